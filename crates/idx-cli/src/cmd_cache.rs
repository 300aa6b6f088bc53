/// Implementation of `idx cache ls` and `idx cache clear`.
use anyhow::{Context, Result};
use idx_cache::{DatasetCache, SqliteDatasetCache};

use crate::CacheCommand;

pub fn run(cmd: &CacheCommand) -> Result<()> {
    match cmd {
        CacheCommand::Ls(store) => {
            let cache = SqliteDatasetCache::open(&store.cache)
                .with_context(|| format!("cannot open {}", store.cache.display()))?;
            let keys = cache.keys()?;
            if keys.is_empty() {
                println!("(no cached datasets)");
            }
            for key in keys {
                println!("{key}");
            }
        }
        CacheCommand::Clear(store) => {
            let cache = SqliteDatasetCache::open(&store.cache)
                .with_context(|| format!("cannot open {}", store.cache.display()))?;
            let removed = cache.clear()?;
            println!(
                "removed {removed} cached dataset{}",
                if removed == 1 { "" } else { "s" }
            );
        }
    }
    Ok(())
}
