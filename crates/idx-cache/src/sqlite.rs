use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use log::{debug, info};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use crate::error::{CacheError, PayloadError};
use crate::key::{DatasetKey, Kind};
use crate::payload::{Payload, StoredPayload};
use crate::store::{check_kind, DatasetCache};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS dataset (
    key        TEXT PRIMARY KEY NOT NULL,
    kind       TEXT NOT NULL,
    digest     BLOB NOT NULL,
    compressed INTEGER NOT NULL,
    raw_len    INTEGER NOT NULL,
    body       BLOB NOT NULL
)";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Idle read connections kept open for reuse.
const MAX_IDLE_READERS: usize = 4;

type Row = (String, Vec<u8>, bool, i64, Vec<u8>);

/// Dataset cache persisted in a single SQLite file.
///
/// The table is created on first open. `key` is the primary key, so the
/// add-only rule is enforced by the database itself: a second `INSERT`
/// for the same key fails with a constraint violation, which is mapped to
/// [`CacheError::DuplicateKey`]. That holds across processes sharing the
/// file, not just across threads sharing this handle.
///
/// # Concurrency
///
/// ```text
///   put / clear ──▶ writer (one connection, Mutex)
///   get / contains / keys ──▶ reader pool ──▶ idle connection or a new one
/// ```
///
/// A file store runs in WAL mode and serves reads from their own
/// connections, so readers never wait on each other or on a writer; each
/// read sees the last committed state. A lock is held only to pop or
/// push an idle connection, never across a query. `:memory:` databases
/// are private to one connection, so their reads share the writer.
pub struct SqliteDatasetCache {
    writer: Mutex<Connection>,
    readers: Option<ReaderPool>,
}

struct ReaderPool {
    path: PathBuf,
    idle: Mutex<Vec<Connection>>,
}

impl ReaderPool {
    fn checkout(&self) -> Result<Connection, CacheError> {
        let idle = self.idle.lock().expect("reader pool lock poisoned").pop();
        match idle {
            Some(conn) => Ok(conn),
            None => open_reader(&self.path),
        }
    }

    fn checkin(&self, conn: Connection) {
        let mut idle = self.idle.lock().expect("reader pool lock poisoned");
        if idle.len() < MAX_IDLE_READERS {
            idle.push(conn);
        }
    }
}

fn open_reader(path: &Path) -> Result<Connection, CacheError> {
    let unavailable = |source| CacheError::StoreUnavailable {
        path: path.to_path_buf(),
        source,
    };
    let conn = Connection::open(path).map_err(unavailable)?;
    conn.busy_timeout(BUSY_TIMEOUT).map_err(unavailable)?;
    conn.pragma_update(None, "query_only", true).map_err(unavailable)?;
    debug!("opened read connection to {}", path.display());
    Ok(conn)
}

/// The `raw_len` column value for a payload of `len` bytes.
fn row_len(key: &str, len: usize) -> Result<i64, CacheError> {
    i64::try_from(len).map_err(|_| CacheError::TooLarge {
        key: key.to_string(),
        size: len,
    })
}

fn is_in_memory(path: &Path) -> bool {
    path.as_os_str().is_empty() || path == Path::new(":memory:")
}

impl SqliteDatasetCache {
    /// Open (or create) the store at `path`.
    ///
    /// `:memory:` opens a private in-memory store.
    ///
    /// # Errors
    ///
    /// [`CacheError::StoreUnavailable`] if the file cannot be opened or
    /// the schema cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        if is_in_memory(path) {
            return Self::open_in_memory();
        }
        let unavailable = |source| CacheError::StoreUnavailable {
            path: path.to_path_buf(),
            source,
        };
        let conn = Connection::open(path).map_err(unavailable)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(unavailable)?;
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(unavailable)?;
        conn.execute_batch(SCHEMA).map_err(unavailable)?;
        info!("opened dataset store {} (journal mode {mode})", path.display());
        Ok(Self {
            writer: Mutex::new(conn),
            readers: Some(ReaderPool {
                path: path.to_path_buf(),
                idle: Mutex::new(Vec::new()),
            }),
        })
    }

    /// A private, non-persistent store.
    ///
    /// # Errors
    ///
    /// [`CacheError::StoreUnavailable`] if SQLite cannot allocate it.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        let unavailable = |source| CacheError::StoreUnavailable {
            path: ":memory:".into(),
            source,
        };
        let conn = Connection::open_in_memory().map_err(unavailable)?;
        conn.execute_batch(SCHEMA).map_err(unavailable)?;
        Ok(Self {
            writer: Mutex::new(conn),
            readers: None,
        })
    }

    /// Run a read-only query on a pooled connection.
    fn read<R>(
        &self,
        query: impl FnOnce(&Connection) -> rusqlite::Result<R>,
    ) -> Result<R, CacheError> {
        match &self.readers {
            Some(pool) => {
                let conn = pool.checkout()?;
                let result = query(&conn);
                pool.checkin(conn);
                Ok(result?)
            }
            None => Ok(query(&self.writer.lock().expect("dataset store lock poisoned"))?),
        }
    }

    fn read_row(&self, key: &str) -> Result<Option<StoredPayload>, CacheError> {
        let row = self.read(|conn| {
            conn.query_row::<Row, _, _>(
                "SELECT kind, digest, compressed, raw_len, body FROM dataset WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .optional()
        })?;

        let Some((kind, digest, compressed, raw_len, body)) = row else {
            return Ok(None);
        };
        let corrupt = |source| CacheError::Corrupt {
            key: key.to_string(),
            source,
        };
        let kind = Kind::from_name(&kind)
            .ok_or_else(|| corrupt(PayloadError::UnknownKind(kind.clone())))?;
        let digest: [u8; 32] = digest
            .try_into()
            .map_err(|d: Vec<u8>| corrupt(PayloadError::DigestLength(d.len())))?;
        let raw_len =
            usize::try_from(raw_len).map_err(|_| corrupt(PayloadError::NegativeLength(raw_len)))?;
        Ok(Some(StoredPayload {
            kind,
            digest,
            compressed,
            raw_len,
            body,
        }))
    }
}

impl DatasetCache for SqliteDatasetCache {
    fn get(&self, key: DatasetKey) -> Result<Option<Payload>, CacheError> {
        let name = key.to_string();
        let Some(stored) = self.read_row(&name)? else {
            debug!("dataset store miss for {name}");
            return Ok(None);
        };
        if stored.kind != key.kind {
            return Err(CacheError::KindMismatch {
                key: name,
                found: stored.kind,
            });
        }
        let payload = stored.open().map_err(|source| CacheError::Corrupt {
            key: name.clone(),
            source,
        })?;
        debug!("dataset store hit for {name} ({} records)", payload.len());
        Ok(Some(payload))
    }

    fn put(&self, key: DatasetKey, payload: &Payload) -> Result<(), CacheError> {
        check_kind(key, payload)?;
        let name = key.to_string();
        let stored = StoredPayload::seal(payload)?;
        let raw_len = row_len(&name, stored.raw_len)?;

        let mut conn = self.writer.lock().expect("dataset store lock poisoned");
        let tx = conn.transaction()?;
        let inserted = tx.execute(
            "INSERT INTO dataset (key, kind, digest, compressed, raw_len, body)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                name,
                stored.kind.as_str(),
                &stored.digest[..],
                stored.compressed,
                raw_len,
                stored.body
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                return Err(CacheError::DuplicateKey { key: name });
            }
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::TooBig => {
                return Err(CacheError::TooLarge {
                    key: name,
                    size: stored.body.len(),
                });
            }
            Err(e) => return Err(e.into()),
        }
        tx.commit()?;

        info!(
            "stored {name}: {} records, {} bytes on disk",
            payload.len(),
            stored.body.len()
        );
        Ok(())
    }

    fn contains(&self, key: DatasetKey) -> Result<bool, CacheError> {
        let found = self.read(|conn| {
            conn.query_row(
                "SELECT 1 FROM dataset WHERE key = ?1",
                params![key.to_string()],
                |_| Ok(()),
            )
            .optional()
        })?;
        Ok(found.is_some())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.read(|conn| {
            let mut stmt = conn.prepare("SELECT key FROM dataset ORDER BY key")?;
            let keys = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(keys)
        })
    }

    fn clear(&self) -> Result<usize, CacheError> {
        let conn = self.writer.lock().expect("dataset store lock poisoned");
        Ok(conn.execute("DELETE FROM dataset", [])?)
    }
}
