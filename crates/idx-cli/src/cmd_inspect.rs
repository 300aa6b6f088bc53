/// Implementation of `idx inspect`.
///
/// Reads the magic word to tell image files from label files, validates
/// the header leniently (the file declares its own shape), then decodes
/// the body unless `--header-only` is set.
///
/// ```text
/// ✓ Header: image file, 60000 records of 28x28
/// ✓ Records: 60000 decoded, 47040000 pixel bytes
/// ```
use std::fs;

use anyhow::{bail, Context, Result};
use idx_decoder::{decode_images, decode_labels};
use idx_wire::{
    read_word, HeaderPolicy, ImageHeader, LabelHeader, IMAGE_MAGIC, LABEL_MAGIC,
};

use crate::InspectArgs;

pub fn run(args: &InspectArgs) -> Result<()> {
    let bytes =
        fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;
    let magic = read_word(&bytes, 0).context("file is shorter than one header word")?;

    match magic {
        IMAGE_MAGIC => {
            let header = ImageHeader::read_from(&bytes, &ImageHeader::MNIST_TRAIN, HeaderPolicy::NonZero)
                .context("invalid image header")?;
            println!(
                "✓ Header: image file, {} records of {}x{}",
                header.count, header.rows, header.cols
            );
            if !args.header_only {
                let records = decode_images(&bytes, &header, HeaderPolicy::Strict)
                    .with_context(|| format!("failed to decode {}", args.file.display()))?;
                println!(
                    "✓ Records: {} decoded, {} pixel bytes",
                    records.len(),
                    records.len() * records.record_size()
                );
            }
        }
        LABEL_MAGIC => {
            let header = LabelHeader::read_from(&bytes, &LabelHeader::MNIST_TRAIN, HeaderPolicy::NonZero)
                .context("invalid label header")?;
            println!("✓ Header: label file, {} records", header.count);
            if !args.header_only {
                let labels = decode_labels(&bytes, &header, HeaderPolicy::Strict)
                    .with_context(|| format!("failed to decode {}", args.file.display()))?;
                let mut histogram = [0usize; 256];
                for &label in &labels {
                    histogram[usize::from(label)] += 1;
                }
                println!("✓ Labels: {} decoded", labels.len());
                for (class, count) in histogram.iter().enumerate().filter(|(_, c)| **c > 0) {
                    println!("    {class}: {count}");
                }
            }
        }
        other => bail!("unknown magic number {other} (expected {IMAGE_MAGIC} or {LABEL_MAGIC})"),
    }
    Ok(())
}
