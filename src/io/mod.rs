use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;

pub mod export;
pub mod json_writer;
pub mod secondary;
pub mod summary;
pub mod tsv_writer;

pub(crate) fn open_maybe_gz(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    if is_gz(path) {
        let decoder = GzDecoder::new(BufReader::new(file));
        Ok(Box::new(decoder))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

pub(crate) fn is_gz(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("gz")
}

/// Extension that decides the table format, looking through a `.gz` suffix.
pub(crate) fn table_extension(path: &Path) -> Option<String> {
    let inner = if is_gz(path) {
        Path::new(path.file_stem()?)
    } else {
        path
    };
    inner
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}
