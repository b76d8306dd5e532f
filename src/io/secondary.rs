use std::path::Path;

use crate::io::{open_maybe_gz, table_extension};
use crate::merge::{MergeError, SecondaryDataset, parse_secondary};

/// Loads a two-column `.csv`/`.tsv` dataset (optionally gzipped) for merging.
pub fn read_secondary(path: &Path, new_column: &str) -> Result<SecondaryDataset, MergeError> {
    let delimiter = match table_extension(path).as_deref() {
        Some("csv") => b',',
        Some("tsv") => b'\t',
        _ => {
            return Err(MergeError::UnsupportedFormat {
                path: path.display().to_string(),
            });
        }
    };

    let reader = open_maybe_gz(path).map_err(|e| MergeError::Read(e.to_string()))?;
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| MergeError::Read(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(|e| MergeError::Read(e.to_string()))?;
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    parse_secondary(&headers, &records, new_column)
}
