//! Left-join of an external per-image dataset onto the measurement table.
//!
//! Validation runs to completion before the table is touched, so a rejected
//! dataset leaves the measurements exactly as they were.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::consensus::{GroupKey, MeasurementTable, MergedValue};
use crate::math::stats::median;

pub const KEY_COLUMN: &str = "filename";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("secondary dataset must have exactly two columns, found {found}")]
    ColumnCount { found: usize },

    #[error("secondary dataset does not contain a column named filename to merge on")]
    MissingKeyColumn,

    #[error("specified column '{column}' is not in the secondary dataset")]
    MissingValueColumn { column: String },

    #[error("specified column '{column}' already exists in the measurements table")]
    ColumnExists { column: String },

    #[error("row {row}: expected 2 fields, found {found}")]
    RaggedRow { row: usize, found: usize },

    #[error("row {row}: value '{value}' in column '{column}' is not numeric")]
    NonNumeric {
        row: usize,
        column: String,
        value: String,
    },

    #[error("unsupported secondary dataset '{path}' (expected .csv or .tsv, optionally gzipped)")]
    UnsupportedFormat { path: String },

    #[error("failed to read secondary dataset: {0}")]
    Read(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryDataset {
    pub value_column: String,
    pub rows: Vec<(String, Option<f64>)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeReport {
    pub rows: usize,
    pub matched_groups: usize,
    pub unmatched_keys: usize,
    pub unparsed_filenames: usize,
}

/// Validates the header and rows of a two-column dataset.
pub fn parse_secondary(
    headers: &[String],
    records: &[Vec<String>],
    new_column: &str,
) -> Result<SecondaryDataset, MergeError> {
    if headers.len() != 2 {
        return Err(MergeError::ColumnCount {
            found: headers.len(),
        });
    }
    let value_idx = headers
        .iter()
        .position(|h| h == new_column)
        .ok_or_else(|| MergeError::MissingValueColumn {
            column: new_column.to_string(),
        })?;
    let key_idx = headers
        .iter()
        .position(|h| h == KEY_COLUMN)
        .ok_or(MergeError::MissingKeyColumn)?;
    if key_idx == value_idx {
        return Err(MergeError::MissingKeyColumn);
    }

    let mut rows = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let row = i + 1;
        if record.len() != 2 {
            return Err(MergeError::RaggedRow {
                row,
                found: record.len(),
            });
        }
        let raw = record[value_idx].trim();
        let value = if raw.is_empty() {
            None
        } else {
            let parsed = raw.parse::<f64>().map_err(|_| MergeError::NonNumeric {
                row,
                column: new_column.to_string(),
                value: raw.to_string(),
            })?;
            Some(parsed)
        };
        rows.push((record[key_idx].trim().to_string(), value));
    }

    Ok(SecondaryDataset {
        value_column: new_column.to_string(),
        rows,
    })
}

/// Summarises the dataset per group key (median and count) and left-joins it.
pub fn merge_into(
    table: &mut MeasurementTable,
    dataset: &SecondaryDataset,
) -> Result<MergeReport, MergeError> {
    let column = &dataset.value_column;
    let mut existing = table.columns();
    existing.extend(table.merged_columns.iter().cloned());
    for candidate in [
        column.clone(),
        format!("{}_median", column),
        format!("{}_count", column),
    ] {
        if existing.contains(&candidate) {
            return Err(MergeError::ColumnExists {
                column: column.clone(),
            });
        }
    }

    let mut report = MergeReport {
        rows: dataset.rows.len(),
        ..MergeReport::default()
    };
    let mut grouped: HashMap<GroupKey, Vec<f64>> = HashMap::new();
    for (filename, value) in &dataset.rows {
        let Some(key) = table.group_by.key_for_filename(filename) else {
            report.unparsed_filenames += 1;
            continue;
        };
        let values = grouped.entry(key).or_default();
        if let Some(v) = value {
            values.push(*v);
        }
    }

    let mut summarised: BTreeMap<GroupKey, MergedValue> = BTreeMap::new();
    for (key, mut values) in grouped {
        let count = values.len();
        summarised.insert(
            key,
            MergedValue {
                median: median(&mut values),
                count,
            },
        );
    }

    for measurement in table.rows.iter_mut() {
        let merged = match summarised.remove(&measurement.key) {
            Some(value) => {
                report.matched_groups += 1;
                value
            }
            None => MergedValue {
                median: None,
                count: 0,
            },
        };
        measurement.merged.insert(column.clone(), merged);
    }
    report.unmatched_keys = summarised.len();
    table.merged_columns.push(column.clone());

    Ok(report)
}
