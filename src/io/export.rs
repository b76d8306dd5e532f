use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::debug;

use crate::annotation::{RawClassification, live_project_flag, parse_annotations};
use crate::io::open_maybe_gz;
use crate::session::parse_timestamp;

const REQUIRED_COLUMNS: &[&str] = &[
    "classification_id",
    "user_name",
    "created_at",
    "metadata",
    "annotations",
    "subject_data",
    "subject_ids",
];

#[derive(Debug, Default)]
pub struct ExportRead {
    pub rows: Vec<RawClassification>,
    pub rows_read: usize,
    pub warnings: Vec<String>,
}

pub fn read_export(path: &Path) -> Result<ExportRead> {
    let reader = open_maybe_gz(path)?;
    read_export_from(reader, &path.display().to_string())
}

/// Reads a classification export; malformed rows are skipped with a warning.
pub fn read_export_from<R: Read>(reader: R, source: &str) -> Result<ExportRead> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .with_context(|| format!("{}: failed to read header row", source))?
        .clone();
    let index: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h, i)).collect();
    for column in REQUIRED_COLUMNS {
        if !index.contains_key(column) {
            bail!("{}: missing required column '{}'", source, column);
        }
    }

    let mut out = ExportRead::default();
    for (i, result) in csv_reader.records().enumerate() {
        let line = i + 2;
        out.rows_read += 1;
        let record = match result {
            Ok(record) => record,
            Err(err) if err.is_io_error() => {
                return Err(err).with_context(|| format!("{}: read failed at line {}", source, line));
            }
            Err(err) => {
                out.warnings
                    .push(format!("{}:{} skipped malformed row: {}", source, line, err));
                continue;
            }
        };
        let field = |name: &str| index.get(name).and_then(|&i| record.get(i));
        match parse_row(&field) {
            Ok(row) => out.rows.push(row),
            Err(err) => {
                debug!(line, error = %err, "export_row_skipped");
                out.warnings
                    .push(format!("{}:{} skipped row: {}", source, line, err));
            }
        }
    }

    Ok(out)
}

fn parse_row<'a, F>(field: &F) -> Result<RawClassification>
where
    F: Fn(&str) -> Option<&'a str>,
{
    let required = |name: &str| {
        field(name)
            .ok_or_else(|| anyhow::anyhow!("missing field '{}'", name))
    };
    let optional = |name: &str| {
        field(name)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let classification_id = required("classification_id")?.trim().to_string();
    if classification_id.is_empty() {
        bail!("empty classification_id");
    }
    let created_raw = required("created_at")?;
    let created_at = parse_timestamp(created_raw)
        .ok_or_else(|| anyhow::anyhow!("unparseable created_at '{}'", created_raw))?;

    let metadata: Value =
        serde_json::from_str(required("metadata")?).context("metadata is not valid JSON")?;
    let annotations_json: Value = serde_json::from_str(required("annotations")?)
        .context("annotations is not valid JSON")?;
    let subject_data: Value = serde_json::from_str(required("subject_data")?)
        .context("subject_data is not valid JSON")?;
    let annotations = parse_annotations(&annotations_json)?;

    // multi-subject rows list ids separated by ';', the first one is classified
    let subject_id = required("subject_ids")?
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    Ok(RawClassification {
        classification_id,
        user_name: required("user_name")?.to_string(),
        user_id: optional("user_id"),
        workflow_name: optional("workflow_name"),
        workflow_version: optional("workflow_version"),
        created_at,
        subject_id,
        live_project: live_project_flag(&metadata),
        subject_data,
        metadata,
        annotations,
    })
}
