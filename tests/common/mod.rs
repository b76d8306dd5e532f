#![allow(dead_code)]

use std::path::Path;

use chrono::{TimeZone, Utc};
use serde_json::json;

use kira_bashthebug::annotation::{DilutionReading, RawClassification};
use kira_bashthebug::decoded::DecodedClassification;
use kira_bashthebug::identity::parse_filename;
use kira_bashthebug::session::SessionMeta;

/// Decoded row for `filename` carrying `code`.
pub fn row(filename: &str, code: i32) -> DecodedClassification {
    DecodedClassification {
        raw: RawClassification {
            classification_id: "1".to_string(),
            user_name: "alice".to_string(),
            user_id: None,
            workflow_name: None,
            workflow_version: None,
            created_at: Utc.with_ymd_and_hms(2018, 3, 1, 10, 0, 0).unwrap(),
            subject_id: "1".to_string(),
            subject_data: json!({}),
            metadata: json!({}),
            annotations: Vec::new(),
            live_project: true,
        },
        filename: Some(filename.to_string()),
        identity: parse_filename(filename),
        reading: DilutionReading::from_code(code).unwrap(),
        session: SessionMeta::default(),
    }
}

pub const V1_LABEL: &str = "Having looked at the plate, what do you see?";
pub const V2_LABEL: &str = "If growth stops, please choose the number of the first clear well";

pub struct ExportRow<'a> {
    pub id: &'a str,
    pub user: &'a str,
    pub created_at: &'a str,
    pub live: bool,
    pub filename: &'a str,
    pub label: &'a str,
    pub answer: &'a str,
}

impl<'a> ExportRow<'a> {
    pub fn new(id: &'a str, user: &'a str, filename: &'a str, answer: &'a str) -> Self {
        Self {
            id,
            user,
            created_at: "2018-03-01 10:00:00 UTC",
            live: true,
            filename,
            label: V2_LABEL,
            answer,
        }
    }
}

/// Writes a classification export in the column layout of the project export.
pub fn write_export(path: &Path, rows: &[ExportRow<'_>]) {
    let mut w = csv::Writer::from_path(path).unwrap();
    w.write_record([
        "classification_id",
        "user_name",
        "user_id",
        "workflow_id",
        "workflow_name",
        "workflow_version",
        "created_at",
        "metadata",
        "annotations",
        "subject_data",
        "subject_ids",
    ])
    .unwrap();
    for (i, r) in rows.iter().enumerate() {
        let subject_id = (1000 + i).to_string();
        let metadata = json!({
            "live_project": r.live,
            "started_at": "2018-03-01T10:00:00.000Z",
            "finished_at": "2018-03-01T10:00:12.500Z",
            "user_language": "en",
            "viewport": {"width": 1280, "height": 800}
        });
        let annotations = json!([{"task": "T0", "task_label": r.label, "value": r.answer}]);
        let subject_data = json!({
            subject_id.clone(): {"retired": null, "Filename": format!("{}.png", r.filename)}
        });
        w.write_record([
            r.id.to_string(),
            r.user.to_string(),
            String::new(),
            "3".to_string(),
            "Which drug concentrations inhibit growth?".to_string(),
            "12.3".to_string(),
            r.created_at.to_string(),
            metadata.to_string(),
            annotations.to_string(),
            subject_data.to_string(),
            subject_id,
        ])
        .unwrap();
    }
    w.flush().unwrap();
}
