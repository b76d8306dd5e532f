pub mod decode;
pub mod schema;

use std::borrow::Cow;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use serde_json::Value;

pub use decode::{
    CannotClassifyReason, DecodeError, DilutionReading, StructuralFailure, decode, decode_batch,
};
pub use schema::{TaskSchema, detect_schema};

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    Null,
    Text(String),
    Number(f64),
    Other(Value),
}

impl AnnotationValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::String(s) => Self::Text(s.clone()),
            Value::Number(n) => match n.as_f64() {
                Some(f) => Self::Number(f),
                None => Self::Other(value.clone()),
            },
            other => Self::Other(other.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub task_label: Option<String>,
    pub value: AnnotationValue,
}

impl Annotation {
    /// Answer as text; numbers use their shortest integer form when integral.
    pub fn text(&self) -> Option<Cow<'_, str>> {
        match &self.value {
            AnnotationValue::Null => None,
            AnnotationValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
            AnnotationValue::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    Some(Cow::Owned(format!("{}", *n as i64)))
                } else {
                    Some(Cow::Owned(n.to_string()))
                }
            }
            AnnotationValue::Other(v) => Some(Cow::Owned(v.to_string())),
        }
    }

    pub fn well_index(&self) -> Option<i64> {
        match &self.value {
            AnnotationValue::Text(s) => s.trim().parse::<i64>().ok(),
            AnnotationValue::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(*n as i64),
            _ => None,
        }
    }
}

/// One contributor's judgement on one subject image, as exported.
#[derive(Debug, Clone)]
pub struct RawClassification {
    pub classification_id: String,
    pub user_name: String,
    pub user_id: Option<String>,
    pub workflow_name: Option<String>,
    pub workflow_version: Option<String>,
    pub created_at: DateTime<Utc>,
    pub subject_id: String,
    pub subject_data: Value,
    pub metadata: Value,
    pub annotations: Vec<Annotation>,
    pub live_project: bool,
}

impl RawClassification {
    pub fn first_answer(&self) -> Option<&Annotation> {
        self.annotations.first()
    }

    pub fn second_answer(&self) -> Option<&Annotation> {
        self.annotations.get(1)
    }
}

pub fn parse_annotations(value: &Value) -> Result<Vec<Annotation>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        _ => bail!("annotations must be a JSON array"),
    };
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let Value::Object(map) = item else {
            bail!("annotation entry must be a JSON object");
        };
        let task_label = map
            .get("task_label")
            .and_then(Value::as_str)
            .map(str::to_string);
        let value = map
            .get("value")
            .map(AnnotationValue::from_json)
            .unwrap_or(AnnotationValue::Null);
        out.push(Annotation {
            task_label,
            value,
        });
    }
    Ok(out)
}

/// `metadata.live_project`; absent or non-boolean counts as not live.
pub fn live_project_flag(metadata: &Value) -> bool {
    metadata
        .get("live_project")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
