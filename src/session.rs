use chrono::{DateTime, Utc};
use serde_json::Value;

/// Per-classification browser session details taken from export metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionMeta {
    pub task_duration_secs: Option<f64>,
    pub user_language: Option<String>,
    pub viewport_width: Option<u64>,
    pub viewport_height: Option<u64>,
}

pub fn session_meta(metadata: &Value) -> SessionMeta {
    SessionMeta {
        task_duration_secs: task_duration_secs(metadata),
        user_language: metadata
            .get("user_language")
            .and_then(Value::as_str)
            .map(str::to_string),
        viewport_width: metadata
            .get("viewport")
            .and_then(|v| v.get("width"))
            .and_then(Value::as_u64),
        viewport_height: metadata
            .get("viewport")
            .and_then(|v| v.get("height"))
            .and_then(Value::as_u64),
    }
}

fn task_duration_secs(metadata: &Value) -> Option<f64> {
    let start = parse_timestamp(metadata.get("started_at")?.as_str()?)?;
    let end = parse_timestamp(metadata.get("finished_at")?.as_str()?)?;
    Some((end - start).num_milliseconds() as f64 / 1000.0)
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // export style: "2017-04-07 10:15:00 UTC"
    let stripped = s.strip_suffix(" UTC").unwrap_or(s);
    chrono::NaiveDateTime::parse_from_str(stripped, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn duration_and_viewport() {
        let meta = json!({
            "started_at": "2017-04-07T10:00:00.000Z",
            "finished_at": "2017-04-07T10:00:42.500Z",
            "user_language": "en",
            "viewport": {"width": 1280, "height": 800}
        });
        let s = session_meta(&meta);
        assert_eq!(s.task_duration_secs, Some(42.5));
        assert_eq!(s.user_language.as_deref(), Some("en"));
        assert_eq!(s.viewport_width, Some(1280));
        assert_eq!(s.viewport_height, Some(800));
    }

    #[test]
    fn missing_fields_are_none() {
        let s = session_meta(&json!({"started_at": "not a date"}));
        assert_eq!(s, SessionMeta::default());
    }

    #[test]
    fn export_timestamp_format() {
        let dt = parse_timestamp("2017-04-07 10:15:00 UTC").unwrap();
        assert_eq!(dt.to_rfc3339(), "2017-04-07T10:15:00+00:00");
    }
}
