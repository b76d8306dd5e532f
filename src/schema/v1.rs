use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consensus::GroupBy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSummary {
    pub rows_read: usize,
    pub rows_live: usize,
    pub rows_in_window: usize,
    pub rows_decoded: usize,
    pub rows_skipped: usize,
    pub rows_filtered: usize,
    pub identity_failures: usize,
    pub group_by: String,
    pub well_index_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementSummary {
    pub groups: usize,
    pub computed: usize,
    pub unreadable: usize,
    pub insufficient: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributorSummary {
    pub total_classifications: usize,
    pub total_users: usize,
    pub anonymous_users: usize,
    pub concentration: Option<f64>,
    pub top_10_share: Option<f64>,
    pub top_100_share: Option<f64>,
    pub top_1000_share: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedColumnSummary {
    pub column: String,
    pub source: String,
    pub rows: usize,
    pub matched_groups: usize,
    pub unmatched_keys: usize,
    pub unparsed_filenames: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BashTheBugV1 {
    pub tool: String,
    pub version: String,
    pub schema_version: String,
    pub input: InputSummary,
    pub codes: BTreeMap<i32, usize>,
    pub measurements: Option<MeasurementSummary>,
    pub contributors: Option<ContributorSummary>,
    pub merged_columns: Vec<MergedColumnSummary>,
}

impl BashTheBugV1 {
    pub fn empty(tool_version: &str, group_by: GroupBy) -> Self {
        Self {
            tool: "kira-bashthebug".to_string(),
            version: tool_version.to_string(),
            schema_version: "v1".to_string(),
            input: InputSummary {
                rows_read: 0,
                rows_live: 0,
                rows_in_window: 0,
                rows_decoded: 0,
                rows_skipped: 0,
                rows_filtered: 0,
                identity_failures: 0,
                group_by: group_by.as_str().to_string(),
                well_index_version: None,
            },
            codes: BTreeMap::new(),
            measurements: None,
            contributors: None,
            merged_columns: Vec::new(),
        }
    }
}
