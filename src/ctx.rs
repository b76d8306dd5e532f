use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::annotation::RawClassification;
use crate::consensus::{ConsensusConfig, GroupBy, MeasurementTable};
use crate::decoded::DecodedClassification;
use crate::identity::{PlateIdentity, Study};
use crate::ledger::ContributorLedger;
use crate::merge::MergeReport;
use crate::plates::WellIndexTables;
use crate::schema::v1::BashTheBugV1;

/// What to do with a row whose decode raised a schema-contract error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePolicy {
    Encode,
    Skip,
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSpec {
    pub path: PathBuf,
    pub column: String,
}

#[derive(Debug, Clone, Default)]
pub struct InputMeta {
    pub rows_read: usize,
    pub rows_live: usize,
    pub rows_in_window: usize,
    pub rows_decoded: usize,
    pub rows_skipped: usize,
    pub rows_filtered: usize,
    pub identity_failures: usize,
}

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub out_dir: PathBuf,
    pub classifications_path: PathBuf,
    pub measurements_path: PathBuf,
    pub users_path: PathBuf,
    pub json_path: PathBuf,
}

#[derive(Debug)]
pub struct Ctx {
    pub input: PathBuf,
    pub group_by: GroupBy,
    pub policy: DecodePolicy,
    pub plates_path: Option<PathBuf>,
    pub include_non_live: bool,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub study: Option<Study>,
    pub reading_day: Option<u32>,
    pub merges: Vec<MergeSpec>,
    pub consensus: ConsensusConfig,
    pub write_tables: bool,
    pub write_json: bool,
    pub threads: usize,
    pub warnings: Vec<String>,
    pub raw: Vec<RawClassification>,
    pub identities: Vec<(Option<String>, Option<PlateIdentity>)>,
    pub tables: Option<WellIndexTables>,
    pub decoded: Vec<DecodedClassification>,
    pub filename_medians: HashMap<String, f64>,
    pub measurements: Option<MeasurementTable>,
    pub merge_reports: Vec<(String, MergeReport)>,
    pub ledger: Option<ContributorLedger>,
    pub input_meta: InputMeta,
    pub output: OutputPaths,
    pub report: BashTheBugV1,
}

impl Ctx {
    pub fn new(
        input: PathBuf,
        out_dir: PathBuf,
        group_by: GroupBy,
        policy: DecodePolicy,
        write_tables: bool,
        write_json: bool,
        tool_version: &str,
    ) -> Self {
        let output = OutputPaths {
            classifications_path: out_dir.join("classifications.tsv"),
            measurements_path: out_dir.join("measurements.tsv"),
            users_path: out_dir.join("users.tsv"),
            json_path: out_dir.join("bashthebug.json"),
            out_dir,
        };
        Self {
            input,
            group_by,
            policy,
            plates_path: None,
            include_non_live: false,
            from_date: None,
            to_date: None,
            study: None,
            reading_day: None,
            merges: Vec::new(),
            consensus: ConsensusConfig::default(),
            write_tables,
            write_json,
            threads: 0,
            warnings: Vec::new(),
            raw: Vec::new(),
            identities: Vec::new(),
            tables: None,
            decoded: Vec::new(),
            filename_medians: HashMap::new(),
            measurements: None,
            merge_reports: Vec::new(),
            ledger: None,
            input_meta: InputMeta::default(),
            output,
            report: BashTheBugV1::empty(tool_version, group_by),
        }
    }

    /// Code counts over the decoded rows, keyed by dilution code.
    pub fn code_counts(&self) -> std::collections::BTreeMap<i32, usize> {
        let mut counts = std::collections::BTreeMap::new();
        for row in &self.decoded {
            *counts.entry(row.dilution_code()).or_insert(0) += 1;
        }
        counts
    }
}
