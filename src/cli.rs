use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::ctx::MergeSpec;

#[derive(Debug, Parser)]
#[command(
    name = "kira-bashthebug",
    version,
    about = "Decode and aggregate crowd-sourced microtiter plate readings"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Decode, aggregate and write all output tables.
    Run(RunArgs),
    /// Decode an export and report dilution code counts only.
    Decode(DecodeArgs),
    Plates(PlatesArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(long, help = "Classification export (.csv or .csv.gz)")]
    pub input: PathBuf,

    #[arg(long)]
    pub out: PathBuf,

    #[arg(long, value_enum, default_value_t = GroupByArg::PlateImage)]
    pub group_by: GroupByArg,

    #[arg(long, value_enum, default_value_t = PolicyArg::Encode)]
    pub policy: PolicyArg,

    #[arg(long, help = "Optional well index TSV to overlay on built-in tables")]
    pub plates: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub study: Option<StudyArg>,

    #[arg(long)]
    pub reading_day: Option<u32>,

    #[arg(long, help = "Keep classifications created on or after this date (YYYY-MM-DD)")]
    pub from_date: Option<NaiveDate>,

    #[arg(long, help = "Keep classifications created on or before this date (YYYY-MM-DD)")]
    pub to_date: Option<NaiveDate>,

    #[arg(long, default_value_t = false)]
    pub include_non_live: bool,

    #[arg(
        long,
        value_parser = parse_merge_spec,
        help = "Merge a two-column dataset: PATH:COLUMN (repeatable)"
    )]
    pub merge: Vec<MergeSpec>,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[arg(long, default_value_t = false)]
    pub no_tables: bool,

    #[arg(long, default_value_t = 0, help = "Number of threads (0 = auto)")]
    pub threads: usize,

    #[arg(long, default_value_t = 10)]
    pub min_total: usize,

    #[arg(long, default_value_t = 5)]
    pub min_valid: usize,

    #[arg(long, default_value_t = 0.5)]
    pub unreadable_fraction: f64,

    #[arg(long, default_value_t = false, help = "Keep no-growth codes when computing statistics")]
    pub keep_no_growth: bool,
}

#[derive(Debug, Args)]
pub struct DecodeArgs {
    #[arg(long, help = "Classification export (.csv or .csv.gz)")]
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = PolicyArg::Encode)]
    pub policy: PolicyArg,

    #[arg(long, help = "Optional well index TSV to overlay on built-in tables")]
    pub plates: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub include_non_live: bool,
}

#[derive(Debug, Args)]
pub struct PlatesArgs {
    #[command(subcommand)]
    pub command: PlatesCommand,
}

#[derive(Debug, Subcommand)]
pub enum PlatesCommand {
    Show(PlatesShowArgs),
}

#[derive(Debug, Args)]
pub struct PlatesShowArgs {
    #[arg(long, help = "Optional well index TSV to overlay on built-in tables")]
    pub plates: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroupByArg {
    PlateImage,
    ReadingDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Encode,
    Skip,
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StudyArg {
    Unknown,
    Legacy,
    Current,
}

/// Splits `PATH:COLUMN` at the last colon.
pub fn parse_merge_spec(s: &str) -> Result<MergeSpec, String> {
    let (path, column) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("expected PATH:COLUMN, got '{}'", s))?;
    if path.is_empty() {
        return Err(format!("missing path in '{}'", s));
    }
    if column.is_empty() {
        return Err(format!("missing column name in '{}'", s));
    }
    Ok(MergeSpec {
        path: PathBuf::from(path),
        column: column.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_spec_splits_on_last_colon() {
        let spec = parse_merge_spec("data/c:/growth.csv:IM_GROWTH").unwrap();
        assert_eq!(spec.path, PathBuf::from("data/c:/growth.csv"));
        assert_eq!(spec.column, "IM_GROWTH");
        assert!(parse_merge_spec("growth.csv").is_err());
        assert!(parse_merge_spec("growth.csv:").is_err());
    }
}
