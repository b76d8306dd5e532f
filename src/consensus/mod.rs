//! Consensus aggregation of decoded codes per physical plate reading.
//!
//! Every group is summarised from scratch; small groups report counts only
//! and groups dominated by failures report the unreadable sentinel.

use std::collections::{BTreeMap, HashMap};

use crate::decoded::DecodedClassification;
use crate::identity::{PlateIdentity, parse_filename, plate_image_of};
use crate::math::stats::{mean, median, median_ceil, sample_std};

pub const UNREADABLE_SENTINEL: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    PlateImage,
    ReadingDay,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlateImage => "plate_image",
            Self::ReadingDay => "reading_day",
        }
    }

    pub fn key_columns(&self) -> &'static [&'static str] {
        match self {
            Self::PlateImage => &["plate_image", "drug"],
            Self::ReadingDay => &["plate", "reading_day", "drug"],
        }
    }

    pub fn key_for(&self, identity: &PlateIdentity) -> GroupKey {
        match self {
            Self::PlateImage => GroupKey::PlateImage {
                plate_image: identity.plate_image.clone(),
                drug: identity.drug.clone(),
            },
            Self::ReadingDay => GroupKey::ReadingDay {
                plate: identity.plate.clone(),
                reading_day: identity.reading_day,
                drug: identity.drug.clone(),
            },
        }
    }

    /// Group key for a bare image filename. Plate-image keys only need the
    /// image prefix and drug; reading-day keys need a full identity.
    pub fn key_for_filename(&self, filename: &str) -> Option<GroupKey> {
        match self {
            Self::PlateImage => plate_image_of(filename).map(|(plate_image, drug)| {
                GroupKey::PlateImage {
                    plate_image: plate_image.to_string(),
                    drug: drug.to_string(),
                }
            }),
            Self::ReadingDay => parse_filename(filename).map(|identity| self.key_for(&identity)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    PlateImage {
        plate_image: String,
        drug: String,
    },
    ReadingDay {
        plate: String,
        reading_day: u32,
        drug: String,
    },
}

impl GroupKey {
    /// Key values in the order of `GroupBy::key_columns`.
    pub fn values(&self) -> Vec<String> {
        match self {
            Self::PlateImage { plate_image, drug } => vec![plate_image.clone(), drug.clone()],
            Self::ReadingDay {
                plate,
                reading_day,
                drug,
            } => vec![plate.clone(), reading_day.to_string(), drug.clone()],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusConfig {
    /// Groups with at most this many codes report counts only.
    pub min_total: usize,
    /// Groups with at most this many positive codes are unreadable.
    pub min_valid: usize,
    pub unreadable_fraction: f64,
    /// Drop no-growth baseline codes (1) before computing statistics.
    pub strip_no_growth: bool,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            min_total: 10,
            min_valid: 5,
            unreadable_fraction: 0.5,
            strip_no_growth: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupCounts {
    pub total: usize,
    pub n_failed: usize,
    pub n_cannot_read: usize,
    pub n_valid: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsensusValues {
    pub median: i32,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: i32,
    pub max: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsensusStats {
    /// Too few codes (or none left to summarise); statistics undefined.
    Insufficient,
    /// Group judged unreadable; every statistic reports the sentinel.
    Unreadable,
    Computed(ConsensusValues),
}

impl ConsensusStats {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insufficient => "insufficient",
            Self::Unreadable => "unreadable",
            Self::Computed(_) => "computed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergedValue {
    pub median: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub key: GroupKey,
    pub counts: GroupCounts,
    pub stats: ConsensusStats,
    pub merged: BTreeMap<String, MergedValue>,
}

pub fn count_codes(codes: &[i32]) -> GroupCounts {
    GroupCounts {
        total: codes.len(),
        n_failed: codes.iter().filter(|&&c| c < -2).count(),
        // disagreement signal: everything except the two reserved values
        n_cannot_read: codes.iter().filter(|&&c| c != -1 && c != -2).count(),
        n_valid: codes.iter().filter(|&&c| c > 0).count(),
    }
}

pub fn aggregate(codes: &[i32], config: &ConsensusConfig) -> (GroupCounts, ConsensusStats) {
    let counts = count_codes(codes);
    if counts.total <= config.min_total {
        return (counts, ConsensusStats::Insufficient);
    }

    let remaining = counts.total - counts.n_failed;
    let proportion_failed = if remaining == 0 {
        f64::INFINITY
    } else {
        counts.n_cannot_read as f64 / remaining as f64
    };
    if proportion_failed >= config.unreadable_fraction || counts.n_valid <= config.min_valid {
        return (counts, ConsensusStats::Unreadable);
    }

    let mut working: Vec<i32> = codes
        .iter()
        .copied()
        .filter(|&c| c > 0)
        .filter(|&c| !(config.strip_no_growth && c == 1))
        .collect();
    if working.is_empty() {
        return (counts, ConsensusStats::Insufficient);
    }

    let values: Vec<f64> = working.iter().map(|&c| c as f64).collect();
    let (Some(mid), Some(avg)) = (median_ceil(&mut working), mean(&values)) else {
        return (counts, ConsensusStats::Insufficient);
    };

    // median_ceil leaves `working` sorted
    let stats = ConsensusValues {
        median: mid,
        mean: avg,
        std: sample_std(&values),
        min: working[0],
        max: working[working.len() - 1],
    };
    (counts, ConsensusStats::Computed(stats))
}

pub const STAT_COLUMNS: &[&str] = &[
    "median",
    "mean",
    "std",
    "min",
    "max",
    "count",
    "n_failed",
    "n_cannot_read",
    "n_valid",
];

#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementTable {
    pub group_by: GroupBy,
    pub rows: Vec<Measurement>,
    pub merged_columns: Vec<String>,
}

impl MeasurementTable {
    /// Every output column name; merged columns expand to median and count.
    pub fn columns(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .group_by
            .key_columns()
            .iter()
            .chain(STAT_COLUMNS.iter())
            .map(|c| c.to_string())
            .collect();
        for name in &self.merged_columns {
            out.push(format!("{}_median", name));
            out.push(format!("{}_count", name));
        }
        out
    }

    pub fn count_by_status(&self) -> (usize, usize, usize) {
        let mut computed = 0;
        let mut unreadable = 0;
        let mut insufficient = 0;
        for m in &self.rows {
            match m.stats {
                ConsensusStats::Computed(_) => computed += 1,
                ConsensusStats::Unreadable => unreadable += 1,
                ConsensusStats::Insufficient => insufficient += 1,
            }
        }
        (computed, unreadable, insufficient)
    }
}

/// Groups rows with a parsed identity and aggregates each group, sorted by key.
pub fn build_measurements(
    rows: &[DecodedClassification],
    group_by: GroupBy,
    config: &ConsensusConfig,
) -> MeasurementTable {
    let mut groups: BTreeMap<GroupKey, Vec<i32>> = BTreeMap::new();
    for row in rows {
        if let Some(identity) = &row.identity {
            groups
                .entry(group_by.key_for(identity))
                .or_default()
                .push(row.dilution_code());
        }
    }

    let rows = groups
        .into_iter()
        .map(|(key, codes)| {
            let (counts, stats) = aggregate(&codes, config);
            Measurement {
                key,
                counts,
                stats,
                merged: BTreeMap::new(),
            }
        })
        .collect();

    MeasurementTable {
        group_by,
        rows,
        merged_columns: Vec::new(),
    }
}

/// Plain median of every code sharing a filename.
pub fn filename_medians(rows: &[DecodedClassification]) -> HashMap<String, f64> {
    let mut by_filename: HashMap<&str, Vec<f64>> = HashMap::new();
    for row in rows {
        if let Some(filename) = &row.filename {
            by_filename
                .entry(filename.as_str())
                .or_default()
                .push(row.dilution_code() as f64);
        }
    }
    by_filename
        .into_iter()
        .filter_map(|(filename, mut codes)| {
            median(&mut codes).map(|m| (filename.to_string(), m))
        })
        .collect()
}
