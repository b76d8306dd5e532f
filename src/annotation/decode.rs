//! Annotation decoding: one classification to one dilution reading.
//!
//! The answer text is matched against an ordered rule list; the first rule
//! whose phrase is contained in the text decides the outcome. Readings map
//! onto a closed integer code space at the output boundary only.

use thiserror::Error;

#[cfg(feature = "mt")]
use rayon::prelude::*;

use crate::annotation::RawClassification;
use crate::annotation::schema::{TaskSchema, detect_schema};
use crate::identity::PlateIdentity;
use crate::plates::{PlateDesign, WellIndexTables};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CannotClassifyReason {
    SkipWells,
    TrailingPattern,
    ContaminationOrEmptyWells,
    Artefacts,
    InsufficientGrowth,
    Other,
    Unspecified,
}

const REASON_PHRASES: &[(&str, CannotClassifyReason)] = &[
    ("Skip wells", CannotClassifyReason::SkipWells),
    ("Trailing pattern", CannotClassifyReason::TrailingPattern),
    ("Contamination", CannotClassifyReason::ContaminationOrEmptyWells),
    ("empty wells", CannotClassifyReason::ContaminationOrEmptyWells),
    ("Artefacts", CannotClassifyReason::Artefacts),
    ("Insufficient growth", CannotClassifyReason::InsufficientGrowth),
    ("Other", CannotClassifyReason::Other),
];

impl CannotClassifyReason {
    pub fn from_answer(text: &str) -> Option<Self> {
        REASON_PHRASES
            .iter()
            .find(|(phrase, _)| text.contains(phrase))
            .map(|(_, reason)| *reason)
    }
}

/// Rows that never produced a reading, tagged by cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructuralFailure {
    MissingTaskLabel,
    NullAnswer,
    TestingTask,
    Undecodable,
    RegularV1WellUnparsed,
    RegularV2WellUnparsed,
    ProV1WellUnparsed,
}

impl StructuralFailure {
    fn well_unparsed(schema: TaskSchema) -> Self {
        match schema {
            TaskSchema::RegularV1 => Self::RegularV1WellUnparsed,
            TaskSchema::RegularV2 => Self::RegularV2WellUnparsed,
            // testing rows are settled before any well parsing
            TaskSchema::ProV1 | TaskSchema::Testing => Self::ProV1WellUnparsed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DilutionReading {
    /// First well showing growth inhibition, 2..=max_index+1.
    ValidReading(u32),
    NoGrowth,
    PartialNoGrowth,
    Unreadable,
    CannotClassify(CannotClassifyReason),
    Structural(StructuralFailure),
}

impl DilutionReading {
    /// Reading for a well number; well 1 is the no-growth baseline.
    pub fn well(n: u32) -> Self {
        if n <= 1 {
            Self::NoGrowth
        } else {
            Self::ValidReading(n)
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::ValidReading(n) => *n as i32,
            Self::NoGrowth => 1,
            Self::PartialNoGrowth => -2,
            Self::Unreadable => -1,
            Self::CannotClassify(reason) => match reason {
                CannotClassifyReason::SkipWells => -10,
                CannotClassifyReason::TrailingPattern => -11,
                CannotClassifyReason::ContaminationOrEmptyWells => -12,
                CannotClassifyReason::Artefacts => -13,
                CannotClassifyReason::InsufficientGrowth => -14,
                CannotClassifyReason::Other => -15,
                CannotClassifyReason::Unspecified => -16,
            },
            Self::Structural(failure) => match failure {
                StructuralFailure::MissingTaskLabel => -100,
                StructuralFailure::NullAnswer => -101,
                StructuralFailure::TestingTask => -102,
                StructuralFailure::Undecodable => -103,
                StructuralFailure::RegularV1WellUnparsed => -104,
                StructuralFailure::RegularV2WellUnparsed => -105,
                StructuralFailure::ProV1WellUnparsed => -106,
            },
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        let reading = match code {
            1 => Self::NoGrowth,
            n if n >= 2 => Self::ValidReading(n as u32),
            -1 => Self::Unreadable,
            -2 => Self::PartialNoGrowth,
            -10 => Self::CannotClassify(CannotClassifyReason::SkipWells),
            -11 => Self::CannotClassify(CannotClassifyReason::TrailingPattern),
            -12 => Self::CannotClassify(CannotClassifyReason::ContaminationOrEmptyWells),
            -13 => Self::CannotClassify(CannotClassifyReason::Artefacts),
            -14 => Self::CannotClassify(CannotClassifyReason::InsufficientGrowth),
            -15 => Self::CannotClassify(CannotClassifyReason::Other),
            -16 => Self::CannotClassify(CannotClassifyReason::Unspecified),
            -100 => Self::Structural(StructuralFailure::MissingTaskLabel),
            -101 => Self::Structural(StructuralFailure::NullAnswer),
            -102 => Self::Structural(StructuralFailure::TestingTask),
            -103 => Self::Structural(StructuralFailure::Undecodable),
            -104 => Self::Structural(StructuralFailure::RegularV1WellUnparsed),
            -105 => Self::Structural(StructuralFailure::RegularV2WellUnparsed),
            -106 => Self::Structural(StructuralFailure::ProV1WellUnparsed),
            _ => return None,
        };
        Some(reading)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ValidReading(_) => "valid_reading",
            Self::NoGrowth => "no_growth",
            Self::PartialNoGrowth => "partial_no_growth",
            Self::Unreadable => "unreadable",
            Self::CannotClassify(_) => "cannot_classify",
            Self::Structural(_) => "structural_failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unrecognised task schema for label '{label}'")]
    UnrecognisedSchema { label: String },

    #[error("unrecognised cannot-classify reason '{reason}'")]
    UnknownCannotClassifyReason { reason: String },

    #[error("unknown plate design '{design}'")]
    UnknownPlateDesign { design: String },

    #[error("no well index for drug '{drug}' on plate design {design}")]
    UnknownDrug { design: &'static str, drug: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleOutcome {
    PartialNoGrowth,
    NoGrowth,
    GrowthInAll,
    CannotClassify,
}

struct AnswerRule {
    phrases: &'static [&'static str],
    outcome: RuleOutcome,
}

// Evaluated top to bottom, first match wins. Text matching none of these
// falls through to well-number parsing.
const ANSWER_RULES: &[AnswerRule] = &[
    AnswerRule {
        phrases: &["No Growth in either", "No Growth in one"],
        outcome: RuleOutcome::PartialNoGrowth,
    },
    AnswerRule {
        phrases: &["No Growth in wells", "No Growth in all"],
        outcome: RuleOutcome::NoGrowth,
    },
    AnswerRule {
        phrases: &["Growth in all"],
        outcome: RuleOutcome::GrowthInAll,
    },
    AnswerRule {
        phrases: &["Cannot classify"],
        outcome: RuleOutcome::CannotClassify,
    },
];

fn match_rule(text: &str) -> Option<RuleOutcome> {
    ANSWER_RULES
        .iter()
        .find(|rule| rule.phrases.iter().any(|p| text.contains(p)))
        .map(|rule| rule.outcome)
}

pub fn decode(
    record: &RawClassification,
    identity: Option<&PlateIdentity>,
    tables: &WellIndexTables,
) -> Result<DilutionReading, DecodeError> {
    let Some(first) = record.first_answer() else {
        return Ok(DilutionReading::Structural(
            StructuralFailure::MissingTaskLabel,
        ));
    };
    let Some(label) = first.task_label.as_deref() else {
        return Ok(DilutionReading::Structural(
            StructuralFailure::MissingTaskLabel,
        ));
    };

    let schema = detect_schema(label).ok_or_else(|| DecodeError::UnrecognisedSchema {
        label: label.to_string(),
    })?;
    if schema == TaskSchema::Testing {
        return Ok(DilutionReading::Structural(StructuralFailure::TestingTask));
    }

    let Some(text) = first.text() else {
        return Ok(DilutionReading::Structural(StructuralFailure::NullAnswer));
    };

    match match_rule(&text) {
        Some(RuleOutcome::PartialNoGrowth) => Ok(DilutionReading::PartialNoGrowth),
        Some(RuleOutcome::NoGrowth) => Ok(DilutionReading::NoGrowth),
        Some(RuleOutcome::GrowthInAll) => {
            let max_index = resolve_max_index(identity, tables)?;
            Ok(DilutionReading::ValidReading(max_index + 1))
        }
        Some(RuleOutcome::CannotClassify) => cannot_classify(schema, record),
        None => well_reading(schema, record, identity, tables),
    }
}

fn resolve_max_index(
    identity: Option<&PlateIdentity>,
    tables: &WellIndexTables,
) -> Result<u32, DecodeError> {
    let Some(identity) = identity else {
        return Err(DecodeError::UnknownPlateDesign {
            design: "<unparsed filename>".to_string(),
        });
    };
    let design = PlateDesign::parse(&identity.plate_design).ok_or_else(|| {
        DecodeError::UnknownPlateDesign {
            design: identity.plate_design.clone(),
        }
    })?;
    tables
        .max_index(design, &identity.drug)
        .ok_or_else(|| DecodeError::UnknownDrug {
            design: design.as_str(),
            drug: identity.drug.clone(),
        })
}

fn cannot_classify(
    schema: TaskSchema,
    record: &RawClassification,
) -> Result<DilutionReading, DecodeError> {
    if schema != TaskSchema::ProV1 {
        return Ok(DilutionReading::Unreadable);
    }
    let Some(reason_text) = record.second_answer().and_then(|a| a.text()) else {
        return Ok(DilutionReading::CannotClassify(
            CannotClassifyReason::Unspecified,
        ));
    };
    CannotClassifyReason::from_answer(&reason_text)
        .map(DilutionReading::CannotClassify)
        .ok_or_else(|| DecodeError::UnknownCannotClassifyReason {
            reason: reason_text.into_owned(),
        })
}

// The well table is only consulted once a well number has been parsed.
fn well_reading(
    schema: TaskSchema,
    record: &RawClassification,
    identity: Option<&PlateIdentity>,
    tables: &WellIndexTables,
) -> Result<DilutionReading, DecodeError> {
    let slot = match schema {
        TaskSchema::RegularV2 => record.first_answer(),
        _ => record.second_answer(),
    };
    let unparsed = DilutionReading::Structural(StructuralFailure::well_unparsed(schema));
    let Some(n) = slot.and_then(|a| a.well_index()) else {
        return Ok(unparsed);
    };
    if n < 1 {
        return Ok(unparsed);
    }
    let max_index = resolve_max_index(identity, tables)?;
    if n > (max_index as i64) + 1 {
        return Ok(unparsed);
    }
    Ok(DilutionReading::well(n as u32))
}

/// Decodes every row; output order always matches input order.
pub fn decode_batch(
    rows: &[(&RawClassification, Option<&PlateIdentity>)],
    tables: &WellIndexTables,
) -> Vec<Result<DilutionReading, DecodeError>> {
    #[cfg(feature = "mt")]
    {
        rows.par_iter()
            .map(|(record, identity)| decode(record, *identity, tables))
            .collect()
    }

    #[cfg(not(feature = "mt"))]
    {
        rows.iter()
            .map(|(record, identity)| decode(record, *identity, tables))
            .collect()
    }
}
