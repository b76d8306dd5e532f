mod loader;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;

pub use loader::{load_builtin_v1, load_well_index_tsv, merge_entries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlateDesign {
    Ukmyc5,
    Ukmyc6,
}

impl PlateDesign {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "UKMYC5" => Some(Self::Ukmyc5),
            "UKMYC6" => Some(Self::Ukmyc6),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ukmyc5 => "UKMYC5",
            Self::Ukmyc6 => "UKMYC6",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WellIndexEntry {
    pub design: PlateDesign,
    pub drug: String,
    pub max_index: u32,
}

/// Highest dilution well per drug, one table per plate design.
///
/// Immutable once built; the decoder borrows it for the whole batch.
#[derive(Debug, Clone)]
pub struct WellIndexTables {
    pub version: String,
    ukmyc5: BTreeMap<String, u32>,
    ukmyc6: BTreeMap<String, u32>,
}

impl WellIndexTables {
    pub fn from_entries(version: &str, entries: Vec<WellIndexEntry>) -> Self {
        let mut ukmyc5 = BTreeMap::new();
        let mut ukmyc6 = BTreeMap::new();
        for entry in entries {
            let table = match entry.design {
                PlateDesign::Ukmyc5 => &mut ukmyc5,
                PlateDesign::Ukmyc6 => &mut ukmyc6,
            };
            table.insert(entry.drug, entry.max_index);
        }
        Self {
            version: version.to_string(),
            ukmyc5,
            ukmyc6,
        }
    }

    pub fn table(&self, design: PlateDesign) -> &BTreeMap<String, u32> {
        match design {
            PlateDesign::Ukmyc5 => &self.ukmyc5,
            PlateDesign::Ukmyc6 => &self.ukmyc6,
        }
    }

    pub fn max_index(&self, design: PlateDesign, drug: &str) -> Option<u32> {
        self.table(design).get(drug).copied()
    }

    pub fn entries(&self) -> Vec<WellIndexEntry> {
        let mut out = Vec::with_capacity(self.ukmyc5.len() + self.ukmyc6.len());
        for design in [PlateDesign::Ukmyc5, PlateDesign::Ukmyc6] {
            for (drug, &max_index) in self.table(design) {
                out.push(WellIndexEntry {
                    design,
                    drug: drug.clone(),
                    max_index,
                });
            }
        }
        out
    }
}

pub fn load_builtin() -> Result<WellIndexTables> {
    let entries = load_builtin_v1()?;
    Ok(WellIndexTables::from_entries("v1", entries))
}

pub fn load_user(path: &Path) -> Result<Vec<WellIndexEntry>> {
    load_well_index_tsv(path)
}

/// Built-in tables with an optional user overlay applied on top.
pub fn load_tables(overlay: Option<&Path>) -> Result<WellIndexTables> {
    let builtin = load_builtin()?;
    match overlay {
        None => Ok(builtin),
        Some(path) => {
            let user = load_user(path)?;
            let merged = merge_entries(builtin.entries(), user);
            Ok(WellIndexTables::from_entries("v1+user", merged))
        }
    }
}
