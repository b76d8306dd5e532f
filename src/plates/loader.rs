use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::plates::{PlateDesign, WellIndexEntry};

pub fn load_builtin_v1() -> Result<Vec<WellIndexEntry>> {
    let content = include_str!("../../assets/plates/well_index_v1.tsv");
    parse_well_index_tsv(content, "built-in v1")
}

pub fn load_well_index_tsv(path: &Path) -> Result<Vec<WellIndexEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read well index TSV {}", path.display()))?;
    parse_well_index_tsv(&content, &path.display().to_string())
}

/// User entries replace built-in entries with the same (design, drug) key;
/// new keys are appended after the built-in ones.
pub fn merge_entries(
    mut builtin: Vec<WellIndexEntry>,
    user: Vec<WellIndexEntry>,
) -> Vec<WellIndexEntry> {
    if user.is_empty() {
        return builtin;
    }
    let mut order: Vec<(PlateDesign, String)> = Vec::new();
    let mut user_map: HashMap<(PlateDesign, String), WellIndexEntry> = HashMap::new();
    for entry in user {
        let key = (entry.design, entry.drug.clone());
        if !user_map.contains_key(&key) {
            order.push(key.clone());
        }
        user_map.insert(key, entry);
    }

    let mut merged = Vec::with_capacity(builtin.len() + user_map.len());
    for entry in builtin.drain(..) {
        let key = (entry.design, entry.drug.clone());
        if let Some(user_entry) = user_map.remove(&key) {
            merged.push(user_entry);
        } else {
            merged.push(entry);
        }
    }
    for key in order {
        if let Some(entry) = user_map.remove(&key) {
            merged.push(entry);
        }
    }
    merged
}

fn parse_well_index_tsv(content: &str, source: &str) -> Result<Vec<WellIndexEntry>> {
    let mut out = Vec::new();
    let mut seen: HashMap<(PlateDesign, String), usize> = HashMap::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = trimmed.split('\t').collect();
        if parts.len() != 3 {
            bail!("{}:{} malformed TSV (expected 3 columns)", source, line_no);
        }
        let design_str = parts[0].trim();
        let drug = parts[1].trim();
        let max_str = parts[2].trim();
        if design_str.is_empty() || drug.is_empty() || max_str.is_empty() {
            bail!("{}:{} empty field in TSV", source, line_no);
        }
        let design = PlateDesign::parse(design_str).ok_or_else(|| {
            anyhow::anyhow!(
                "{}:{} unknown plate design '{}' (expected UKMYC5 or UKMYC6)",
                source,
                line_no,
                design_str
            )
        })?;
        if drug.len() != 3 || !drug.chars().all(|c| c.is_ascii_uppercase()) {
            bail!("{}:{} drug code must be 3 uppercase letters", source, line_no);
        }
        let max_index: u32 = max_str
            .parse()
            .map_err(|_| anyhow::anyhow!("{}:{} max_index is not an integer", source, line_no))?;
        if max_index == 0 {
            bail!("{}:{} max_index must be positive", source, line_no);
        }

        let key = (design, drug.to_string());
        if let Some(first) = seen.get(&key) {
            bail!(
                "{}:{} duplicate entry for {} {} (first at line {})",
                source,
                line_no,
                design.as_str(),
                drug,
                first
            );
        }
        seen.insert(key, line_no);
        out.push(WellIndexEntry {
            design,
            drug: drug.to_string(),
            max_index,
        });
    }

    if out.is_empty() {
        bail!("{} contains no well index entries", source);
    }

    Ok(out)
}
