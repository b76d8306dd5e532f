use anyhow::{Context, Result};
use tracing::info;

use crate::ctx::Ctx;
use crate::io::secondary::read_secondary;
use crate::merge::merge_into;
use crate::pipeline::Stage;

pub struct Stage6Merge;

impl Stage6Merge {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage6Merge {
    fn name(&self) -> &'static str {
        "stage6_merge"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if ctx.merges.is_empty() {
            return Ok(());
        }
        let table = ctx
            .measurements
            .as_mut()
            .context("measurements must be built before merging")?;

        for spec in &ctx.merges {
            let dataset = read_secondary(&spec.path, &spec.column)
                .with_context(|| format!("failed to load {}", spec.path.display()))?;
            let report = merge_into(table, &dataset).with_context(|| {
                format!(
                    "failed to merge column '{}' from {}",
                    spec.column,
                    spec.path.display()
                )
            })?;
            if report.unparsed_filenames > 0 {
                ctx.warnings.push(format!(
                    "{}: {} filenames could not be parsed into a plate identity",
                    spec.path.display(),
                    report.unparsed_filenames
                ));
            }
            info!(
                column = %spec.column,
                rows = report.rows,
                matched_groups = report.matched_groups,
                unmatched_keys = report.unmatched_keys,
                "dataset_merged"
            );
            ctx.merge_reports.push((spec.column.clone(), report));
        }
        Ok(())
    }
}
