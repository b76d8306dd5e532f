use std::path::Path;

use anyhow::{Context, Result};

use crate::ctx::Ctx;
use crate::schema::v1::{
    BashTheBugV1, ContributorSummary, InputSummary, MeasurementSummary, MergedColumnSummary,
};

pub fn build_report(ctx: &Ctx) -> Result<BashTheBugV1> {
    let input = InputSummary {
        rows_read: ctx.input_meta.rows_read,
        rows_live: ctx.input_meta.rows_live,
        rows_in_window: ctx.input_meta.rows_in_window,
        rows_decoded: ctx.input_meta.rows_decoded,
        rows_skipped: ctx.input_meta.rows_skipped,
        rows_filtered: ctx.input_meta.rows_filtered,
        identity_failures: ctx.input_meta.identity_failures,
        group_by: ctx.group_by.as_str().to_string(),
        well_index_version: ctx.tables.as_ref().map(|t| t.version.clone()),
    };

    let measurements = ctx.measurements.as_ref().map(|table| {
        let (computed, unreadable, insufficient) = table.count_by_status();
        MeasurementSummary {
            groups: table.rows.len(),
            computed,
            unreadable,
            insufficient,
        }
    });

    let contributors = ctx.ledger.as_ref().map(|ledger| ContributorSummary {
        total_classifications: ledger.total_classifications,
        total_users: ledger.total_users(),
        anonymous_users: ledger.anonymous_users(),
        concentration: ledger.concentration,
        top_10_share: ledger.top_share(10),
        top_100_share: ledger.top_share(100),
        top_1000_share: ledger.top_share(1000),
    });

    let mut merged_columns = Vec::with_capacity(ctx.merge_reports.len());
    for (column, report) in &ctx.merge_reports {
        let spec = ctx
            .merges
            .iter()
            .find(|m| &m.column == column)
            .with_context(|| format!("merge report for unknown column '{}'", column))?;
        merged_columns.push(MergedColumnSummary {
            column: column.clone(),
            source: spec.path.display().to_string(),
            rows: report.rows,
            matched_groups: report.matched_groups,
            unmatched_keys: report.unmatched_keys,
            unparsed_filenames: report.unparsed_filenames,
        });
    }

    Ok(BashTheBugV1 {
        tool: "kira-bashthebug".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: "v1".to_string(),
        input,
        codes: ctx.code_counts(),
        measurements,
        contributors,
        merged_columns,
    })
}

pub fn write_json(path: &Path, report: &BashTheBugV1) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}
