use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::consensus::{ConsensusStats, MeasurementTable, UNREADABLE_SENTINEL};
use crate::ctx::Ctx;
use crate::ledger::ContributorLedger;

const IO_BUF_CAPACITY: usize = 1 << 20; // 1 MiB

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::with_capacity(IO_BUF_CAPACITY, file))
}

fn opt<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

fn opt_f64(v: Option<f64>) -> String {
    v.map(|x| format!("{:.6}", x)).unwrap_or_default()
}

// Tabs and newlines would break the row layout.
fn clean(s: &str) -> String {
    s.replace(['\t', '\n', '\r'], " ")
}

pub fn write_classifications(path: &Path, ctx: &Ctx) -> Result<()> {
    let mut w = create(path)?;
    writeln!(
        w,
        "classification_id\tuser_name\tuser_id\tcreated_at\tworkflow_name\tworkflow_version\tsubject_id\tfilename\tplate_image\tplate_design\tdrug\tplate\tstudy_id\treading_day\tsite\tdilution_code\treading\ttask_duration_secs\tuser_language\tviewport_width\tviewport_height\tconsensus_median\tmedian_delta"
    )?;
    for row in &ctx.decoded {
        let raw = &row.raw;
        let id = row.identity.as_ref();
        let code = row.dilution_code();
        let consensus = row
            .filename
            .as_ref()
            .and_then(|f| ctx.filename_medians.get(f))
            .copied();
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            clean(&raw.classification_id),
            clean(&raw.user_name),
            clean(raw.user_id.as_deref().unwrap_or_default()),
            raw.created_at.to_rfc3339(),
            clean(raw.workflow_name.as_deref().unwrap_or_default()),
            clean(raw.workflow_version.as_deref().unwrap_or_default()),
            clean(&raw.subject_id),
            clean(row.filename.as_deref().unwrap_or_default()),
            opt(id.map(|i| clean(&i.plate_image))),
            opt(id.map(|i| clean(&i.plate_design))),
            opt(id.map(|i| clean(&i.drug))),
            opt(id.map(|i| clean(&i.plate))),
            row.study().as_str(),
            opt(id.map(|i| i.reading_day)),
            opt(id.map(|i| clean(&i.site))),
            code,
            row.reading.label(),
            opt_f64(row.session.task_duration_secs),
            clean(row.session.user_language.as_deref().unwrap_or_default()),
            opt(row.session.viewport_width),
            opt(row.session.viewport_height),
            opt_f64(consensus),
            opt_f64(consensus.map(|m| code as f64 - m)),
        )?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_measurements(path: &Path, table: &MeasurementTable) -> Result<()> {
    let mut w = create(path)?;
    writeln!(w, "{}", table.columns().join("\t"))?;
    for m in &table.rows {
        let mut fields: Vec<String> = m.key.values().iter().map(|v| clean(v)).collect();
        match &m.stats {
            ConsensusStats::Insufficient => {
                fields.extend(std::iter::repeat_n(String::new(), 5));
            }
            ConsensusStats::Unreadable => {
                let sentinel = UNREADABLE_SENTINEL.to_string();
                fields.extend(std::iter::repeat_n(sentinel, 5));
            }
            ConsensusStats::Computed(v) => {
                fields.push(v.median.to_string());
                fields.push(format!("{:.6}", v.mean));
                fields.push(opt_f64(v.std));
                fields.push(v.min.to_string());
                fields.push(v.max.to_string());
            }
        }
        fields.push(m.counts.total.to_string());
        fields.push(m.counts.n_failed.to_string());
        fields.push(m.counts.n_cannot_read.to_string());
        fields.push(m.counts.n_valid.to_string());
        for name in &table.merged_columns {
            let merged = m.merged.get(name);
            fields.push(opt_f64(merged.and_then(|v| v.median)));
            fields.push(merged.map(|v| v.count).unwrap_or(0).to_string());
        }
        writeln!(w, "{}", fields.join("\t"))?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_users(path: &Path, ledger: &ContributorLedger) -> Result<()> {
    let mut w = create(path)?;
    writeln!(
        w,
        "user_name\tclassifications\tanonymous\trank\tcumulative_classifications\tproportion_total_classifications\tproportion_user_base"
    )?;
    for r in &ledger.records {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{:.6}\t{:.6}",
            clean(&r.user_name),
            r.classifications,
            r.anonymous,
            r.rank,
            r.cumulative_classifications,
            r.proportion_total,
            r.proportion_user_base
        )?;
    }
    w.flush()?;
    Ok(())
}
