use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::ctx::Ctx;
use crate::io::export::read_export;
use crate::pipeline::Stage;

pub struct Stage1Input;

impl Stage1Input {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage1Input {
    fn name(&self) -> &'static str {
        "stage1_input"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if !ctx.input.exists() {
            bail!("input not found: {}", ctx.input.display());
        }
        if let (Some(from), Some(to)) = (ctx.from_date, ctx.to_date) {
            if from > to {
                bail!("--from-date {} is after --to-date {}", from, to);
            }
        }

        let export = read_export(&ctx.input)?;
        for warning in &export.warnings {
            warn!(warning = %warning, "export_row_skipped");
        }
        ctx.warnings.extend(export.warnings);
        ctx.input_meta.rows_read = export.rows_read;

        let mut rows = export.rows;
        if !ctx.include_non_live {
            rows.retain(|r| r.live_project);
        }
        ctx.input_meta.rows_live = rows.len();

        let (from, to) = (ctx.from_date, ctx.to_date);
        rows.retain(|r| {
            let day = r.created_at.date_naive();
            from.is_none_or(|f| day >= f) && to.is_none_or(|t| day <= t)
        });
        ctx.input_meta.rows_in_window = rows.len();

        if rows.is_empty() {
            ctx.warnings
                .push("no classifications left after live/date filtering".to_string());
        }

        info!(
            rows_read = ctx.input_meta.rows_read,
            rows_live = ctx.input_meta.rows_live,
            rows_in_window = ctx.input_meta.rows_in_window,
            "export_loaded"
        );
        ctx.raw = rows;
        Ok(())
    }
}
