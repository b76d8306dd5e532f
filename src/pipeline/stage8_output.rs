use anyhow::{Context, Result};
use tracing::info;

use crate::ctx::Ctx;
use crate::io::{json_writer, tsv_writer};
use crate::pipeline::Stage;

pub struct Stage8Output;

impl Stage8Output {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage8Output {
    fn name(&self) -> &'static str {
        "stage8_output"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        ctx.report = json_writer::build_report(ctx)?;

        if ctx.write_tables {
            tsv_writer::write_classifications(&ctx.output.classifications_path, ctx)?;
            let table = ctx
                .measurements
                .as_ref()
                .context("measurements missing at output")?;
            tsv_writer::write_measurements(&ctx.output.measurements_path, table)?;
            let ledger = ctx.ledger.as_ref().context("ledger missing at output")?;
            tsv_writer::write_users(&ctx.output.users_path, ledger)?;
        }
        if ctx.write_json {
            json_writer::write_json(&ctx.output.json_path, &ctx.report)?;
        }

        info!(out_dir = %ctx.output.out_dir.display(), "stage8_output_ready");
        Ok(())
    }
}
