use anyhow::Result;
use tracing::info;

use crate::consensus::filename_medians;
use crate::ctx::Ctx;
use crate::pipeline::Stage;

pub struct Stage4Filter;

impl Stage4Filter {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage4Filter {
    fn name(&self) -> &'static str {
        "stage4_filter"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let before = ctx.decoded.len();
        let study = ctx.study;
        let reading_day = ctx.reading_day;

        // rows without a parsed identity cannot match a reading day
        ctx.decoded.retain(|row| {
            study.is_none_or(|s| row.study() == s)
                && reading_day.is_none_or(|d| {
                    row.identity.as_ref().is_some_and(|i| i.reading_day == d)
                })
        });
        ctx.input_meta.rows_filtered = before - ctx.decoded.len();

        ctx.filename_medians = filename_medians(&ctx.decoded);

        info!(
            rows_kept = ctx.decoded.len(),
            rows_filtered = ctx.input_meta.rows_filtered,
            filenames = ctx.filename_medians.len(),
            "classifications_filtered"
        );
        Ok(())
    }
}
