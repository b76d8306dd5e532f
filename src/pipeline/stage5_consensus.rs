use anyhow::Result;
use tracing::info;

use crate::consensus::build_measurements;
use crate::ctx::Ctx;
use crate::pipeline::Stage;

pub struct Stage5Consensus;

impl Stage5Consensus {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage5Consensus {
    fn name(&self) -> &'static str {
        "stage5_consensus"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let table = build_measurements(&ctx.decoded, ctx.group_by, &ctx.consensus);
        let (computed, unreadable, insufficient) = table.count_by_status();
        if table.rows.is_empty() {
            ctx.warnings
                .push("no classification has a parseable plate identity to group on".to_string());
        }
        info!(
            group_by = ctx.group_by.as_str(),
            groups = table.rows.len(),
            computed,
            unreadable,
            insufficient,
            "consensus_built"
        );
        ctx.measurements = Some(table);
        Ok(())
    }
}
