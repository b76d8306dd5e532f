use anyhow::Result;
use std::time::Instant;
use tracing::{info, warn};

use crate::ctx::Ctx;

pub mod stage0_scaffold;
pub mod stage1_input;
pub mod stage2_identity;
pub mod stage3_decode;
pub mod stage4_filter;
pub mod stage5_consensus;
pub mod stage6_merge;
pub mod stage7_ledger;
pub mod stage8_output;

pub trait Stage {
    fn name(&self) -> &'static str;
    fn run(&self, ctx: &mut Ctx) -> Result<()>;
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Every stage of a full `run`, in order.
    pub fn full() -> Self {
        Self::new(vec![
            Box::new(stage0_scaffold::Stage0Scaffold::new()),
            Box::new(stage1_input::Stage1Input::new()),
            Box::new(stage2_identity::Stage2Identity::new()),
            Box::new(stage3_decode::Stage3Decode::new()),
            Box::new(stage4_filter::Stage4Filter::new()),
            Box::new(stage5_consensus::Stage5Consensus::new()),
            Box::new(stage6_merge::Stage6Merge::new()),
            Box::new(stage7_ledger::Stage7Ledger::new()),
            Box::new(stage8_output::Stage8Output::new()),
        ])
    }

    pub fn run(&self, ctx: &mut Ctx) -> Result<()> {
        info!(
            input = %ctx.input.display(),
            group_by = ctx.group_by.as_str(),
            "pipeline started"
        );
        for stage in &self.stages {
            let start = Instant::now();
            info!(stage = stage.name(), "stage started");
            if let Err(err) = stage.run(ctx) {
                let elapsed_ms = start.elapsed().as_millis();
                warn!(
                    stage = stage.name(),
                    elapsed_ms = elapsed_ms as u64,
                    "stage failed"
                );
                return Err(err);
            }
            let elapsed_ms = start.elapsed().as_millis();
            info!(
                stage = stage.name(),
                elapsed_ms = elapsed_ms as u64,
                "stage finished"
            );
        }
        Ok(())
    }
}
