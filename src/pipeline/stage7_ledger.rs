use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::ledger::build_ledger;
use crate::pipeline::Stage;

pub struct Stage7Ledger;

impl Stage7Ledger {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage7Ledger {
    fn name(&self) -> &'static str {
        "stage7_ledger"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let ledger = build_ledger(ctx.decoded.iter().map(|r| r.raw.user_name.as_str()));
        info!(
            users = ledger.total_users(),
            anonymous = ledger.anonymous_users(),
            classifications = ledger.total_classifications,
            "ledger_built"
        );
        ctx.ledger = Some(ledger);
        Ok(())
    }
}
