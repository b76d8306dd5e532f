use anyhow::Result;
use tracing::{debug, info};

use crate::ctx::Ctx;
use crate::identity::parse_subject;
use crate::pipeline::Stage;

pub struct Stage2Identity;

impl Stage2Identity {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage2Identity {
    fn name(&self) -> &'static str {
        "stage2_identity"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let mut identities = Vec::with_capacity(ctx.raw.len());
        let mut failures = 0usize;
        for raw in &ctx.raw {
            let (filename, identity) = parse_subject(&raw.subject_data, &raw.subject_id);
            if identity.is_none() {
                failures += 1;
                debug!(
                    classification_id = %raw.classification_id,
                    filename = filename.as_deref().unwrap_or("<none>"),
                    "identity_unparsed"
                );
            }
            identities.push((filename, identity));
        }

        if failures > 0 {
            ctx.warnings.push(format!(
                "{} classifications have no parseable plate image filename",
                failures
            ));
        }
        ctx.input_meta.identity_failures = failures;
        ctx.identities = identities;

        info!(
            rows = ctx.raw.len(),
            identity_failures = failures,
            "identities_parsed"
        );
        Ok(())
    }
}
