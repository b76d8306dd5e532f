use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::annotation::{DecodeError, DilutionReading, StructuralFailure, decode_batch};
use crate::ctx::{Ctx, DecodePolicy};
use crate::decoded::DecodedClassification;
use crate::pipeline::Stage;
use crate::plates::{WellIndexTables, load_tables};
use crate::session::session_meta;

pub struct Stage3Decode;

impl Stage3Decode {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage3Decode {
    fn name(&self) -> &'static str {
        "stage3_decode"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let tables = load_tables(ctx.plates_path.as_deref())?;
        info!(version = %tables.version, "well_index_loaded");

        let results = run_decode(ctx, &tables)?;

        let raw = std::mem::take(&mut ctx.raw);
        let identities = std::mem::take(&mut ctx.identities);
        let mut decoded = Vec::with_capacity(raw.len());
        let mut skipped = 0usize;

        for ((raw, (filename, identity)), result) in
            raw.into_iter().zip(identities).zip(results)
        {
            let reading = match result {
                Ok(reading) => reading,
                Err(err) => match ctx.policy {
                    DecodePolicy::Abort => {
                        bail!("classification {}: {}", raw.classification_id, err);
                    }
                    DecodePolicy::Skip => {
                        skipped += 1;
                        ctx.warnings.push(skip_message(&raw.classification_id, &err));
                        continue;
                    }
                    DecodePolicy::Encode => {
                        let encoded = DilutionReading::Structural(StructuralFailure::Undecodable);
                        warn!(
                            classification_id = %raw.classification_id,
                            error = %err,
                            "decode_failed_encoded"
                        );
                        ctx.warnings.push(format!(
                            "classification {}: {} (encoded as {})",
                            raw.classification_id,
                            err,
                            encoded.code()
                        ));
                        encoded
                    }
                },
            };
            let session = session_meta(&raw.metadata);
            decoded.push(DecodedClassification {
                raw,
                filename,
                identity,
                reading,
                session,
            });
        }

        ctx.input_meta.rows_decoded = decoded.len();
        ctx.input_meta.rows_skipped = skipped;
        ctx.decoded = decoded;
        ctx.tables = Some(tables);

        info!(
            rows_decoded = ctx.input_meta.rows_decoded,
            rows_skipped = skipped,
            "classifications_decoded"
        );
        Ok(())
    }
}

fn skip_message(classification_id: &str, err: &DecodeError) -> String {
    format!("classification {} skipped: {}", classification_id, err)
}

fn run_decode(
    ctx: &Ctx,
    tables: &WellIndexTables,
) -> Result<Vec<Result<DilutionReading, DecodeError>>> {
    let pairs: Vec<_> = ctx
        .raw
        .iter()
        .zip(ctx.identities.iter())
        .map(|(raw, (_, identity))| (raw, identity.as_ref()))
        .collect();

    #[cfg(feature = "mt")]
    {
        if ctx.threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(ctx.threads.max(1))
                .build()
                .map_err(|e| anyhow::anyhow!("failed to build thread pool: {}", e))?;
            return Ok(pool.install(|| decode_batch(&pairs, tables)));
        }
    }

    Ok(decode_batch(&pairs, tables))
}
