use anyhow::Result;

use crate::ctx::Ctx;

pub fn format_summary(ctx: &Ctx) -> Result<String> {
    let version = env!("CARGO_PKG_VERSION");
    let meta = &ctx.input_meta;

    let mut out = String::new();
    out.push_str(&format!("kira-bashthebug v{}\n", version));
    out.push_str(&format!(
        "Input: {} rows read, {} live, {} in window, {} decoded, {} skipped, {} filtered\n",
        meta.rows_read,
        meta.rows_live,
        meta.rows_in_window,
        meta.rows_decoded,
        meta.rows_skipped,
        meta.rows_filtered
    ));
    if meta.identity_failures > 0 {
        out.push_str(&format!(
            "Unparsed plate identities: {}\n",
            meta.identity_failures
        ));
    }

    if let Some(table) = &ctx.measurements {
        let (computed, unreadable, insufficient) = table.count_by_status();
        out.push_str(&format!(
            "Measurements ({}): {} groups, {} computed, {} unreadable, {} insufficient\n",
            table.group_by.as_str(),
            table.rows.len(),
            computed,
            unreadable,
            insufficient
        ));
    }

    for (column, report) in &ctx.merge_reports {
        out.push_str(&format!(
            "Merged {}: {} rows, {} groups matched, {} keys unmatched\n",
            column, report.rows, report.matched_groups, report.unmatched_keys
        ));
    }

    if let Some(ledger) = &ctx.ledger {
        out.push_str(&format!(
            "Total classifications: {}\n",
            ledger.total_classifications
        ));
        out.push_str(&format!(
            "Total users: {} ({} anonymous)\n",
            ledger.total_users(),
            ledger.anonymous_users()
        ));
        match ledger.concentration {
            Some(g) => out.push_str(&format!("Gini coefficient: {:.2}\n", g)),
            None => out.push_str("Gini coefficient: n/a\n"),
        }
        for n in [10usize, 100, 1000] {
            if let Some(share) = ledger.top_share(n) {
                out.push_str(&format!(
                    "Top {:>4} users have done: {:.2} %\n",
                    n,
                    share * 100.0
                ));
            }
        }
    }

    Ok(out)
}
