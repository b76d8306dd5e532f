use std::collections::HashMap;

const ANONYMOUS_PREFIX: &str = "not-logged-in";

#[derive(Debug, Clone, PartialEq)]
pub struct ContributorRecord {
    pub user_name: String,
    pub classifications: usize,
    pub anonymous: bool,
    pub rank: usize,
    pub cumulative_classifications: usize,
    pub proportion_total: f64,
    pub proportion_user_base: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContributorLedger {
    pub records: Vec<ContributorRecord>,
    pub total_classifications: usize,
    /// 1 - 2 * mean(proportion_total); undefined for an empty ledger.
    pub concentration: Option<f64>,
}

impl ContributorLedger {
    pub fn total_users(&self) -> usize {
        self.records.len()
    }

    pub fn anonymous_users(&self) -> usize {
        self.records.iter().filter(|r| r.anonymous).count()
    }

    /// Share of all classifications done by the `n` most active contributors.
    pub fn top_share(&self, n: usize) -> Option<f64> {
        if self.total_classifications == 0 {
            return None;
        }
        let top: usize = self.records.iter().take(n).map(|r| r.classifications).sum();
        Some(top as f64 / self.total_classifications as f64)
    }
}

pub fn is_anonymous(user_name: &str) -> bool {
    user_name.starts_with(ANONYMOUS_PREFIX)
}

pub fn build_ledger<'a, I>(user_names: I) -> ContributorLedger
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&'a str, usize> = HashMap::new();
    for name in user_names {
        *counts.entry(name).or_insert(0) += 1;
    }

    let mut sorted: Vec<(&str, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let total: usize = sorted.iter().map(|(_, c)| c).sum();
    let n_users = sorted.len();

    let mut records = Vec::with_capacity(n_users);
    let mut cumulative = 0usize;
    for (i, (name, count)) in sorted.into_iter().enumerate() {
        cumulative += count;
        let rank = i + 1;
        records.push(ContributorRecord {
            user_name: name.to_string(),
            classifications: count,
            anonymous: is_anonymous(name),
            rank,
            cumulative_classifications: cumulative,
            proportion_total: cumulative as f64 / total as f64,
            proportion_user_base: rank as f64 / n_users as f64,
        });
    }

    let concentration = if records.is_empty() {
        None
    } else {
        let area_under_curve =
            records.iter().map(|r| r.proportion_total).sum::<f64>() / n_users as f64;
        Some(1.0 - 2.0 * area_under_curve)
    };

    ContributorLedger {
        records,
        total_classifications: total,
        concentration,
    }
}
