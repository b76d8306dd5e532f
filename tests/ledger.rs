use kira_bashthebug::ledger::{build_ledger, is_anonymous};

#[test]
fn two_contributor_ledger() {
    let mut names = vec!["alice"; 90];
    names.extend(vec!["bob"; 10]);
    let ledger = build_ledger(names);

    assert_eq!(ledger.total_classifications, 100);
    assert_eq!(ledger.total_users(), 2);
    let alice = &ledger.records[0];
    assert_eq!(alice.user_name, "alice");
    assert_eq!(alice.rank, 1);
    assert!((alice.proportion_total - 0.9).abs() < 1e-12);
    assert!((alice.proportion_user_base - 0.5).abs() < 1e-12);
    let bob = &ledger.records[1];
    assert_eq!(bob.cumulative_classifications, 100);
    assert!((bob.proportion_total - 1.0).abs() < 1e-12);
    assert!((ledger.concentration.unwrap() + 0.9).abs() < 1e-12);
}

#[test]
fn ties_are_ordered_by_name() {
    let ledger = build_ledger(["zed", "amy", "zed", "amy", "kim"]);
    let order: Vec<&str> = ledger.records.iter().map(|r| r.user_name.as_str()).collect();
    assert_eq!(order, vec!["amy", "zed", "kim"]);
    assert_eq!(ledger.top_share(1), Some(0.4));
}

#[test]
fn anonymous_contributors_are_flagged() {
    assert!(is_anonymous("not-logged-in-0a1b2c"));
    assert!(!is_anonymous("alice"));
    let ledger = build_ledger(["not-logged-in-1", "alice", "not-logged-in-2"]);
    assert_eq!(ledger.anonymous_users(), 2);
}

#[test]
fn empty_ledger() {
    let ledger = build_ledger(std::iter::empty::<&str>());
    assert!(ledger.records.is_empty());
    assert_eq!(ledger.concentration, None);
    assert_eq!(ledger.top_share(10), None);
}
