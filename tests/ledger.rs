//! Startup reconciliation and purchase durability against real files.

use coffee_terminal::ledger::snapshot::Snapshot;
use coffee_terminal::ledger::wal::Wal;
use coffee_terminal::ledger::BalanceLedger;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Files {
    _dir: TempDir,
    snapshot: PathBuf,
    log: PathBuf,
}

fn setup(snapshot_json: &str, log_lines: &[&str]) -> Files {
    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("config.json");
    let log = dir.path().join("coffee.log");
    fs::write(&snapshot, snapshot_json).unwrap();
    let mut body = String::new();
    for line in log_lines {
        body.push_str(line);
        body.push('\n');
    }
    fs::write(&log, body).unwrap();
    Files {
        _dir: dir,
        snapshot,
        log,
    }
}

fn log_lines(path: &Path) -> Vec<String> {
    Wal::replay(path).unwrap()
}

#[test]
fn replay_folds_log_into_snapshot_and_empties_it() {
    let files = setup(
        r#"{"selected_index":0,"names":["a","b"],"balances":{"a":0,"b":0}}"#,
        &["a", "a", "b"],
    );

    let (ledger, report) = BalanceLedger::open(&files.snapshot, &files.log).unwrap();
    assert_eq!(report.replayed, 3);
    assert_eq!(ledger.balance("a"), Some(2));
    assert_eq!(ledger.balance("b"), Some(1));
    assert!(log_lines(&files.log).is_empty());

    let stored = Snapshot::load(&files.snapshot).unwrap();
    assert_eq!(stored.balances.get("a"), Some(&2));
    assert_eq!(stored.balances.get("b"), Some(&1));
    drop(ledger);

    // Second startup with an empty log changes nothing.
    let (again, report) = BalanceLedger::open(&files.snapshot, &files.log).unwrap();
    assert_eq!(report.replayed, 0);
    assert_eq!(again.balance("a"), Some(2));
    assert_eq!(again.balance("b"), Some(1));
    assert_eq!(Snapshot::load(&files.snapshot).unwrap(), stored);
}

#[test]
fn unknown_log_entries_are_skipped_not_fatal() {
    let files = setup(
        r#"{"selected_index":0,"names":["a","b"],"balances":{"a":0,"b":7}}"#,
        &["a", "ghost", "a"],
    );

    let (ledger, report) = BalanceLedger::open(&files.snapshot, &files.log).unwrap();
    assert_eq!(report.skipped, vec!["ghost"]);
    assert_eq!(ledger.balance("a"), Some(2));
    assert_eq!(ledger.balance("b"), Some(7));
    assert_eq!(ledger.balance("ghost"), None);
    assert!(log_lines(&files.log).is_empty());
}

#[test]
fn roster_names_without_balance_start_at_zero() {
    let files = setup(
        r#"{"selected_index":1,"names":["a","new","a"],"coffee_on_last_restart":{"a":4}}"#,
        &[],
    );

    let (ledger, _) = BalanceLedger::open(&files.snapshot, &files.log).unwrap();
    assert_eq!(ledger.roster(), ["a".to_string(), "new".to_string()]);
    assert_eq!(ledger.balance("new"), Some(0));
    assert_eq!(ledger.selected_index(), 1);

    let stored = Snapshot::load(&files.snapshot).unwrap();
    assert_eq!(stored.names, vec!["a", "new"]);
    assert_eq!(stored.balances.get("new"), Some(&0));
}

#[test]
fn purchase_is_logged_before_it_is_visible() {
    let files = setup(
        r#"{"selected_index":0,"names":["a","b"],"balances":{"a":5}}"#,
        &[],
    );
    let (mut ledger, _) = BalanceLedger::open(&files.snapshot, &files.log).unwrap();

    let balance = ledger.record_purchase("a").unwrap();
    assert_eq!(balance, 6);
    assert_eq!(ledger.balance("a"), Some(6));
    assert_eq!(log_lines(&files.log), vec!["a"]);

    // Snapshot is untouched at runtime; the log carries the difference.
    let stored = Snapshot::load(&files.snapshot).unwrap();
    assert_eq!(stored.balances.get("a"), Some(&5));
}

#[test]
fn purchases_survive_a_crash_until_next_startup() {
    let files = setup(r#"{"selected_index":0,"names":["a","b"],"balances":{}}"#, &[]);
    {
        let (mut ledger, _) = BalanceLedger::open(&files.snapshot, &files.log).unwrap();
        ledger.record_purchase("b").unwrap();
        ledger.record_purchase("b").unwrap();
        ledger.record_purchase("a").unwrap();
        // dropped without any shutdown step
    }

    let (ledger, report) = BalanceLedger::open(&files.snapshot, &files.log).unwrap();
    assert_eq!(report.replayed, 3);
    assert_eq!(ledger.balance("a"), Some(1));
    assert_eq!(ledger.balance("b"), Some(2));
}

#[test]
fn unknown_user_purchase_is_rejected_without_side_effects() {
    let files = setup(r#"{"selected_index":0,"names":["a"],"balances":{"a":1}}"#, &[]);
    let (mut ledger, _) = BalanceLedger::open(&files.snapshot, &files.log).unwrap();

    assert!(ledger.record_purchase("mallory").is_err());
    assert_eq!(ledger.balance("a"), Some(1));
    assert!(log_lines(&files.log).is_empty());
}

#[test]
fn missing_or_broken_snapshot_aborts_startup() {
    let files = setup("{ not json", &["a"]);
    assert!(BalanceLedger::open(&files.snapshot, &files.log).is_err());
    // The log is left for a later, successful startup.
    assert_eq!(log_lines(&files.log), vec!["a"]);

    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("config.json");
    assert!(BalanceLedger::open(&missing, &dir.path().join("coffee.log")).is_err());
}

#[test]
fn missing_log_is_created() {
    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("config.json");
    fs::write(&snapshot, r#"{"selected_index":0,"names":["a"]}"#).unwrap();
    let log = dir.path().join("coffee.log");

    let (ledger, _) = BalanceLedger::open(&snapshot, &log).unwrap();
    assert!(log.exists());
    assert_eq!(ledger.log_path(), log);
    assert_eq!(ledger.balance("a"), Some(0));
}

#[test]
fn padded_roster_name_keeps_its_purchases_across_restarts() {
    let files = setup(
        r#"{"selected_index":0,"names":["anna ","bob"],"balances":{"anna ":2}}"#,
        &[],
    );
    {
        let (mut ledger, _) = BalanceLedger::open(&files.snapshot, &files.log).unwrap();
        assert_eq!(ledger.roster(), ["anna".to_string(), "bob".to_string()]);
        assert_eq!(ledger.record_purchase("anna").unwrap(), 3);
    }

    let (ledger, report) = BalanceLedger::open(&files.snapshot, &files.log).unwrap();
    assert_eq!(report.replayed, 1);
    assert!(report.skipped.is_empty());
    assert_eq!(ledger.balance("anna"), Some(3));
}

#[test]
fn multi_line_roster_name_is_not_served() {
    let files = setup(r#"{"selected_index":0,"names":["a","b\nc"]}"#, &[]);
    let (mut ledger, _) = BalanceLedger::open(&files.snapshot, &files.log).unwrap();
    assert_eq!(ledger.roster(), ["a".to_string()]);
    assert!(ledger.record_purchase("b\nc").is_err());
    assert!(log_lines(&files.log).is_empty());
}

#[test]
fn corrupted_log_line_is_skipped_and_startup_completes() {
    let files = setup(r#"{"selected_index":0,"names":["a","b"],"balances":{}}"#, &[]);
    fs::write(&files.log, b"a\n\xff\xfe\na\n").unwrap();

    let (ledger, report) = BalanceLedger::open(&files.snapshot, &files.log).unwrap();
    assert_eq!(report.replayed, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(ledger.balance("a"), Some(2));
    assert_eq!(ledger.balance("b"), Some(0));
    assert!(log_lines(&files.log).is_empty());
}
