//! Durable per-user coffee counters.
//!
//! Two files back the ledger: a JSON snapshot holding the balances as of the
//! last startup, and an append-only log holding one line per purchase since
//! then. The true balance of a user is always
//! `snapshot balance + occurrences in the log`. The snapshot is rewritten
//! only during [`BalanceLedger::open`], after the log has been folded in;
//! only then is the log emptied.

pub mod snapshot;
pub mod wal;

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::logging::{log_purchase, log_reconcile, log_unknown_entry};
use snapshot::Snapshot;
use wal::{AppendFault, Wal};

/// What the startup replay did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Log entries folded into a balance.
    pub replayed: usize,
    /// Log entries that matched no roster name.
    pub skipped: Vec<String>,
}

#[derive(Debug)]
pub struct BalanceLedger {
    roster: Vec<String>,
    accounts: BTreeMap<String, u64>,
    selected_index: i64,
    wal: Wal,
}

/// Fold `entries` into `accounts`, counting only roster names.
fn replay_entries(
    roster: &[String],
    accounts: &mut BTreeMap<String, u64>,
    entries: &[String],
) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    for (idx, entry) in entries.iter().enumerate() {
        if entry.trim().is_empty() {
            continue;
        }
        let name = entry.as_str();
        match accounts.get_mut(name) {
            Some(balance) if roster.iter().any(|r| r == name) => {
                *balance = balance.saturating_add(1);
                report.replayed += 1;
            }
            _ => {
                log_unknown_entry(idx + 1, name);
                report.skipped.push(name.to_string());
            }
        }
    }
    report
}

impl BalanceLedger {
    /// Load the snapshot, replay the log into it, compact, and start serving.
    ///
    /// A missing or malformed snapshot is fatal. A missing log is created.
    pub fn open(snapshot_path: &Path, log_path: &Path) -> Result<(Self, ReconcileReport)> {
        let snap = Snapshot::load(snapshot_path)?;
        let roster = snap.roster();

        let mut accounts = snap.roster_balances();
        for name in &roster {
            accounts.entry(name.clone()).or_insert(0);
        }

        let entries = Wal::replay(log_path)
            .with_context(|| format!("reading purchase log {}", log_path.display()))?;
        let report = replay_entries(&roster, &mut accounts, &entries);

        let compacted = Snapshot {
            selected_index: snap.selected_index,
            names: roster.clone(),
            balances: accounts.clone(),
        };
        compacted.store(snapshot_path)?;

        let wal = Wal::open(log_path)
            .with_context(|| format!("opening purchase log {}", log_path.display()))?;
        wal.truncate()
            .with_context(|| format!("truncating purchase log {}", log_path.display()))?;

        log_reconcile(report.replayed, report.skipped.len(), accounts.len());
        Ok((
            Self {
                roster,
                accounts,
                selected_index: snap.selected_index,
                wal,
            },
            report,
        ))
    }

    /// Record one purchase for `name` and return the new balance.
    ///
    /// The log line is on disk before the in-memory balance moves; if the
    /// append fails nothing changes.
    pub fn record_purchase(&mut self, name: &str) -> Result<u64> {
        if !self.roster.iter().any(|r| r == name) {
            bail!("unknown user {:?}", name);
        }
        let current = self.accounts.get(name).copied().unwrap_or(0);
        self.wal
            .append(name)
            .with_context(|| format!("appending to {}", self.wal.path().display()))?;
        let next = current.saturating_add(1);
        self.accounts.insert(name.to_string(), next);
        log_purchase(name, next);
        Ok(next)
    }

    pub fn balance(&self, name: &str) -> Option<u64> {
        self.accounts.get(name).copied()
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    /// Menu position persisted in the snapshot, unclamped.
    pub fn selected_index(&self) -> i64 {
        self.selected_index
    }

    /// Switch shared with the log for simulating a failing disk.
    pub fn append_fault(&self) -> AppendFault {
        self.wal.fault()
    }

    pub fn log_path(&self) -> PathBuf {
        self.wal.path().to_path_buf()
    }
}
