use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::logging::{log, obj, v_str, Domain, Level};

/// Persisted terminal record: roster, menu position and compacted balances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub selected_index: i64,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default, alias = "coffee_on_last_restart")]
    pub balances: BTreeMap<String, u64>,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing snapshot {}", path.display()))
    }

    /// Replace the snapshot on disk atomically (write aside, then rename).
    pub fn store(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_string_pretty(self).context("encoding snapshot")?;
        {
            let mut file = File::create(&tmp)
                .with_context(|| format!("creating {}", tmp.display()))?;
            file.write_all(body.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)
            .with_context(|| format!("replacing snapshot {}", path.display()))?;
        Ok(())
    }

    /// Names as they are written to the purchase log: trimmed, free of
    /// control characters, unique, in first-seen order. Never empty.
    pub fn roster(&self) -> Vec<String> {
        let mut roster: Vec<String> = Vec::with_capacity(self.names.len());
        for raw in &self.names {
            let name = raw.trim();
            if name.is_empty() || name.chars().any(char::is_control) {
                log(
                    Level::Warn,
                    Domain::Ledger,
                    "roster_name_rejected",
                    obj(&[("name", v_str(raw))]),
                );
                continue;
            }
            if !roster.iter().any(|r| r == name) {
                roster.push(name.to_string());
            }
        }
        if roster.is_empty() {
            roster.push("default".to_string());
        }
        roster
    }

    /// Stored balances with any count kept under an untrimmed roster
    /// spelling moved to the trimmed name.
    pub fn roster_balances(&self) -> BTreeMap<String, u64> {
        let mut balances = self.balances.clone();
        for raw in &self.names {
            let name = raw.trim();
            if name == raw.as_str() {
                continue;
            }
            if let Some(count) = balances.remove(raw) {
                let slot = balances.entry(name.to_string()).or_insert(0);
                *slot = slot.saturating_add(count);
            }
        }
        balances
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_legacy_balance_key_is_accepted() {
        let snap: Snapshot = serde_json::from_str(
            r#"{"selected_index": 2, "names": ["a", "b"], "coffee_on_last_restart": {"a": 5}}"#,
        )
        .unwrap();
        assert_eq!(snap.selected_index, 2);
        assert_eq!(snap.balances.get("a"), Some(&5));
    }

    #[test]
    fn test_roster_dedups_and_defaults() {
        let snap = Snapshot {
            names: vec!["b".into(), "a".into(), "b".into()],
            ..Default::default()
        };
        assert_eq!(snap.roster(), vec!["b", "a"]);
        assert_eq!(Snapshot::default().roster(), vec!["default"]);
    }

    #[test]
    fn test_roster_names_survive_the_log() {
        let mut snap = Snapshot {
            names: vec![
                "anna ".into(),
                " bob".into(),
                "anna".into(),
                "car\nl".into(),
                "   ".into(),
            ],
            ..Default::default()
        };
        snap.balances.insert("anna ".into(), 2);
        snap.balances.insert("anna".into(), 1);
        snap.balances.insert("car\nl".into(), 9);

        assert_eq!(snap.roster(), vec!["anna", "bob"]);
        let balances = snap.roster_balances();
        assert_eq!(balances.get("anna"), Some(&3));
        assert_eq!(balances.get("anna "), None);
        // rejected names keep their stored count
        assert_eq!(balances.get("car\nl"), Some(&9));
    }

    #[test]
    fn test_store_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut snap = Snapshot {
            selected_index: 1,
            names: vec!["a".into(), "b".into()],
            ..Default::default()
        };
        snap.balances.insert("a".into(), 3);
        snap.store(&path).unwrap();

        assert_eq!(Snapshot::load(&path).unwrap(), snap);
        assert!(!dir.path().join("config.json.tmp").exists());
    }

    #[test]
    fn test_malformed_snapshot_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "").unwrap();
        assert!(Snapshot::load(&path).is_err());
        assert!(Snapshot::load(&dir.path().join("missing.json")).is_err());
    }
}
