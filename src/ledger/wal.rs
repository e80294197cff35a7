use std::fs::{self, create_dir_all, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared switch that makes every append fail while tripped.
#[derive(Debug, Clone, Default)]
pub struct AppendFault(Arc<AtomicBool>);

impl AppendFault {
    pub fn trip(&self, on: bool) {
        self.0.store(on, Ordering::SeqCst);
    }

    pub fn is_tripped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Append-only purchase log: one user name per line.
#[derive(Debug)]
pub struct Wal {
    file: File,
    path: PathBuf,
    fault: AppendFault,
}

impl Wal {
    /// Open the log for appending, creating it (and its directory) if missing.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            fault: AppendFault::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fault(&self) -> AppendFault {
        self.fault.clone()
    }

    /// Append one entry and wait until it reaches the disk.
    pub fn append(&mut self, entry: &str) -> std::io::Result<()> {
        if self.fault.is_tripped() {
            return Err(io::Error::new(io::ErrorKind::Other, "append fault injected"));
        }
        let mut line = String::with_capacity(entry.len() + 1);
        line.push_str(entry);
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        self.file.sync_data()
    }

    /// Read every entry, trailing line breaks stripped.
    ///
    /// Bytes that are not UTF-8 are replaced, so a corrupted line comes back
    /// as an entry that matches no name instead of failing the whole read.
    pub fn replay(path: &Path) -> std::io::Result<Vec<String>> {
        if !path.exists() {
            return Ok(vec![]);
        }
        let raw = fs::read(path)?;
        let mut lines: Vec<&[u8]> = raw.split(|&b| b == b'\n').collect();
        if lines.last().map_or(false, |l| l.is_empty()) {
            lines.pop();
        }
        Ok(lines
            .into_iter()
            .map(|line| {
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                String::from_utf8_lossy(line).into_owned()
            })
            .collect())
    }

    /// Drop every entry. Only valid once the entries are folded into a snapshot.
    pub fn truncate(&self) -> std::io::Result<()> {
        let file = OpenOptions::new().write(true).truncate(true).open(&self.path)?;
        file.sync_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_wal_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("coffee.log");

        {
            let mut wal = Wal::open(&path).unwrap();
            wal.append("anna").unwrap();
            wal.append("bob").unwrap();
        }

        assert_eq!(Wal::replay(&path).unwrap(), vec!["anna", "bob"]);
    }

    #[test]
    fn test_missing_log_replays_empty() {
        let dir = TempDir::new().unwrap();
        assert!(Wal::replay(&dir.path().join("absent.log")).unwrap().is_empty());
    }

    #[test]
    fn test_appends_after_truncate_start_fresh() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("coffee.log");

        let mut wal = Wal::open(&path).unwrap();
        wal.append("anna").unwrap();
        wal.truncate().unwrap();
        assert!(Wal::replay(&path).unwrap().is_empty());

        wal.append("bob").unwrap();
        assert_eq!(Wal::replay(&path).unwrap(), vec!["bob"]);
    }

    #[test]
    fn test_crlf_entries_are_normalized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("coffee.log");
        std::fs::write(&path, "anna\r\nbob\n").unwrap();
        assert_eq!(Wal::replay(&path).unwrap(), vec!["anna", "bob"]);
    }

    #[test]
    fn test_corrupted_bytes_do_not_fail_replay() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("coffee.log");
        std::fs::write(&path, b"anna\n\xff\xfe\n\nbob").unwrap();
        let entries = Wal::replay(&path).unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0], "anna");
        assert_ne!(entries[1], "anna");
        assert_eq!(entries[2], "");
        assert_eq!(entries[3], "bob");
    }

    #[test]
    fn test_tripped_fault_fails_append_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("coffee.log");
        let mut wal = Wal::open(&path).unwrap();
        let fault = wal.fault();

        fault.trip(true);
        assert!(wal.append("anna").is_err());
        fault.trip(false);
        wal.append("bob").unwrap();
        assert_eq!(Wal::replay(&path).unwrap(), vec!["bob"]);
    }
}
