use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::StoreError;
use crate::models::normalize_address;

/// Durable set of addresses already finalized, backed by a newline-delimited
/// append-only file.
///
/// The file is re-read in full on every query, which is acceptable at the
/// expected scale of low-thousands of addresses. Membership is
/// case-insensitive; the file keeps addresses as they were given.
///
/// Writes follow a read-check-then-append sequence. The sequential scheduler
/// gives this store single-writer access by construction; parallelizing
/// wallet processing would require a mutex around `mark_processed`.
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All finalized addresses, normalized for comparison.
    ///
    /// A missing or unreadable file degrades to an empty set: "nothing
    /// processed yet" re-processes idempotently, while halting would skip
    /// work.
    pub fn processed_addresses(&self) -> HashSet<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => content
                .lines()
                .map(normalize_address)
                .filter(|line| !line.is_empty())
                .collect(),
            Err(e) => {
                if self.path.exists() {
                    warn!(
                        "Could not read progress file {}: {}; treating as empty",
                        self.path.display(),
                        e
                    );
                }
                HashSet::new()
            }
        }
    }

    pub fn contains(&self, address: &str) -> bool {
        self.processed_addresses()
            .contains(&normalize_address(address))
    }

    /// Mark an address as finalized. Idempotent: a duplicate call is a no-op
    /// and reports false.
    pub fn mark_processed(&self, address: &str) -> Result<bool, StoreError> {
        if self.contains(address) {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", address.trim())?;

        info!("Added {} to processed list", address.trim());
        Ok(true)
    }

    pub fn count(&self) -> usize {
        self.processed_addresses().len()
    }

    /// Clear all records. Operator escape hatch, not part of the normal run.
    pub fn reset(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            info!("Progress file {} cleared", self.path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, ProgressStore) {
        let dir = TempDir::new().unwrap();
        let store = ProgressStore::new(dir.path().join("processed.txt"));
        (dir, store)
    }

    const ADDR_1: &str = "0xf977814e90da44bfa03b6295a0616a897441acec";
    const ADDR_2: &str = "0x28c6c06298d514db089934071355e5743bf21d60";

    #[test]
    fn test_missing_file_is_empty_set() {
        let (_dir, store) = temp_store();
        assert!(store.processed_addresses().is_empty());
        assert_eq!(store.count(), 0);
        assert!(!store.contains(ADDR_1));
    }

    #[test]
    fn test_mark_and_contains() {
        let (_dir, store) = temp_store();

        assert!(store.mark_processed(ADDR_1).unwrap());
        assert!(store.contains(ADDR_1));
        assert!(!store.contains(ADDR_2));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_idempotent_marking() {
        let (_dir, store) = temp_store();

        assert!(store.mark_processed(ADDR_1).unwrap());
        // Second call is a no-op; the set size is unchanged
        assert!(!store.mark_processed(ADDR_1).unwrap());
        assert_eq!(store.count(), 1);
        assert!(store.contains(ADDR_1));

        // The file itself holds the address exactly once
        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content.matches(ADDR_1).count(), 1);
    }

    #[test]
    fn test_case_insensitive_membership() {
        let (_dir, store) = temp_store();

        store.mark_processed(&ADDR_1.to_uppercase().replace("0X", "0x")).unwrap();
        assert!(store.contains(ADDR_1));
        assert!(!store.mark_processed(ADDR_1).unwrap());
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_reset_clears_records() {
        let (_dir, store) = temp_store();

        store.mark_processed(ADDR_1).unwrap();
        store.mark_processed(ADDR_2).unwrap();
        assert_eq!(store.count(), 2);

        store.reset().unwrap();
        assert_eq!(store.count(), 0);
        assert!(!store.path().exists());

        // Reset on an already-missing file is fine
        store.reset().unwrap();
    }

    #[test]
    fn test_blank_lines_ignored() {
        let (_dir, store) = temp_store();

        fs::write(store.path(), format!("{}\n\n{}\n\n", ADDR_1, ADDR_2)).unwrap();
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let store = ProgressStore::new(dir.path().join("nested/dir/processed.txt"));

        assert!(store.mark_processed(ADDR_1).unwrap());
        assert!(store.contains(ADDR_1));
    }
}
