//! Persistence layer.
//!
//! Each account is stored as two JSON documents in the data directory:
//! `<id>_data.json` (the ledger: bets plus balances) and
//! `<id>_config.json` (tier, size, phase, activity dates). A top-level
//! `accounts.json` maps account id → summary info.
//!
//! Writes go through a temp file followed by a rename, so a reader never
//! observes a half-written document.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::{AccountConfig, AccountsIndex, Ledger};

const INDEX_FILE: &str = "accounts.json";

/// File-backed store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    /// Open (creating if needed) the data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data dir {}", data_dir.display()))?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn data_path(&self, account_id: &str) -> PathBuf {
        self.data_dir.join(format!("{account_id}_data.json"))
    }

    fn config_path(&self, account_id: &str) -> PathBuf {
        self.data_dir.join(format!("{account_id}_config.json"))
    }

    fn index_path(&self) -> PathBuf {
        self.data_dir.join(INDEX_FILE)
    }

    /// Serialise and atomically write a value to `path`.
    fn write_atomic<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value).context("Failed to serialise document")?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to move {} into place", tmp.display()))?;
        debug!(path = %path.display(), bytes = json.len(), "Document saved");
        Ok(())
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let value = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(value))
    }

    // -- ledger ----------------------------------------------------------

    /// Load an account's ledger. Absent file → zeroed ledger; first-time
    /// initialization with the real starting size is the caller's job.
    pub fn load_ledger(&self, account_id: &str) -> Result<Ledger> {
        match self.read_json::<Ledger>(&self.data_path(account_id))? {
            Some(ledger) => Ok(ledger),
            None => {
                info!(account_id, "No ledger on disk, returning zeroed ledger");
                Ok(Ledger::zeroed())
            }
        }
    }

    pub fn save_ledger(&self, account_id: &str, ledger: &Ledger) -> Result<()> {
        self.write_atomic(&self.data_path(account_id), ledger)
    }

    // -- config ----------------------------------------------------------

    pub fn load_config(&self, account_id: &str) -> Result<Option<AccountConfig>> {
        self.read_json(&self.config_path(account_id))
    }

    pub fn save_config(&self, account_id: &str, config: &AccountConfig) -> Result<()> {
        self.write_atomic(&self.config_path(account_id), config)
    }

    // -- accounts index --------------------------------------------------

    pub fn load_index(&self) -> Result<AccountsIndex> {
        Ok(self.read_json(&self.index_path())?.unwrap_or_default())
    }

    pub fn save_index(&self, index: &AccountsIndex) -> Result<()> {
        self.write_atomic(&self.index_path(), index)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
