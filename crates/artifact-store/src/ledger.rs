//! Metadata ledger implementation
//!
//! The ledger is the single persisted record of lifecycle state, read at
//! startup and written after every state-changing operation. Writes go to a
//! temporary file in the same directory and are renamed into place, so a
//! crash mid-write never leaves a truncated record.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use common::error::Result;

/// Persisted lifecycle state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Name of the active model, if one is serving
    pub active_model: Option<String>,
    /// Names of all registered models
    #[serde(default)]
    pub known_models: BTreeSet<String>,
    /// When a model was last activated
    pub last_activated: Option<DateTime<Utc>>,
    /// When the record was last written; stamped on every save
    pub last_updated: Option<DateTime<Utc>>,
}

/// Reader/writer for the persisted ledger record
#[derive(Debug, Clone)]
pub struct MetadataLedger {
    /// Ledger file location
    path: PathBuf,
}

impl MetadataLedger {
    /// Creates a ledger backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the ledger file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted record
    ///
    /// A missing or unreadable file yields the default empty record; a
    /// corrupt record is logged as a warning and replaced by the default,
    /// never treated as fatal.
    pub fn load(&self) -> LedgerRecord {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no ledger file yet, starting empty");
                return LedgerRecord::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read ledger, starting empty");
                return LedgerRecord::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt ledger, resetting to empty record");
                LedgerRecord::default()
            }
        }
    }

    /// Saves the record, stamping a fresh `last_updated` timestamp
    pub fn save(&self, record: &mut LedgerRecord) -> Result<()> {
        record.last_updated = Some(Utc::now());

        let json = serde_json::to_string_pretty(record)?;

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        // Write-then-rename keeps the previous record intact until the new
        // one is fully on disk.
        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        std::fs::write(tmp.path(), json)?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = %self.path.display(), "ledger saved");
        Ok(())
    }
}
