//! On-disk persistence of the selection overlays

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::state::{AllowOverrides, ExpandState, SelectionState};
use crate::error::{ResultExt, Result};

/// Everything that survives between sessions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSelection {
    #[serde(default)]
    pub checked: SelectionState,
    #[serde(default)]
    pub expanded: ExpandState,
    #[serde(default)]
    pub allow: AllowOverrides,
    /// Children loaded beyond the first page, per directory
    #[serde(default)]
    pub loaded: BTreeMap<PathBuf, usize>,
}

/// JSON file holding one root's [`PersistedSelection`]
#[derive(Debug, Clone)]
pub struct SelectionStore {
    path: PathBuf,
}

impl SelectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored selection; a missing or unreadable store is empty
    pub fn load(&self) -> PersistedSelection {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Could not read {}: {}", self.path.display(), e);
                }
                return PersistedSelection::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(persisted) => persisted,
            Err(e) => {
                log::warn!(
                    "Ignoring corrupt selection store {}: {}",
                    self.path.display(),
                    e
                );
                PersistedSelection::default()
            }
        }
    }

    pub fn save(&self, persisted: &PersistedSelection) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(persisted)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        log::debug!("Saved selection to {}", self.path.display());
        Ok(())
    }
}
