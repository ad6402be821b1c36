//! Persisted credentials and export history.
//!
//! The state bundle is small and rewritten whole on every update. Two writers
//! racing on the same file is last-writer-wins.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Mutex;

/// Key + token pair sent as query authentication on every API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_token: String,
}

impl ApiCredentials {
    pub fn is_complete(&self) -> bool {
        !self.api_key.is_empty() && !self.api_token.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(rename = "trelloApiKey", default)]
    pub api_key: String,
    #[serde(rename = "trelloToken", default)]
    pub api_token: String,
    #[serde(rename = "boardId", default)]
    pub board_id: String,
    #[serde(rename = "todoListId", default)]
    pub list_id: String,
}

impl ExportConfig {
    /// All four values must be present; a partial bundle is never usable.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
            && !self.api_token.is_empty()
            && !self.board_id.is_empty()
            && !self.list_id.is_empty()
    }

    pub fn credentials(&self) -> ApiCredentials {
        ApiCredentials {
            api_key: self.api_key.clone(),
            api_token: self.api_token.clone(),
        }
    }
}

/// Everything persisted between sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredState {
    #[serde(flatten)]
    pub config: ExportConfig,
    #[serde(rename = "exportedTweets", default)]
    pub exported: BTreeSet<String>,
}

pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<StoredState, StoreError>;
    fn save(&self, state: &StoredState) -> Result<(), StoreError>;

    fn config(&self) -> Result<ExportConfig, StoreError> {
        Ok(self.load()?.config)
    }

    fn save_config(&self, config: ExportConfig) -> Result<(), StoreError> {
        let mut state = self.load()?;
        state.config = config;
        self.save(&state)
    }

    fn history(&self) -> Result<BTreeSet<String>, StoreError> {
        Ok(self.load()?.exported)
    }

    /// Append one exported URL. Returns false if it was already recorded.
    fn record_exported(&self, url: &str) -> Result<bool, StoreError> {
        let mut state = self.load()?;
        let inserted = state.exported.insert(url.to_string());
        if inserted {
            self.save(&state)?;
        }
        Ok(inserted)
    }
}

/// State kept in a single JSON file. A missing file reads as empty state.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<StoredState, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoredState::default())
            }
            Err(e) => return Err(self.io_err(e)),
        };
        // Strip BOM if present
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        if content.trim().is_empty() {
            return Ok(StoredState::default());
        }
        serde_json::from_str(content).map_err(|source| StoreError::Json {
            path: self.path.display().to_string(),
            source,
        })
    }

    fn save(&self, state: &StoredState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
            }
        }
        let json = serde_json::to_string_pretty(state).map_err(|source| StoreError::Json {
            path: self.path.display().to_string(),
            source,
        })?;
        // Write to a sibling then rename so a crash never leaves half a file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.io_err(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;
        tracing::debug!(path = %self.path.display(), exported = state.exported.len(), "state saved");
        Ok(())
    }
}

/// In-process store for tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoredState>,
}

impl MemoryStore {
    pub fn new(state: StoredState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<StoredState, StoreError> {
        self.state
            .lock()
            .map(|s| s.clone())
            .map_err(|_| StoreError::Poisoned)
    }

    fn save(&self, state: &StoredState) -> Result<(), StoreError> {
        let mut guard = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        *guard = state.clone();
        Ok(())
    }
}
