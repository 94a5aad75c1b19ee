//! JSON file persistence for the fact collection.
//!
//! The file holds a single object, `{"facts": [...]}`. Files written by
//! earlier tooling under a `memories` key load as well.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ErrorCode, KeepsakeError, KeepsakeResult};
use crate::traits::FactPersistence;
use crate::types::FactRecord;

#[derive(Debug, Default, Serialize, Deserialize)]
struct FactFile {
    #[serde(default, alias = "memories")]
    facts: Vec<FactRecord>,
}

/// Persists facts as a pretty-printed JSON document.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    /// Persistence backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FactPersistence for JsonFilePersistence {
    fn load(&self) -> KeepsakeResult<Vec<FactRecord>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "Facts file missing; starting empty");
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let file: FactFile = serde_json::from_str(&content).map_err(|e| {
            KeepsakeError::Persistence {
                message: format!("Malformed facts file {}: {}", self.path.display(), e),
                code: ErrorCode::PerReadFailed,
                fact_id: None,
                source: Some(Box::new(e)),
            }
        })?;
        Ok(file.facts)
    }

    fn save(&self, facts: &[FactRecord]) -> KeepsakeResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let body = serde_json::to_string_pretty(&FactFile {
            facts: facts.to_vec(),
        })?;

        // Write-then-rename so a crash never leaves a truncated file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), count = facts.len(), "Saved facts");
        Ok(())
    }
}

/// Persistence that keeps nothing; every store operation stays in memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPersistence;

impl FactPersistence for NullPersistence {
    fn load(&self) -> KeepsakeResult<Vec<FactRecord>> {
        Ok(Vec::new())
    }

    fn save(&self, _facts: &[FactRecord]) -> KeepsakeResult<()> {
        Ok(())
    }
}
