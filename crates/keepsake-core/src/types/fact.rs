//! Fact record types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Importance assigned when a fact is stored without one.
pub const DEFAULT_IMPORTANCE: u8 = 5;

/// Upper bound of the importance scale.
pub const MAX_IMPORTANCE: u8 = 10;

/// One stored unit of background knowledge.
///
/// Records are append-only: once created they are never mutated or removed
/// during normal operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactRecord {
    /// Unique, monotonically assigned identifier.
    pub id: u64,
    /// Open-vocabulary category tag (e.g. "identity", "first_contact").
    pub category: String,
    /// The fact payload.
    pub content: String,
    /// Creation date, `YYYY-MM-DD`.
    pub date: String,
    /// Importance on a 0-10 scale.
    #[serde(default = "default_importance")]
    pub importance: u8,
}

fn default_importance() -> u8 {
    DEFAULT_IMPORTANCE
}

impl FactRecord {
    /// Create a new fact with default importance.
    pub fn new(
        id: u64,
        category: impl Into<String>,
        content: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id,
            category: category.into(),
            content: content.into(),
            date: date.into(),
            importance: DEFAULT_IMPORTANCE,
        }
    }

    /// Set the importance, clamped to the 0-10 scale.
    pub fn with_importance(mut self, importance: u8) -> Self {
        self.importance = importance.min(MAX_IMPORTANCE);
        self
    }

    /// Lowercased content used by the lexical matchers.
    pub fn content_lower(&self) -> String {
        self.content.to_lowercase()
    }
}

/// Summary statistics over a fact store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactStats {
    /// Number of stored facts.
    pub count: usize,
    /// Fact count per category, sorted by category name.
    pub per_category_counts: BTreeMap<String, usize>,
    /// Earliest `date` value, `None` for an empty store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_date: Option<String>,
    /// Latest `date` value, `None` for an empty store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_date: Option<String>,
}
