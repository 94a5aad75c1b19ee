//! Durable storage contract for the fact collection.

use crate::error::KeepsakeResult;
use crate::types::FactRecord;

/// Loads and durably stores the full fact collection.
///
/// The store always hands over the complete set; implementations replace
/// whatever they held before.
#[cfg_attr(test, mockall::automock)]
pub trait FactPersistence: Send + Sync {
    /// Load every stored fact.
    fn load(&self) -> KeepsakeResult<Vec<FactRecord>>;

    /// Durably store `facts`, replacing the previous contents.
    fn save(&self, facts: &[FactRecord]) -> KeepsakeResult<()>;
}
