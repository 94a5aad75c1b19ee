//! In-memory fact store with write-through persistence.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::Local;
use tracing::{debug, info, warn};

use crate::error::{ErrorCode, KeepsakeError, KeepsakeResult};
use crate::traits::FactPersistence;
use crate::types::{FactRecord, FactStats, DEFAULT_IMPORTANCE, MAX_IMPORTANCE};

use super::json_file::NullPersistence;

/// Read access to a snapshot of facts.
///
/// The router reads facts through this seam so that retrieval failures can
/// be injected and handled without aborting a turn.
#[cfg_attr(test, mockall::automock)]
pub trait FactSource: Send + Sync {
    /// All facts in insertion order.
    fn snapshot(&self) -> KeepsakeResult<Vec<FactRecord>>;
}

#[derive(Debug)]
struct Inner {
    facts: Vec<FactRecord>,
    next_id: u64,
}

/// Append-only store of [`FactRecord`]s.
///
/// Reads always work on the in-memory sequence. Appends update memory first
/// and then write the full set through the configured [`FactPersistence`].
pub struct FactStore {
    inner: RwLock<Inner>,
    /// Serializes durable writes so the last write always holds every fact.
    save_lock: Mutex<()>,
    persistence: Arc<dyn FactPersistence>,
}

impl FactStore {
    /// Create an empty store that never touches durable storage.
    pub fn in_memory() -> Self {
        Self::with_facts(Vec::new(), Arc::new(NullPersistence))
    }

    /// Create a store from facts that are already loaded.
    ///
    /// The id counter continues after the largest existing id.
    pub fn with_facts(facts: Vec<FactRecord>, persistence: Arc<dyn FactPersistence>) -> Self {
        let next_id = facts.iter().map(|f| f.id).max().map_or(1, |max| max + 1);
        Self {
            inner: RwLock::new(Inner { facts, next_id }),
            save_lock: Mutex::new(()),
            persistence,
        }
    }

    /// Load the full collection from `persistence`.
    ///
    /// Fails when the stored collection repeats an id or holds an
    /// importance outside 0-10.
    pub fn load(persistence: Arc<dyn FactPersistence>) -> KeepsakeResult<Self> {
        let facts = persistence.load()?;

        let mut seen = HashSet::with_capacity(facts.len());
        for fact in &facts {
            if !seen.insert(fact.id) {
                return Err(KeepsakeError::Configuration(format!(
                    "Duplicate fact id {} in stored collection",
                    fact.id
                )));
            }
            if fact.importance > MAX_IMPORTANCE {
                return Err(KeepsakeError::out_of_range(
                    format!(
                        "Stored fact {} has importance {} outside 0-{}",
                        fact.id, fact.importance, MAX_IMPORTANCE
                    ),
                    "Fix the importance in the facts file",
                ));
            }
        }

        info!(count = facts.len(), "Loaded facts");
        Ok(Self::with_facts(facts, persistence))
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        // Records are never mutated in place, so a poisoned lock still
        // guards a consistent sequence.
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// All facts in insertion order.
    pub fn all(&self) -> Vec<FactRecord> {
        self.read().facts.clone()
    }

    /// Number of stored facts.
    pub fn len(&self) -> usize {
        self.read().facts.len()
    }

    /// Whether the store holds no facts.
    pub fn is_empty(&self) -> bool {
        self.read().facts.is_empty()
    }

    /// Facts whose category equals `category` exactly.
    pub fn by_category(&self, category: &str) -> Vec<FactRecord> {
        self.read()
            .facts
            .iter()
            .filter(|f| f.category == category)
            .cloned()
            .collect()
    }

    /// The `n` most recent facts by `date`, newest first.
    ///
    /// Facts sharing a date keep their insertion order.
    pub fn most_recent(&self, n: usize) -> Vec<FactRecord> {
        let mut facts = self.all();
        facts.sort_by(|a, b| b.date.cmp(&a.date));
        facts.truncate(n);
        facts
    }

    /// Facts with importance at or above `threshold`.
    pub fn important(&self, threshold: u8) -> Vec<FactRecord> {
        self.read()
            .facts
            .iter()
            .filter(|f| f.importance >= threshold)
            .cloned()
            .collect()
    }

    /// Append a new fact and persist the full collection.
    ///
    /// `importance` defaults to 5 and must not exceed 10.
    ///
    /// # Durability
    ///
    /// The record is added to memory before the durable write. If that write
    /// fails this returns [`KeepsakeError::Persistence`] carrying the new
    /// record's id, and the record **stays visible** for the rest of the
    /// process lifetime. Callers that need durability must treat the error
    /// as "stored for this session only".
    pub fn append(
        &self,
        content: impl Into<String>,
        category: impl Into<String>,
        importance: Option<u8>,
    ) -> KeepsakeResult<FactRecord> {
        let content = content.into();
        let category = category.into();
        let importance = importance.unwrap_or(DEFAULT_IMPORTANCE);

        if content.trim().is_empty() {
            return Err(KeepsakeError::validation("Fact content must not be empty"));
        }
        if category.trim().is_empty() {
            return Err(KeepsakeError::validation("Fact category must not be empty"));
        }
        if importance > MAX_IMPORTANCE {
            return Err(KeepsakeError::out_of_range(
                format!("Importance {} is outside 0-{}", importance, MAX_IMPORTANCE),
                "Use an importance between 0 and 10",
            ));
        }

        let record = {
            let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            let record = FactRecord {
                id: inner.next_id,
                category,
                content,
                date: Local::now().format("%Y-%m-%d").to_string(),
                importance,
            };
            inner.next_id += 1;
            inner.facts.push(record.clone());
            record
        };

        debug!(id = record.id, category = %record.category, "Appended fact");
        self.persist(record.id)?;
        Ok(record)
    }

    fn persist(&self, fact_id: u64) -> KeepsakeResult<()> {
        let _guard = self.save_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = self.all();

        self.persistence.save(&snapshot).map_err(|e| {
            warn!(fact_id, error = %e, "Durable write failed; fact kept in memory only");
            match e {
                err @ KeepsakeError::Persistence { .. } => err.with_fact_id(fact_id),
                other => KeepsakeError::Persistence {
                    message: other.to_string(),
                    code: ErrorCode::PerWriteFailed,
                    fact_id: Some(fact_id),
                    source: Some(Box::new(other)),
                },
            }
        })
    }

    /// Count, per-category counts, and the date range of stored facts.
    pub fn stats(&self) -> FactStats {
        let inner = self.read();
        let mut per_category_counts = BTreeMap::new();
        for fact in &inner.facts {
            *per_category_counts.entry(fact.category.clone()).or_insert(0) += 1;
        }

        FactStats {
            count: inner.facts.len(),
            per_category_counts,
            oldest_date: inner.facts.iter().map(|f| f.date.clone()).min(),
            newest_date: inner.facts.iter().map(|f| f.date.clone()).max(),
        }
    }
}

impl FactSource for FactStore {
    fn snapshot(&self) -> KeepsakeResult<Vec<FactRecord>> {
        Ok(self.all())
    }
}

impl std::fmt::Debug for FactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactStore")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockFactPersistence;

    fn fact(id: u64, category: &str, content: &str, date: &str, importance: u8) -> FactRecord {
        FactRecord::new(id, category, content, date).with_importance(importance)
    }

    fn sample_store() -> FactStore {
        FactStore::with_facts(
            vec![
                fact(1, "identity", "Her name is Maya", "2023-05-01", 10),
                fact(2, "favorites", "Purple is the favorite color", "2023-06-10", 6),
                fact(3, "promises", "Promised a trip to the lake", "2023-06-10", 8),
                fact(4, "favorites", "Loves mango ice cream", "2023-01-20", 4),
            ],
            Arc::new(NullPersistence),
        )
    }

    #[test]
    fn test_all_keeps_insertion_order() {
        let ids: Vec<u64> = sample_store().all().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_by_category_exact_match() {
        let store = sample_store();
        assert_eq!(store.by_category("favorites").len(), 2);
        assert!(store.by_category("Favorites").is_empty());
    }

    #[test]
    fn test_most_recent_is_stable_for_equal_dates() {
        let ids: Vec<u64> = sample_store().most_recent(3).iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_important_threshold() {
        let ids: Vec<u64> = sample_store().important(8).iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_append_assigns_next_id_and_today() {
        let store = sample_store();
        let record = tokio_test::assert_ok!(store.append("Met at the library", "meeting", None));
        assert_eq!(record.id, 5);
        assert_eq!(record.importance, DEFAULT_IMPORTANCE);
        assert_eq!(record.date, Local::now().format("%Y-%m-%d").to_string());
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_append_rejects_out_of_range_importance() {
        let store = FactStore::in_memory();
        let err = store.append("x", "misc", Some(11)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValOutOfRange);
        assert!(store.is_empty());
    }

    #[test]
    fn test_failed_write_keeps_record_in_memory() {
        let mut persistence = MockFactPersistence::new();
        persistence
            .expect_save()
            .times(1)
            .returning(|_| Err(KeepsakeError::Io(std::io::Error::other("disk full"))));

        let store = FactStore::with_facts(Vec::new(), Arc::new(persistence));
        let err = store.append("Likes rain", "favorites", Some(3)).unwrap_err();

        match err {
            KeepsakeError::Persistence { fact_id, .. } => assert_eq!(fact_id, Some(1)),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.by_category("favorites").len(), 1);
    }

    #[test]
    fn test_ids_are_never_reused_after_failed_write() {
        let mut persistence = MockFactPersistence::new();
        let mut calls = 0;
        persistence.expect_save().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(KeepsakeError::persistence("first write fails"))
            } else {
                Ok(())
            }
        });

        let store = FactStore::with_facts(Vec::new(), Arc::new(persistence));
        assert!(store.append("a", "misc", None).is_err());
        let second = store.append("b", "misc", None).unwrap();
        assert_eq!(second.id, 2);
    }

    #[test]
    fn test_save_receives_full_collection() {
        let mut persistence = MockFactPersistence::new();
        persistence
            .expect_save()
            .withf(|facts| facts.len() == 5 && facts[4].content == "new")
            .times(1)
            .returning(|_| Ok(()));

        let existing = sample_store().all();
        let store = FactStore::with_facts(existing, Arc::new(persistence));
        store.append("new", "misc", None).unwrap();
    }

    #[test]
    fn test_load_rejects_duplicate_ids() {
        let mut persistence = MockFactPersistence::new();
        persistence.expect_load().returning(|| {
            Ok(vec![
                FactRecord::new(1, "a", "x", "2024-01-01"),
                FactRecord::new(1, "b", "y", "2024-01-02"),
            ])
        });
        assert!(matches!(
            FactStore::load(Arc::new(persistence)),
            Err(KeepsakeError::Configuration(_))
        ));
    }

    #[test]
    fn test_load_rejects_importance_above_scale() {
        let mut persistence = MockFactPersistence::new();
        persistence.expect_load().returning(|| {
            let mut loud = FactRecord::new(1, "misc", "x", "2024-01-01");
            loud.importance = 250;
            Ok(vec![loud, FactRecord::new(2, "misc", "We cooked dinner", "2024-01-02")])
        });
        let err = FactStore::load(Arc::new(persistence)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValOutOfRange);
    }

    #[test]
    fn test_stats() {
        let stats = sample_store().stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.per_category_counts.get("favorites"), Some(&2));
        assert_eq!(stats.oldest_date.as_deref(), Some("2023-01-20"));
        assert_eq!(stats.newest_date.as_deref(), Some("2023-06-10"));
    }

    #[test]
    fn test_stats_empty_store() {
        let stats = FactStore::in_memory().stats();
        assert_eq!(stats.count, 0);
        assert!(stats.oldest_date.is_none());
        assert!(stats.newest_date.is_none());
    }
}
