//! Rule-based lexical relevance scoring.

use std::sync::Arc;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::KeepsakeResult;
use crate::lexicon::{LexiconCatalog, LexiconGroup};
use crate::types::FactRecord;

use super::config::{ScoringWeights, MIN_TERM_CHARS};

/// A fact paired with its computed relevance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFact {
    pub fact: FactRecord,
    pub score: f64,
}

/// How a retrieval was answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Retrieval {
    /// An override rule matched; facts come straight from its categories,
    /// ordered by importance.
    OverrideMatch { rule: String, facts: Vec<FactRecord> },
    /// The weighted scorer ranked the facts.
    ScoredMatch { facts: Vec<ScoredFact> },
}

impl Retrieval {
    /// Number of facts returned.
    pub fn len(&self) -> usize {
        match self {
            Retrieval::OverrideMatch { facts, .. } => facts.len(),
            Retrieval::ScoredMatch { facts } => facts.len(),
        }
    }

    /// Whether nothing was retrieved.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an override rule answered the query.
    pub fn is_override(&self) -> bool {
        matches!(self, Retrieval::OverrideMatch { .. })
    }

    /// The retrieved facts, best first.
    pub fn into_facts(self) -> Vec<FactRecord> {
        match self {
            Retrieval::OverrideMatch { facts, .. } => facts,
            Retrieval::ScoredMatch { facts } => facts.into_iter().map(|s| s.fact).collect(),
        }
    }
}

/// Ranks facts against a query using term overlap, lexicon groups and importance.
///
/// Scoring is deterministic: equal scores are ordered by fact id, which
/// follows store insertion order, so the input order of `facts` never
/// changes the ranking.
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    weights: ScoringWeights,
    catalog: Arc<LexiconCatalog>,
}

impl RelevanceScorer {
    /// Create a scorer, failing when the weights break the required ordering.
    pub fn new(weights: ScoringWeights, catalog: Arc<LexiconCatalog>) -> KeepsakeResult<Self> {
        weights.validate_against(&catalog)?;
        Ok(Self { weights, catalog })
    }

    /// Scorer with default weights over the built-in lexicon.
    pub fn with_builtin_lexicon() -> KeepsakeResult<Self> {
        Self::new(ScoringWeights::default(), Arc::new(LexiconCatalog::builtin()?))
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn catalog(&self) -> &LexiconCatalog {
        &self.catalog
    }

    /// Score every fact against `query`, best first.
    ///
    /// Facts with a total score of zero or less are dropped.
    pub fn score(&self, query: &str, facts: &[FactRecord]) -> Vec<ScoredFact> {
        let query_lower = query.to_lowercase();
        let terms: Vec<&str> = query_lower
            .split_whitespace()
            .filter(|t| t.chars().count() > MIN_TERM_CHARS)
            .collect();
        let groups = self.catalog.activated_groups(&query_lower);

        let mut scored: Vec<ScoredFact> = facts
            .iter()
            .filter_map(|fact| {
                let score = self.score_fact(fact, &terms, &groups);
                (score > 0.0).then(|| ScoredFact {
                    fact: fact.clone(),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            OrderedFloat(b.score)
                .cmp(&OrderedFloat(a.score))
                .then_with(|| a.fact.id.cmp(&b.fact.id))
        });

        trace!(
            candidates = facts.len(),
            kept = scored.len(),
            groups = groups.len(),
            "Scored facts"
        );
        scored
    }

    fn score_fact(&self, fact: &FactRecord, terms: &[&str], groups: &[&LexiconGroup]) -> f64 {
        let content = fact.content_lower();

        let term_hits = terms.iter().filter(|t| content.contains(**t)).count();
        let mut score = term_hits as f64 * self.weights.direct_term;

        for group in groups {
            if group.matches_category(&fact.category) {
                score += f64::from(group.boost);
            }
            let hits = group.content_hits(&content);
            let hits = self.weights.content_match_cap.map_or(hits, |cap| hits.min(cap));
            score += hits as f64 * self.weights.content_match;
        }

        score + f64::from(fact.importance) * self.weights.importance
    }

    /// Retrieve up to `k` facts for `query`.
    ///
    /// An override rule matching the query takes precedence and bypasses
    /// scoring entirely, even when its categories hold no facts.
    pub fn retrieve(&self, query: &str, facts: &[FactRecord], k: usize) -> Retrieval {
        if let Some(rule) = self.catalog.override_for(query) {
            let mut matched: Vec<FactRecord> = facts
                .iter()
                .filter(|f| rule.categories.iter().any(|c| *c == f.category))
                .cloned()
                .collect();
            matched.sort_by(|a, b| b.importance.cmp(&a.importance));
            matched.truncate(k);

            debug!(rule = %rule.name, count = matched.len(), "Override retrieval");
            return Retrieval::OverrideMatch {
                rule: rule.name.clone(),
                facts: matched,
            };
        }

        let mut scored = self.score(query, facts);
        scored.truncate(k);
        debug!(count = scored.len(), k, "Scored retrieval");
        Retrieval::ScoredMatch { facts: scored }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{OverrideRule, LEXICON_VERSION};

    fn fact(id: u64, category: &str, content: &str, importance: u8) -> FactRecord {
        FactRecord::new(id, category, content, "2024-01-01").with_importance(importance)
    }

    fn scorer() -> RelevanceScorer {
        RelevanceScorer::with_builtin_lexicon().unwrap()
    }

    fn sample_facts() -> Vec<FactRecord> {
        vec![
            fact(1, "identity", "Her name is Maya and she is my girlfriend", 10),
            fact(2, "first_contact", "We met on a Friday message", 9),
            fact(3, "favorites", "Purple is the favorite color", 6),
            fact(4, "stargazing", "We watched Orion from the rooftop", 8),
            fact(5, "identity", "She lives in Kathmandu", 7),
            fact(6, "promises", "I promised to always make her laugh", 5),
        ]
    }

    #[test]
    fn test_first_contact_beats_favorites() {
        let facts = vec![
            fact(1, "first_contact", "We met on a Friday message", 5),
            fact(2, "favorites", "Purple is the favorite color", 5),
        ];
        let scored = scorer().score("how did we first start talking", &facts);
        assert_eq!(scored[0].fact.category, "first_contact");
        assert!(scored[0].score > scored[1].score);
    }

    #[test]
    fn test_scores_non_increasing() {
        let scored = scorer().score("remember our first night under the stars?", &sample_facts());
        assert!(!scored.is_empty());
        for pair in scored.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_ranking_ignores_input_order() {
        let facts = sample_facts();
        let mut reversed = facts.clone();
        reversed.reverse();

        for query in ["favorite stars", "", "we promised to laugh", "first message"] {
            let forward: Vec<u64> = scorer().score(query, &facts).iter().map(|s| s.fact.id).collect();
            let backward: Vec<u64> =
                scorer().score(query, &reversed).iter().map(|s| s.fact.id).collect();
            assert_eq!(forward, backward, "query {:?}", query);
        }
    }

    #[test]
    fn test_non_positive_scores_excluded() {
        let facts = vec![
            fact(1, "misc", "Unrelated trivia", 0),
            fact(2, "misc", "More trivia", 3),
        ];
        let scored = scorer().score("nothing matches here", &facts);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].fact.id, 2);
        assert!(scored.iter().all(|s| s.score > 0.0));
    }

    #[test]
    fn test_empty_query_is_importance_order() {
        let ids: Vec<u64> = scorer()
            .score("", &sample_facts())
            .iter()
            .map(|s| s.fact.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 4, 5, 3, 6]);
    }

    #[test]
    fn test_equal_scores_keep_store_order() {
        let facts = vec![
            fact(7, "misc", "a", 5),
            fact(3, "misc", "b", 5),
            fact(5, "misc", "c", 5),
        ];
        let ids: Vec<u64> = scorer().score("", &facts).iter().map(|s| s.fact.id).collect();
        assert_eq!(ids, vec![3, 5, 7]);
    }

    #[test]
    fn test_short_terms_ignored() {
        let facts = vec![fact(1, "misc", "go to it", 0)];
        assert!(scorer().score("go to it", &facts).is_empty());
    }

    #[test]
    fn test_override_returns_only_identity() {
        let retrieval = scorer().retrieve("who is my girlfriend? we met on facebook", &sample_facts(), 3);
        match retrieval {
            Retrieval::OverrideMatch { rule, facts } => {
                assert_eq!(rule, "identity");
                assert_eq!(facts.iter().map(|f| f.id).collect::<Vec<_>>(), vec![1, 5]);
            }
            other => panic!("expected override, got {:?}", other),
        }
    }

    #[test]
    fn test_override_ties_keep_insertion_order() {
        let facts = vec![
            fact(9, "identity", "second inserted first", 4),
            fact(2, "identity", "inserted later", 4),
        ];
        let facts_out = scorer().retrieve("who is my partner", &facts, 5).into_facts();
        assert_eq!(facts_out.iter().map(|f| f.id).collect::<Vec<_>>(), vec![9, 2]);
    }

    #[test]
    fn test_override_without_facts_is_empty() {
        let facts = vec![fact(1, "favorites", "Purple", 9)];
        let retrieval = scorer().retrieve("who is my girlfriend", &facts, 2);
        assert!(retrieval.is_override());
        assert!(retrieval.is_empty());
    }

    #[test]
    fn test_retrieve_truncates_to_k() {
        let retrieval = scorer().retrieve("first star promise", &sample_facts(), 2);
        assert_eq!(retrieval.len(), 2);
        assert!(!retrieval.is_override());
    }

    #[test]
    fn test_empty_store_and_zero_k() {
        assert!(scorer().retrieve("first message", &[], 3).is_empty());
        assert!(scorer().retrieve("first message", &sample_facts(), 0).is_empty());
    }

    #[test]
    fn test_content_match_cap() {
        let group = LexiconGroup {
            name: "stars".to_string(),
            trigger_phrases: vec!["sky".to_string()],
            matching_categories: vec!["stargazing".to_string()],
            content_substrings: vec!["star".to_string(), "orion".to_string(), "moon".to_string()],
            boost: 20,
        };
        let catalog = Arc::new(
            LexiconCatalog::new(LEXICON_VERSION, Vec::<OverrideRule>::new(), vec![group]).unwrap(),
        );
        let facts = vec![
            fact(1, "stargazing", "a quiet evening", 0),
            fact(2, "misc", "star orion moon", 0),
        ];

        let uncapped = RelevanceScorer::new(ScoringWeights::default(), catalog.clone()).unwrap();
        let scored = uncapped.score("sky", &facts);
        assert_eq!(scored[0].fact.id, 1);
        assert!((scored[1].score - 15.0).abs() < 1e-9);

        let capped =
            RelevanceScorer::new(ScoringWeights::default().with_content_match_cap(1), catalog)
                .unwrap();
        let scored = capped.score("sky", &facts);
        assert!((scored[1].score - 5.0).abs() < 1e-9);
    }
}
