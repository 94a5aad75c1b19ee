//! Scoring weights for lexical relevance.

use serde::{Deserialize, Serialize};

use crate::error::{KeepsakeError, KeepsakeResult};
use crate::lexicon::LexiconCatalog;

/// Increment per query term found in a fact's content.
pub const DIRECT_TERM_WEIGHT: f64 = 1.0;

/// Increment per lexicon content substring found in a fact's content.
pub const CONTENT_MATCH_WEIGHT: f64 = 5.0;

/// Multiplier applied to a fact's importance.
pub const IMPORTANCE_WEIGHT: f64 = 0.01;

/// Query tokens must be longer than this to count as direct terms.
pub const MIN_TERM_CHARS: usize = 2;

/// Weights used by [`RelevanceScorer`](super::RelevanceScorer).
///
/// Relative magnitudes are part of the contract: a topical group match must
/// beat any number of content hints from a single group, a content hint must
/// beat a coincidental word overlap, and importance only breaks near-ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Weight per matching query term (W1).
    pub direct_term: f64,
    /// Weight per matching content substring (W2).
    pub content_match: f64,
    /// Weight per importance point (W3).
    pub importance: f64,
    /// Maximum content-substring hits counted per group; `None` counts all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_match_cap: Option<usize>,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            direct_term: DIRECT_TERM_WEIGHT,
            content_match: CONTENT_MATCH_WEIGHT,
            importance: IMPORTANCE_WEIGHT,
            content_match_cap: None,
        }
    }
}

impl ScoringWeights {
    /// Cap content-substring hits per activated group.
    pub fn with_content_match_cap(mut self, cap: usize) -> Self {
        self.content_match_cap = Some(cap);
        self
    }

    /// Check the ordering `content_match > direct_term > 10 * importance`.
    pub fn validate(&self) -> KeepsakeResult<()> {
        let finite = [self.direct_term, self.content_match, self.importance]
            .iter()
            .all(|w| w.is_finite());
        if !finite {
            return Err(KeepsakeError::validation("Scoring weights must be finite"));
        }
        if self.importance < 0.0 {
            return Err(KeepsakeError::out_of_range(
                "importance weight must be non-negative",
                "Use a small fraction such as 0.01",
            ));
        }
        if self.direct_term <= self.importance * 10.0 {
            return Err(KeepsakeError::out_of_range(
                format!(
                    "direct_term ({}) must exceed ten times the importance weight ({})",
                    self.direct_term, self.importance
                ),
                "A single word overlap has to outweigh the whole importance scale",
            ));
        }
        if self.content_match <= self.direct_term {
            return Err(KeepsakeError::out_of_range(
                format!(
                    "content_match ({}) must exceed direct_term ({})",
                    self.content_match, self.direct_term
                ),
                "Raise content_match or lower direct_term",
            ));
        }
        if self.content_match_cap == Some(0) {
            return Err(KeepsakeError::out_of_range(
                "content_match_cap must be at least 1",
                "Leave the cap unset to count every hit",
            ));
        }
        Ok(())
    }

    /// [`validate`](Self::validate), plus every group boost above `content_match`.
    pub fn validate_against(&self, catalog: &LexiconCatalog) -> KeepsakeResult<()> {
        self.validate()?;
        if let Some(group) = catalog
            .groups()
            .iter()
            .find(|g| f64::from(g.boost) <= self.content_match)
        {
            return Err(KeepsakeError::out_of_range(
                format!(
                    "Lexicon group '{}' boost ({}) must exceed content_match ({})",
                    group.name, group.boost, self.content_match
                ),
                "Raise the group boost in the lexicon",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_valid() {
        let weights = ScoringWeights::default();
        assert!(weights.validate().is_ok());
        assert!(weights
            .validate_against(&LexiconCatalog::builtin().unwrap())
            .is_ok());
    }

    #[test]
    fn test_magnitude_violations() {
        let flat = ScoringWeights {
            content_match: 1.0,
            ..Default::default()
        };
        assert!(flat.validate().is_err());

        let heavy_importance = ScoringWeights {
            importance: 0.5,
            ..Default::default()
        };
        assert!(heavy_importance.validate().is_err());

        let nan = ScoringWeights {
            direct_term: f64::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_group_boost_must_dominate() {
        let weights = ScoringWeights {
            content_match: 50.0,
            ..Default::default()
        };
        assert!(weights.validate().is_ok());
        assert!(weights
            .validate_against(&LexiconCatalog::builtin().unwrap())
            .is_err());
    }

    #[test]
    fn test_zero_cap_rejected() {
        let weights = ScoringWeights::default().with_content_match_cap(0);
        assert!(weights.validate().is_err());
    }
}
