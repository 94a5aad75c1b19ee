//! Relevance retrieval over the fact store.
//!
//! Scoring is lexical and rule-driven. For each candidate fact:
//! - each query term longer than two characters found in the content adds
//!   [`ScoringWeights::direct_term`]
//! - each activated lexicon group adds its boost when the fact's category
//!   is one of the group's categories
//! - each content substring of an activated group found in the content adds
//!   [`ScoringWeights::content_match`]
//! - importance adds `importance * ScoringWeights::importance`
//!
//! Override rules in the lexicon are consulted before any of this and
//! produce a [`Retrieval::OverrideMatch`].

mod config;
mod scorer;

pub use config::{
    ScoringWeights, CONTENT_MATCH_WEIGHT, DIRECT_TERM_WEIGHT, IMPORTANCE_WEIGHT, MIN_TERM_CHARS,
};
pub use scorer::{RelevanceScorer, Retrieval, ScoredFact};
