//! Conversation routing.
//!
//! Each message passes through
//! `start -> mood_detected -> {direct|memory|suggestion}_reply -> safety_reviewed -> done`.
//! A memory or suggestion reply that comes up empty also visits
//! `direct_reply` before review.

mod config;
mod engine;

pub use config::{
    RouterConfig, DEFAULT_DRAFT_FALLBACK, DEFAULT_MEMORY_MARKERS, DEFAULT_RETRIEVAL_K,
    DEFAULT_SAFE_FALLBACK, MAX_RETRIEVAL_K,
};
pub use engine::{ConversationRouter, ConversationRouterBuilder};
