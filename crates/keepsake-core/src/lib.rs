//! keepsake-core - Core library for keepsake.
//!
//! A small conversational agent core: an append-only fact store, a
//! rule-based lexical relevance scorer driven by a versioned lexicon, a
//! per-turn router that picks between direct, memory and suggestion
//! replies, and an inactivity scheduler that signals when to reach out
//! after a silence.
//!
//! # Example
//!
//! ```ignore
//! use keepsake_core::{AgentConfig, ConversationSession};
//!
//! let session = ConversationSession::from_config(&AgentConfig::from_env())?;
//! session.remember("We met on a Friday message", "first_contact", Some(9))?;
//!
//! let outcome = session.process_turn("how did we first start talking?");
//! println!("{} ({})", outcome.final_text, outcome.route_summary());
//! ```

pub mod companions;
pub mod config;
pub mod error;
pub mod facts;
pub mod lexicon;
pub mod retrieval;
pub mod router;
pub mod scheduler;
pub mod session;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use companions::{
    KeywordMoodClassifier, PatternContentFilter, Strictness, SuggestionCatalog, TemplateRenderer,
};
pub use config::AgentConfig;
pub use error::{ErrorCode, KeepsakeError, KeepsakeResult};
pub use facts::{FactSource, FactStore, JsonFilePersistence, NullPersistence};
pub use lexicon::{LexiconCatalog, LexiconGroup, OverrideRule};
pub use retrieval::{RelevanceScorer, Retrieval, ScoredFact, ScoringWeights};
pub use router::{ConversationRouter, RouterConfig};
pub use scheduler::{
    ActivityWatch, InactivityConfig, InactivityScheduler, OutreachEvent, TimerState,
};
pub use session::{ConversationSession, SessionStats};
pub use traits::{
    ContentFilter, FactPersistence, FilterVerdict, MoodClassifier, ResponseRenderer, Suggestion,
    SuggestionProvider,
};
pub use types::{
    Affect, ConversationTurn, FactRecord, FactStats, Mood, MoodReading, ReplyPath, RouteStage,
    TurnOutcome,
};
