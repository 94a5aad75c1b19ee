//! Topic lexicon for relevance boosting.
//!
//! The catalog is a versioned TOML resource. The crate embeds a default
//! table; deployments can point [`RetrievalSettings::lexicon_path`]
//! at a replacement.
//!
//! [`RetrievalSettings::lexicon_path`]: crate::config::RetrievalSettings::lexicon_path

mod catalog;

pub use catalog::{LexiconCatalog, LexiconGroup, OverrideRule, LEXICON_VERSION};
