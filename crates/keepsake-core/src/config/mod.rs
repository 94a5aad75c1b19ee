//! Configuration system for keepsake.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;

use crate::companions::Strictness;
use crate::error::{KeepsakeError, KeepsakeResult};
use crate::lexicon::LexiconCatalog;
use crate::retrieval::{RelevanceScorer, ScoringWeights};
use crate::router::RouterConfig;
use crate::scheduler::InactivityConfig;

/// Retrieval settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Scoring weights.
    pub weights: ScoringWeights,
    /// Lexicon file replacing the built-in table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lexicon_path: Option<PathBuf>,
}

/// Content filter settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetySettings {
    /// Threshold level for the pattern filter.
    pub strictness: Strictness,
}

/// Main agent configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Relevance scoring.
    pub retrieval: RetrievalSettings,
    /// Turn routing.
    pub router: RouterConfig,
    /// Silence monitoring.
    pub inactivity: InactivityConfig,
    /// Content filtering.
    pub safety: SafetySettings,
    /// Location of the JSON fact file.
    pub facts_path: PathBuf,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let keepsake_dir = dirs::home_dir()
            .map(|h| h.join(".keepsake"))
            .unwrap_or_else(|| PathBuf::from(".keepsake"));

        Self {
            retrieval: RetrievalSettings::default(),
            router: RouterConfig::default(),
            inactivity: InactivityConfig::default(),
            safety: SafetySettings::default(),
            facts_path: keepsake_dir.join("facts.json"),
        }
    }
}

impl AgentConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> KeepsakeResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => toml::from_str(&content)
                .map_err(|e| KeepsakeError::Configuration(e.to_string())),
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| KeepsakeError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| KeepsakeError::Configuration(e.to_string())),
            _ => Err(KeepsakeError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads:
    /// - `KEEPSAKE_FACTS_PATH`
    /// - `KEEPSAKE_LEXICON_PATH`
    /// - `KEEPSAKE_RETRIEVAL_K`
    /// - `KEEPSAKE_CONTENT_MATCH_CAP`
    /// - `KEEPSAKE_INACTIVITY_SECS`
    /// - `KEEPSAKE_POLL_INTERVAL_SECS`
    /// - `KEEPSAKE_STRICTNESS` (low, medium, high)
    ///
    /// Unparsable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("KEEPSAKE_FACTS_PATH") {
            config.facts_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("KEEPSAKE_LEXICON_PATH") {
            config.retrieval.lexicon_path = Some(PathBuf::from(path));
        }
        if let Some(k) = env_parse("KEEPSAKE_RETRIEVAL_K") {
            config.router.retrieval_k = k;
        }
        if let Some(cap) = env_parse("KEEPSAKE_CONTENT_MATCH_CAP") {
            config.retrieval.weights.content_match_cap = Some(cap);
        }
        if let Some(secs) = env_parse("KEEPSAKE_INACTIVITY_SECS") {
            config.inactivity.threshold_secs = secs;
        }
        if let Some(secs) = env_parse("KEEPSAKE_POLL_INTERVAL_SECS") {
            config.inactivity.poll_interval_secs = secs;
        }
        if let Some(strictness) = env_parse("KEEPSAKE_STRICTNESS") {
            config.safety.strictness = strictness;
        }

        config
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Check every section; called before any component is built.
    pub fn validate(&self) -> KeepsakeResult<()> {
        self.retrieval.weights.validate()?;
        self.router.validate()?;
        self.inactivity.validate()?;
        if self.facts_path.as_os_str().is_empty() {
            return Err(KeepsakeError::missing_field("facts_path"));
        }
        Ok(())
    }

    /// The configured lexicon, or the built-in one.
    pub fn load_lexicon(&self) -> KeepsakeResult<LexiconCatalog> {
        match &self.retrieval.lexicon_path {
            Some(path) => LexiconCatalog::from_file(path),
            None => LexiconCatalog::builtin(),
        }
    }

    /// A scorer over the configured lexicon and weights.
    pub fn build_scorer(&self) -> KeepsakeResult<RelevanceScorer> {
        RelevanceScorer::new(self.retrieval.weights.clone(), Arc::new(self.load_lexicon()?))
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable environment value");
            None
        }
    }
}

/// Builder for AgentConfig.
#[derive(Default)]
pub struct AgentConfigBuilder {
    config: AgentConfig,
}

impl AgentConfigBuilder {
    /// Set scoring weights.
    pub fn weights(mut self, weights: ScoringWeights) -> Self {
        self.config.retrieval.weights = weights;
        self
    }

    /// Use a lexicon file instead of the built-in table.
    pub fn lexicon_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.retrieval.lexicon_path = Some(path.into());
        self
    }

    /// Set router configuration.
    pub fn router(mut self, router: RouterConfig) -> Self {
        self.config.router = router;
        self
    }

    /// Set inactivity configuration.
    pub fn inactivity(mut self, inactivity: InactivityConfig) -> Self {
        self.config.inactivity = inactivity;
        self
    }

    /// Set content filter strictness.
    pub fn strictness(mut self, strictness: Strictness) -> Self {
        self.config.safety.strictness = strictness;
        self
    }

    /// Set the fact file path.
    pub fn facts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.facts_path = path.into();
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> KeepsakeResult<AgentConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
