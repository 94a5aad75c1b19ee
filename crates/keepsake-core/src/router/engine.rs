//! Per-turn conversation state machine.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::companions::{KeywordMoodClassifier, PatternContentFilter, TemplateRenderer};
use crate::error::KeepsakeResult;
use crate::facts::FactSource;
use crate::retrieval::RelevanceScorer;
use crate::traits::{
    ContentFilter, MoodClassifier, NoSuggestions, ResponseRenderer, SuggestionProvider,
};
use crate::types::{
    Affect, ConversationTurn, FactRecord, Mood, MoodReading, ReplyPath, RouteStage, TurnOutcome,
};

use super::config::RouterConfig;

/// Routes one message at a time through mood detection, an optional fact
/// lookup and the content filter.
///
/// `process_turn` never fails. Collaborator errors are logged and answered
/// with a fallback: a neutral mood for the classifier, a direct reply for
/// retrieval or suggestions, a fixed draft for the renderer. A failing
/// content filter fails the turn closed with [`RouterConfig::safe_fallback`].
pub struct ConversationRouter {
    facts: Arc<dyn FactSource>,
    scorer: RelevanceScorer,
    classifier: Arc<dyn MoodClassifier>,
    filter: Arc<dyn ContentFilter>,
    suggestions: Arc<dyn SuggestionProvider>,
    renderer: Arc<dyn ResponseRenderer>,
    config: RouterConfig,
    markers: Vec<String>,
}

impl ConversationRouter {
    /// Start building a router over `facts`, ranked by `scorer`.
    pub fn builder(facts: Arc<dyn FactSource>, scorer: RelevanceScorer) -> ConversationRouterBuilder {
        ConversationRouterBuilder {
            facts,
            scorer,
            classifier: None,
            filter: None,
            suggestions: None,
            renderer: None,
            config: RouterConfig::default(),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn scorer(&self) -> &RelevanceScorer {
        &self.scorer
    }

    /// The renderer used for drafts, shared with outreach handling.
    pub fn renderer(&self) -> Arc<dyn ResponseRenderer> {
        self.renderer.clone()
    }

    /// The suggestion provider used for positive moods.
    pub fn suggestions(&self) -> Arc<dyn SuggestionProvider> {
        self.suggestions.clone()
    }

    /// Whether `message` contains a memory-intent marker.
    pub fn has_memory_intent(&self, message: &str) -> bool {
        let lower = message.to_lowercase();
        self.markers.iter().any(|m| lower.contains(m.as_str()))
    }

    /// The reply path chosen after mood detection.
    pub fn choose_path(&self, message: &str, mood: Mood) -> ReplyPath {
        if self.has_memory_intent(message) {
            return ReplyPath::Memory;
        }
        match mood.affect() {
            Affect::Negative => ReplyPath::Memory,
            Affect::Positive => ReplyPath::Suggestion,
            Affect::Neutral => ReplyPath::Direct,
        }
    }

    /// Process one message end to end.
    pub fn process_turn(&self, message: &str) -> TurnOutcome {
        let mut turn = ConversationTurn::start(message);

        let reading = self.classify(message);
        turn.detected_mood = reading.mood;
        turn.visit(RouteStage::MoodDetected);

        let path = self.choose_path(message, reading.mood);
        turn.visit(path.stage());
        debug!(mood = %reading.mood, path = ?path, "Route selected");

        let draft = match path {
            ReplyPath::Memory => self.draft_memory_reply(&mut turn),
            ReplyPath::Suggestion => self.draft_suggestion_reply(&mut turn),
            ReplyPath::Direct => self.draft_direct_reply(&turn),
        };

        let (final_text, safe, safety_score) = self.review(&draft);
        turn.visit(RouteStage::SafetyReviewed);
        turn.visit(RouteStage::Done);

        let outcome = TurnOutcome {
            final_text,
            mood: turn.detected_mood,
            facts_used: turn.retrieved_facts,
            route_path: turn.route_path,
            safe,
            safety_score,
        };
        info!(
            mood = %outcome.mood,
            facts = outcome.facts_used.len(),
            safe = outcome.safe,
            route = %outcome.route_summary(),
            "Turn processed"
        );
        outcome
    }

    fn classify(&self, message: &str) -> MoodReading {
        match self.classifier.classify(message) {
            Ok(reading) => reading,
            Err(e) => {
                warn!(error = %e, code = e.code().as_str(), "Mood classifier failed; using neutral");
                MoodReading::neutral()
            }
        }
    }

    /// Facts for `message`, best first.
    pub fn retrieve(&self, message: &str) -> KeepsakeResult<Vec<FactRecord>> {
        let snapshot = self.facts.snapshot()?;
        let retrieval = self
            .scorer
            .retrieve(message, &snapshot, self.config.retrieval_k);
        Ok(retrieval.into_facts())
    }

    fn draft_memory_reply(&self, turn: &mut ConversationTurn) -> String {
        match self.retrieve(&turn.raw_message) {
            Ok(facts) if !facts.is_empty() => {
                debug!(count = facts.len(), "Facts retrieved");
                turn.retrieved_facts = facts;
                self.render_or_fallback(turn.detected_mood, &turn.raw_message, &turn.retrieved_facts)
            }
            Ok(_) => {
                debug!("No relevant facts; replying directly");
                turn.visit(RouteStage::DirectReply);
                self.draft_direct_reply(turn)
            }
            Err(e) => {
                warn!(error = %e, code = e.code().as_str(), "Fact retrieval failed; replying directly");
                turn.visit(RouteStage::DirectReply);
                self.draft_direct_reply(turn)
            }
        }
    }

    fn draft_suggestion_reply(&self, turn: &mut ConversationTurn) -> String {
        match self.suggestions.suggest_for(turn.detected_mood) {
            Ok(Some(suggestion)) => {
                debug!(title = %suggestion.title, "Suggestion selected");
                self.renderer
                    .render_suggestion(turn.detected_mood, &turn.raw_message, &suggestion)
                    .unwrap_or_else(|e| {
                        warn!(error = %e, "Suggestion render failed; using fallback draft");
                        self.config.draft_fallback.clone()
                    })
            }
            Ok(None) => {
                debug!(mood = %turn.detected_mood, "No suggestion; replying directly");
                turn.visit(RouteStage::DirectReply);
                self.draft_direct_reply(turn)
            }
            Err(e) => {
                warn!(error = %e, code = e.code().as_str(), "Suggestion lookup failed; replying directly");
                turn.visit(RouteStage::DirectReply);
                self.draft_direct_reply(turn)
            }
        }
    }

    fn draft_direct_reply(&self, turn: &ConversationTurn) -> String {
        self.render_or_fallback(turn.detected_mood, &turn.raw_message, &[])
    }

    fn render_or_fallback(&self, mood: Mood, message: &str, facts: &[FactRecord]) -> String {
        self.renderer
            .render(mood, message, facts)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Renderer failed; using fallback draft");
                self.config.draft_fallback.clone()
            })
    }

    fn review(&self, draft: &str) -> (String, bool, u8) {
        match self.filter.review_and_fix(draft) {
            Ok(verdict) => {
                if !verdict.passed {
                    debug!(score = verdict.score, "Draft below filter threshold");
                }
                (verdict.final_text, verdict.passed, verdict.score)
            }
            Err(e) => {
                error!(error = %e, "Content filter unavailable; withholding draft");
                (self.config.safe_fallback.clone(), false, 0)
            }
        }
    }
}

impl std::fmt::Debug for ConversationRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationRouter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ConversationRouter`].
///
/// Collaborators left unset fall back to the keyword classifier, the
/// pattern filter, no suggestions and the template renderer.
pub struct ConversationRouterBuilder {
    facts: Arc<dyn FactSource>,
    scorer: RelevanceScorer,
    classifier: Option<Arc<dyn MoodClassifier>>,
    filter: Option<Arc<dyn ContentFilter>>,
    suggestions: Option<Arc<dyn SuggestionProvider>>,
    renderer: Option<Arc<dyn ResponseRenderer>>,
    config: RouterConfig,
}

impl ConversationRouterBuilder {
    pub fn classifier(mut self, classifier: Arc<dyn MoodClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn filter(mut self, filter: Arc<dyn ContentFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn suggestions(mut self, suggestions: Arc<dyn SuggestionProvider>) -> Self {
        self.suggestions = Some(suggestions);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn ResponseRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the configuration and build the router.
    pub fn build(self) -> KeepsakeResult<ConversationRouter> {
        self.config.validate()?;
        let markers = self
            .config
            .memory_markers
            .iter()
            .map(|m| m.to_lowercase())
            .collect();

        Ok(ConversationRouter {
            facts: self.facts,
            scorer: self.scorer,
            classifier: self
                .classifier
                .unwrap_or_else(|| Arc::new(KeywordMoodClassifier::new())),
            filter: self
                .filter
                .unwrap_or_else(|| Arc::new(PatternContentFilter::default())),
            suggestions: self.suggestions.unwrap_or_else(|| Arc::new(NoSuggestions)),
            renderer: self
                .renderer
                .unwrap_or_else(|| Arc::new(TemplateRenderer::new())),
            config: self.config,
            markers,
        })
    }
}
