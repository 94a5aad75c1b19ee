//! End-to-end tests for a conversation session.

use std::sync::Arc;
use std::time::Duration;

use keepsake_core::{
    AgentConfig, ContentFilter, ConversationRouter, ConversationSession, FactStore,
    FilterVerdict, InactivityConfig, InactivityScheduler, KeepsakeError, KeepsakeResult, Mood,
    RelevanceScorer, RouteStage, SuggestionCatalog,
};

fn config_in(dir: &std::path::Path) -> AgentConfig {
    AgentConfig::builder()
        .facts_path(dir.join("facts.json"))
        .inactivity(InactivityConfig::with_threshold(2).with_poll_interval(1))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_memory_question_uses_stored_fact() {
    let dir = tempfile::tempdir().unwrap();
    let session = ConversationSession::from_config(&config_in(dir.path())).unwrap();
    session
        .remember("We met on a Friday message", "first_contact", Some(9))
        .unwrap();
    session
        .remember("Purple is the favorite color", "favorites", Some(6))
        .unwrap();

    let outcome = session.process_turn("how did we first start talking?");
    assert_eq!(outcome.route_path[2], RouteStage::MemoryReply);
    assert_eq!(outcome.facts_used[0].category, "first_contact");
    assert!(outcome.final_text.contains("Friday message"));
    assert_eq!(outcome.route_path.last(), Some(&RouteStage::Done));
}

#[tokio::test]
async fn test_playful_message_gets_suggestion() {
    let dir = tempfile::tempdir().unwrap();
    let session = ConversationSession::from_config(&config_in(dir.path())).unwrap();

    let outcome = session.process_turn("haha you're so silly");
    assert_eq!(outcome.mood, Mood::Playful);
    assert_eq!(
        outcome.route_path,
        vec![
            RouteStage::Start,
            RouteStage::MoodDetected,
            RouteStage::SuggestionReply,
            RouteStage::SafetyReviewed,
            RouteStage::Done,
        ]
    );
    assert!(outcome.final_text.contains("Online Game Night"));
}

struct BrokenFilter;

impl ContentFilter for BrokenFilter {
    fn review_and_fix(&self, _text: &str) -> KeepsakeResult<FilterVerdict> {
        Err(KeepsakeError::filter_unavailable("filter crashed"))
    }
}

#[tokio::test]
async fn test_broken_filter_never_leaks_draft() {
    let store = Arc::new(FactStore::in_memory());
    store.append("We met on a Friday message", "first_contact", Some(9)).unwrap();

    let router = ConversationRouter::builder(store.clone(), RelevanceScorer::with_builtin_lexicon().unwrap())
        .filter(Arc::new(BrokenFilter))
        .suggestions(Arc::new(SuggestionCatalog::builtin()))
        .build()
        .unwrap();
    let (scheduler, rx) = InactivityScheduler::new(InactivityConfig::default()).unwrap();
    let session = ConversationSession::new(router, store, scheduler, rx);

    let outcome = session.process_turn("remember our first message?");
    assert!(!outcome.safe);
    assert_eq!(outcome.safety_score, 0);
    assert!(!outcome.final_text.contains("Friday"));
    assert_eq!(outcome.final_text, session.router().config().safe_fallback);
}

#[tokio::test(start_paused = true)]
async fn test_silence_triggers_single_outreach() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = ConversationSession::from_config(&config_in(dir.path())).unwrap();
    let mut rx = session.take_outreach_rx().unwrap();

    session.process_turn("good night");
    tokio::time::sleep(Duration::from_millis(3_200)).await;

    let event = rx.try_recv().unwrap();
    assert!(event.silence_secs >= 2);
    assert!(session.scheduler().is_current(&event));
    assert!(rx.try_recv().is_err());

    // A new turn restarts the silence window and outdates the event.
    session.process_turn("still here");
    assert!(!session.scheduler().is_current(&event));
    tokio::time::sleep(Duration::from_millis(1_200)).await;
    assert!(rx.try_recv().is_err());
}
