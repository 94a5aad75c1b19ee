//! Conversation session tying the router, fact store and inactivity
//! scheduler together.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::companions::{KeywordMoodClassifier, PatternContentFilter, SuggestionCatalog, TemplateRenderer};
use crate::config::AgentConfig;
use crate::error::{KeepsakeError, KeepsakeResult};
use crate::facts::{FactStore, JsonFilePersistence};
use crate::router::ConversationRouter;
use crate::scheduler::{InactivityScheduler, OutreachEvent, OutreachReceiver, TimerState};
use crate::types::{FactRecord, FactStats, Mood, TurnOutcome};

/// Snapshot of session state for status displays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub facts: FactStats,
    pub last_mood: Mood,
    pub timer_state: TimerState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds_since_activity: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds_until_outreach: Option<u64>,
}

/// One conversation with one user.
///
/// The session owns its inactivity scheduler; nothing here is process-wide.
///
/// # Example
///
/// ```ignore
/// use keepsake_core::{AgentConfig, ConversationSession};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut session = ConversationSession::from_config(&AgentConfig::from_env())?;
///     session.on_outreach_due(|event, text| println!("[{}s] {}", event.silence_secs, text))?;
///
///     let outcome = session.process_turn("do you remember how we first started talking?");
///     println!("{}", outcome.final_text);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct ConversationSession {
    router: ConversationRouter,
    store: Arc<FactStore>,
    scheduler: InactivityScheduler,
    outreach_rx: Option<OutreachReceiver>,
    listener: Option<JoinHandle<()>>,
    last_mood: Mutex<Mood>,
}

impl ConversationSession {
    /// Assemble a session from parts.
    ///
    /// `router` must read its facts from `store`.
    pub fn new(
        router: ConversationRouter,
        store: Arc<FactStore>,
        scheduler: InactivityScheduler,
        outreach_rx: OutreachReceiver,
    ) -> Self {
        Self {
            router,
            store,
            scheduler,
            outreach_rx: Some(outreach_rx),
            listener: None,
            last_mood: Mutex::new(Mood::Neutral),
        }
    }

    /// Build a session with the reference collaborators and a JSON fact file.
    ///
    /// Must be called inside a tokio runtime, which later turns use to arm
    /// the inactivity scheduler.
    pub fn from_config(config: &AgentConfig) -> KeepsakeResult<Self> {
        config.validate()?;
        tokio::runtime::Handle::try_current().map_err(|_| {
            KeepsakeError::no_runtime("ConversationSession must be created inside a tokio runtime")
        })?;
        debug!(facts_path = %config.facts_path.display(), "Creating session");

        let persistence = Arc::new(JsonFilePersistence::new(&config.facts_path));
        let store = Arc::new(FactStore::load(persistence)?);
        let router = ConversationRouter::builder(store.clone(), config.build_scorer()?)
            .classifier(Arc::new(KeywordMoodClassifier::new()))
            .filter(Arc::new(PatternContentFilter::new(config.safety.strictness)))
            .suggestions(Arc::new(SuggestionCatalog::builtin()))
            .renderer(Arc::new(TemplateRenderer::new()))
            .config(config.router.clone())
            .build()?;
        let (scheduler, rx) = InactivityScheduler::new(config.inactivity.clone())?;

        Ok(Self::new(router, store, scheduler, rx))
    }

    /// Process a user message.
    ///
    /// Records activity and arms the inactivity scheduler. If arming fails
    /// (no tokio runtime) the reply is still returned and outreach stays off.
    pub fn process_turn(&self, message: &str) -> TurnOutcome {
        self.scheduler.record_activity();
        let outcome = self.router.process_turn(message);

        *self.last_mood.lock().unwrap_or_else(PoisonError::into_inner) = outcome.mood;
        self.scheduler.set_last_mood(outcome.mood);
        if let Err(e) = self.scheduler.arm() {
            warn!(error = %e, "Inactivity scheduler not armed");
        }

        outcome
    }

    /// Deliver outreach events to `callback` along with rendered text.
    ///
    /// Spawns a listener task; can only be called once per session.
    pub fn on_outreach_due<F>(&mut self, callback: F) -> KeepsakeResult<()>
    where
        F: Fn(&OutreachEvent, &str) + Send + 'static,
    {
        let mut rx = self.outreach_rx.take().ok_or_else(|| {
            KeepsakeError::internal("Outreach listener already registered for this session")
        })?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            KeepsakeError::no_runtime("on_outreach_due must run inside a tokio runtime")
        })?;
        let renderer = self.router.renderer();
        let watch = self.scheduler.watch();

        self.listener = Some(runtime.spawn(async move {
            while let Some(event) = rx.recv().await {
                if !watch.is_current(&event) {
                    debug!(silence_secs = event.silence_secs, "Skipping stale outreach event");
                    continue;
                }
                let text = renderer.render_outreach(&event).unwrap_or_else(|e| {
                    warn!(error = %e, "Outreach render failed; using default line");
                    "Are you still there?".to_string()
                });
                callback(&event, &text);
            }
            debug!("Outreach listener stopped");
        }));
        info!("Outreach listener registered");
        Ok(())
    }

    /// Take the raw outreach receiver instead of registering a callback.
    ///
    /// Events may be stale by the time they are read; check them with
    /// [`InactivityScheduler::is_current`] before acting.
    pub fn take_outreach_rx(&mut self) -> Option<OutreachReceiver> {
        self.outreach_rx.take()
    }

    /// Store a new fact ("remember this").
    ///
    /// A [`KeepsakeError::Persistence`] error means the fact is kept for
    /// this session but was not written to disk.
    pub fn remember(
        &self,
        content: &str,
        category: &str,
        importance: Option<u8>,
    ) -> KeepsakeResult<FactRecord> {
        self.store.append(content, category, importance)
    }

    /// Current fact, mood and timer statistics.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            facts: self.store.stats(),
            last_mood: self.last_mood(),
            timer_state: self.scheduler.state(),
            seconds_since_activity: self.scheduler.seconds_since_activity(),
            seconds_until_outreach: self.scheduler.seconds_until_outreach(),
        }
    }

    pub fn last_mood(&self) -> Mood {
        *self.last_mood.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn router(&self) -> &ConversationRouter {
        &self.router
    }

    pub fn store(&self) -> &Arc<FactStore> {
        &self.store
    }

    pub fn scheduler(&self) -> &InactivityScheduler {
        &self.scheduler
    }

    /// Stop silence monitoring and the outreach listener.
    pub fn shutdown(&mut self) {
        self.scheduler.disarm();
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        info!("Session stopped");
    }
}

impl Drop for ConversationSession {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}
