//! Silence detection for unsolicited follow-up messages.
//!
//! The scheduler runs one tokio task per armed period. The task wakes on a
//! fixed poll interval, compares the time since the last recorded activity
//! against the threshold and emits an [`OutreachEvent`] on a channel when
//! it is crossed.
//!
//! An event already queued is not withdrawn by later activity. Each event
//! carries the activity generation it was raised in; consumers reading the
//! channel directly should drop events for which
//! [`InactivityScheduler::is_current`] (or [`ActivityWatch::is_current`])
//! returns `false`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{KeepsakeError, KeepsakeResult};
use crate::types::Mood;

const EVENT_BUFFER: usize = 16;

/// Channel for receiving outreach events.
pub type OutreachReceiver = mpsc::Receiver<OutreachEvent>;

/// Timing configuration for the inactivity scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InactivityConfig {
    /// Silence in seconds before an outreach event fires (default: 60).
    pub threshold_secs: u64,
    /// Seconds between checks (default: 5).
    pub poll_interval_secs: u64,
}

impl Default for InactivityConfig {
    fn default() -> Self {
        Self {
            threshold_secs: 60,
            poll_interval_secs: 5,
        }
    }
}

impl InactivityConfig {
    /// Config with a custom threshold and the default poll interval.
    pub fn with_threshold(threshold_secs: u64) -> Self {
        Self {
            threshold_secs,
            ..Default::default()
        }
    }

    /// Override the poll interval.
    pub fn with_poll_interval(mut self, poll_interval_secs: u64) -> Self {
        self.poll_interval_secs = poll_interval_secs;
        self
    }

    pub fn threshold(&self) -> Duration {
        Duration::from_secs(self.threshold_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Both durations must be at least one second.
    pub fn validate(&self) -> KeepsakeResult<()> {
        if self.threshold_secs == 0 {
            return Err(KeepsakeError::out_of_range(
                "inactivity threshold_secs must be at least 1",
                "Set threshold_secs to the silence length that should trigger outreach",
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(KeepsakeError::out_of_range(
                "inactivity poll_interval_secs must be at least 1",
                "The default of 5 seconds works for most sessions",
            ));
        }
        Ok(())
    }
}

/// Monitoring state of the activity timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    /// Not monitoring.
    Idle,
    /// Monitoring; no event for the current silence window yet.
    Armed,
    /// An event fired and monitoring continues with a fresh window.
    Fired,
}

/// Signal emitted after the configured silence period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachEvent {
    /// Silence length that triggered the event, in seconds.
    pub silence_secs: u64,
    /// Wall-clock time the event fired.
    pub fired_at: DateTime<Utc>,
    /// Mood of the last processed message.
    pub last_mood: Mood,
    /// Number of activities recorded before the event fired.
    pub activity_generation: u64,
}

/// Cloneable handle for checking whether an outreach event is stale.
#[derive(Debug, Clone)]
pub struct ActivityWatch {
    generation: Arc<AtomicU64>,
}

impl ActivityWatch {
    /// `true` when no activity was recorded after `event` fired.
    pub fn is_current(&self, event: &OutreachEvent) -> bool {
        event.activity_generation == self.generation.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct TimerShared {
    last_activity: Option<Instant>,
    state: TimerState,
    last_mood: Mood,
}

struct RunningTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Tracks user activity and signals when silence exceeds a threshold.
///
/// Owned by a conversation session. Arming requires a tokio runtime; the
/// remaining operations are plain synchronous calls.
pub struct InactivityScheduler {
    config: InactivityConfig,
    shared: Arc<Mutex<TimerShared>>,
    sender: mpsc::Sender<OutreachEvent>,
    task: Mutex<Option<RunningTask>>,
    generation: Arc<AtomicU64>,
}

impl InactivityScheduler {
    /// Create an idle scheduler.
    ///
    /// Returns the scheduler and a receiver for outreach events.
    pub fn new(config: InactivityConfig) -> KeepsakeResult<(Self, OutreachReceiver)> {
        config.validate()?;
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        Ok((
            Self {
                config,
                shared: Arc::new(Mutex::new(TimerShared {
                    last_activity: None,
                    state: TimerState::Idle,
                    last_mood: Mood::Neutral,
                })),
                sender: tx,
                task: Mutex::new(None),
                generation: Arc::new(AtomicU64::new(0)),
            },
            rx,
        ))
    }

    pub fn config(&self) -> &InactivityConfig {
        &self.config
    }

    fn shared(&self) -> MutexGuard<'_, TimerShared> {
        lock_shared(&self.shared)
    }

    fn task_slot(&self) -> MutexGuard<'_, Option<RunningTask>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start monitoring.
    ///
    /// Starts a fresh silence window when coming out of idle, so silence
    /// while disarmed never counts. Arming an already armed scheduler does
    /// nothing.
    pub fn arm(&self) -> KeepsakeResult<()> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            KeepsakeError::no_runtime("InactivityScheduler::arm must run inside a tokio runtime")
        })?;

        let mut slot = self.task_slot();
        if let Some(task) = slot.as_ref() {
            if !task.handle.is_finished() && !task.token.is_cancelled() {
                return Ok(());
            }
        }

        {
            let mut shared = self.shared();
            if shared.state == TimerState::Idle || shared.last_activity.is_none() {
                shared.last_activity = Some(Instant::now());
            }
            shared.state = TimerState::Armed;
        }

        let token = CancellationToken::new();
        let handle = runtime.spawn(poll_loop(
            self.shared.clone(),
            self.sender.clone(),
            self.generation.clone(),
            token.clone(),
            self.config.threshold(),
            self.config.poll_interval(),
        ));
        *slot = Some(RunningTask { token, handle });

        info!(
            threshold_secs = self.config.threshold_secs,
            poll_interval_secs = self.config.poll_interval_secs,
            "Inactivity scheduler armed"
        );
        Ok(())
    }

    /// Stop monitoring. No event is emitted after this returns until the
    /// next [`arm`](Self::arm).
    pub fn disarm(&self) {
        let task = self.task_slot().take();
        if let Some(task) = task {
            task.token.cancel();
            debug!("Inactivity scheduler disarmed");
        }
        self.shared().state = TimerState::Idle;
    }

    /// Reset the silence window. A fired timer returns to armed.
    ///
    /// Events queued before this call become stale.
    pub fn record_activity(&self) {
        let mut shared = self.shared();
        self.generation.fetch_add(1, Ordering::SeqCst);
        shared.last_activity = Some(Instant::now());
        if shared.state == TimerState::Fired {
            shared.state = TimerState::Armed;
        }
    }

    /// Remember the mood to attach to the next outreach event.
    pub fn set_last_mood(&self, mood: Mood) {
        self.shared().last_mood = mood;
    }

    /// Whole seconds since the last recorded activity.
    pub fn seconds_since_activity(&self) -> Option<u64> {
        self.shared()
            .last_activity
            .map(|at| at.elapsed().as_secs())
    }

    /// Whole seconds until the next event would fire, `None` while idle.
    pub fn seconds_until_outreach(&self) -> Option<u64> {
        let shared = self.shared();
        if shared.state == TimerState::Idle {
            return None;
        }
        let elapsed = shared.last_activity.map_or(0, |at| at.elapsed().as_secs());
        Some(self.config.threshold_secs.saturating_sub(elapsed))
    }

    /// `true` when no activity was recorded after `event` fired.
    pub fn is_current(&self, event: &OutreachEvent) -> bool {
        self.watch().is_current(event)
    }

    /// Handle for checking event staleness from another task.
    pub fn watch(&self) -> ActivityWatch {
        ActivityWatch {
            generation: self.generation.clone(),
        }
    }

    pub fn state(&self) -> TimerState {
        self.shared().state
    }

    pub fn is_armed(&self) -> bool {
        self.state() != TimerState::Idle
    }
}

impl Drop for InactivityScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task_slot().take() {
            task.token.cancel();
        }
    }
}

impl std::fmt::Debug for InactivityScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InactivityScheduler")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

fn lock_shared(shared: &Mutex<TimerShared>) -> MutexGuard<'_, TimerShared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn poll_loop(
    shared: Arc<Mutex<TimerShared>>,
    sender: mpsc::Sender<OutreachEvent>,
    generation: Arc<AtomicU64>,
    token: CancellationToken,
    threshold: Duration,
    poll: Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + poll, poll);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => check(&shared, &sender, &generation, &token, threshold),
        }
    }
    debug!("Inactivity poll loop stopped");
}

fn check(
    shared: &Mutex<TimerShared>,
    sender: &mpsc::Sender<OutreachEvent>,
    generation: &AtomicU64,
    token: &CancellationToken,
    threshold: Duration,
) {
    // The event is sent while the lock is held so that a concurrent disarm,
    // which cancels before locking, can never be followed by an event.
    let mut state = lock_shared(shared);
    if token.is_cancelled() {
        return;
    }

    let now = Instant::now();
    let baseline = *state.last_activity.get_or_insert(now);
    let silence = now.saturating_duration_since(baseline);
    if silence < threshold {
        return;
    }

    state.last_activity = Some(now);
    state.state = TimerState::Fired;

    let event = OutreachEvent {
        silence_secs: silence.as_secs(),
        fired_at: Utc::now(),
        last_mood: state.last_mood,
        activity_generation: generation.load(Ordering::SeqCst),
    };
    info!(silence_secs = event.silence_secs, mood = %event.last_mood, "Outreach due");

    if let Err(e) = sender.try_send(event) {
        warn!(error = %e, "Dropping outreach event");
    }
}
