use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tracing::{debug, info};

use crate::clock::{Clock, SecondTicker};
use crate::differ::{self, CharState};
use crate::error::EngineError;
use crate::heatmap::SessionErrors;
use crate::metrics::Metrics;
use crate::session::{
    SessionConfig, SessionEvent, SessionObserver, SessionPhase, SessionResult, SessionSnapshot,
};
use crate::time_series::WpmSeries;

/// What a buffer change produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputOutcome {
    /// Keys of errors counted by this change, for the heatmap
    pub new_errors: Vec<char>,
    /// Set when this change finished the session
    pub completed: Option<SessionResult>,
}

/// Drives one typing session through Idle, Countdown, Running, Paused and
/// Complete.
///
/// All time comes from the injected [`Clock`]; the periodic work (countdown,
/// wpm samples, expiry) happens in [`SessionController::on_tick`], which is
/// safe to call at any rate.
pub struct SessionController {
    config: SessionConfig,
    clock: Arc<dyn Clock>,
    ticker: SecondTicker,
    phase: SessionPhase,
    target: Vec<char>,
    typed: Vec<char>,
    states: Vec<CharState>,
    countdown: Option<u32>,
    accumulated: Duration,
    running_since: Option<Duration>,
    samples: WpmSeries,
    errors: SessionErrors,
    result: Option<SessionResult>,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl SessionController {
    pub fn new(config: SessionConfig, clock: Arc<dyn Clock>, text: impl Into<String>) -> Self {
        let target: Vec<char> = text.into().chars().collect();
        let states = differ::diff(&target, &[], false);
        let errors = SessionErrors::new(config.error_policy);

        Self {
            ticker: SecondTicker::new(clock.clone()),
            clock,
            config,
            phase: SessionPhase::Idle,
            target,
            typed: Vec::new(),
            states,
            countdown: None,
            accumulated: Duration::ZERO,
            running_since: None,
            samples: WpmSeries::new(),
            errors,
            result: None,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn target(&self) -> &[char] {
        &self.target
    }

    pub fn target_text(&self) -> String {
        self.target.iter().collect()
    }

    pub fn typed(&self) -> &[char] {
        &self.typed
    }

    pub fn states(&self) -> &[CharState] {
        &self.states
    }

    pub fn current_index(&self) -> Option<usize> {
        differ::current_index(&self.states)
    }

    pub fn countdown(&self) -> Option<u32> {
        self.countdown
    }

    pub fn samples(&self) -> &WpmSeries {
        &self.samples
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    /// Errors counted so far under the configured policy
    pub fn session_errors(&self) -> usize {
        self.errors.total()
    }

    pub fn elapsed(&self) -> Duration {
        match self.running_since {
            Some(since) => self.accumulated + self.clock.now().saturating_sub(since),
            None => self.accumulated,
        }
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.config
            .duration
            .map(|limit| limit.saturating_sub(self.elapsed()))
    }

    /// Current speed and accuracy; a pure read of the state array
    pub fn live_metrics(&self) -> Metrics {
        Metrics::sample(&self.states, self.elapsed())
    }

    pub fn snapshot(&self) -> SessionSnapshot<'_> {
        SessionSnapshot {
            phase: self.phase,
            states: &self.states,
            current_index: self.current_index(),
            elapsed: self.elapsed(),
            remaining: self.remaining(),
            countdown: self.countdown,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Complete
    }

    /// Leaves Idle for Countdown (or straight to Running without one).
    ///
    /// A no-op outside Idle. Refuses an empty text or invalid config.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.phase != SessionPhase::Idle {
            return Ok(());
        }
        self.config.validate()?;
        if self.target.is_empty() {
            return Err(EngineError::NoTextAvailable);
        }

        if self.config.countdown_enabled() {
            self.countdown = Some(self.config.countdown_secs);
            self.ticker.arm();
            self.set_phase(SessionPhase::Countdown);
        } else {
            self.begin_running();
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.phase != SessionPhase::Running {
            return;
        }
        self.freeze_elapsed();
        self.ticker.cancel();
        self.set_phase(SessionPhase::Paused);
    }

    pub fn resume(&mut self) {
        if self.phase != SessionPhase::Paused {
            return;
        }
        self.running_since = Some(self.clock.now());
        self.ticker.arm();
        self.set_phase(SessionPhase::Running);
    }

    pub fn toggle_pause(&mut self) {
        match self.phase {
            SessionPhase::Running => self.pause(),
            SessionPhase::Paused => self.resume(),
            _ => {}
        }
    }

    /// Manual end; returns the result when this call finished the session
    pub fn end(&mut self) -> Option<SessionResult> {
        match self.phase {
            SessionPhase::Running | SessionPhase::Paused => Some(self.finish()),
            _ => None,
        }
    }

    /// Back to Idle with a new text, discarding everything from this session
    pub fn restart(&mut self, text: impl Into<String>) {
        self.ticker.cancel();
        self.target = text.into().chars().collect();
        self.typed.clear();
        self.states = differ::diff(&self.target, &[], false);
        self.countdown = None;
        self.accumulated = Duration::ZERO;
        self.running_since = None;
        self.samples = WpmSeries::new();
        self.errors = SessionErrors::new(self.config.error_policy);
        self.result = None;
        self.set_phase(SessionPhase::Idle);
    }

    /// Replaces the typed buffer with the full current input
    pub fn input(&mut self, typed: &str) -> InputOutcome {
        if let Some(outcome) = self.expire_before_input() {
            return outcome;
        }
        if self.phase != SessionPhase::Running {
            return InputOutcome::default();
        }
        self.typed = typed.chars().take(self.target.len()).collect();
        self.apply_input()
    }

    pub fn push_char(&mut self, c: char) -> InputOutcome {
        if let Some(outcome) = self.expire_before_input() {
            return outcome;
        }
        if self.phase != SessionPhase::Running || self.typed.len() >= self.target.len() {
            return InputOutcome::default();
        }
        self.typed.push(c);
        self.apply_input()
    }

    pub fn backspace(&mut self) -> InputOutcome {
        if let Some(outcome) = self.expire_before_input() {
            return outcome;
        }
        if self.phase != SessionPhase::Running || self.typed.pop().is_none() {
            return InputOutcome::default();
        }
        self.apply_input()
    }

    /// Periodic work; returns the result if time ran out on this tick
    pub fn on_tick(&mut self) -> Option<SessionResult> {
        match self.phase {
            SessionPhase::Countdown => {
                let due = self.ticker.poll();
                if due == 0 {
                    return None;
                }
                let left = self
                    .countdown
                    .unwrap_or(0)
                    .saturating_sub(due.min(u32::MAX as u64) as u32);
                if left == 0 {
                    self.begin_running();
                } else {
                    self.countdown = Some(left);
                    self.notify(SessionEvent::Updated);
                }
                None
            }
            SessionPhase::Running => {
                if self.ticker.poll() > 0 {
                    let metrics = self.live_metrics();
                    self.samples.record(metrics.elapsed_secs.round(), metrics.wpm);
                    self.notify(SessionEvent::Updated);
                }
                self.expire_if_due()
            }
            SessionPhase::Idle | SessionPhase::Paused | SessionPhase::Complete => None,
        }
    }

    fn expire_if_due(&mut self) -> Option<SessionResult> {
        let expired = self.phase == SessionPhase::Running
            && self
                .config
                .duration
                .is_some_and(|limit| self.elapsed() >= limit);
        expired.then(|| self.finish())
    }

    /// A key landing after the limit ends the session and is dropped
    fn expire_before_input(&mut self) -> Option<InputOutcome> {
        self.expire_if_due().map(|result| InputOutcome {
            new_errors: Vec::new(),
            completed: Some(result),
        })
    }

    fn apply_input(&mut self) -> InputOutcome {
        self.states = differ::diff(&self.target, &self.typed, true);
        let new_errors = self
            .errors
            .observe(&self.target, &self.states, &self.typed);
        self.notify(SessionEvent::Updated);

        let completed = if differ::is_complete(self.target.len(), self.typed.len()) {
            Some(self.finish())
        } else {
            None
        };

        InputOutcome {
            new_errors,
            completed,
        }
    }

    fn begin_running(&mut self) {
        self.countdown = None;
        self.running_since = Some(self.clock.now());
        self.ticker.arm();
        self.states = differ::diff(&self.target, &self.typed, true);
        self.set_phase(SessionPhase::Running);
    }

    fn freeze_elapsed(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += self.clock.now().saturating_sub(since);
        }
    }

    fn finish(&mut self) -> SessionResult {
        self.freeze_elapsed();
        if let Some(limit) = self.config.duration {
            self.accumulated = self.accumulated.min(limit);
        }
        self.ticker.cancel();
        self.states = differ::diff(&self.target, &self.typed, false);

        let metrics = Metrics::sample(&self.states, self.accumulated);
        let result = SessionResult {
            wpm: metrics.reported_wpm(),
            cpm: metrics.reported_cpm(),
            accuracy: metrics.reported_accuracy(),
            time: metrics.elapsed_secs,
            date: Local::now(),
            difficulty: self.config.difficulty,
            correct_chars: metrics.correct_chars,
            incorrect_chars: metrics.incorrect_chars,
            consistency: self.samples.consistency(),
        };

        info!(
            wpm = result.wpm,
            accuracy = result.accuracy,
            time = result.time,
            difficulty = %result.difficulty,
            "session complete"
        );

        self.result = Some(result.clone());
        self.set_phase(SessionPhase::Complete);
        self.notify(SessionEvent::Completed(result.clone()));
        result
    }

    fn set_phase(&mut self, to: SessionPhase) {
        let from = self.phase;
        self.phase = to;
        debug!(%from, %to, "session phase changed");
        self.notify(SessionEvent::PhaseChanged { from, to });
    }

    fn notify(&mut self, event: SessionEvent) {
        if self.observers.is_empty() {
            return;
        }
        let mut observers = std::mem::take(&mut self.observers);
        let snapshot = self.snapshot();
        for observer in observers.iter_mut() {
            observer.on_event(&event, &snapshot);
        }
        self.observers = observers;
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("phase", &self.phase)
            .field("config", &self.config)
            .field("target_len", &self.target.len())
            .field("typed_len", &self.typed.len())
            .field("elapsed", &self.elapsed())
            .field("countdown", &self.countdown)
            .finish()
    }
}
