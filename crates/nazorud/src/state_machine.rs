use nazoru_core::config::{Config, KeysConfig};
use nazoru_core::protocol::{PredictError, Prediction};
use nazoru_core::recorder::{KeyEvent, KeySequenceRecorder};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What the kiosk is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No capture in progress; waiting for the first key.
    Waiting,
    /// Keys are being recorded.
    Listening,
    /// A character was recognised and appended to the output.
    Completed,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Listening => "listening",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsEvent {
    pub action: &'static str,
    pub category: String,
}

/// Actions that the state machine wants the caller to perform.
#[derive(Debug)]
pub enum Action {
    SetState(SessionState),
    /// Replace the raw-key transcript.
    ShowTranscript(String),
    /// Replace the recognised output text.
    ShowOutput(String),
    /// Start the inactivity poll timer.
    StartPolling,
    /// Cancel the inactivity poll timer.
    StopPolling,
    /// Send the sequence to the predictor and report back with `session`.
    Predict { session: u64, events: Vec<KeyEvent> },
    Analytics(AnalyticsEvent),
    /// Everything was reset; the view must start over.
    Reload,
}

pub struct StateMachine {
    state: SessionState,
    recorder: KeySequenceRecorder,
    output: String,
    started: Option<Instant>,
    polling: bool,
    /// Incremented for every new session.
    session: u64,
    /// Session whose prediction request is still outstanding.
    pending: Option<u64>,
    keys: KeysConfig,
    wait: Duration,
    min_keys: usize,
    refresh_after: Duration,
    analytics_category: String,
}

impl StateMachine {
    pub fn new(config: &Config) -> Self {
        Self {
            state: SessionState::Waiting,
            recorder: KeySequenceRecorder::new(),
            output: String::new(),
            started: None,
            polling: false,
            session: 0,
            pending: None,
            keys: config.keys.clone(),
            wait: config.session.wait(),
            min_keys: config.session.min_keys,
            refresh_after: config.refresh.timeout(),
            analytics_category: config.analytics.category.clone(),
        }
    }

    #[cfg(test)]
    fn state(&self) -> SessionState {
        self.state
    }

    #[cfg(test)]
    fn is_polling(&self) -> bool {
        self.polling
    }

    #[cfg(test)]
    fn output(&self) -> &str {
        &self.output
    }

    /// Handle a keydown carrying a browser-style key name.
    pub fn process_key(&mut self, key: &str, now: Instant) -> Vec<Action> {
        if self.keys.is_ignored(key) {
            return Vec::new();
        }

        if key == self.keys.backspace {
            self.output.pop();
            return vec![Action::ShowOutput(self.output.clone())];
        }

        let mut actions = Vec::new();
        if self.recorder.is_empty() {
            actions.extend(self.start_recording(now));
        }

        let elapsed = self.elapsed_ms(now);
        self.recorder.add(key, elapsed);
        debug!(key, elapsed_ms = elapsed, len = self.recorder.len(), "key recorded");
        actions.push(Action::ShowTranscript(self.recorder.transcript().to_string()));
        actions
    }

    fn start_recording(&mut self, now: Instant) -> Vec<Action> {
        if let Some(stale) = self.pending.take() {
            debug!(session = stale, "new session supersedes in-flight request");
        }
        self.session += 1;
        self.started = Some(now);
        self.state = SessionState::Listening;
        self.polling = true;
        // The previous transcript may still be on screen while a request was in flight.
        self.recorder.clear();
        debug!(session = self.session, "recording started");
        vec![Action::SetState(SessionState::Listening), Action::StartPolling]
    }

    /// Poll timer tick: stop recording once the keyboard has been quiet
    /// for longer than the wait time.
    pub fn check_poll(&mut self, now: Instant) -> Vec<Action> {
        if !self.polling {
            return Vec::new();
        }
        let last = match self.recorder.last_event() {
            Ok(event) => event.elapsed_ms,
            Err(e) => {
                warn!(error = %e, "poll timer running without keys, stopping it");
                self.polling = false;
                self.state = SessionState::Waiting;
                return vec![Action::StopPolling, Action::SetState(SessionState::Waiting)];
            }
        };
        let idle = self.elapsed_ms(now).saturating_sub(last);
        if idle > self.wait.as_millis() as u64 {
            self.stop_recording()
        } else {
            Vec::new()
        }
    }

    fn stop_recording(&mut self) -> Vec<Action> {
        self.polling = false;
        let mut actions = vec![Action::StopPolling];

        if self.recorder.len() < self.min_keys {
            debug!(len = self.recorder.len(), "sequence too short, discarding");
            self.state = SessionState::Waiting;
            self.recorder.clear();
            actions.push(Action::SetState(SessionState::Waiting));
            actions.push(Action::ShowTranscript(String::new()));
            return actions;
        }

        let events = self.recorder.take_events();
        info!(session = self.session, keys = events.len(), "recording stopped, requesting prediction");
        self.pending = Some(self.session);
        actions.push(Action::Predict {
            session: self.session,
            events,
        });
        actions
    }

    /// Apply the outcome of the request issued for `session`.
    pub fn prediction_done(
        &mut self,
        session: u64,
        outcome: Result<Prediction, PredictError>,
    ) -> Vec<Action> {
        if self.pending != Some(session) {
            debug!(session, current = self.session, "dropping stale prediction");
            return Vec::new();
        }
        self.pending = None;
        self.recorder.clear();

        match outcome {
            Ok(prediction) => {
                info!(session, character = %prediction.character, "prediction applied");
                self.output.push_str(&prediction.character);
                self.state = SessionState::Completed;
                vec![
                    Action::ShowOutput(self.output.clone()),
                    Action::SetState(SessionState::Completed),
                    Action::ShowTranscript(String::new()),
                    Action::Analytics(AnalyticsEvent {
                        action: "input",
                        category: self.analytics_category.clone(),
                    }),
                ]
            }
            Err(e) => {
                warn!(session, error = %e, "prediction failed");
                self.state = SessionState::Waiting;
                vec![
                    Action::SetState(SessionState::Waiting),
                    Action::ShowTranscript(String::new()),
                ]
            }
        }
    }

    /// Watchdog tick: reset everything once the last session started longer
    /// ago than the refresh threshold.
    pub fn check_refresh(&mut self, now: Instant) -> Vec<Action> {
        let Some(started) = self.started else {
            return Vec::new();
        };
        if now.saturating_duration_since(started) <= self.refresh_after {
            return Vec::new();
        }
        info!(state = %self.state, "refresh threshold reached, resetting");
        self.reset();
        vec![Action::StopPolling, Action::Reload]
    }

    fn reset(&mut self) {
        self.state = SessionState::Waiting;
        self.recorder.clear();
        self.output.clear();
        self.started = None;
        self.polling = false;
        self.pending = None;
    }

    fn elapsed_ms(&self, now: Instant) -> u64 {
        self.started
            .map(|s| now.saturating_duration_since(s).as_millis() as u64)
            .unwrap_or(0)
    }
}
