use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One keypress and its offset from the start of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: String,
    /// Milliseconds since the first key of the session.
    #[serde(rename = "time")]
    pub elapsed_ms: u64,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            key: key.into(),
            elapsed_ms,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecorderError {
    #[error("key sequence is empty")]
    EmptySequence,
}

/// Accumulates the timed key events of the current session, along with the
/// transcript of raw keys shown to the user.
#[derive(Debug, Default)]
pub struct KeySequenceRecorder {
    events: Vec<KeyEvent>,
    transcript: String,
}

impl KeySequenceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str, elapsed_ms: u64) {
        self.events.push(KeyEvent::new(key, elapsed_ms));
        self.transcript.push_str(key);
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.transcript.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last_event(&self) -> Result<&KeyEvent, RecorderError> {
        self.events.last().ok_or(RecorderError::EmptySequence)
    }

    pub fn events(&self) -> &[KeyEvent] {
        &self.events
    }

    /// Move the sequence out for a prediction request. The transcript stays
    /// visible until the caller clears it.
    pub fn take_events(&mut self) -> Vec<KeyEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }
}
