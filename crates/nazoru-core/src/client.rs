use crate::protocol::{self, PredictError, Prediction};
use crate::recorder::KeyEvent;
use std::time::Duration;
use tracing::debug;

/// Anything that can turn a timed key sequence into a character.
pub trait Predictor: Send + Sync {
    fn predict(&self, events: &[KeyEvent]) -> Result<Prediction, PredictError>;
}

/// Blocking JSON-over-HTTP predictor for `POST /predict`.
pub struct HttpPredictor {
    agent: ureq::Agent,
    endpoint: String,
}

impl HttpPredictor {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Predictor for HttpPredictor {
    fn predict(&self, events: &[KeyEvent]) -> Result<Prediction, PredictError> {
        let payload = protocol::encode_request(events)?;
        debug!(endpoint = %self.endpoint, keys = events.len(), "sending prediction request");

        let body = self
            .agent
            .post(self.endpoint.as_str())
            .header("Content-Type", "application/json")
            .send(payload.as_str())
            .map_err(|e| PredictError::Http(format!("{}: {e}", self.endpoint)))?
            .into_body()
            .read_to_string()
            .map_err(|e| PredictError::Http(format!("{}: {e}", self.endpoint)))?;

        protocol::decode_response(&body)
    }
}
