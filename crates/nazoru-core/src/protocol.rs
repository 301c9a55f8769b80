use crate::recorder::KeyEvent;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a prediction could not be applied.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("backend rejected the sequence (status {0:?})")]
    Rejected(String),
    #[error("response carried no result")]
    NoResult,
}

/// One ranked candidate from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub character: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

/// Response body of `POST /predict`.
///
/// `status` is optional; when present it must be `"ok"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub result: Vec<Candidate>,
}

/// A validated prediction: the character to display plus the full ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub character: String,
    pub candidates: Vec<Candidate>,
}

impl TryFrom<PredictResponse> for Prediction {
    type Error = PredictError;

    fn try_from(resp: PredictResponse) -> Result<Self, Self::Error> {
        if let Some(status) = resp.status {
            if status != "ok" {
                return Err(PredictError::Rejected(status));
            }
        }
        let character = match resp.result.first() {
            Some(best) => best.character.clone(),
            None => return Err(PredictError::NoResult),
        };
        Ok(Self {
            character,
            candidates: resp.result,
        })
    }
}

/// Serialize the recorded sequence as the request body.
pub fn encode_request(events: &[KeyEvent]) -> Result<String, PredictError> {
    serde_json::to_string(events).map_err(|e| PredictError::Malformed(e.to_string()))
}

/// Parse and validate a response body.
pub fn decode_response(body: &str) -> Result<Prediction, PredictError> {
    let resp: PredictResponse =
        serde_json::from_str(body.trim()).map_err(|e| PredictError::Malformed(e.to_string()))?;
    Prediction::try_from(resp)
}
