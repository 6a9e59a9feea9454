//! Contract with the external service that turns an instruction into a
//! placement payload.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no API key configured (set GEMINI_API_KEY or api_key in the config file)")]
    MissingApiKey,
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode the service envelope: {0}")]
    Envelope(#[from] serde_json::Error),
    #[error("empty or filtered response: {0}")]
    EmptyResponse(String),
}

/// Sends `instruction` together with the serialized room and returns the
/// service's raw text reply. The reply is untrusted.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn request(&self, instruction: &str, room_state: &str) -> Result<String, TransportError>;
}

/// Stand-in used when no API key is configured. Every request fails with
/// [`TransportError::MissingApiKey`]; local commands keep working.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineService;

#[async_trait]
impl ReasoningService for OfflineService {
    async fn request(&self, _instruction: &str, _room_state: &str) -> Result<String, TransportError> {
        Err(TransportError::MissingApiKey)
    }
}
