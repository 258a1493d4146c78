//! Outbound SMS transport.
//!
//! [`Messenger`] is the seam between the dispatcher and whatever actually
//! carries the text: the production [`HttpSmsGateway`], or a mock in tests.
//! A messenger makes exactly one delivery attempt per call; retry scheduling
//! belongs to the job queue, not the transport.

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

/// Error from a single delivery attempt.
///
/// The split drives the retry decision: transient failures go back on the
/// queue with backoff, permanent ones fail the job immediately.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// A later attempt may succeed (network failure, gateway overload).
    #[error("transient send failure: {0}")]
    Transient(String),

    /// Retrying cannot help (rejected number, rejected content).
    #[error("permanent send failure: {0}")]
    Permanent(String),
}

/// A channel that can deliver one SMS.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Deliver `body` to the E.164 number `to`.
    ///
    /// `dedup_key` identifies the job across redeliveries; gateways that
    /// support an idempotency reference should pass it through so a crashed
    /// worker's duplicate attempt collapses on their side.
    async fn send(&self, to: &str, body: &str, dedup_key: Uuid) -> Result<(), SendError>;
}

// ---------------------------------------------------------------------------
// HttpSmsGateway
// ---------------------------------------------------------------------------

/// Delivers SMS through a JSON-over-HTTP gateway.
///
/// POSTs `{"to", "body", "reference"}` to the configured endpoint. Any 2xx
/// response counts as accepted-for-delivery; delivery receipts are the
/// gateway's concern.
pub struct HttpSmsGateway {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpSmsGateway {
    /// Create a gateway client with a per-request timeout.
    pub fn new(url: String, api_key: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            url,
            api_key,
        }
    }
}

#[async_trait]
impl Messenger for HttpSmsGateway {
    async fn send(&self, to: &str, body: &str, dedup_key: Uuid) -> Result<(), SendError> {
        let payload = serde_json::json!({
            "to": to,
            "body": body,
            "reference": dedup_key,
        });

        let mut request = self.client.post(&self.url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        // Connection errors and timeouts are worth another try later.
        let response = request
            .send()
            .await
            .map_err(|e| SendError::Transient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Err(SendError::Transient(format!("gateway returned HTTP {status}")))
        } else {
            Err(SendError::Permanent(format!("gateway returned HTTP {status}")))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
