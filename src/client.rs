use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Longest slice of an error body kept in a `SubmitError::Status`.
const BODY_EXCERPT_CHARS: usize = 200;

#[derive(Serialize)]
struct ChatRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    reply: String,
}

/// Why a submission produced no reply. The UI shows one fallback text for all
/// of these; the kind is kept for logging.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("could not reach the inference endpoint: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("inference endpoint returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("inference endpoint returned an unexpected body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("request task stopped before reporting: {0}")]
    Interrupted(String),
}

impl SubmitError {
    /// Short tag used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            SubmitError::Transport(_) => "transport",
            SubmitError::Status { .. } => "status",
            SubmitError::MalformedBody(_) => "malformed_body",
            SubmitError::Interrupted(_) => "interrupted",
        }
    }
}

/// Client for the `{prompt} -> {reply}` chat endpoint.
///
/// One call per `ask`; no retries and no timeout beyond reqwest's defaults.
#[derive(Clone, Debug)]
pub struct InsightClient {
    client: Client,
    endpoint: String,
}

impl InsightClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub async fn ask(&self, prompt: &str) -> Result<String, SubmitError> {
        let result = self.post_prompt(prompt).await;
        if let Err(err) = &result {
            debug!(kind = err.kind(), endpoint = %self.endpoint, error = %err, "chat request failed");
        }
        result
    }

    async fn post_prompt(&self, prompt: &str) -> Result<String, SubmitError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequest { prompt })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SubmitError::Status {
                status,
                body: body.chars().take(BODY_EXCERPT_CHARS).collect(),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)?;
        Ok(parsed.reply)
    }
}
