//! Conversation controller
//!
//! Owns the message log, the uncommitted input, and the request lifecycle
//! flags. Everything that mutates a session goes through `on_input_change`,
//! `begin_submit`/`settle`, or `submit`.

use tracing::{debug, info, warn};

use crate::client::{InsightClient, SubmitError};
use crate::state::{Message, FALLBACK_TEXT};

#[derive(Debug, Default)]
pub struct Conversation {
    pending_input: String,
    log: Vec<Message>,
    is_submitting: bool,
    last_submit_succeeded: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> &[Message] {
        &self.log
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn last_submit_succeeded(&self) -> bool {
        self.last_submit_succeeded
    }

    /// Whether the submit affordance should be enabled.
    pub fn can_submit(&self) -> bool {
        !self.is_submitting && !self.pending_input.trim().is_empty()
    }

    /// Replace the uncommitted input. The input is disabled while a request
    /// is in flight, so changes are rejected then.
    pub fn on_input_change(&mut self, text: impl Into<String>) -> bool {
        if self.is_submitting {
            return false;
        }
        self.pending_input = text.into();
        true
    }

    /// Start a submission of the pending input.
    ///
    /// Returns the prompt to send, or `None` if the input is blank or another
    /// submission is still in flight. On `Some`, the user message is already
    /// in the log and the input has been cleared.
    pub fn begin_submit(&mut self) -> Option<String> {
        if self.is_submitting {
            debug!("submit ignored, request already in flight");
            return None;
        }
        if self.pending_input.trim().is_empty() {
            return None;
        }

        self.is_submitting = true;
        self.last_submit_succeeded = false;

        let prompt = std::mem::take(&mut self.pending_input);
        self.log.push(Message::user(prompt.clone()));

        info!(chars = prompt.chars().count(), "submitting question");
        Some(prompt)
    }

    /// Finish the in-flight submission with its outcome. Always appends
    /// exactly one assistant message.
    pub fn settle(&mut self, outcome: Result<String, SubmitError>) {
        if !self.is_submitting {
            warn!("settle called with no submission in flight");
            return;
        }

        match outcome {
            Ok(reply) => {
                info!(chars = reply.chars().count(), "reply received");
                self.log.push(Message::assistant(reply));
                self.last_submit_succeeded = true;
            }
            Err(err) => {
                warn!(kind = err.kind(), error = %err, "submission failed");
                self.log.push(Message::assistant(FALLBACK_TEXT));
            }
        }

        self.is_submitting = false;
    }

    /// Submit the pending input and wait for the reply.
    ///
    /// Returns `None` when nothing was sent, otherwise whether the reply
    /// succeeded.
    pub async fn submit(&mut self, client: &InsightClient) -> Option<bool> {
        let prompt = self.begin_submit()?;
        let outcome = client.ask(&prompt).await;
        self.settle(outcome);
        Some(self.last_submit_succeeded)
    }
}
