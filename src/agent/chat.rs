//! Chat wrapper: bounded retry with error resynthesis.
//!
//! When a reasoning pass fails with one of the three recoverable kinds, the
//! failure is rephrased as a message and fed back to the executor as if the
//! user had sent it, giving the agent a chance to self-correct (for example by
//! re-querying the device list). The bound is the attempt counter, not
//! semantic progress: a second, unrelated failure still consumes the
//! remaining budget.

use std::sync::Arc;

use tracing::{error, info};

use crate::error::AgentError;

use super::executor::AgentInvoker;

/// Retries after the initial attempt; at most three invocations total.
const MAX_RETRIES: usize = 2;

/// The conversational front door over the agent executor.
pub struct ChatAgent {
    executor: Arc<dyn AgentInvoker>,
}

impl ChatAgent {
    pub fn new(executor: Arc<dyn AgentInvoker>) -> Self {
        Self { executor }
    }

    /// Handle one chat turn.
    ///
    /// Returns `Ok` with either the agent's answer or, once retries are
    /// exhausted, a literal string beginning with `ERROR: ` - callers must
    /// treat both as valid textual responses. Only unclassified failures
    /// come back as `Err`.
    pub async fn chat(&self, message: &str) -> Result<String, AgentError> {
        let mut input = message.to_string();
        let mut attempts = 0;

        loop {
            info!("CHAT_SENT_TO_LLM: {input}");

            let err = match self.executor.invoke(&input).await {
                Ok(output) => return Ok(output),
                Err(err) => err,
            };

            let synthesized = match &err {
                AgentError::Validation(detail) => format!(
                    "ERROR: You missed a parameter invoking the function. \
                     See for the information missing: {detail}"
                ),
                AgentError::Connectivity(detail) => format!("ERROR: Unable to connect. {detail}"),
                AgentError::Lookup(detail) => format!(
                    "ERROR: You provided an empty value or a device that doesn't exist. {detail}"
                ),
                AgentError::Other(_) => return Err(err),
            };

            if attempts < MAX_RETRIES {
                error!("{synthesized}");
                input = synthesized;
                attempts += 1;
            } else {
                error!("retries exhausted: {err}");
                return Ok(format!("ERROR: {err}"));
            }
        }
    }
}
