//! Error taxonomy for the agent boundary.
//!
//! The executor surfaces exactly three recoverable failure kinds; the chat
//! wrapper retries those and nothing else. Anything it cannot classify is
//! carried as [`AgentError::Other`] and propagates to the caller unchanged.

use thiserror::Error;

/// Failure raised by the agent executor or one of its tools.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A required tool parameter was missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The diagnostic backend (or the model endpoint) could not be reached.
    #[error("{0}")]
    Connectivity(String),

    /// An empty value or a nonexistent device/site was referenced.
    #[error("{0}")]
    Lookup(String),

    /// Unclassified failure. Never recovered by the retry wrapper.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AgentError {
    /// Classify a reqwest error: transport-level failures are connectivity
    /// problems the agent can react to, everything else is unclassified.
    pub fn from_transport(context: &str, err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            AgentError::Connectivity(format!("{context}: {err}"))
        } else {
            AgentError::Other(anyhow::Error::new(err).context(context.to_string()))
        }
    }
}
