//! API request and response types.

use serde::{Deserialize, Serialize};

/// A single user-authored chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// The message text
    pub message: String,
}

/// An alert to forward to the notification channel.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertRequest {
    /// The alert text
    pub alert: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}
