use std::time::Duration;

use thiserror::Error;

/// Why a provisioning attempt did not produce a meeting link
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProvisionError {
    /// Response was neither JSON nor a redirect
    #[error("Unexpected response format (content type: {content_type})")]
    UnexpectedFormat { content_type: String },

    /// JSON response without authorization URL or meeting link
    #[error("Meeting service response did not contain a meeting link")]
    MissingMeetLink,

    #[error("Meeting service request failed: {0}")]
    Network(String),

    /// Service reported its own error (e.g. calendar insert failed)
    #[error("Meeting service error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("Authorization window was not closed within {}s", .0.as_secs())]
    AuthorizationTimedOut(Duration),

    #[error("Authorization was cancelled")]
    AuthorizationCancelled,

    #[error("Could not open authorization window: {0}")]
    Presenter(String),
}
