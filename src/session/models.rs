//! Data models for session drafts

use serde::{Deserialize, Serialize};

/// How a session is held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    /// Held over a remote meeting link
    Virtual,
    /// Held at a physical location
    Physical,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Virtual => "virtual",
            Self::Physical => "physical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "virtual" => Some(Self::Virtual),
            "physical" => Some(Self::Physical),
            _ => None,
        }
    }
}

/// A session being filled in by the caller.
///
/// Owned by the caller for the whole attempt. Only the provisioning flow
/// touches `meeting_link` and `loading`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDraft {
    /// Virtual or physical
    pub session_type: SessionType,

    /// Meeting title (placeholder applied when absent)
    pub summary: Option<String>,

    /// Physical location (placeholder applied when absent)
    pub location: Option<String>,

    /// Meeting link, set only when provisioning succeeded
    pub meeting_link: Option<String>,

    /// Whether a provisioning attempt is in flight
    pub loading: bool,
}

impl SessionDraft {
    /// Create an empty draft of the given type
    pub fn new(session_type: SessionType) -> Self {
        Self {
            session_type,
            summary: None,
            location: None,
            meeting_link: None,
            loading: false,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn is_virtual(&self) -> bool {
        self.session_type == SessionType::Virtual
    }

    /// Whether the location field has a usable value
    pub fn has_location(&self) -> bool {
        self.location
            .as_deref()
            .map(|l| !l.trim().is_empty())
            .unwrap_or(false)
    }
}
