//! Meeting creation request payload

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::config::Settings;
use crate::session::SessionDraft;

/// Every provisioned meeting lasts exactly this long
pub const MEETING_DURATION_MINUTES: i64 = 60;

const DEFAULT_SUMMARY: &str = "Mentoring Session";
const DEFAULT_DESCRIPTION: &str = "Scheduled mentoring session";
const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";
const DEFAULT_ATTENDEE_DOMAIN: &str = "example.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attendee {
    pub email: String,
}

/// Body of the meeting creation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeetingRequest {
    pub summary: String,
    pub description: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub end_time: DateTime<Utc>,
    pub timezone: String,
    pub attendees: Vec<Attendee>,
    /// Conference creation key forwarded to the calendar provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl MeetingRequest {
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Maps a participant registration identifier to an attendee.
///
/// Registration identifiers are not addresses, so every implementation is a
/// guess until the session feature stores real contact details.
pub trait AttendeeAddressing: Send + Sync {
    fn address_for(&self, registration_id: &str) -> Attendee;
}

/// `REG123` -> `REG123@<domain>`. Not guaranteed to be deliverable.
#[derive(Debug, Clone)]
pub struct PlaceholderEmailAddressing {
    domain: String,
}

impl PlaceholderEmailAddressing {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }
}

impl Default for PlaceholderEmailAddressing {
    fn default() -> Self {
        Self::new(DEFAULT_ATTENDEE_DOMAIN)
    }
}

impl AttendeeAddressing for PlaceholderEmailAddressing {
    fn address_for(&self, registration_id: &str) -> Attendee {
        Attendee {
            email: format!("{}@{}", registration_id, self.domain),
        }
    }
}

/// Builds a fresh [`MeetingRequest`] per submission attempt
pub struct RequestBuilder {
    default_summary: String,
    description: String,
    timezone: String,
    addressing: Box<dyn AttendeeAddressing>,
}

impl RequestBuilder {
    pub fn new(addressing: Box<dyn AttendeeAddressing>) -> Self {
        Self {
            default_summary: DEFAULT_SUMMARY.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            addressing,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let meeting = &settings.meeting;
        Self::new(Box::new(PlaceholderEmailAddressing::new(
            meeting.attendee_domain.trim(),
        )))
        .with_default_summary(&meeting.summary)
        .with_description(&meeting.description)
        .with_timezone(&meeting.timezone)
    }

    pub fn with_default_summary(mut self, summary: &str) -> Self {
        if !summary.trim().is_empty() {
            self.default_summary = summary.trim().to_string();
        }
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_timezone(mut self, timezone: &str) -> Self {
        if !timezone.trim().is_empty() {
            self.timezone = timezone.trim().to_string();
        }
        self
    }

    /// Build the request for a virtual session starting at `start`
    pub fn build(
        &self,
        draft: &SessionDraft,
        participants: &[String],
        start: DateTime<Utc>,
        request_id: Option<&str>,
    ) -> MeetingRequest {
        let summary = draft
            .summary
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.default_summary)
            .to_string();

        MeetingRequest {
            summary,
            description: self.description.clone(),
            start_time: start,
            end_time: start + Duration::minutes(MEETING_DURATION_MINUTES),
            timezone: self.timezone.clone(),
            attendees: participants
                .iter()
                .map(|id| self.addressing.address_for(id))
                .collect(),
            request_id: request_id.map(str::to_string),
        }
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new(Box::new(PlaceholderEmailAddressing::default()))
    }
}
