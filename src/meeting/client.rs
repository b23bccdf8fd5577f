use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::Settings;
use crate::meeting::request::MeetingRequest;
use crate::meeting::ProvisionError;
use crate::{MeetlinkError, Result};

/// What one exchange with the meeting service amounted to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceOutcome {
    Success { meeting_link: String },
    AuthorizationRequired { authorization_url: String },
    RedirectPending { redirect_url: String },
    Failure { reason: ProvisionError },
}

#[async_trait]
pub trait MeetingService: Send + Sync {
    /// Ask the service to create a meeting. Never retries.
    async fn create_meeting(&self, request: &MeetingRequest) -> ServiceOutcome;

    /// Ask the service whether the caller has granted calendar access
    async fn check_authorization(&self) -> Result<bool>;
}

/// The parts of an HTTP response that decide its [`ServiceOutcome`]
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    /// Transport followed at least one redirect
    pub redirected: bool,
    /// URL the response finally came from
    pub final_url: String,
    pub body: String,
}

/// True for `application/json` and `*/*+json` media types
pub fn is_structured_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json" || essence.ends_with("+json")
}

/// Classify a response. Checks run in order: format, authorization URL,
/// meeting link, service error.
pub fn classify(raw: &RawResponse) -> ServiceOutcome {
    let structured = raw
        .content_type
        .as_deref()
        .map(is_structured_content_type)
        .unwrap_or(false);

    if !structured {
        if raw.redirected {
            return ServiceOutcome::RedirectPending {
                redirect_url: raw.final_url.clone(),
            };
        }
        return ServiceOutcome::Failure {
            reason: ProvisionError::UnexpectedFormat {
                content_type: raw.content_type.clone().unwrap_or_else(|| "none".to_string()),
            },
        };
    }

    let payload: Value = match serde_json::from_str(&raw.body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Meeting service returned malformed JSON");
            return ServiceOutcome::Failure {
                reason: ProvisionError::UnexpectedFormat {
                    content_type: raw.content_type.clone().unwrap_or_default(),
                },
            };
        }
    };

    if let Some(url) = non_empty_str(&payload, "authorization_url") {
        return ServiceOutcome::AuthorizationRequired {
            authorization_url: url.to_string(),
        };
    }

    if let Some(link) = non_empty_str(&payload, "meet_link") {
        debug!(
            meeting_id = non_empty_str(&payload, "meeting_id").unwrap_or("-"),
            event_id = non_empty_str(&payload, "event_id").unwrap_or("-"),
            "Meeting created"
        );
        return ServiceOutcome::Success {
            meeting_link: link.to_string(),
        };
    }

    if let Some(error) = non_empty_str(&payload, "error") {
        let message = match non_empty_str(&payload, "details") {
            Some(details) => format!("{}: {}", error, details),
            None => error.to_string(),
        };
        return ServiceOutcome::Failure {
            reason: ProvisionError::Service {
                status: raw.status,
                message,
            },
        };
    }

    warn!(status = raw.status, body = %raw.body, "Meeting service response had no meeting link");
    ServiceOutcome::Failure {
        reason: ProvisionError::MissingMeetLink,
    }
}

fn non_empty_str<'a>(payload: &'a Value, field: &str) -> Option<&'a str> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Deserialize)]
struct CheckAuthResponse {
    #[serde(default)]
    is_authorized: bool,
}

/// HTTP client for the meeting service.
///
/// Sends the caller's bearer credential and keeps a cookie store so session
/// cookies set by the service travel with later requests.
pub struct MeetingServiceClient {
    http: Client,
    create_url: Url,
    check_auth_url: Url,
    token: SecretString,
}

impl MeetingServiceClient {
    pub fn new(
        create_url: &str,
        check_auth_url: &str,
        token: SecretString,
        timeout: Duration,
    ) -> Result<Self> {
        let create_url = parse_url(create_url)?;
        let check_auth_url = parse_url(check_auth_url)?;

        let http = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            http,
            create_url,
            check_auth_url,
            token,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let token = settings.auth.token.trim().to_string();
        if token.is_empty() {
            return Err(MeetlinkError::Config(
                "Meeting service token is missing. Set auth.token in config or MEETLINK_AUTH_TOKEN."
                    .to_string(),
            ));
        }

        Self::new(
            &settings.create_url(),
            &settings.check_auth_url(),
            SecretString::from(token),
            settings.request_timeout(),
        )
    }

    async fn read_response(
        &self,
        response: reqwest::Response,
    ) -> std::result::Result<RawResponse, reqwest::Error> {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let redirected = response.url() != &self.create_url;
        let final_url = response.url().to_string();
        let body = response.text().await?;

        Ok(RawResponse {
            status,
            content_type,
            redirected,
            final_url,
            body,
        })
    }
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url)
        .map_err(|e| MeetlinkError::Config(format!("Invalid meeting service URL '{}': {}", url, e)))
}

#[async_trait]
impl MeetingService for MeetingServiceClient {
    #[instrument(skip(self, request), fields(attendees = request.attendees.len()))]
    async fn create_meeting(&self, request: &MeetingRequest) -> ServiceOutcome {
        let sent = self
            .http
            .post(self.create_url.clone())
            .bearer_auth(self.token.expose_secret())
            .json(request)
            .send()
            .await;

        let raw = match sent {
            Ok(response) => self.read_response(response).await,
            Err(e) => Err(e),
        };

        let raw = match raw {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Meeting service request failed");
                return ServiceOutcome::Failure {
                    reason: ProvisionError::Network(e.to_string()),
                };
            }
        };

        let outcome = classify(&raw);
        info!(
            status = raw.status,
            redirected = raw.redirected,
            outcome = outcome_name(&outcome),
            "Meeting service responded"
        );
        outcome
    }

    #[instrument(skip(self))]
    async fn check_authorization(&self) -> Result<bool> {
        let response = self
            .http
            .get(self.check_auth_url.clone())
            .bearer_auth(self.token.expose_secret())
            .send()
            .await?
            .error_for_status()?;

        let payload: CheckAuthResponse = response.json().await?;
        debug!(is_authorized = payload.is_authorized, "Authorization status");
        Ok(payload.is_authorized)
    }
}

fn outcome_name(outcome: &ServiceOutcome) -> &'static str {
    match outcome {
        ServiceOutcome::Success { .. } => "success",
        ServiceOutcome::AuthorizationRequired { .. } => "authorization_required",
        ServiceOutcome::RedirectPending { .. } => "redirect_pending",
        ServiceOutcome::Failure { .. } => "failure",
    }
}
