use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::config::Settings;
use crate::meeting::authorization::{
    AuthorizationFlowController, Cancellation, InteractiveAuthorizationPresenter,
};
use crate::meeting::client::MeetingService;
use crate::meeting::notice::Notifier;
use crate::meeting::request::RequestBuilder;
use crate::meeting::resolver::{Resolution, ResultResolver};
use crate::session::SessionDraft;

/// Inputs of one submission that are not part of the draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionAttempt {
    /// Participant registration identifiers, in attendee order
    pub participants: Vec<String>,
    pub start: DateTime<Utc>,
    pub request_id: Option<String>,
}

impl ProvisionAttempt {
    pub fn new(participants: Vec<String>, start: DateTime<Utc>) -> Self {
        Self {
            participants,
            start,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Runs a whole provisioning attempt for a session draft
pub struct Provisioner {
    builder: RequestBuilder,
    service: Arc<dyn MeetingService>,
    controller: AuthorizationFlowController,
    resolver: ResultResolver,
}

impl Provisioner {
    pub fn new(
        builder: RequestBuilder,
        service: Arc<dyn MeetingService>,
        controller: AuthorizationFlowController,
        resolver: ResultResolver,
    ) -> Self {
        Self {
            builder,
            service,
            controller,
            resolver,
        }
    }

    pub fn from_settings(
        settings: &Settings,
        service: Arc<dyn MeetingService>,
        presenter: Arc<dyn InteractiveAuthorizationPresenter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::new(
            RequestBuilder::from_settings(settings),
            service,
            AuthorizationFlowController::from_settings(settings, presenter, notifier.clone()),
            ResultResolver::from_settings(settings, notifier),
        )
    }

    /// Provision a meeting for `draft`, or fill in its location if physical.
    ///
    /// Never retries. On [`Resolution::Abort`] the caller must not create the
    /// session and has to run a new attempt from scratch.
    #[instrument(skip_all, fields(session_type = draft.session_type.as_str()))]
    pub async fn provision(
        &self,
        draft: &mut SessionDraft,
        attempt: &ProvisionAttempt,
        cancel: &mut Cancellation,
    ) -> Resolution {
        if !draft.is_virtual() {
            return self.resolver.resolve_physical(draft);
        }

        draft.loading = true;
        draft.meeting_link = None;

        let request = self.builder.build(
            draft,
            &attempt.participants,
            attempt.start,
            attempt.request_id.as_deref(),
        );

        let report = self
            .controller
            .run(self.service.as_ref(), &request, cancel)
            .await;

        info!(
            states = report.history.len(),
            terminal = report.history.last().map(|s| s.name()).unwrap_or("none"),
            "Provisioning attempt finished"
        );

        self.resolver.resolve(draft, report.terminal)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::meeting::authorization::testing::{FakePresenter, FakeService, WindowBehavior};
    use crate::meeting::client::ServiceOutcome;
    use crate::meeting::notice::testing::RecordingNotifier;
    use crate::meeting::notice::{Notice, RetryPrompt};
    use crate::meeting::ProvisionError;
    use crate::session::SessionType;

    struct Harness {
        service: Arc<FakeService>,
        presenter: Arc<FakePresenter>,
        notifier: Arc<RecordingNotifier>,
        provisioner: Provisioner,
    }

    fn harness(outcome: ServiceOutcome, behavior: WindowBehavior) -> Harness {
        let service = Arc::new(FakeService::new(outcome));
        let presenter = Arc::new(FakePresenter::new(behavior));
        let notifier = Arc::new(RecordingNotifier::default());

        let mut settings = Settings::default();
        settings.window.timeout_secs = 1;

        let provisioner = Provisioner::from_settings(
            &settings,
            service.clone(),
            presenter.clone(),
            notifier.clone(),
        );

        Harness {
            service,
            presenter,
            notifier,
            provisioner,
        }
    }

    fn attempt() -> ProvisionAttempt {
        ProvisionAttempt::new(
            vec!["2021CS01".to_string(), "2021CS02".to_string()],
            Utc.with_ymd_and_hms(2024, 10, 15, 10, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn virtual_success_sets_meeting_link() {
        let h = harness(
            ServiceOutcome::Success {
                meeting_link: "https://x".to_string(),
            },
            WindowBehavior::CloseImmediately,
        );
        let mut draft = SessionDraft::new(SessionType::Virtual);

        let resolution = h
            .provisioner
            .provision(&mut draft, &attempt(), &mut Cancellation::never())
            .await;

        assert_eq!(resolution, Resolution::Proceed);
        assert_eq!(draft.meeting_link.as_deref(), Some("https://x"));
        assert!(!draft.loading);
        assert_eq!(h.service.create_calls(), 1);
    }

    #[tokio::test]
    async fn authorization_required_returns_before_window_closes() {
        let h = harness(
            ServiceOutcome::AuthorizationRequired {
                authorization_url: "https://accounts.example.com/auth".to_string(),
            },
            WindowBehavior::NeverClose,
        );
        let mut draft = SessionDraft::new(SessionType::Virtual);

        let resolution = h
            .provisioner
            .provision(&mut draft, &attempt(), &mut Cancellation::never())
            .await;

        assert!(!resolution.should_proceed());
        assert!(!draft.loading);
        assert!(draft.meeting_link.is_none());

        let opened = h.presenter.opened();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].url, "https://accounts.example.com/auth");
        assert_eq!(h.service.create_calls(), 1);
    }

    #[tokio::test]
    async fn authorization_window_closed_prompts_retry() {
        let h = harness(
            ServiceOutcome::AuthorizationRequired {
                authorization_url: "https://accounts.example.com/auth".to_string(),
            },
            WindowBehavior::CloseImmediately,
        );
        let mut draft = SessionDraft::new(SessionType::Virtual);

        let resolution = h
            .provisioner
            .provision(&mut draft, &attempt(), &mut Cancellation::never())
            .await;

        assert_eq!(
            resolution,
            Resolution::Abort {
                message: Notice::Retry(RetryPrompt::WindowClosed).to_string()
            }
        );
        assert_eq!(
            h.notifier.notices(),
            vec![
                Notice::AuthorizationRequired {
                    url: "https://accounts.example.com/auth".to_string()
                },
                Notice::Retry(RetryPrompt::WindowClosed),
            ]
        );
    }

    #[tokio::test]
    async fn unexpected_format_opens_no_window() {
        let h = harness(
            ServiceOutcome::Failure {
                reason: ProvisionError::UnexpectedFormat {
                    content_type: "text/html".to_string(),
                },
            },
            WindowBehavior::CloseImmediately,
        );
        let mut draft = SessionDraft::new(SessionType::Virtual);

        let resolution = h
            .provisioner
            .provision(&mut draft, &attempt(), &mut Cancellation::never())
            .await;

        assert!(!resolution.should_proceed());
        assert!(h.presenter.opened().is_empty());
        assert!(matches!(
            h.notifier.notices()[0],
            Notice::CreationFailed(ProvisionError::UnexpectedFormat { .. })
        ));
    }

    #[tokio::test]
    async fn physical_session_makes_no_request() {
        let h = harness(
            ServiceOutcome::Success {
                meeting_link: "https://x".to_string(),
            },
            WindowBehavior::CloseImmediately,
        );
        let mut draft = SessionDraft::new(SessionType::Physical);

        let resolution = h
            .provisioner
            .provision(&mut draft, &attempt(), &mut Cancellation::never())
            .await;

        assert_eq!(resolution, Resolution::Proceed);
        assert_eq!(draft.location.as_deref(), Some("To be determined"));
        assert!(draft.meeting_link.is_none());
        assert_eq!(h.service.create_calls(), 0);
    }

    #[tokio::test]
    async fn stale_link_is_cleared_on_failed_retry() {
        let h = harness(
            ServiceOutcome::Failure {
                reason: ProvisionError::MissingMeetLink,
            },
            WindowBehavior::CloseImmediately,
        );
        let mut draft = SessionDraft::new(SessionType::Virtual);
        draft.meeting_link = Some("https://old".to_string());

        h.provisioner
            .provision(&mut draft, &attempt(), &mut Cancellation::never())
            .await;

        assert!(draft.meeting_link.is_none());
    }
}
