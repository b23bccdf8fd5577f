use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Settings;
use crate::meeting::authorization::TerminalState;
use crate::meeting::notice::{Notice, Notifier};
use crate::session::SessionDraft;

const DEFAULT_LOCATION: &str = "To be determined";

/// What the caller should do with the session after an attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Go ahead and create the session
    Proceed,
    /// Do not create the session. The user has to start over.
    Abort { message: String },
}

impl Resolution {
    pub fn should_proceed(&self) -> bool {
        matches!(self, Resolution::Proceed)
    }
}

/// Applies a terminal flow state to the session draft
pub struct ResultResolver {
    notifier: Arc<dyn Notifier>,
    default_location: String,
}

impl ResultResolver {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            default_location: DEFAULT_LOCATION.to_string(),
        }
    }

    pub fn from_settings(settings: &Settings, notifier: Arc<dyn Notifier>) -> Self {
        Self::new(notifier).with_default_location(&settings.meeting.default_location)
    }

    pub fn with_default_location(mut self, location: &str) -> Self {
        if !location.trim().is_empty() {
            self.default_location = location.trim().to_string();
        }
        self
    }

    pub fn resolve(&self, draft: &mut SessionDraft, state: TerminalState) -> Resolution {
        draft.loading = false;

        let notice = match state {
            TerminalState::Succeeded { meeting_link } => {
                info!(meeting_link = %meeting_link, "Meeting link assigned");
                draft.meeting_link = Some(meeting_link);
                return Resolution::Proceed;
            }
            TerminalState::AwaitingRetry { prompt } => Notice::Retry(prompt),
            TerminalState::Failed { error } => {
                warn!(error = %error, "Meeting creation failed");
                Notice::CreationFailed(error)
            }
        };

        draft.meeting_link = None;
        self.notifier.notify(&notice);
        Resolution::Abort {
            message: notice.to_string(),
        }
    }

    /// Physical sessions skip provisioning. Fills in the location if unset.
    pub fn resolve_physical(&self, draft: &mut SessionDraft) -> Resolution {
        if !draft.has_location() {
            draft.location = Some(self.default_location.clone());
        }
        draft.meeting_link = None;
        draft.loading = false;
        Resolution::Proceed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meeting::notice::testing::RecordingNotifier;
    use crate::meeting::notice::RetryPrompt;
    use crate::meeting::ProvisionError;
    use crate::session::SessionType;

    fn loading_draft() -> SessionDraft {
        let mut draft = SessionDraft::new(SessionType::Virtual);
        draft.loading = true;
        draft
    }

    #[test]
    fn success_assigns_link_and_clears_loading() {
        let notifier = Arc::new(RecordingNotifier::default());
        let resolver = ResultResolver::new(notifier.clone());
        let mut draft = loading_draft();

        let resolution = resolver.resolve(
            &mut draft,
            TerminalState::Succeeded {
                meeting_link: "https://x".to_string(),
            },
        );

        assert_eq!(resolution, Resolution::Proceed);
        assert_eq!(draft.meeting_link.as_deref(), Some("https://x"));
        assert!(!draft.loading);
        assert!(notifier.notices().is_empty());
    }

    #[test]
    fn retry_aborts_without_link() {
        let notifier = Arc::new(RecordingNotifier::default());
        let resolver = ResultResolver::new(notifier.clone());
        let mut draft = loading_draft();

        let resolution = resolver.resolve(
            &mut draft,
            TerminalState::AwaitingRetry {
                prompt: RetryPrompt::WindowClosed,
            },
        );

        assert!(!resolution.should_proceed());
        assert!(draft.meeting_link.is_none());
        assert!(!draft.loading);
        assert_eq!(notifier.notices(), vec![Notice::Retry(RetryPrompt::WindowClosed)]);
    }

    #[test]
    fn failure_reports_error_message() {
        let notifier = Arc::new(RecordingNotifier::default());
        let resolver = ResultResolver::new(notifier.clone());
        let mut draft = loading_draft();

        let resolution = resolver.resolve(
            &mut draft,
            TerminalState::Failed {
                error: ProvisionError::MissingMeetLink,
            },
        );

        match resolution {
            Resolution::Abort { message } => assert!(message.contains("returned no link")),
            Resolution::Proceed => panic!("expected abort"),
        }
        assert!(!draft.loading);
        assert!(draft.meeting_link.is_none());
    }

    #[test]
    fn physical_without_location_gets_placeholder() {
        let resolver = ResultResolver::new(Arc::new(RecordingNotifier::default()));

        let mut draft = SessionDraft::new(SessionType::Physical);
        assert_eq!(resolver.resolve_physical(&mut draft), Resolution::Proceed);
        assert_eq!(draft.location.as_deref(), Some("To be determined"));

        let mut draft = SessionDraft::new(SessionType::Physical).with_location("");
        resolver.resolve_physical(&mut draft);
        assert_eq!(draft.location.as_deref(), Some("To be determined"));
    }

    #[test]
    fn physical_keeps_given_location() {
        let resolver = ResultResolver::new(Arc::new(RecordingNotifier::default()))
            .with_default_location("Main hall");

        let mut draft = SessionDraft::new(SessionType::Physical).with_location("Lab 2");
        resolver.resolve_physical(&mut draft);
        assert_eq!(draft.location.as_deref(), Some("Lab 2"));

        let mut draft = SessionDraft::new(SessionType::Physical);
        resolver.resolve_physical(&mut draft);
        assert_eq!(draft.location.as_deref(), Some("Main hall"));
    }
}
