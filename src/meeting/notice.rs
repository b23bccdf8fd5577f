//! User-facing messages emitted while provisioning

use std::fmt;

use crate::meeting::ProvisionError;

/// What the user is told after the authorization window closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPrompt {
    /// Consent window closed. Whether the user granted access is unknown.
    WindowClosed,
    /// Window opened for a redirect the service could not follow by itself
    RedirectHandled,
    /// Status check reported the user is now authorized
    AuthorizationConfirmed,
    /// Status check reported the user is still not authorized
    AuthorizationNotConfirmed,
}

/// A classified message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    AuthorizationRequired { url: String },
    RedirectNeedsAuthorization { url: String },
    Retry(RetryPrompt),
    CreationFailed(ProvisionError),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::AuthorizationRequired { url } => write!(
                f,
                "Authorization with the meeting provider is required. Complete it in the window that just opened: {}",
                url
            ),
            Notice::RedirectNeedsAuthorization { url } => write!(
                f,
                "Please complete the authorization in the window that just opened, then try creating the session again: {}",
                url
            ),
            Notice::Retry(prompt) => match prompt {
                RetryPrompt::WindowClosed => f.write_str(
                    "Please try creating the session again now that you've authorized with the meeting provider.",
                ),
                RetryPrompt::RedirectHandled => f.write_str(
                    "Once the authorization step is complete, try creating the session again.",
                ),
                RetryPrompt::AuthorizationConfirmed => {
                    f.write_str("Authorization confirmed. Please try creating the session again.")
                }
                RetryPrompt::AuthorizationNotConfirmed => f.write_str(
                    "Authorization was not completed. Finish it in the browser, then try creating the session again.",
                ),
            },
            Notice::CreationFailed(error) => match error {
                ProvisionError::MissingMeetLink => f.write_str(
                    "Failed to create meeting link: the service returned no link. Please try again.",
                ),
                ProvisionError::AuthorizationTimedOut(_) => f.write_str(
                    "The authorization window was not closed in time. Complete authorization, then try creating the session again.",
                ),
                ProvisionError::AuthorizationCancelled => f.write_str(
                    "Authorization was cancelled. Try creating the session again when ready.",
                ),
                other => write!(f, "Failed to create meeting link. Please try again. ({})", other),
            },
        }
    }
}

/// Receives notices for display. The UI layer decides how to show them.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_link_has_its_own_message() {
        let generic = Notice::CreationFailed(ProvisionError::Network("refused".into())).to_string();
        let missing = Notice::CreationFailed(ProvisionError::MissingMeetLink).to_string();

        assert!(generic.contains("refused"));
        assert!(missing.contains("returned no link"));
        assert_ne!(generic, missing);
    }

    #[test]
    fn every_retry_prompt_asks_to_try_again() {
        for prompt in [
            RetryPrompt::WindowClosed,
            RetryPrompt::RedirectHandled,
            RetryPrompt::AuthorizationConfirmed,
            RetryPrompt::AuthorizationNotConfirmed,
        ] {
            let message = Notice::Retry(prompt).to_string();
            assert!(message.contains("try creating the session again"), "{}", message);
        }
    }
}
