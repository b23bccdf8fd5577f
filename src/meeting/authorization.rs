//! Interactive authorization state machine
//!
//! ```text
//! Idle -> RequestSent -> Succeeded
//!                     -> Failed
//!                     -> AuthPending     -> AwaitingRetry | Failed
//!                     -> RedirectPending -> AwaitingRetry | Failed
//! ```
//!
//! The pending states open a consent window and wait for it to close. The
//! wait ends on closure, on timeout, or when the caller cancels. A closed
//! window does not say whether the user granted access, so unless a status
//! check is enabled the flow only asks the user to try again. Nothing here
//! resubmits the original request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::meeting::client::{MeetingService, ServiceOutcome};
use crate::meeting::notice::{Notice, Notifier, RetryPrompt};
use crate::meeting::request::MeetingRequest;
use crate::meeting::ProvisionError;

const DEFAULT_WINDOW_TITLE: &str = "Google Authorization";
const DEFAULT_WINDOW_WIDTH: u32 = 800;
const DEFAULT_WINDOW_HEIGHT: u32 = 600;
const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Where and how to open a consent window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    pub url: String,
    pub title: String,
    pub width: u32,
    pub height: u32,
}

/// A window that can report whether it has been closed
pub trait AuthorizationWindow: Send + Sync {
    fn is_closed(&self) -> bool;
}

/// Completes the matching [`CompletionSignal`]
#[derive(Debug)]
pub struct CompletionHandle {
    tx: oneshot::Sender<()>,
}

impl CompletionHandle {
    pub fn complete(self) {
        let _ = self.tx.send(());
    }
}

/// Resolves once the consent window has closed
#[derive(Debug)]
pub struct CompletionSignal {
    rx: oneshot::Receiver<()>,
}

impl CompletionSignal {
    pub fn channel() -> (CompletionHandle, CompletionSignal) {
        let (tx, rx) = oneshot::channel();
        (CompletionHandle { tx }, CompletionSignal { rx })
    }

    /// Check `window` every `interval` and resolve when it reports closed.
    ///
    /// The polling task stops on its own once the signal is dropped.
    pub fn poll_window<W>(window: W, interval: Duration) -> Self
    where
        W: AuthorizationWindow + 'static,
    {
        let (handle, signal) = Self::channel();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if handle.tx.is_closed() {
                    return;
                }
                if window.is_closed() {
                    handle.complete();
                    return;
                }
            }
        });
        signal
    }

    /// Wait for closure. A dropped handle counts as closed.
    pub async fn closed(self) {
        let _ = self.rx.await;
    }
}

/// Opens consent windows
#[async_trait]
pub trait InteractiveAuthorizationPresenter: Send + Sync {
    async fn open(&self, spec: &WindowSpec) -> Result<CompletionSignal, ProvisionError>;
}

/// Sender half of a cancel channel
#[derive(Debug, Clone)]
pub struct Canceller {
    tx: Arc<watch::Sender<bool>>,
}

impl Canceller {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Lets the caller abandon an authorization wait
#[derive(Debug, Clone)]
pub struct Cancellation {
    rx: watch::Receiver<bool>,
}

impl Cancellation {
    pub fn channel() -> (Canceller, Cancellation) {
        let (tx, rx) = watch::channel(false);
        (Canceller { tx: Arc::new(tx) }, Cancellation { rx })
    }

    /// A cancellation that never fires
    pub fn never() -> Self {
        let (_, cancellation) = Self::channel();
        cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancelled. Pends forever if the canceller is gone.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Where an attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalState {
    Succeeded { meeting_link: String },
    AwaitingRetry { prompt: RetryPrompt },
    Failed { error: ProvisionError },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    RequestSent,
    AuthPending { authorization_url: String },
    RedirectPending { redirect_url: String },
    Succeeded { meeting_link: String },
    AwaitingRetry { prompt: RetryPrompt },
    Failed { error: ProvisionError },
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::RequestSent => "request_sent",
            Self::AuthPending { .. } => "auth_pending",
            Self::RedirectPending { .. } => "redirect_pending",
            Self::Succeeded { .. } => "succeeded",
            Self::AwaitingRetry { .. } => "awaiting_retry",
            Self::Failed { .. } => "failed",
        }
    }
}

impl From<TerminalState> for FlowState {
    fn from(state: TerminalState) -> Self {
        match state {
            TerminalState::Succeeded { meeting_link } => Self::Succeeded { meeting_link },
            TerminalState::AwaitingRetry { prompt } => Self::AwaitingRetry { prompt },
            TerminalState::Failed { error } => Self::Failed { error },
        }
    }
}

/// Terminal state plus every state the attempt passed through
#[derive(Debug, Clone)]
pub struct FlowReport {
    pub terminal: TerminalState,
    pub history: Vec<FlowState>,
}

#[derive(Debug, Clone, Copy)]
enum PendingKind {
    Authorization,
    Redirect,
}

/// Drives one provisioning attempt through the authorization states
pub struct AuthorizationFlowController {
    presenter: Arc<dyn InteractiveAuthorizationPresenter>,
    notifier: Arc<dyn Notifier>,
    window_title: String,
    window_width: u32,
    window_height: u32,
    wait_timeout: Duration,
    verify_after_close: bool,
}

impl AuthorizationFlowController {
    pub fn new(
        presenter: Arc<dyn InteractiveAuthorizationPresenter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            presenter,
            notifier,
            window_title: DEFAULT_WINDOW_TITLE.to_string(),
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            verify_after_close: false,
        }
    }

    pub fn from_settings(
        settings: &Settings,
        presenter: Arc<dyn InteractiveAuthorizationPresenter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::new(presenter, notifier)
            .with_window(
                &settings.window.title,
                settings.window.width,
                settings.window.height,
            )
            .with_timeout(settings.window_timeout())
            .with_verification(settings.service.verify_after_close)
    }

    pub fn with_window(mut self, title: &str, width: u32, height: u32) -> Self {
        self.window_title = title.to_string();
        self.window_width = width;
        self.window_height = height;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Query the service's authorization status after the window closes
    pub fn with_verification(mut self, enabled: bool) -> Self {
        self.verify_after_close = enabled;
        self
    }

    /// Send `request` and follow the outcome to a terminal state
    pub async fn run(
        &self,
        service: &dyn MeetingService,
        request: &MeetingRequest,
        cancel: &mut Cancellation,
    ) -> FlowReport {
        let mut history = vec![FlowState::Idle];

        transition(&mut history, FlowState::RequestSent);
        let terminal = match service.create_meeting(request).await {
            ServiceOutcome::Success { meeting_link } => TerminalState::Succeeded { meeting_link },
            ServiceOutcome::Failure { reason } => TerminalState::Failed { error: reason },
            ServiceOutcome::AuthorizationRequired { authorization_url } => {
                transition(
                    &mut history,
                    FlowState::AuthPending {
                        authorization_url: authorization_url.clone(),
                    },
                );
                self.notifier.notify(&Notice::AuthorizationRequired {
                    url: authorization_url.clone(),
                });
                self.await_window(authorization_url, PendingKind::Authorization, service, cancel)
                    .await
            }
            ServiceOutcome::RedirectPending { redirect_url } => {
                transition(
                    &mut history,
                    FlowState::RedirectPending {
                        redirect_url: redirect_url.clone(),
                    },
                );
                self.notifier.notify(&Notice::RedirectNeedsAuthorization {
                    url: redirect_url.clone(),
                });
                self.await_window(redirect_url, PendingKind::Redirect, service, cancel)
                    .await
            }
        };
        transition(&mut history, terminal.clone().into());

        FlowReport { terminal, history }
    }

    async fn await_window(
        &self,
        url: String,
        kind: PendingKind,
        service: &dyn MeetingService,
        cancel: &mut Cancellation,
    ) -> TerminalState {
        let spec = WindowSpec {
            url,
            title: self.window_title.clone(),
            width: self.window_width,
            height: self.window_height,
        };

        let signal = match self.presenter.open(&spec).await {
            Ok(signal) => signal,
            Err(error) => {
                warn!(error = %error, "Failed to open authorization window");
                return TerminalState::Failed { error };
            }
        };

        debug!(timeout_secs = self.wait_timeout.as_secs(), "Waiting for authorization window");

        tokio::select! {
            closed = tokio::time::timeout(self.wait_timeout, signal.closed()) => match closed {
                Ok(()) => TerminalState::AwaitingRetry {
                    prompt: self.retry_prompt(kind, service).await,
                },
                Err(_) => {
                    warn!("Authorization window wait timed out");
                    TerminalState::Failed {
                        error: ProvisionError::AuthorizationTimedOut(self.wait_timeout),
                    }
                }
            },
            _ = cancel.cancelled() => {
                info!("Authorization wait cancelled");
                TerminalState::Failed {
                    error: ProvisionError::AuthorizationCancelled,
                }
            }
        }
    }

    async fn retry_prompt(&self, kind: PendingKind, service: &dyn MeetingService) -> RetryPrompt {
        let fallback = match kind {
            PendingKind::Authorization => RetryPrompt::WindowClosed,
            PendingKind::Redirect => RetryPrompt::RedirectHandled,
        };

        if !self.verify_after_close {
            return fallback;
        }

        match service.check_authorization().await {
            Ok(true) => RetryPrompt::AuthorizationConfirmed,
            Ok(false) => RetryPrompt::AuthorizationNotConfirmed,
            Err(e) => {
                warn!(error = %e, "Authorization status check failed");
                fallback
            }
        }
    }
}

fn transition(history: &mut Vec<FlowState>, next: FlowState) {
    let from = history.last().map(FlowState::name).unwrap_or("none");
    debug!(from, to = next.name(), "Flow transition");
    history.push(next);
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, Copy)]
    pub enum WindowBehavior {
        CloseImmediately,
        NeverClose,
        FailToOpen,
    }

    /// Presenter that records every window it was asked to open
    pub struct FakePresenter {
        behavior: WindowBehavior,
        opened: Mutex<Vec<WindowSpec>>,
        // Keeps never-closing windows open for the duration of the test
        handles: Mutex<Vec<CompletionHandle>>,
    }

    impl FakePresenter {
        pub fn new(behavior: WindowBehavior) -> Self {
            Self {
                behavior,
                opened: Mutex::new(Vec::new()),
                handles: Mutex::new(Vec::new()),
            }
        }

        pub fn opened(&self) -> Vec<WindowSpec> {
            self.opened.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl InteractiveAuthorizationPresenter for FakePresenter {
        async fn open(&self, spec: &WindowSpec) -> Result<CompletionSignal, ProvisionError> {
            if let WindowBehavior::FailToOpen = self.behavior {
                return Err(ProvisionError::Presenter("no display".to_string()));
            }

            self.opened.lock().unwrap().push(spec.clone());
            let (handle, signal) = CompletionSignal::channel();
            match self.behavior {
                WindowBehavior::CloseImmediately => handle.complete(),
                _ => self.handles.lock().unwrap().push(handle),
            }
            Ok(signal)
        }
    }

    /// Meeting service that replays a fixed outcome
    pub struct FakeService {
        outcome: ServiceOutcome,
        authorized: Option<bool>,
        pub create_calls: AtomicUsize,
        pub check_calls: AtomicUsize,
    }

    impl FakeService {
        pub fn new(outcome: ServiceOutcome) -> Self {
            Self {
                outcome,
                authorized: None,
                create_calls: AtomicUsize::new(0),
                check_calls: AtomicUsize::new(0),
            }
        }

        /// `None` makes the status check fail
        pub fn with_authorization_status(mut self, authorized: Option<bool>) -> Self {
            self.authorized = authorized;
            self
        }

        pub fn create_calls(&self) -> usize {
            self.create_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MeetingService for FakeService {
        async fn create_meeting(&self, _request: &MeetingRequest) -> ServiceOutcome {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }

        async fn check_authorization(&self) -> crate::Result<bool> {
            self.check_calls.fetch_add(1, Ordering::SeqCst);
            self.authorized
                .ok_or_else(|| crate::MeetlinkError::Other("status unavailable".to_string()))
        }
    }
}
