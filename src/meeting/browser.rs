//! Consent window backed by the system browser
//!
//! A terminal cannot see when a browser tab closes, so the window counts as
//! closed once the user presses Enter in the terminal.

use std::io::BufRead;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::meeting::authorization::{
    AuthorizationWindow, CompletionSignal, InteractiveAuthorizationPresenter, WindowSpec,
};
use crate::meeting::ProvisionError;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Opens consent URLs with the platform's URL opener
pub struct BrowserPresenter {
    opener: String,
    launch: bool,
    poll_interval: Duration,
}

impl BrowserPresenter {
    pub fn new() -> Self {
        Self {
            opener: default_opener().to_string(),
            launch: true,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Use a specific opener command instead of the platform default
    pub fn with_opener(mut self, opener: impl Into<String>) -> Self {
        self.opener = opener.into();
        self
    }

    /// Only print the URL, do not launch anything
    pub fn print_only(mut self) -> Self {
        self.launch = false;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn opener(&self) -> &str {
        &self.opener
    }

    fn launch_browser(&self, url: &str) -> Result<(), ProvisionError> {
        Command::new(&self.opener)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|e| ProvisionError::Presenter(format!("failed to run {}: {}", self.opener, e)))
    }
}

impl Default for BrowserPresenter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InteractiveAuthorizationPresenter for BrowserPresenter {
    async fn open(&self, spec: &WindowSpec) -> Result<CompletionSignal, ProvisionError> {
        if self.launch {
            self.launch_browser(&spec.url)?;
            debug!(opener = %self.opener, width = spec.width, height = spec.height, "Browser launched");
        }

        eprintln!();
        eprintln!("== {} ==", spec.title);
        eprintln!("Open this URL to continue: {}", spec.url);
        eprintln!("Press Enter here once you have finished or closed the page.");

        Ok(CompletionSignal::poll_window(
            TerminalWindow::spawn(),
            self.poll_interval,
        ))
    }
}

/// Closed once a line (or EOF) arrives on stdin
struct TerminalWindow {
    closed: Arc<AtomicBool>,
}

impl TerminalWindow {
    fn spawn() -> Self {
        let closed = Arc::new(AtomicBool::new(false));
        let flag = closed.clone();

        // Plain thread: a blocking stdin read must not hold up runtime shutdown
        std::thread::spawn(move || {
            let mut line = String::new();
            if let Err(e) = std::io::stdin().lock().read_line(&mut line) {
                warn!(error = %e, "Failed to read from stdin");
            }
            flag.store(true, Ordering::SeqCst);
        });

        Self { closed }
    }
}

impl AuthorizationWindow for TerminalWindow {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn default_opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    }
}
