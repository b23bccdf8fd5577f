//! Meeting module for meetlink
//!
//! Provisions a meeting link for a virtual session:
//!
//! 1. [`RequestBuilder`] turns the session draft into a [`MeetingRequest`]
//! 2. [`MeetingServiceClient`] sends it and classifies the reply into a [`ServiceOutcome`]
//! 3. [`AuthorizationFlowController`] opens a consent window when the service
//!    needs the user to authorize first
//! 4. [`ResultResolver`] writes the link into the draft or reports why it could not
//!
//! [`Provisioner`] wires the four steps together.

mod authorization;
mod browser;
mod client;
mod error;
mod notice;
mod provisioner;
mod request;
mod resolver;

pub use authorization::{
    AuthorizationFlowController, AuthorizationWindow, Cancellation, Canceller, CompletionHandle,
    CompletionSignal, FlowReport, FlowState, InteractiveAuthorizationPresenter, TerminalState,
    WindowSpec,
};
pub use browser::BrowserPresenter;
pub use client::{
    classify, is_structured_content_type, MeetingService, MeetingServiceClient, RawResponse,
    ServiceOutcome,
};
pub use error::ProvisionError;
pub use notice::{Notice, Notifier, RetryPrompt};
pub use provisioner::{ProvisionAttempt, Provisioner};
pub use request::{
    Attendee, AttendeeAddressing, MeetingRequest, PlaceholderEmailAddressing, RequestBuilder,
    MEETING_DURATION_MINUTES,
};
pub use resolver::{Resolution, ResultResolver};
