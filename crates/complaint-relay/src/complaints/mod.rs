//! Complaint intake and committee notification.
//!
//! A submission is validated synchronously and acknowledged at once; the report mail is
//! relayed from a detached task so the caller never waits on the relay. The diagnostic path
//! runs the same dispatcher inline against the sender's own mailbox.

pub mod dispatcher;
pub mod domain;
pub mod relay;
pub mod report;
pub mod router;
pub mod service;
pub mod smtp;

#[cfg(test)]
mod tests;

pub use dispatcher::{DispatchOutcome, MailDispatcher, RecipientFailure};
pub use domain::{
    ComplaintAcknowledgement, ComplaintForm, ComplaintSubmission, DiagnosticResult,
    SubmissionError,
};
pub use relay::{MailRelay, OutgoingMessage, RelayError, RelaySession};
pub use report::ComplaintReport;
pub use router::complaint_router;
pub use service::{
    ComplaintService, ComplaintServiceError, SubmissionReceipt, DIAGNOSTIC_COMPLAINT_TEXT,
    DIAGNOSTIC_REGISTER_NUMBER,
};
pub use smtp::SmtpRelay;
