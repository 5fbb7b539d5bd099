use std::sync::Arc;

use chrono::Local;
use tracing::{error, info};

use super::domain::ComplaintSubmission;
use super::relay::{MailRelay, OutgoingMessage, RelayError};
use super::report::ComplaintReport;

/// A recipient whose individual send failed inside an otherwise healthy session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientFailure {
    pub recipient: String,
    pub error: RelayError,
}

/// Tally of one dispatch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub attempted: usize,
    pub delivered: usize,
    pub failures: Vec<RecipientFailure>,
    /// Set when the session could not be opened; nothing was attempted in that case.
    pub session_error: Option<RelayError>,
}

impl DispatchOutcome {
    pub fn succeeded(&self) -> bool {
        self.delivered > 0
    }
}

/// Renders complaint reports and relays one copy per recipient over a single session.
pub struct MailDispatcher<R> {
    relay: Arc<R>,
    sender: String,
}

impl<R> Clone for MailDispatcher<R> {
    fn clone(&self) -> Self {
        Self {
            relay: Arc::clone(&self.relay),
            sender: self.sender.clone(),
        }
    }
}

impl<R> MailDispatcher<R>
where
    R: MailRelay + 'static,
{
    pub fn new(relay: Arc<R>, sender: impl Into<String>) -> Self {
        Self {
            relay,
            sender: sender.into(),
        }
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Returns `true` when at least one recipient accepted the report.
    pub async fn send(
        &self,
        register_number: &str,
        complaint_text: &str,
        recipients: &[String],
    ) -> bool {
        self.dispatch(register_number, complaint_text, recipients)
            .await
            .succeeded()
    }

    /// Renders the report stamped with the current time and relays it.
    pub async fn dispatch(
        &self,
        register_number: &str,
        complaint_text: &str,
        recipients: &[String],
    ) -> DispatchOutcome {
        let report = ComplaintReport::render(register_number, complaint_text, Local::now());
        self.relay_report(register_number, &report, recipients).await
    }

    /// Relays an accepted submission, stamping the report with the time it was received.
    pub async fn dispatch_submission(
        &self,
        submission: &ComplaintSubmission,
        recipients: &[String],
    ) -> DispatchOutcome {
        let report = ComplaintReport::render(
            &submission.register_number,
            &submission.complaint_text,
            submission.received_at,
        );
        self.relay_report(&submission.register_number, &report, recipients)
            .await
    }

    async fn relay_report(
        &self,
        register_number: &str,
        report: &ComplaintReport,
        recipients: &[String],
    ) -> DispatchOutcome {
        info!(%register_number, recipients = recipients.len(), "starting complaint email dispatch");

        let mut session = match self.relay.open().await {
            Ok(session) => session,
            Err(err) => {
                log_session_error(&err);
                return DispatchOutcome {
                    session_error: Some(err),
                    ..DispatchOutcome::default()
                };
            }
        };
        info!("mail relay session established");

        let mut outcome = DispatchOutcome::default();
        for recipient in recipients {
            outcome.attempted += 1;
            let message = OutgoingMessage {
                from: self.sender.clone(),
                to: recipient.clone(),
                subject: report.subject().to_string(),
                body: report.body().to_string(),
            };

            match session.deliver(&message).await {
                Ok(()) => {
                    info!(%recipient, "complaint email sent");
                    outcome.delivered += 1;
                }
                Err(err) => {
                    error!(%recipient, kind = err.kind(), error = %err, "failed to send complaint email");
                    outcome.failures.push(RecipientFailure {
                        recipient: recipient.clone(),
                        error: err,
                    });
                }
            }
        }
        session.close().await;

        info!(
            delivered = outcome.delivered,
            attempted = outcome.attempted,
            "complaint email dispatch completed"
        );
        outcome
    }
}

fn log_session_error(err: &RelayError) {
    match err {
        RelayError::Auth(detail) => {
            error!(%detail, "email authentication failed");
            error!("check that the relay credential is an application password, not the account password");
        }
        RelayError::Connect(detail) => error!(%detail, "failed to connect to mail relay"),
        RelayError::Protocol(detail) => error!(%detail, "mail relay error occurred"),
        RelayError::Unexpected(detail) => error!(%detail, "unexpected error while sending complaint email"),
    }
}
