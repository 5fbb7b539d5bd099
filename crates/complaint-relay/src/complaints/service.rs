use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::dispatcher::MailDispatcher;
use super::domain::{
    ComplaintAcknowledgement, ComplaintForm, ComplaintSubmission, DiagnosticResult,
    SubmissionError,
};
use super::relay::MailRelay;

pub const DIAGNOSTIC_REGISTER_NUMBER: &str = "TEST123";
pub const DIAGNOSTIC_COMPLAINT_TEXT: &str =
    "This is a test email to verify the email configuration is working correctly.";

/// Accepted submission plus the handle of its background delivery.
///
/// HTTP handlers drop the handle, which detaches the task.
#[derive(Debug)]
pub struct SubmissionReceipt {
    pub acknowledgement: ComplaintAcknowledgement,
    pub delivery: JoinHandle<bool>,
}

/// Error raised by the complaint service.
#[derive(Debug, thiserror::Error)]
pub enum ComplaintServiceError {
    #[error(transparent)]
    Validation(#[from] SubmissionError),
    #[error("{0}")]
    Internal(String),
}

/// Service pairing the dispatcher with the committee distribution list.
pub struct ComplaintService<R> {
    dispatcher: MailDispatcher<R>,
    committee: Arc<[String]>,
}

impl<R> ComplaintService<R>
where
    R: MailRelay + 'static,
{
    pub fn new(relay: Arc<R>, sender: impl Into<String>, committee: Vec<String>) -> Self {
        Self {
            dispatcher: MailDispatcher::new(relay, sender),
            committee: committee.into(),
        }
    }

    /// Validates the form and hands delivery to a detached task on the current runtime.
    pub fn submit(
        &self,
        form: &ComplaintForm,
    ) -> Result<SubmissionReceipt, ComplaintServiceError> {
        let submission = ComplaintSubmission::from_form(form)?;
        info!(register_number = %submission.register_number, "received complaint");

        let runtime = Handle::try_current().map_err(|err| {
            error!(error = %err, "no runtime available for complaint dispatch");
            ComplaintServiceError::Internal(format!("An error occurred: {err}"))
        })?;

        let dispatcher = self.dispatcher.clone();
        let committee = Arc::clone(&self.committee);
        let delivery = runtime.spawn(async move {
            dispatcher
                .dispatch_submission(&submission, &committee)
                .await
                .succeeded()
        });
        info!("background task added for sending emails");

        Ok(SubmissionReceipt {
            acknowledgement: ComplaintAcknowledgement::for_form(form),
            delivery,
        })
    }

    /// Sends the canned diagnostic report to the sender's own mailbox and waits for it.
    pub async fn test_email(&self) -> Result<DiagnosticResult, ComplaintServiceError> {
        let dispatcher = self.dispatcher.clone();
        let delivered = tokio::spawn(async move {
            let recipients = [dispatcher.sender().to_string()];
            dispatcher
                .send(
                    DIAGNOSTIC_REGISTER_NUMBER,
                    DIAGNOSTIC_COMPLAINT_TEXT,
                    &recipients,
                )
                .await
        })
        .await
        .map_err(|err| {
            error!(error = %err, "test email failed");
            ComplaintServiceError::Internal(format!("Test email failed: {err}"))
        })?;

        Ok(DiagnosticResult::from_delivery(delivered))
    }
}
