use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Raw form fields as posted by the reporting page. Absent fields deserialize as empty
/// strings so they fail validation the same way blank ones do.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ComplaintForm {
    #[serde(default)]
    pub register_number: String,
    #[serde(default)]
    pub complaint_text: String,
}

/// A validated complaint, alive only while its report is rendered and relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintSubmission {
    pub register_number: String,
    pub complaint_text: String,
    pub received_at: DateTime<Local>,
}

impl ComplaintSubmission {
    pub fn from_form(form: &ComplaintForm) -> Result<Self, SubmissionError> {
        Self::from_form_at(form, Local::now())
    }

    pub fn from_form_at(
        form: &ComplaintForm,
        received_at: DateTime<Local>,
    ) -> Result<Self, SubmissionError> {
        let register_number = form.register_number.trim();
        if register_number.is_empty() {
            return Err(SubmissionError::EmptyRegisterNumber);
        }

        let complaint_text = form.complaint_text.trim();
        if complaint_text.is_empty() {
            return Err(SubmissionError::EmptyComplaintText);
        }

        Ok(Self {
            register_number: register_number.to_string(),
            complaint_text: complaint_text.to_string(),
            received_at,
        })
    }
}

/// Client input faults raised before a submission is accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("Register number cannot be empty")]
    EmptyRegisterNumber,
    #[error("Complaint text cannot be empty")]
    EmptyComplaintText,
}

/// Immediate reply to an accepted submission. Delivery has not happened yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintAcknowledgement {
    pub status: String,
    pub message: String,
    pub register_number: String,
    pub complaint_message: String,
}

impl ComplaintAcknowledgement {
    pub const MESSAGE: &'static str = "Complaint received. Email is being sent in the background.";

    /// Echoes the fields exactly as they were posted.
    pub fn for_form(form: &ComplaintForm) -> Self {
        Self {
            status: "success".to_string(),
            message: Self::MESSAGE.to_string(),
            register_number: form.register_number.clone(),
            complaint_message: form.complaint_text.clone(),
        }
    }
}

/// Result of the diagnostic send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticResult {
    pub status: String,
    pub message: String,
}

impl DiagnosticResult {
    pub fn from_delivery(delivered: bool) -> Self {
        if delivered {
            Self {
                status: "success".to_string(),
                message: "Test email sent successfully".to_string(),
            }
        } else {
            Self {
                status: "error".to_string(),
                message: "Failed to send test email".to_string(),
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}
