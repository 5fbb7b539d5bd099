use chrono::{DateTime, Local};

const BANNER_RULE: &str = "=============================";

/// Plain-text report sent to every committee member for one complaint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintReport {
    subject: String,
    body: String,
}

impl ComplaintReport {
    pub fn render(
        register_number: &str,
        complaint_text: &str,
        generated_at: DateTime<Local>,
    ) -> Self {
        let subject = format!("Ragging Report from (Register number) {register_number}");
        let timestamp = generated_at.format("%Y-%m-%d %H:%M:%S");

        let body = format!(
            "ANTI-RAGGING COMPLAINT REPORT\n\
             {BANNER_RULE}\n\
             \n\
             Student Register Number: {register_number}\n\
             Complaint Submitted On: {timestamp}\n\
             \n\
             COMPLAINT DETAILS:\n\
             {complaint_text}\n\
             \n\
             {BANNER_RULE}\n\
             This is an automated message from the College Anti-Ragging Reporting System.\n\
             Please take immediate action as required.\n"
        );

        Self { subject, body }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}
