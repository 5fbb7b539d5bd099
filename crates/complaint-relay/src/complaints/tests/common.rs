use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::complaints::relay::{MailRelay, OutgoingMessage, RelayError, RelaySession};
use crate::complaints::{ComplaintForm, ComplaintService};

pub(super) const SENDER: &str = "relay@college.example";

pub(super) fn committee() -> Vec<String> {
    vec![
        "chair@college.example".to_string(),
        "warden@college.example".to_string(),
        "dean@college.example".to_string(),
        "counsellor@college.example".to_string(),
    ]
}

pub(super) fn form(register_number: &str, complaint_text: &str) -> ComplaintForm {
    ComplaintForm {
        register_number: register_number.to_string(),
        complaint_text: complaint_text.to_string(),
    }
}

/// In-memory relay that records every attempted message and fails on demand.
#[derive(Default)]
pub(super) struct ScriptedRelay {
    open_error: Option<RelayError>,
    failing: HashSet<String>,
    attempts: Arc<Mutex<Vec<OutgoingMessage>>>,
    opened: AtomicUsize,
    closed: Arc<AtomicUsize>,
}

impl ScriptedRelay {
    pub(super) fn healthy() -> Self {
        Self::default()
    }

    pub(super) fn refusing(error: RelayError) -> Self {
        Self {
            open_error: Some(error),
            ..Self::default()
        }
    }

    pub(super) fn failing_for(recipients: &[&str]) -> Self {
        Self {
            failing: recipients.iter().map(|r| r.to_string()).collect(),
            ..Self::default()
        }
    }

    pub(super) fn attempts(&self) -> Vec<OutgoingMessage> {
        self.attempts.lock().expect("attempts mutex poisoned").clone()
    }

    pub(super) fn attempted_recipients(&self) -> Vec<String> {
        self.attempts().into_iter().map(|message| message.to).collect()
    }

    pub(super) fn sessions_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub(super) fn sessions_closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailRelay for ScriptedRelay {
    async fn open(&self) -> Result<Box<dyn RelaySession>, RelayError> {
        if let Some(error) = &self.open_error {
            return Err(error.clone());
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            failing: self.failing.clone(),
            attempts: Arc::clone(&self.attempts),
            closed: Arc::clone(&self.closed),
        }))
    }
}

struct ScriptedSession {
    failing: HashSet<String>,
    attempts: Arc<Mutex<Vec<OutgoingMessage>>>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl RelaySession for ScriptedSession {
    async fn deliver(&mut self, message: &OutgoingMessage) -> Result<(), RelayError> {
        self.attempts
            .lock()
            .expect("attempts mutex poisoned")
            .push(message.clone());
        if self.failing.contains(&message.to) {
            return Err(RelayError::Protocol(format!(
                "550 mailbox unavailable: {}",
                message.to
            )));
        }
        Ok(())
    }

    async fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Relay whose session setup panics, standing in for a crashed dispatch task.
pub(super) struct PanickingRelay;

#[async_trait]
impl MailRelay for PanickingRelay {
    async fn open(&self) -> Result<Box<dyn RelaySession>, RelayError> {
        panic!("relay client crashed");
    }
}

pub(super) fn build_service(relay: ScriptedRelay) -> (Arc<ComplaintService<ScriptedRelay>>, Arc<ScriptedRelay>) {
    let relay = Arc::new(relay);
    let service = Arc::new(ComplaintService::new(
        Arc::clone(&relay),
        SENDER,
        committee(),
    ));
    (service, relay)
}

pub(super) fn form_request(uri: &str, body: &str) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post(uri)
        .header(
            axum::http::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(axum::body::Body::from(body.to_string()))
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
