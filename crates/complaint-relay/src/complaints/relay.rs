use async_trait::async_trait;

/// One message addressed to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Faults raised while talking to the outbound mail relay.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("relay authentication failed: {0}")]
    Auth(String),
    #[error("relay connection failed: {0}")]
    Connect(String),
    #[error("relay protocol error: {0}")]
    Protocol(String),
    #[error("unexpected relay error: {0}")]
    Unexpected(String),
}

impl RelayError {
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Auth(_) => "auth",
            RelayError::Connect(_) => "connect",
            RelayError::Protocol(_) => "protocol",
            RelayError::Unexpected(_) => "unexpected",
        }
    }
}

/// Opens authenticated sessions against an outbound mail relay.
///
/// Every call yields a fresh session; implementations hold no connection between calls.
#[async_trait]
pub trait MailRelay: Send + Sync {
    async fn open(&self) -> Result<Box<dyn RelaySession>, RelayError>;
}

/// An established, authenticated relay connection shared by a batch of messages.
#[async_trait]
pub trait RelaySession: Send {
    async fn deliver(&mut self, message: &OutgoingMessage) -> Result<(), RelayError>;

    /// Ends the session. Failures here are not reported; the batch is already settled.
    async fn close(&mut self);
}
