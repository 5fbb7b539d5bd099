use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{AsyncSmtpConnection, TlsParameters};
use lettre::transport::smtp::extension::{ClientId, Extension};
use lettre::Message;
use tracing::{debug, info};

use super::relay::{MailRelay, OutgoingMessage, RelayError, RelaySession};
use crate::config::MailConfig;

/// Submission-port relay: plain TCP, upgraded with STARTTLS, then AUTH.
pub struct SmtpRelay {
    host: String,
    port: u16,
    timeout: Duration,
    credentials: Credentials,
    hello_name: ClientId,
}

impl SmtpRelay {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        timeout: Duration,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
            credentials: Credentials::new(username.into(), password.into()),
            hello_name: ClientId::default(),
        }
    }

    pub fn from_config(config: &MailConfig) -> Self {
        Self::new(
            config.relay_host.clone(),
            config.relay_port,
            config.timeout,
            config.sender.clone(),
            config.password.clone(),
        )
    }
}

#[async_trait]
impl MailRelay for SmtpRelay {
    async fn open(&self) -> Result<Box<dyn RelaySession>, RelayError> {
        info!(host = %self.host, port = self.port, "connecting to mail relay");

        let mut connection = AsyncSmtpConnection::connect_tokio1(
            (self.host.as_str(), self.port),
            Some(self.timeout),
            &self.hello_name,
            None,
            None,
        )
        .await
        .map_err(|err| RelayError::Connect(err.to_string()))?;
        debug!("connected to mail relay");

        if !connection
            .server_info()
            .supports_feature(Extension::StartTls)
        {
            connection.abort().await;
            return Err(RelayError::Protocol(
                "relay does not advertise STARTTLS".to_string(),
            ));
        }

        let tls = TlsParameters::new(self.host.clone())
            .map_err(|err| RelayError::Protocol(format!("invalid TLS parameters: {err}")))?;
        connection
            .starttls(tls, &self.hello_name)
            .await
            .map_err(|err| RelayError::Protocol(format!("STARTTLS failed: {err}")))?;
        debug!("TLS enabled");

        connection
            .auth(&[Mechanism::Plain, Mechanism::Login], &self.credentials)
            .await
            .map_err(|err| RelayError::Auth(err.to_string()))?;
        debug!("relay login successful");

        Ok(Box::new(SmtpSession { connection }))
    }
}

struct SmtpSession {
    connection: AsyncSmtpConnection,
}

#[async_trait]
impl RelaySession for SmtpSession {
    async fn deliver(&mut self, message: &OutgoingMessage) -> Result<(), RelayError> {
        let email = build_message(message)?;
        self.connection
            .send(email.envelope(), &email.formatted())
            .await
            .map(|_| ())
            .map_err(|err| classify_send_error(&err))
    }

    async fn close(&mut self) {
        if let Err(err) = self.connection.quit().await {
            debug!(error = %err, "relay QUIT failed");
        }
    }
}

/// Relay replies (4xx/5xx or malformed) are protocol faults; anything else is unexpected.
fn classify_send_error(err: &lettre::transport::smtp::Error) -> RelayError {
    if err.is_permanent() || err.is_transient() || err.is_response() {
        RelayError::Protocol(err.to_string())
    } else {
        RelayError::Unexpected(err.to_string())
    }
}

fn build_message(message: &OutgoingMessage) -> Result<Message, RelayError> {
    let from: Mailbox = message.from.parse().map_err(|err| {
        RelayError::Unexpected(format!("invalid sender '{}': {err}", message.from))
    })?;
    let to: Mailbox = message.to.parse().map_err(|err| {
        RelayError::Unexpected(format!("invalid recipient '{}': {err}", message.to))
    })?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(message.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(message.body.clone())
        .map_err(|err| RelayError::Unexpected(format!("failed to build message: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    fn relay_for(port: u16) -> SmtpRelay {
        SmtpRelay::new(
            "127.0.0.1",
            port,
            Duration::from_secs(5),
            "relay@college.example",
            "app-password",
        )
    }

    fn message(to: &str) -> OutgoingMessage {
        OutgoingMessage {
            from: "relay@college.example".to_string(),
            to: to.to_string(),
            subject: "Ragging Report from (Register number) 21CS045".to_string(),
            body: "Seniors demanded money.".to_string(),
        }
    }

    #[test]
    fn builds_plain_text_message_for_single_recipient() {
        let email = build_message(&message("chair@college.example")).expect("message builds");
        let recipients = email.envelope().to();
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].to_string(), "chair@college.example");

        let formatted = String::from_utf8(email.formatted()).expect("utf8 message");
        assert!(formatted.contains("Subject: Ragging Report from (Register number) 21CS045"));
        assert!(formatted.contains("Content-Type: text/plain"));
    }

    #[test]
    fn malformed_recipient_is_unexpected_fault() {
        let err = build_message(&message("not-an-address")).expect_err("address rejected");
        assert_eq!(err.kind(), "unexpected");
    }

    async fn connect_error(port: u16) -> lettre::transport::smtp::Error {
        match AsyncSmtpConnection::connect_tokio1(
            ("127.0.0.1", port),
            Some(Duration::from_secs(5)),
            &ClientId::default(),
            None,
            None,
        )
        .await
        {
            Ok(_) => panic!("connection should fail"),
            Err(err) => err,
        }
    }

    #[tokio::test]
    async fn relay_rejection_reply_is_protocol_fault() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            socket
                .write_all(b"554 no service\r\n")
                .await
                .expect("rejection");
        });

        let err = connect_error(port).await;
        assert!(err.is_permanent());
        let classified = classify_send_error(&err);
        assert_eq!(classified.kind(), "protocol");
        assert!(classified.to_string().contains("no service"));
        server.await.expect("scripted relay finishes");
    }

    #[tokio::test]
    async fn transport_failure_is_unexpected_fault() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let err = connect_error(port).await;
        assert_eq!(classify_send_error(&err).kind(), "unexpected");
    }

    #[tokio::test]
    async fn refused_connection_is_connect_fault() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let err = match relay_for(port).open().await {
            Ok(_) => panic!("nothing is listening"),
            Err(err) => err,
        };
        assert_eq!(err.kind(), "connect");
    }

    #[tokio::test]
    async fn relay_without_starttls_is_protocol_fault() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.expect("accept");
            let (read, mut write) = socket.into_split();
            let mut lines = BufReader::new(read);
            write
                .write_all(b"220 relay.test ESMTP\r\n")
                .await
                .expect("greeting");

            let mut line = String::new();
            lines.read_line(&mut line).await.expect("ehlo");
            assert!(line.starts_with("EHLO"));
            write
                .write_all(b"250 relay.test\r\n")
                .await
                .expect("ehlo reply");

            loop {
                line.clear();
                match lines.read_line(&mut line).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        if write.write_all(b"221 bye\r\n").await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        let err = match relay_for(port).open().await {
            Ok(_) => panic!("relay lacks STARTTLS"),
            Err(err) => err,
        };
        assert_eq!(err.kind(), "protocol");
        server.await.expect("scripted relay finishes");
    }
}
