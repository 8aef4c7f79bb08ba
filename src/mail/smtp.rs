use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{DeliveryFailure, MailTransport, OutboundMessage, SenderCredentials, TransportFactory};
use crate::config::Config;
use crate::error::{AppError, Result};

/// RFC 4954 replies to a refused AUTH exchange
const AUTH_FAILED_CODES: &[&str] = &["530", "534", "535", "538"];

/// Relay settings from server configuration; credentials arrive per request
#[derive(Debug, Clone)]
pub struct SmtpRelay {
    host: Option<String>,
    port: u16,
    timeout: Duration,
}

impl SmtpRelay {
    pub fn new(config: &Config) -> Self {
        Self {
            host: config.smtp_host.clone(),
            port: config.smtp_port,
            timeout: Duration::from_secs(config.smtp_timeout_seconds),
        }
    }
}

impl TransportFactory for SmtpRelay {
    fn connect(&self, credentials: &SenderCredentials) -> Result<Box<dyn MailTransport>> {
        let host = self
            .host
            .as_deref()
            .ok_or_else(|| AppError::Configuration("SMTP_HOST is not set".to_string()))?;

        let creds = Credentials::new(credentials.email.clone(), credentials.password.clone());

        // 465 wraps the whole session in TLS, other ports upgrade when offered
        let builder = if self.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| AppError::TransportInit(e.to_string()))?
        } else {
            let tls = TlsParameters::new(host.to_string())
                .map_err(|e| AppError::TransportInit(format!("TLS parameters error: {}", e)))?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                .tls(Tls::Opportunistic(tls))
        };

        let transport = builder
            .port(self.port)
            .credentials(creds)
            .timeout(Some(self.timeout))
            .build();

        tracing::debug!(host = %host, port = self.port, "SMTP transport created");

        Ok(Box::new(SmtpSession {
            transport,
            host: host.to_string(),
        }))
    }
}

struct SmtpSession {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
}

#[async_trait]
impl MailTransport for SmtpSession {
    async fn deliver(&self, message: &OutboundMessage) -> std::result::Result<(), DeliveryFailure> {
        let email = build_message(message)?;

        match self.transport.send(email).await {
            Ok(response) => {
                tracing::info!(
                    recipient = %message.to,
                    code = %response.code(),
                    "Email delivered"
                );
                Ok(())
            }
            Err(err) => {
                tracing::error!(
                    recipient = %message.to,
                    error = %err,
                    status = ?err.status().map(|c| c.to_string()),
                    "Email delivery failed"
                );
                Err(classify(&err))
            }
        }
    }

    fn host(&self) -> &str {
        &self.host
    }
}

/// Build the MIME message for one recipient
pub fn build_message(message: &OutboundMessage) -> std::result::Result<Message, DeliveryFailure> {
    let from_address: Address = message
        .from_address
        .parse()
        .map_err(|e| DeliveryFailure::Rejected(format!("Invalid sender address: {}", e)))?;
    let to: Mailbox = message
        .to
        .parse()
        .map_err(|e| DeliveryFailure::Rejected(format!("Invalid recipient address: {}", e)))?;

    let builder = Message::builder()
        .from(Mailbox::new(Some(message.display_name.clone()), from_address))
        .to(to)
        .subject(message.subject.clone());

    let html = SinglePart::html(message.html_body.clone());

    let built = match &message.attachment {
        Some(attachment) => {
            let content_type = ContentType::parse(&attachment.content_type)
                .or_else(|_| ContentType::parse("application/octet-stream"))
                .map_err(|e| DeliveryFailure::Rejected(e.to_string()))?;
            let part = MimeAttachment::new(attachment.filename.clone())
                .body(attachment.content.clone(), content_type);
            builder.multipart(MultiPart::mixed().singlepart(html).singlepart(part))
        }
        None => builder.singlepart(html),
    };

    built.map_err(|e| DeliveryFailure::Rejected(e.to_string()))
}

fn classify(err: &lettre::transport::smtp::Error) -> DeliveryFailure {
    if let Some(code) = err.status() {
        if AUTH_FAILED_CODES.contains(&code.to_string().as_str()) {
            return DeliveryFailure::Authentication {
                response: err.to_string(),
            };
        }
    }

    // Without a reply code, anything but a client or parse error happened on the wire
    let transport_level = err.status().is_none() && !err.is_client() && !err.is_response();
    if err.is_timeout() || err.is_tls() || transport_level || caused_by_io(err) {
        return DeliveryFailure::Connection(err.to_string());
    }

    DeliveryFailure::Rejected(err.to_string())
}

fn caused_by_io(err: &lettre::transport::smtp::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return true;
        }
        source = cause.source();
    }
    false
}
