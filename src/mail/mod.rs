pub mod smtp;

pub use smtp::SmtpRelay;

use std::fmt;

use async_trait::async_trait;

use crate::error::Result;

/// Sender identity taken fresh from each send request, never persisted
#[derive(Clone)]
pub struct SenderCredentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for SenderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
    pub content_type: String,
}

/// A single message addressed to one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub from_address: String,
    pub display_name: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub attachment: Option<Attachment>,
}

/// Why a single delivery attempt failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryFailure {
    #[error("authentication rejected (server: {response})")]
    Authentication { response: String },

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("{0}")]
    Rejected(String),
}

/// One authenticated session with the relay, reused for every recipient of a batch
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, message: &OutboundMessage) -> std::result::Result<(), DeliveryFailure>;

    /// Host name shown in connection failure hints
    fn host(&self) -> &str;
}

/// Builds a transport from the caller-supplied credentials
pub trait TransportFactory: Send + Sync {
    fn connect(&self, credentials: &SenderCredentials) -> Result<Box<dyn MailTransport>>;
}
