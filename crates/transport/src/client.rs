//! Mail delivery client trait and the request/response shapes it exchanges.

use serde::Deserialize;

use crate::attachment::Attachment;
use crate::error::DeliveryError;

/// One outbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct SendRequest {
    pub from: String,
    pub to: String,
    /// Sent verbatim; omitted from the request when `None`.
    pub subject: Option<String>,
    pub text: String,
    pub attachment: Option<Attachment>,
}

/// Acknowledgement returned by the delivery API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SendResponse {
    /// Provider message id, e.g. `<20240101.1@mg.example.com>`.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Trait for remote mail delivery implementations.
///
/// Implementations hold no per-call state; one instance is shared by every
/// in-flight send.
#[async_trait::async_trait]
pub trait MailClient: Send + Sync {
    async fn send(&self, request: &SendRequest) -> Result<SendResponse, DeliveryError>;

    /// Human-readable name for this client (e.g., "mailgun").
    fn client_name(&self) -> &str;
}
