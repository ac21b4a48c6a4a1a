//! Mailgun HTTP API client.
//!
//! Sends messages as `multipart/form-data` to
//! `{base}/{domain}/messages`, authenticating with HTTP basic auth
//! (user `api`, password = API key).

use reqwest::multipart::{Form, Part};

use crate::attachment::Attachment;
use crate::client::{MailClient, SendRequest, SendResponse};
use crate::config::Settings;
use crate::error::{ConfigError, DeliveryError};

/// Delivers messages through the Mailgun `messages` endpoint.
///
/// Building one performs no network activity.
pub struct MailgunClient {
    messages_url: String,
    api_key: String,
    /// Shared HTTP client (connection pooling).
    client: reqwest::Client,
}

impl std::fmt::Debug for MailgunClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailgunClient")
            .field("messages_url", &self.messages_url)
            .finish_non_exhaustive()
    }
}

impl MailgunClient {
    /// Build a client from validated settings, applying `proxy` and
    /// `timeout` to the underlying HTTP client.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder();

        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(ref proxy) = settings.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| ConfigError::Invalid(format!("invalid proxy {proxy}: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            messages_url: settings.messages_url(),
            api_key: settings.api_key.clone(),
            client,
        })
    }

    pub fn messages_url(&self) -> &str {
        &self.messages_url
    }
}

async fn attachment_part(attachment: &Attachment) -> Result<Part, DeliveryError> {
    let bytes = match attachment {
        Attachment::Path(file) => tokio::fs::read(&file.path).await.map_err(|e| {
            DeliveryError::Attachment(format!("failed to read {}: {e}", file.path.display()))
        })?,
        Attachment::Data(data) => data.data.clone(),
    };
    let part = Part::bytes(bytes).file_name(attachment.filename());
    match attachment.content_type() {
        Some(ct) => part
            .mime_str(ct)
            .map_err(|e| DeliveryError::Attachment(format!("invalid content type {ct}: {e}"))),
        None => Ok(part),
    }
}

#[async_trait::async_trait]
impl MailClient for MailgunClient {
    async fn send(&self, request: &SendRequest) -> Result<SendResponse, DeliveryError> {
        let mut form = Form::new()
            .text("from", request.from.clone())
            .text("to", request.to.clone())
            .text("text", request.text.clone());

        if let Some(ref subject) = request.subject {
            form = form.text("subject", subject.clone());
        }

        if let Some(ref attachment) = request.attachment {
            form = form.part("attachment", attachment_part(attachment).await?);
        }

        tracing::debug!(
            url = %self.messages_url,
            to = %request.to,
            has_attachment = request.attachment.is_some(),
            "Sending Mailgun message"
        );

        let response = self
            .client
            .post(&self.messages_url)
            .basic_auth("api", Some(&self.api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());

        if !status.is_success() {
            // Mailgun answers errors with `{"message": ...}`, except auth
            // failures which come back as plain text.
            let message = serde_json::from_str::<SendResponse>(&body_text)
                .ok()
                .and_then(|r| r.message)
                .unwrap_or(body_text);
            tracing::warn!(
                url = %self.messages_url,
                %status,
                message = %message,
                "Mailgun returned non-2xx status"
            );
            return Err(DeliveryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: SendResponse = serde_json::from_str(&body_text).unwrap_or_default();
        tracing::debug!(id = ?parsed.id, %status, "Mailgun accepted message");
        Ok(parsed)
    }

    fn client_name(&self) -> &str {
        "mailgun"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MailgunConfig;
    use std::time::Duration;

    fn settings(cfg: MailgunConfig) -> Settings {
        cfg.resolve().unwrap()
    }

    #[test]
    fn messages_url_uses_domain() {
        let client =
            MailgunClient::from_settings(&settings(MailgunConfig::new("a@b.com", "k", "d.com")))
                .unwrap();
        assert_eq!(client.messages_url(), "https://api.mailgun.net/v3/d.com/messages");
        assert_eq!(client.client_name(), "mailgun");
    }

    #[test]
    fn proxy_and_timeout_accepted() {
        let cfg = MailgunConfig::new("a@b.com", "k", "d.com")
            .with_proxy("http://proxy.internal:3128")
            .with_timeout(Duration::from_millis(1500));
        assert!(MailgunClient::from_settings(&settings(cfg)).is_ok());
    }

    #[test]
    fn invalid_proxy_rejected() {
        let cfg = MailgunConfig::new("a@b.com", "k", "d.com").with_proxy("not a url");
        let err = MailgunClient::from_settings(&settings(cfg)).unwrap_err();
        assert!(err.to_string().contains("invalid proxy"), "got: {err}");
    }

    #[test]
    fn debug_hides_api_key() {
        let client = MailgunClient::from_settings(&settings(MailgunConfig::new(
            "a@b.com",
            "key-very-secret",
            "d.com",
        )))
        .unwrap();
        assert!(!format!("{client:?}").contains("key-very-secret"));
    }

    #[tokio::test]
    async fn missing_attachment_file_is_a_delivery_error() {
        let err = attachment_part(&Attachment::path("/definitely/not/here.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Attachment(_)));
    }
}
