//! Error types for transport construction and mail delivery.

/// Errors raised while building a transport. A transport is never
/// constructed when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("recipient required")]
    MissingRecipient,

    #[error("api credential required")]
    MissingApiKey,

    #[error("api domain required")]
    MissingDomain,

    #[error("unknown log level: {0}")]
    InvalidLevel(String),

    #[error("environment variable error: {0}")]
    Env(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no tokio runtime available to dispatch log mail")]
    NoRuntime,
}

/// Errors from a single delivery attempt. These only ever reach observers
/// through [`crate::events::TransportEvent::Error`].
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mailgun API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("attachment error: {0}")]
    Attachment(String),
}

impl DeliveryError {
    /// HTTP status reported by the API, if the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Attachment(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_field_messages() {
        assert_eq!(ConfigError::MissingRecipient.to_string(), "recipient required");
        assert_eq!(ConfigError::MissingApiKey.to_string(), "api credential required");
        assert_eq!(ConfigError::MissingDomain.to_string(), "api domain required");
    }

    #[test]
    fn api_error_exposes_status() {
        let err = DeliveryError::Api {
            status: 401,
            message: "Forbidden".to_string(),
        };
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "Mailgun API returned 401: Forbidden");
        assert_eq!(DeliveryError::Attachment("x".into()).status(), None);
    }
}
