//! The Mailgun log transport.
//!
//! [`MailgunTransport`] turns each [`LogRecord`] into one email. Delivery is
//! best-effort: the outcome reported to the caller is always `true`, and a
//! failed send only shows up as a [`TransportEvent::Error`] for subscribers.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::client::{MailClient, SendRequest};
use crate::compose::compose;
use crate::config::{MailgunConfig, Settings};
use crate::error::{ConfigError, DeliveryError};
use crate::events::{EventBus, TransportEvent};
use crate::level::Level;
use crate::mailgun::MailgunClient;
use crate::record::LogRecord;

/// Capability a logging front end needs from a transport.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Registry name (e.g., "mailgun").
    fn name(&self) -> &str;

    /// Minimum level the front end should forward.
    fn level(&self) -> Level;

    /// Whether panics should be forwarded as error records.
    fn handles_exceptions(&self) -> bool {
        false
    }

    /// Handle one record. Resolves once the attempt has completed.
    async fn log(&self, record: LogRecord) -> bool;
}

/// Sends log records as email through Mailgun.
///
/// Cheap to clone; clones share the client and the observer list.
#[derive(Clone)]
pub struct MailgunTransport {
    inner: Arc<Inner>,
}

struct Inner {
    settings: Settings,
    client: Arc<dyn MailClient>,
    events: EventBus,
}

impl std::fmt::Debug for MailgunTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailgunTransport")
            .field("settings", &self.inner.settings)
            .field("client", &self.inner.client.client_name())
            .finish()
    }
}

impl MailgunTransport {
    /// Validate `config` and build a transport backed by [`MailgunClient`].
    pub fn new(config: MailgunConfig) -> Result<Self, ConfigError> {
        let settings = config.resolve()?;
        let client = MailgunClient::from_settings(&settings)?;
        Ok(Self::from_parts(settings, Arc::new(client)))
    }

    /// Validate `config` and build a transport that delivers through `client`.
    pub fn with_client(
        config: MailgunConfig,
        client: Arc<dyn MailClient>,
    ) -> Result<Self, ConfigError> {
        let settings = config.resolve()?;
        Ok(Self::from_parts(settings, client))
    }

    fn from_parts(settings: Settings, client: Arc<dyn MailClient>) -> Self {
        tracing::debug!(
            to = %settings.to,
            from = %settings.from,
            level = %settings.level,
            silent = settings.silent,
            client = client.client_name(),
            "mail transport configured"
        );
        Self {
            inner: Arc::new(Inner {
                settings,
                client,
                events: EventBus::new(),
            }),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Register an observer for `error` and `logged` notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.inner.events.subscribe()
    }

    /// The request that would be sent for `record`.
    pub fn request_for(&self, record: &LogRecord) -> Result<SendRequest, DeliveryError> {
        let settings = &self.inner.settings;
        let composed = compose(&record.message, record.metadata.as_ref())?;
        Ok(SendRequest {
            from: settings.from.clone(),
            to: settings.to.clone(),
            subject: settings.subject.clone(),
            text: composed.text,
            attachment: composed.attachment,
        })
    }

    /// Handle one record and wait for the delivery attempt.
    ///
    /// Always returns `true`. Silent transports return immediately without
    /// sending or emitting anything. The record's level is not compared
    /// with the configured minimum; that is the front end's job.
    pub async fn log(&self, record: LogRecord) -> bool {
        if self.inner.settings.silent {
            return true;
        }

        let events = &self.inner.events;
        let start = std::time::Instant::now();

        match self.request_for(&record) {
            Ok(request) => match self.inner.client.send(&request).await {
                Ok(response) => {
                    tracing::info!(
                        channel = self.inner.client.client_name(),
                        level = %record.level,
                        id = ?response.id,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "log mail delivered"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        channel = self.inner.client.client_name(),
                        level = %record.level,
                        error = %e,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "log mail delivery failed"
                    );
                    events.emit(TransportEvent::Error(Arc::new(e)));
                }
            },
            Err(e) => {
                tracing::warn!(level = %record.level, error = %e, "log mail not sent");
                events.emit(TransportEvent::Error(Arc::new(e)));
            }
        }

        events.emit(TransportEvent::Logged);
        true
    }

    /// Handle one record without waiting on the current tokio runtime. The
    /// handle resolves to `true` when the attempt completes.
    ///
    /// Fails with [`ConfigError::NoRuntime`] outside a runtime; use
    /// [`dispatch_on`](Self::dispatch_on) with an explicit handle there.
    pub fn dispatch(&self, record: LogRecord) -> Result<JoinHandle<bool>, ConfigError> {
        let handle = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;
        Ok(self.dispatch_on(&handle, record))
    }

    /// Like [`dispatch`](Self::dispatch), spawning onto `handle`.
    pub fn dispatch_on(&self, handle: &Handle, record: LogRecord) -> JoinHandle<bool> {
        let this = self.clone();
        handle.spawn(async move { this.log(record).await })
    }
}

#[async_trait::async_trait]
impl Transport for MailgunTransport {
    fn name(&self) -> &str {
        "mailgun"
    }

    fn level(&self) -> Level {
        self.inner.settings.threshold()
    }

    fn handles_exceptions(&self) -> bool {
        self.inner.settings.handle_exceptions
    }

    async fn log(&self, record: LogRecord) -> bool {
        MailgunTransport::log(self, record).await
    }
}
