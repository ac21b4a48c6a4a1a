//! Log transport that delivers log records as email through Mailgun.
//!
//! This crate provides:
//! - `MailgunTransport`, which turns a log record into one outbound email
//! - `MailClient` trait with the reqwest-based `MailgunClient`
//! - Metadata rendering and attachment handling for mail bodies
//! - `MailLayer`, a `tracing` layer that forwards events to a transport

pub mod attachment;
pub mod client;
pub mod compose;
pub mod config;
pub mod error;
pub mod events;
pub mod inspect;
pub mod layer;
pub mod level;
pub mod mailgun;
pub mod record;
pub mod transport;

pub use client::{MailClient, SendRequest, SendResponse};
pub use config::MailgunConfig;
pub use error::{ConfigError, DeliveryError};
pub use events::TransportEvent;
pub use layer::{install_panic_hook, MailLayer};
pub use level::Level;
pub use record::LogRecord;
pub use transport::{MailgunTransport, Transport};
