//! `tracing` front end for a [`Transport`].
//!
//! [`MailLayer`] is the dispatch side of the logging framework: it applies
//! the transport's minimum level, turns each event into a [`LogRecord`]
//! (the `message` field becomes the message, every other field goes into
//! the metadata object) and hands it to the transport on a tokio task.
//!
//! Events from the transport itself and from its HTTP stack are never
//! forwarded, otherwise a delivery log line would trigger another mail.

use std::fmt;

use serde_json::{Map, Value};
use tokio::runtime::Handle;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::error::ConfigError;
use crate::level::Level;
use crate::record::LogRecord;
use crate::transport::Transport;

/// Targets whose events are never mailed.
const INTERNAL_TARGETS: &[&str] = &[
    "logmail",
    "logmail_transport",
    "reqwest",
    "hyper",
    "hyper_util",
    "h2",
    "rustls",
];

fn is_internal(target: &str) -> bool {
    INTERNAL_TARGETS.iter().any(|prefix| {
        target == *prefix
            || target
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with("::"))
    })
}

pub struct MailLayer<T> {
    transport: T,
    level: Level,
    handle: Handle,
}

impl<T: Transport + Clone + 'static> MailLayer<T> {
    /// Forward events at or above the transport's level, spawning each
    /// delivery onto `handle`.
    pub fn new(transport: T, handle: Handle) -> Self {
        let level = transport.level();
        Self {
            transport,
            level,
            handle,
        }
    }

    /// Like [`new`](Self::new), using the runtime of the calling context.
    pub fn current(transport: T) -> Result<Self, ConfigError> {
        let handle = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;
        Ok(Self::new(transport, handle))
    }

    pub fn level(&self) -> Level {
        self.level
    }
}

impl<S, T> Layer<S> for MailLayer<T>
where
    S: Subscriber,
    T: Transport + Clone + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_internal(metadata.target()) {
            return;
        }

        let level = Level::from(*metadata.level());
        if !level.passes(self.level) {
            return;
        }

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);
        let record = visitor.into_record(level);

        let transport = self.transport.clone();
        self.handle.spawn(async move {
            transport.log(record).await;
        });
    }
}

#[derive(Default)]
struct RecordVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl RecordVisitor {
    fn into_record(self, level: Level) -> LogRecord {
        let record = LogRecord::new(level.as_str(), self.message.unwrap_or_default());
        if self.fields.is_empty() {
            record
        } else {
            record.with_metadata(Value::Object(self.fields))
        }
    }

    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for RecordVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        self.insert(field, value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{value:?}")));
    }
}

/// Mail panics as `error` records when the transport handles exceptions.
///
/// The previous hook still runs afterwards. Delivery is spawned onto
/// `handle`, so a panic that ends the process may exit before the mail is
/// out. Returns `false` (and installs nothing) when the transport does not
/// handle exceptions.
pub fn install_panic_hook<T: Transport + Clone + 'static>(transport: T, handle: Handle) -> bool {
    if !transport.handles_exceptions() {
        return false;
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "Box<dyn Any>".to_string());
        let location = info.location().map(|l| l.to_string());

        let record = panic_record(&payload, location);
        let transport = transport.clone();
        handle.spawn(async move {
            transport.log(record).await;
        });

        previous(info);
    }));
    true
}

fn panic_record(payload: &str, location: Option<String>) -> LogRecord {
    let thread = std::thread::current();
    let cwd = std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let metadata = serde_json::json!({
        "date": chrono::Utc::now().to_rfc3339(),
        "process": {
            "pid": std::process::id(),
            "argv": std::env::args().collect::<Vec<_>>(),
            "cwd": cwd,
        },
        "thread": thread.name().unwrap_or("<unnamed>"),
        "location": location,
    });

    LogRecord::new(Level::Error.as_str(), format!("uncaughtException: {payload}"))
        .with_metadata(metadata)
}
