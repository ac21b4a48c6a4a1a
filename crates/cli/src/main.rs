//! logmail: send log records as email through Mailgun.
//!
//! - `logmail send -m "..."` mails one record and reports the delivery outcome
//! - `logmail pipe` logs every stdin line through `tracing` with the mail
//!   layer installed, so only lines at or above the minimum level are mailed

mod cli;
mod config;

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use logmail_transport::{
    install_panic_hook, Level, LogRecord, MailLayer, MailgunTransport, TransportEvent,
};

use crate::cli::{CliArgs, Command, PipeLevel};

/// How long to wait for outstanding deliveries before exiting.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let mut config = config::resolve(&args.transport, args.config.as_deref())?;

    match args.command {
        Command::Send {
            level,
            message,
            meta,
            attach,
        } => {
            tracing_subscriber::fmt().with_env_filter(env_filter()).init();

            let transport =
                MailgunTransport::new(config).context("invalid mail transport configuration")?;
            let metadata = build_metadata(meta.as_deref(), attach.as_deref())?;
            send(&transport, LogRecord { level, message, metadata }).await
        }
        Command::Pipe { level, min_level } => {
            if min_level.is_some() {
                config.level = min_level;
            }
            let transport =
                MailgunTransport::new(config).context("invalid mail transport configuration")?;

            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_filter(env_filter()))
                .with(MailLayer::current(transport.clone())?)
                .init();

            if install_panic_hook(transport.clone(), Handle::current()) {
                info!("panics will be mailed");
            }

            pipe(&transport, level).await
        }
    }
}

/// Combine `--meta` JSON and `--attach` into one metadata value.
fn build_metadata(meta: Option<&str>, attach: Option<&str>) -> Result<Option<Value>> {
    let mut metadata = match meta {
        Some(raw) => Some(serde_json::from_str::<Value>(raw).context("--meta is not valid JSON")?),
        None => None,
    };

    if let Some(path) = attach {
        match metadata.get_or_insert_with(|| Value::Object(Default::default())) {
            Value::Object(map) => {
                map.insert("attachment".to_string(), Value::String(path.to_string()));
            }
            _ => bail!("--attach needs --meta to be a JSON object"),
        }
    }

    Ok(metadata)
}

async fn send(transport: &MailgunTransport, record: LogRecord) -> Result<()> {
    let mut events = transport.subscribe();
    transport.log(record).await;

    if transport.settings().silent {
        info!("silent transport, nothing sent");
        return Ok(());
    }

    while let Ok(event) = events.try_recv() {
        if let TransportEvent::Error(e) = event {
            bail!("delivery failed: {e}");
        }
    }
    info!(to = %transport.settings().to, "log mail sent");
    Ok(())
}

async fn pipe(transport: &MailgunTransport, level: PipeLevel) -> Result<()> {
    let mut events = transport.subscribe();
    let mailed = Level::from(tracing::Level::from(level)).passes(transport.settings().threshold())
        && !transport.settings().silent;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut count = 0usize;
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        match level {
            PipeLevel::Error => tracing::error!(target: "stdin", "{line}"),
            PipeLevel::Warn => tracing::warn!(target: "stdin", "{line}"),
            PipeLevel::Info => tracing::info!(target: "stdin", "{line}"),
            PipeLevel::Debug => tracing::debug!(target: "stdin", "{line}"),
            PipeLevel::Trace => tracing::trace!(target: "stdin", "{line}"),
        }
        count += 1;
    }

    if mailed && count > 0 {
        let Drained {
            failed,
            completed,
            missed,
        } = drain(&mut events, count).await;
        if missed > 0 {
            warn!(missed, "delivery outcome unknown for skipped events");
        } else if completed < count {
            warn!(completed, expected = count, "gave up waiting for deliveries");
        }
        if failed > 0 {
            bail!("{failed} of {count} log mails failed");
        }
    }
    Ok(())
}

/// Delivery outcomes observed while draining.
#[derive(Debug, Default, PartialEq, Eq)]
struct Drained {
    failed: usize,
    /// `logged` events actually received.
    completed: usize,
    /// Events dropped because the receiver lagged; their outcome is unknown.
    missed: usize,
}

/// Wait until `expected` records are accounted for, either by a `logged`
/// event or by a skipped event, or until the deadline.
async fn drain(events: &mut broadcast::Receiver<TransportEvent>, expected: usize) -> Drained {
    let mut drained = Drained::default();
    let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;

    while drained.completed + drained.missed < expected {
        match tokio::time::timeout_at(deadline, events.recv()).await {
            Ok(Ok(TransportEvent::Logged)) => drained.completed += 1,
            Ok(Ok(TransportEvent::Error(_))) => drained.failed += 1,
            Ok(Err(broadcast::error::RecvError::Lagged(n))) => {
                warn!(skipped = n, "missed delivery events");
                drained.missed += n as usize;
            }
            Ok(Err(broadcast::error::RecvError::Closed)) | Err(_) => break,
        }
    }
    drained
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_from_meta_and_attach() {
        let meta = build_metadata(Some(r#"{"job":"backup"}"#), Some("/var/log/backup.log"))
            .unwrap()
            .unwrap();
        assert_eq!(
            meta,
            json!({"job": "backup", "attachment": "/var/log/backup.log"})
        );
    }

    #[test]
    fn attach_alone_creates_object() {
        let meta = build_metadata(None, Some("/tmp/a.txt")).unwrap().unwrap();
        assert_eq!(meta, json!({"attachment": "/tmp/a.txt"}));
    }

    #[test]
    fn no_flags_no_metadata() {
        assert_eq!(build_metadata(None, None).unwrap(), None);
    }

    #[test]
    fn attach_with_non_object_meta_fails() {
        assert!(build_metadata(Some("[1,2]"), Some("/tmp/a.txt")).is_err());
        assert!(build_metadata(Some("{not json"), None).is_err());
    }

    #[tokio::test]
    async fn drain_counts_failures() {
        let (tx, mut rx) = broadcast::channel(8);
        tx.send(TransportEvent::Error(std::sync::Arc::new(
            logmail_transport::DeliveryError::Attachment("x".into()),
        )))
        .unwrap();
        tx.send(TransportEvent::Logged).unwrap();
        tx.send(TransportEvent::Logged).unwrap();
        assert_eq!(
            drain(&mut rx, 2).await,
            Drained {
                failed: 1,
                completed: 2,
                missed: 0
            }
        );
    }

    #[tokio::test]
    async fn drain_reports_lag_as_missed_not_completed() {
        let (tx, mut rx) = broadcast::channel(2);
        tx.send(TransportEvent::Error(std::sync::Arc::new(
            logmail_transport::DeliveryError::Attachment("x".into()),
        )))
        .unwrap();
        for _ in 0..3 {
            tx.send(TransportEvent::Logged).unwrap();
        }
        // Capacity 2: the error and one `logged` are overwritten.
        assert_eq!(
            drain(&mut rx, 3).await,
            Drained {
                failed: 0,
                completed: 1,
                missed: 2
            }
        );
    }
}
