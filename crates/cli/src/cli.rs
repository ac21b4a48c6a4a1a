use clap::{Args, Parser, Subcommand, ValueEnum};
use logmail_transport::MailgunConfig;

/// Send log records as email through Mailgun.
///
/// Settings come from command-line flags, then `MAILGUN_*` environment
/// variables (a `.env` file is loaded first), then the config file.
#[derive(Parser, Debug)]
#[command(name = "logmail", version, about = "Send log records as email through Mailgun")]
pub struct CliArgs {
    /// Path to config file (default: ~/.config/logmail/config.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(flatten)]
    pub transport: TransportArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Transport settings that override environment and config file.
#[derive(Args, Debug, Default)]
pub struct TransportArgs {
    /// Recipient address(es), comma separated
    #[arg(long, global = true)]
    pub to: Option<String>,

    /// Sender address (default: winston@<hostname>)
    #[arg(long, global = true)]
    pub from: Option<String>,

    /// Mail subject
    #[arg(long, global = true)]
    pub subject: Option<String>,

    /// Mailgun API key
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Mailgun sending domain
    #[arg(long, global = true)]
    pub domain: Option<String>,

    /// Mailgun API host, e.g. api.eu.mailgun.net
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Accept records but never send anything (`--silent=false` overrides
    /// the environment and config file)
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub silent: Option<bool>,
}

impl TransportArgs {
    pub fn to_config(&self) -> MailgunConfig {
        MailgunConfig {
            to: self.to.clone(),
            from: self.from.clone(),
            subject: self.subject.clone(),
            api_key: self.api_key.clone(),
            domain: self.domain.clone(),
            host: self.host.clone(),
            timeout: self.timeout,
            silent: self.silent,
            ..MailgunConfig::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a single log record
    Send {
        /// Record level (error, warn, info, http, verbose, debug, silly)
        #[arg(long, default_value = "info")]
        level: String,

        /// Message text
        #[arg(long, short)]
        message: String,

        /// Metadata as a JSON value
        #[arg(long)]
        meta: Option<String>,

        /// File to attach
        #[arg(long)]
        attach: Option<String>,
    },

    /// Mail every stdin line at or above the configured level
    Pipe {
        /// Level each line is logged at
        #[arg(long, value_enum, default_value_t = PipeLevel::Info)]
        level: PipeLevel,

        /// Minimum level that is mailed (overrides config)
        #[arg(long)]
        min_level: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipeLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<PipeLevel> for tracing::Level {
    fn from(level: PipeLevel) -> Self {
        match level {
            PipeLevel::Error => tracing::Level::ERROR,
            PipeLevel::Warn => tracing::Level::WARN,
            PipeLevel::Info => tracing::Level::INFO,
            PipeLevel::Debug => tracing::Level::DEBUG,
            PipeLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_with_global_flags() {
        let args = CliArgs::parse_from([
            "logmail",
            "--to",
            "ops@example.com",
            "send",
            "--level",
            "error",
            "-m",
            "boom",
            "--meta",
            r#"{"id":1}"#,
        ]);
        assert_eq!(args.transport.to.as_deref(), Some("ops@example.com"));
        match args.command {
            Command::Send {
                level, message, meta, ..
            } => {
                assert_eq!(level, "error");
                assert_eq!(message, "boom");
                assert_eq!(meta.as_deref(), Some(r#"{"id":1}"#));
            }
            other => panic!("expected send, got: {other:?}"),
        }
    }

    #[test]
    fn pipe_defaults_to_info() {
        let args = CliArgs::parse_from(["logmail", "pipe"]);
        match args.command {
            Command::Pipe { level, min_level } => {
                assert_eq!(level, PipeLevel::Info);
                assert_eq!(min_level, None);
            }
            other => panic!("expected pipe, got: {other:?}"),
        }
    }

    #[test]
    fn silent_flag_forms() {
        let args = CliArgs::parse_from(["logmail", "pipe"]);
        assert_eq!(args.transport.silent, None);
        let args = CliArgs::parse_from(["logmail", "--silent=false", "pipe"]);
        assert_eq!(args.transport.silent, Some(false));
        let args = CliArgs::parse_from(["logmail", "--silent", "pipe"]);
        assert_eq!(args.transport.silent, Some(true));
    }

    #[test]
    fn transport_args_map_to_config() {
        let args = CliArgs::parse_from(["logmail", "--silent", "--timeout", "500", "pipe"]);
        let cfg = args.transport.to_config();
        assert_eq!(cfg.silent, Some(true));
        assert_eq!(cfg.timeout, Some(500));
        assert_eq!(cfg.to, None);
    }
}
