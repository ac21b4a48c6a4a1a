//! Transport configuration.
//!
//! [`MailgunConfig`] is the raw, user-facing shape: every field optional so
//! it can come from a struct literal, a TOML file or the environment.
//! [`MailgunConfig::resolve`] validates it into [`Settings`], which is what
//! the transport and the Mailgun client actually hold.

use std::env;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::level::Level;

pub const DEFAULT_HOST: &str = "api.mailgun.net";
pub const DEFAULT_PROTOCOL: &str = "https";
pub const DEFAULT_ENDPOINT: &str = "/v3";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_bool(key: &str) -> Option<bool> {
    env_opt(key).map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env_opt(key) {
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env(format!("{key} has an invalid value: {v}"))),
        None => Ok(None),
    }
}

/// Configuration surface of the Mailgun log transport.
///
/// Keys use the camelCase names of the transport options (`to`, `apiKey`,
/// `domain`, `handleExceptions`, ...), so a TOML file reads the same as the
/// options object of a logger setup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MailgunConfig {
    /// Recipient address, or a comma-separated list. Required.
    pub to: Option<String>,
    /// Sender address. Defaults to `winston@<hostname>`.
    pub from: Option<String>,
    /// Minimum level forwarded by the tracing layer. Defaults to `info`.
    /// Labels outside the npm set are kept as given.
    pub level: Option<String>,
    /// Unset means `false`; kept optional so a later source can turn it off.
    pub silent: Option<bool>,
    pub subject: Option<String>,
    pub handle_exceptions: Option<bool>,
    /// Mailgun API key. Required.
    pub api_key: Option<String>,
    /// Mailgun sending domain. Required.
    pub domain: Option<String>,
    pub proxy: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout: Option<u64>,
    pub host: Option<String>,
    pub protocol: Option<String>,
    pub port: Option<u16>,
    pub endpoint: Option<String>,
}

impl MailgunConfig {
    /// Config with the three required fields set and everything else defaulted.
    pub fn new(
        to: impl Into<String>,
        api_key: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            to: Some(to.into()),
            api_key: Some(api_key.into()),
            domain: Some(domain.into()),
            ..Self::default()
        }
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = Some(silent);
        self
    }

    pub fn with_handle_exceptions(mut self, handle: bool) -> Self {
        self.handle_exceptions = Some(handle);
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout.as_millis() as u64);
        self
    }

    /// Point the client at a different API base, e.g. `api.eu.mailgun.net`
    /// or a local test server.
    pub fn with_api_base(
        mut self,
        protocol: impl Into<String>,
        host: impl Into<String>,
        port: Option<u16>,
    ) -> Self {
        self.protocol = Some(protocol.into());
        self.host = Some(host.into());
        self.port = port;
        self
    }

    /// Build config from `MAILGUN_*` environment variables (call
    /// [`load_dotenv`] first).
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            to: env_opt("MAILGUN_TO"),
            from: env_opt("MAILGUN_FROM"),
            level: env_opt("MAILGUN_LEVEL"),
            silent: env_bool("MAILGUN_SILENT"),
            subject: env_opt("MAILGUN_SUBJECT"),
            handle_exceptions: env_bool("MAILGUN_HANDLE_EXCEPTIONS"),
            api_key: env_opt("MAILGUN_API_KEY"),
            domain: env_opt("MAILGUN_DOMAIN"),
            proxy: env_opt("MAILGUN_PROXY"),
            timeout: env_parse("MAILGUN_TIMEOUT")?,
            host: env_opt("MAILGUN_HOST"),
            protocol: env_opt("MAILGUN_PROTOCOL"),
            port: env_parse("MAILGUN_PORT")?,
            endpoint: env_opt("MAILGUN_ENDPOINT"),
        })
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Fill every unset field of `self` from `other`.
    pub fn or(self, other: MailgunConfig) -> Self {
        Self {
            to: self.to.or(other.to),
            from: self.from.or(other.from),
            level: self.level.or(other.level),
            silent: self.silent.or(other.silent),
            subject: self.subject.or(other.subject),
            handle_exceptions: self.handle_exceptions.or(other.handle_exceptions),
            api_key: self.api_key.or(other.api_key),
            domain: self.domain.or(other.domain),
            proxy: self.proxy.or(other.proxy),
            timeout: self.timeout.or(other.timeout),
            host: self.host.or(other.host),
            protocol: self.protocol.or(other.protocol),
            port: self.port.or(other.port),
            endpoint: self.endpoint.or(other.endpoint),
        }
    }

    /// Validate and apply defaults.
    ///
    /// Required fields are checked in order `to`, `apiKey`, `domain`; the
    /// first missing one is reported.
    pub fn resolve(&self) -> Result<Settings, ConfigError> {
        let to = required(self.to.as_deref(), ConfigError::MissingRecipient)?;
        let api_key = required(self.api_key.as_deref(), ConfigError::MissingApiKey)?;
        let domain = required(self.domain.as_deref(), ConfigError::MissingDomain)?;

        let from = match optional(self.from.as_deref())? {
            Some(from) => from,
            None => default_sender(),
        };
        let level = optional(self.level.as_deref())?
            .map(|level| level.trim().to_string())
            .unwrap_or_else(|| Level::default().as_str().to_string());

        let protocol = self
            .protocol
            .as_deref()
            .unwrap_or(DEFAULT_PROTOCOL)
            .trim_end_matches(':')
            .to_ascii_lowercase();
        if protocol != "http" && protocol != "https" {
            return Err(ConfigError::Invalid(format!(
                "unsupported protocol: {protocol}"
            )));
        }
        let host = optional(self.host.as_deref())?.unwrap_or_else(|| DEFAULT_HOST.to_string());
        let endpoint = self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        let endpoint = format!("/{}", endpoint.trim_matches('/'));
        let base_url = match self.port {
            Some(port) => format!("{protocol}://{host}:{port}{endpoint}"),
            None => format!("{protocol}://{host}{endpoint}"),
        };

        Ok(Settings {
            to,
            from,
            level,
            silent: self.silent.unwrap_or(false),
            subject: self.subject.clone(),
            handle_exceptions: self.handle_exceptions.unwrap_or(false),
            api_key,
            domain,
            proxy: optional(self.proxy.as_deref())?,
            timeout: self.timeout.map(Duration::from_millis),
            base_url,
        })
    }
}

/// Validated configuration with defaults applied.
#[derive(Clone, PartialEq)]
pub struct Settings {
    pub to: String,
    pub from: String,
    /// Configured level label, verbatim. See [`Settings::threshold`].
    pub level: String,
    pub silent: bool,
    pub subject: Option<String>,
    pub handle_exceptions: bool,
    pub api_key: String,
    pub domain: String,
    pub proxy: Option<String>,
    pub timeout: Option<Duration>,
    /// API base including the version endpoint, e.g. `https://api.mailgun.net/v3`.
    pub base_url: String,
}

impl Settings {
    /// Minimum level the tracing layer forwards for the configured label.
    pub fn threshold(&self) -> Level {
        Level::threshold_for(&self.level)
    }

    /// URL of the domain's `messages` resource.
    pub fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.base_url, self.domain)
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("to", &self.to)
            .field("from", &self.from)
            .field("level", &self.level)
            .field("silent", &self.silent)
            .field("subject", &self.subject)
            .field("handle_exceptions", &self.handle_exceptions)
            .field("api_key", &"<redacted>")
            .field("domain", &self.domain)
            .field("proxy", &self.proxy)
            .field("timeout", &self.timeout)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// `winston@<hostname>`, the sender used when none is configured.
pub fn default_sender() -> String {
    let host = sysinfo::System::host_name()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string());
    format!("winston@{host}")
}

fn required(value: Option<&str>, missing: ConfigError) -> Result<String, ConfigError> {
    match optional(value)? {
        Some(v) => Ok(v),
        None => Err(missing),
    }
}

fn optional(value: Option<&str>) -> Result<Option<String>, ConfigError> {
    match value.filter(|v| !v.is_empty()) {
        Some(v) => Ok(Some(resolve_env_vars(v)?).filter(|v| !v.is_empty())),
        None => Ok(None),
    }
}

/// Resolve `${VAR_NAME}` patterns in a string using `std::env::var`.
///
/// Returns an error if a referenced variable is not set.
pub fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_name = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '}' {
                    closed = true;
                    break;
                }
                var_name.push(c);
            }
            if !closed {
                return Err(ConfigError::Env(format!(
                    "unclosed env var reference in: {input}"
                )));
            }
            let value = env::var(&var_name)
                .map_err(|_| ConfigError::Env(format!("env var not found: {var_name}")))?;
            result.push_str(&value);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}
