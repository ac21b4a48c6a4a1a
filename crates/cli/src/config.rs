use anyhow::{Context, Result};
use logmail_transport::config::load_dotenv;
use logmail_transport::MailgunConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cli::TransportArgs;

/// Return the default config file path: ~/.config/logmail/config.toml
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("could not determine user config directory")?
        .join("logmail");
    Ok(config_dir.join("config.toml"))
}

/// Load the config file at `path`, or the default path.
/// Returns an empty config if the file does not exist.
pub fn load_file(path: Option<&str>) -> Result<MailgunConfig> {
    let config_path = match path {
        Some(p) => PathBuf::from(p),
        None => default_config_path()?,
    };
    read_if_exists(&config_path)
}

fn read_if_exists(config_path: &Path) -> Result<MailgunConfig> {
    if config_path.exists() {
        debug!(?config_path, "Loading config");
        MailgunConfig::from_toml_file(config_path)
            .with_context(|| format!("failed to load config: {}", config_path.display()))
    } else {
        debug!(?config_path, "Config file not found, using environment only");
        Ok(MailgunConfig::default())
    }
}

/// Resolve transport settings.
/// Priority: cli flags > env vars > config file.
pub fn resolve(args: &TransportArgs, path: Option<&str>) -> Result<MailgunConfig> {
    load_dotenv();
    let env = MailgunConfig::from_env().context("invalid MAILGUN_* environment")?;
    let file = load_file(path)?;
    Ok(args.to_config().or(env).or(file))
}
