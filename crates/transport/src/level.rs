//! npm-style severity levels.
//!
//! Lower priority numbers are more severe: `error` is 0, `silly` is 6.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warn,
    #[default]
    Info,
    Http,
    Verbose,
    Debug,
    Silly,
}

impl Level {
    pub const ALL: [Level; 7] = [
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Http,
        Level::Verbose,
        Level::Debug,
        Level::Silly,
    ];

    pub fn priority(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Http => "http",
            Level::Verbose => "verbose",
            Level::Debug => "debug",
            Level::Silly => "silly",
        }
    }

    /// True when a record at `self` passes a threshold of `minimum`.
    pub fn passes(self, minimum: Level) -> bool {
        self.priority() <= minimum.priority()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Level::ALL
            .into_iter()
            .find(|l| l.as_str() == lower)
            .ok_or_else(|| ConfigError::InvalidLevel(s.to_string()))
    }
}

impl Level {
    /// Threshold for a configured level label.
    ///
    /// npm labels map to themselves and syslog labels to their nearest npm
    /// level. Any other label is custom: nothing is known about its
    /// priority, so the threshold passes every record.
    pub fn threshold_for(label: &str) -> Level {
        if let Ok(level) = label.parse() {
            return level;
        }
        match label.trim().to_ascii_lowercase().as_str() {
            "emerg" | "alert" | "crit" => Level::Error,
            "warning" => Level::Warn,
            "notice" => Level::Info,
            _ => Level::Silly,
        }
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::INFO => Level::Info,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::TRACE => Level::Silly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!(" verbose ".parse::<Level>().unwrap(), Level::Verbose);
    }

    #[test]
    fn parse_unknown_level() {
        match "loud".parse::<Level>() {
            Err(ConfigError::InvalidLevel(l)) => assert_eq!(l, "loud"),
            other => panic!("expected InvalidLevel, got: {other:?}"),
        }
    }

    #[test]
    fn ordering_follows_npm_priorities() {
        let priorities: Vec<u8> = Level::ALL.iter().map(|l| l.priority()).collect();
        assert_eq!(priorities, vec![0, 1, 2, 3, 4, 5, 6]);
        assert!(Level::Error < Level::Silly);
    }

    #[test]
    fn threshold_check() {
        assert!(Level::Error.passes(Level::Info));
        assert!(Level::Info.passes(Level::Info));
        assert!(!Level::Debug.passes(Level::Info));
    }

    #[test]
    fn threshold_for_known_syslog_and_custom_labels() {
        assert_eq!(Level::threshold_for("Warn"), Level::Warn);
        assert_eq!(Level::threshold_for("crit"), Level::Error);
        assert_eq!(Level::threshold_for("warning"), Level::Warn);
        assert_eq!(Level::threshold_for("notice"), Level::Info);
        assert_eq!(Level::threshold_for("chatty"), Level::Silly);
        assert!(Level::Silly.passes(Level::threshold_for("chatty")));
    }

    #[test]
    fn tracing_levels_map() {
        assert_eq!(Level::from(tracing::Level::TRACE), Level::Silly);
        assert_eq!(Level::from(tracing::Level::ERROR), Level::Error);
    }
}
