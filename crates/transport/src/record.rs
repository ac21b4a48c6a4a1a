//! The log record handed to a transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::level::Level;

/// One log event: level, message and optional structured metadata.
///
/// `metadata` may carry an `attachment` entry, either a file path string or
/// an object with a `data` field (see [`crate::attachment`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl LogRecord {
    pub fn new(level: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            message: message.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Parsed level, if the label is one of the known npm levels.
    pub fn severity(&self) -> Option<Level> {
        self.level.parse().ok()
    }
}

impl From<(Level, String)> for LogRecord {
    fn from((level, message): (Level, String)) -> Self {
        Self::new(level.as_str(), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn severity_parses_known_labels() {
        assert_eq!(LogRecord::new("error", "x").severity(), Some(Level::Error));
        assert_eq!(LogRecord::new("custom", "x").severity(), None);
    }

    #[test]
    fn deserializes_without_metadata() {
        let record: LogRecord =
            serde_json::from_value(json!({"level": "info", "message": "hi"})).unwrap();
        assert_eq!(record.metadata, None);
    }
}
