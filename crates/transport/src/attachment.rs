//! Mail attachments taken from log metadata.
//!
//! A string `attachment` entry is a file path, read when the mail is sent.
//! An object entry is built from its `data` field, which may be:
//! - a string: a file path, or base64 content when `encoding` is `"base64"`
//! - an array of byte values (`[104, 105]`)
//! - a serialized buffer (`{"type": "Buffer", "data": [104, 105]}`)
//!
//! Optional `filename` and `contentType` fields apply to both forms.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{Map, Value};

use crate::error::DeliveryError;

const DEFAULT_FILENAME: &str = "file";

#[derive(Debug, Clone, PartialEq)]
pub enum Attachment {
    /// File on disk, read at send time.
    Path(FileAttachment),
    /// In-memory content.
    Data(BinaryAttachment),
}

impl Attachment {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(FileAttachment::new(path))
    }

    /// Build from an attachment object that has a `data` field.
    pub fn from_object(obj: &Map<String, Value>) -> Result<Self, DeliveryError> {
        let data = obj
            .get("data")
            .ok_or_else(|| DeliveryError::Attachment("attachment has no data".to_string()))?;
        let encoding = obj.get("encoding").and_then(Value::as_str);
        let filename = obj.get("filename").and_then(Value::as_str);
        let content_type = obj.get("contentType").and_then(Value::as_str);

        if let (Value::String(path), None) = (data, encoding) {
            let mut file = FileAttachment::new(path);
            file.filename = filename.map(str::to_string);
            file.content_type = content_type.map(str::to_string);
            return Ok(Self::Path(file));
        }

        let mut binary = BinaryAttachment::new(decode_data(data, encoding)?);
        if let Some(name) = filename {
            binary.filename = name.to_string();
        }
        binary.content_type = content_type.map(str::to_string);
        Ok(Self::Data(binary))
    }

    /// File name used for the multipart part.
    pub fn filename(&self) -> String {
        match self {
            Self::Path(file) => file.filename(),
            Self::Data(data) => data.filename.clone(),
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::Path(file) => file.content_type.as_deref(),
            Self::Data(data) => data.content_type.as_deref(),
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(file) => Some(&file.path),
            Self::Data(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileAttachment {
    pub path: PathBuf,
    /// Overrides the path's basename.
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl FileAttachment {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            filename: None,
            content_type: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Explicit `filename`, else the path's basename, else `file`.
    pub fn filename(&self) -> String {
        if let Some(name) = &self.filename {
            return name.clone();
        }
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryAttachment {
    pub data: Vec<u8>,
    pub filename: String,
    pub content_type: Option<String>,
}

impl BinaryAttachment {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            filename: DEFAULT_FILENAME.to_string(),
            content_type: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

fn decode_data(data: &Value, encoding: Option<&str>) -> Result<Vec<u8>, DeliveryError> {
    match data {
        Value::String(s) => match encoding {
            Some(enc) if enc.eq_ignore_ascii_case("base64") => BASE64
                .decode(s.as_bytes())
                .map_err(|e| DeliveryError::Attachment(format!("invalid base64 data: {e}"))),
            Some(enc) => Err(DeliveryError::Attachment(format!(
                "unsupported attachment encoding: {enc}"
            ))),
            None => Err(DeliveryError::Attachment(
                "string data without encoding is a path".to_string(),
            )),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|b| u8::try_from(b).ok())
                    .ok_or_else(|| {
                        DeliveryError::Attachment(format!("invalid byte value: {item}"))
                    })
            })
            .collect(),
        Value::Object(buf) if buf.get("type").and_then(Value::as_str) == Some("Buffer") => {
            match buf.get("data") {
                Some(inner @ Value::Array(_)) => decode_data(inner, None),
                _ => Err(DeliveryError::Attachment(
                    "serialized buffer has no data array".to_string(),
                )),
            }
        }
        other => Err(DeliveryError::Attachment(format!(
            "unsupported attachment data: {other}"
        ))),
    }
}
