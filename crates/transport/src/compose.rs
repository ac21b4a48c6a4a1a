//! Turns a log record into mail text plus an optional attachment.

use serde_json::Value;

use crate::attachment::Attachment;
use crate::error::DeliveryError;
use crate::inspect::inspect;

/// Mail content derived from one log record.
#[derive(Debug, Clone, PartialEq)]
pub struct Composed {
    pub text: String,
    pub attachment: Option<Attachment>,
}

/// Build the mail body for `message` and `metadata`.
///
/// Metadata with content is appended after a blank line, unless it carries
/// a usable `attachment` entry, in which case the attachment is returned and
/// the body stays `message`. A malformed `attachment` entry (neither a path
/// nor an object with `data`) is rendered with the rest of the metadata.
///
/// Fails only when an attachment's `data` cannot be decoded.
pub fn compose(message: &str, metadata: Option<&Value>) -> Result<Composed, DeliveryError> {
    let mut composed = Composed {
        text: message.to_string(),
        attachment: None,
    };

    let Some(meta) = metadata.filter(|m| has_content(m)) else {
        return Ok(composed);
    };

    match meta.get("attachment") {
        Some(Value::String(path)) => {
            composed.attachment = Some(Attachment::path(path));
        }
        Some(Value::Object(obj)) if obj.contains_key("data") => {
            composed.attachment = Some(Attachment::from_object(obj)?);
        }
        _ => {
            composed.text.push_str("\n\n");
            composed.text.push_str(&inspect(meta));
        }
    }

    Ok(composed)
}

/// Null and empty containers carry nothing worth mailing; every other value
/// does, scalars included.
fn has_content(meta: &Value) -> bool {
    match meta {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::{BinaryAttachment, FileAttachment};
    use serde_json::json;

    #[test]
    fn no_metadata_keeps_message() {
        let c = compose("boom", None).unwrap();
        assert_eq!(c.text, "boom");
        assert_eq!(c.attachment, None);
    }

    #[test]
    fn null_and_empty_metadata_keep_message() {
        for meta in [json!(null), json!({}), json!([])] {
            let c = compose("boom", Some(&meta)).unwrap();
            assert_eq!(c.text, "boom", "metadata: {meta}");
            assert_eq!(c.attachment, None);
        }
    }

    #[test]
    fn metadata_is_appended() {
        let meta = json!({"user": "a", "id": 1});
        let c = compose("boom", Some(&meta)).unwrap();
        assert_eq!(c.text, format!("boom\n\n{}", inspect(&meta)));
        assert_eq!(c.text, "boom\n\n{ user: 'a', id: 1 }");
    }

    #[test]
    fn scalar_metadata_is_appended() {
        let c = compose("boom", Some(&json!(42))).unwrap();
        assert_eq!(c.text, "boom\n\n42");
    }

    #[test]
    fn string_attachment_is_a_path() {
        let meta = json!({"attachment": "/tmp/file.txt"});
        let c = compose("boom", Some(&meta)).unwrap();
        assert_eq!(c.text, "boom");
        assert_eq!(c.attachment, Some(Attachment::path("/tmp/file.txt")));
    }

    #[test]
    fn data_attachment_is_binary() {
        let meta = json!({"attachment": {"data": [1, 2, 3]}, "other": true});
        let c = compose("boom", Some(&meta)).unwrap();
        assert_eq!(c.text, "boom");
        assert_eq!(
            c.attachment,
            Some(Attachment::Data(BinaryAttachment::new(vec![1, 2, 3])))
        );
    }

    #[test]
    fn string_data_attachment_is_a_path() {
        let meta = json!({"attachment": {"data": "/var/log/app.log", "filename": "app.txt"}});
        let c = compose("boom", Some(&meta)).unwrap();
        assert_eq!(c.text, "boom");
        assert_eq!(
            c.attachment,
            Some(Attachment::Path(
                FileAttachment::new("/var/log/app.log").with_filename("app.txt")
            ))
        );
    }

    #[test]
    fn malformed_attachment_renders_whole_metadata() {
        let meta = json!({"attachment": {"name": "x"}, "id": 7});
        let c = compose("boom", Some(&meta)).unwrap();
        assert_eq!(c.attachment, None);
        assert_eq!(c.text, "boom\n\n{ attachment: { name: 'x' }, id: 7 }");
    }

    #[test]
    fn undecodable_data_fails() {
        let meta = json!({"attachment": {"data": 3.5}});
        assert!(matches!(
            compose("boom", Some(&meta)),
            Err(DeliveryError::Attachment(_))
        ));
    }
}
