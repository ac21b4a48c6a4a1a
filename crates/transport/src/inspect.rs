//! Human-readable rendering of structured metadata for mail bodies.
//!
//! Output follows the familiar object-literal style:
//!
//! ```text
//! { user: 'a', id: 1, tags: [ 'x', 'y' ] }
//! ```
//!
//! Nesting deeper than the configured depth collapses to `[Object]` or
//! `[Array]`. Containers whose single-line form would exceed
//! [`BREAK_LENGTH`] are spread over several lines, two spaces per level.

use serde_json::Value;

/// Nesting depth expanded in mail bodies.
pub const DEFAULT_DEPTH: usize = 5;

/// Line width a single-line container must fit in, counting its indent and
/// a fixed allowance for the surrounding context.
pub const BREAK_LENGTH: usize = 80;

/// Columns reserved for the key or prefix that precedes a container.
const CONTEXT_ALLOWANCE: usize = 10;

/// Render `value` with [`DEFAULT_DEPTH`].
pub fn inspect(value: &Value) -> String {
    inspect_with_depth(value, DEFAULT_DEPTH)
}

pub fn inspect_with_depth(value: &Value, depth: usize) -> String {
    format_value(value, 0, depth, 0)
}

fn format_value(value: &Value, level: usize, depth: usize, indent: usize) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        Value::Array(items) => {
            if items.is_empty() {
                return "[]".to_string();
            }
            if level > depth {
                return "[Array]".to_string();
            }
            let entries: Vec<String> = items
                .iter()
                .map(|item| format_value(item, level + 1, depth, indent + 2))
                .collect();
            reduce(entries, '[', ']', indent)
        }
        Value::Object(map) => {
            if map.is_empty() {
                return "{}".to_string();
            }
            if level > depth {
                return "[Object]".to_string();
            }
            let entries: Vec<String> = map
                .iter()
                .map(|(key, item)| {
                    format!(
                        "{}: {}",
                        format_key(key),
                        format_value(item, level + 1, depth, indent + 2)
                    )
                })
                .collect();
            reduce(entries, '{', '}', indent)
        }
    }
}

fn reduce(entries: Vec<String>, open: char, close: char, indent: usize) -> String {
    // Each entry costs its length plus one column of separator, counted
    // again in the start offset alongside the indent and opening brace.
    let single_line_len: usize = entries.iter().map(|e| e.len() + 2).sum::<usize>()
        + indent
        + open.len_utf8()
        + CONTEXT_ALLOWANCE;
    let multiline = entries.iter().any(|e| e.contains('\n'));

    if !multiline && single_line_len <= BREAK_LENGTH {
        return format!("{open} {} {close}", entries.join(", "));
    }

    let pad = " ".repeat(indent + 2);
    let mut out = String::new();
    out.push(open);
    for (i, entry) in entries.iter().enumerate() {
        out.push('\n');
        out.push_str(&pad);
        out.push_str(entry);
        if i + 1 < entries.len() {
            out.push(',');
        }
    }
    out.push('\n');
    out.push_str(&" ".repeat(indent));
    out.push(close);
    out
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn format_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Quote with `'`, switching to `"` or a backtick when that avoids escaping.
fn quote(s: &str) -> String {
    let q = if !s.contains('\'') {
        '\''
    } else if !s.contains('"') {
        '"'
    } else if !s.contains('`') {
        '`'
    } else {
        '\''
    };

    let mut out = String::with_capacity(s.len() + 2);
    out.push(q);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == q => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(q);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_object() {
        assert_eq!(inspect(&json!({"user": "a", "id": 1})), "{ user: 'a', id: 1 }");
    }

    #[test]
    fn scalars() {
        assert_eq!(inspect(&json!(null)), "null");
        assert_eq!(inspect(&json!(true)), "true");
        assert_eq!(inspect(&json!(4.5)), "4.5");
        assert_eq!(inspect(&json!("plain")), "'plain'");
    }

    #[test]
    fn empty_containers() {
        assert_eq!(inspect(&json!({})), "{}");
        assert_eq!(inspect(&json!([])), "[]");
        assert_eq!(inspect(&json!({"a": {}, "b": []})), "{ a: {}, b: [] }");
    }

    #[test]
    fn non_identifier_keys_are_quoted() {
        assert_eq!(
            inspect(&json!({"content-type": "text", "_ok": 1, "1st": 2})),
            "{ 'content-type': 'text', _ok: 1, '1st': 2 }"
        );
        assert_eq!(inspect(&json!({"$x": 1, "a$": 2})), "{ '$x': 1, 'a$': 2 }");
    }

    #[test]
    fn string_quote_selection() {
        assert_eq!(inspect(&json!("it's")), "\"it's\"");
        assert_eq!(inspect(&json!("a\nb")), "'a\\nb'");
        assert_eq!(inspect(&json!("back\\slash")), "'back\\\\slash'");
    }

    #[test]
    fn nesting_beyond_depth_collapses() {
        let value = json!({"l1": {"l2": {"l3": {"l4": {"l5": {"l6": {"l7": 1}, "arr": [1]}}}}}});
        let rendered = inspect(&value);
        assert!(rendered.contains("l6: [Object]"), "got: {rendered}");
        assert!(rendered.contains("arr: [Array]"), "got: {rendered}");
        assert!(!rendered.contains("l7"));
    }

    #[test]
    fn depth_zero_collapses_children() {
        let value = json!({"a": {"b": 1}, "c": [1, 2]});
        assert_eq!(inspect_with_depth(&value, 0), "{ a: [Object], c: [Array] }");
    }

    #[test]
    fn long_objects_break_over_lines() {
        let value = json!({
            "request_id": "3f1c2a9e-0d4b-4a53-9d38-5b2b6c1e7f10",
            "path": "/api/v1/orders/12345/items",
            "nested": {"status": 500}
        });
        let rendered = inspect(&value);
        assert_eq!(
            rendered,
            "{\n  request_id: '3f1c2a9e-0d4b-4a53-9d38-5b2b6c1e7f10',\n  path: '/api/v1/orders/12345/items',\n  nested: { status: 500 }\n}"
        );
    }

    #[test]
    fn break_length_boundary() {
        let fits = json!({"s": "x".repeat(62)});
        assert!(!inspect(&fits).contains('\n'));

        let overflows = json!({"s": "x".repeat(63)});
        assert_eq!(
            inspect(&overflows),
            format!("{{\n  s: '{}'\n}}", "x".repeat(63))
        );
    }

    #[test]
    fn nested_multiline_indents() {
        let long = "x".repeat(80);
        let value = json!({"outer": {"inner": long}});
        let rendered = inspect(&value);
        let expected = format!("{{\n  outer: {{\n    inner: '{long}'\n  }}\n}}");
        assert_eq!(rendered, expected);
    }

    #[test]
    fn arrays_render_inline() {
        assert_eq!(inspect(&json!([1, "two", null])), "[ 1, 'two', null ]");
    }
}
