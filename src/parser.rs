//! Structural parser for configuration documents
//!
//! Converts one document's text into an ordered list of key definitions with
//! logical paths. The parser is a pure function of the document content and
//! identity: no shared state, no I/O.
//!
//! The scan is line-based. A stack of `(key, indent)` frames tracks the
//! currently open ancestor keys; each `key:` line emits one definition whose
//! path is the directory components followed by the open frames and the key
//! itself. Lines that cannot be classified are skipped: the parser never
//! fails on malformed input, it degrades to fewer definitions.

use crate::models::{DocumentId, KeyDefinition, Span};

/// An open ancestor key awaiting children on subsequent lines
struct Frame {
    key: String,
    indent: usize,
}

/// Parse a document into its key definitions.
///
/// `dir_components` is the document's location relative to its workspace
/// root (filename extension stripped), derived once per document by the
/// caller. Documents outside any recognized root pass an empty slice.
pub fn parse(document: &DocumentId, text: &str, dir_components: &[String]) -> Vec<KeyDefinition> {
    let mut definitions = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;

        let indent = leading_whitespace(raw_line);
        let body = &raw_line[indent..];

        // Blank lines and full-line comments
        if body.is_empty() || body.starts_with('#') {
            continue;
        }

        // Sequence items are not key lines
        if body == "-" || body.starts_with("- ") {
            continue;
        }

        let body = strip_inline_comment(body);

        let Some((key_token, value)) = split_key_line(body) else {
            continue;
        };

        let key = unquote(key_token);
        if key.is_empty() {
            continue;
        }

        // Close siblings and deeper frames
        while stack.last().is_some_and(|frame| frame.indent >= indent) {
            stack.pop();
        }

        let mut logical_path =
            Vec::with_capacity(dir_components.len() + stack.len() + 1);
        logical_path.extend(dir_components.iter().cloned());
        logical_path.extend(stack.iter().map(|frame| frame.key.clone()));
        logical_path.push(key.to_string());

        definitions.push(KeyDefinition {
            logical_path,
            document: document.clone(),
            span: Span::new(line_no, indent, line_no, indent + key_token.len()),
        });

        // An empty value or an unclosed flow collection may have children
        // on subsequent lines
        if value.is_empty() || opens_flow(value) {
            stack.push(Frame {
                key: key.to_string(),
                indent,
            });
        }
    }

    definitions
}

/// Count leading whitespace characters (tabs count as one column)
fn leading_whitespace(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

/// Truncate at the first `#` that starts a comment (line start or preceded
/// by whitespace, outside quotes), then trim trailing whitespace
fn strip_inline_comment(body: &str) -> &str {
    let mut in_single = false;
    let mut in_double = false;
    let mut prev: Option<char> = None;

    for (pos, ch) in body.char_indices() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '#' if !in_single && !in_double => {
                if prev.is_none_or(|p| p.is_whitespace()) {
                    return body[..pos].trim_end();
                }
            }
            _ => {}
        }
        prev = Some(ch);
    }

    body.trim_end()
}

/// Split a `key: value` line at the first colon outside quotes that is
/// followed by whitespace or end of line. Returns the raw key token and the
/// trimmed value, or `None` when the line is not a key line.
fn split_key_line(body: &str) -> Option<(&str, &str)> {
    let mut in_single = false;
    let mut in_double = false;

    let mut chars = body.char_indices().peekable();
    while let Some((pos, ch)) = chars.next() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            ':' if !in_single && !in_double => {
                let follows = chars.peek().map(|&(_, c)| c);
                if follows.is_none() || follows.is_some_and(|c| c.is_whitespace()) {
                    let key_token = body[..pos].trim_end();
                    if key_token.is_empty() || key_token.chars().all(|c| c == ':') {
                        return None;
                    }
                    let value = body[pos + 1..].trim();
                    return Some((key_token, value));
                }
            }
            _ => {}
        }
    }

    None
}

/// Strip a matching pair of surrounding quotes from a key token
fn unquote(token: &str) -> &str {
    let bytes = token.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &token[1..token.len() - 1];
        }
    }
    token
}

/// Whether a value opens a flow collection left unclosed on its line.
///
/// Closed one-line flows (`{a: 1}`) are leaves; only a net-positive brace
/// or bracket depth means children may follow on later lines.
fn opens_flow(value: &str) -> bool {
    if !value.starts_with('{') && !value.starts_with('[') {
        return false;
    }

    let mut depth: i32 = 0;
    let mut in_single = false;
    let mut in_double = false;

    for ch in value.chars() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '{' | '[' if !in_single && !in_double => depth += 1,
            '}' | ']' if !in_single && !in_double => depth -= 1,
            _ => {}
        }
    }

    depth > 0
}
