//! Bracket-markup scanner.
//!
//! Single left-to-right pass over the text. Tags are located byte-wise so the
//! reported spans can be used to slice the original string; tag bodies are
//! parsed with a small character cursor that understands quoted values.

use crate::{MarkupAttribute, MarkupError, MarkupProperty};

/// An open tag waiting for its close tag.
struct OpenTag {
    name: String,
    span_start: usize,
    inner_start: usize,
    properties: Vec<MarkupProperty>,
}

/// Parse all markup attributes in `text`.
///
/// Returns attributes ordered by their starting position. The text itself is
/// never modified; escaped brackets (`\[`, `\]`) are skipped over.
///
/// # Errors
///
/// Fails on unterminated tags, unclosed attributes, mismatched closing tags,
/// empty tags, and malformed properties.
pub fn parse_attributes(text: &str) -> Result<Vec<MarkupAttribute>, MarkupError> {
    let bytes = text.as_bytes();
    let mut attrs: Vec<MarkupAttribute> = Vec::new();
    let mut stack: Vec<OpenTag> = Vec::new();

    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() && matches!(bytes[i + 1], b'[' | b']' | b'\\') => {
                i += 2;
            }
            b'[' => {
                let tag_start = i;
                let tag_end =
                    find_tag_end(bytes, i + 1).ok_or(MarkupError::UnterminatedTag(tag_start))?;
                let body = &text[i + 1..tag_end];
                handle_tag(tag_start, tag_end, body, &mut stack, &mut attrs)?;
                i = tag_end + 1;
            }
            _ => i += 1,
        }
    }

    if let Some(open) = stack.pop() {
        return Err(MarkupError::UnterminatedAttribute(open.name));
    }

    attrs.sort_by_key(|a| a.span.start);
    Ok(attrs)
}

/// Remove an attribute's span from `text`, tags and enclosed text included.
///
/// Everything outside the span, other markup included, is left intact.
///
/// # Panics
///
/// Panics if `attr` was not produced by parsing this same `text` and its span
/// does not fall on character boundaries within it.
pub fn strip_attribute(text: &str, attr: &MarkupAttribute) -> String {
    let mut out = String::with_capacity(text.len() - attr.span.len());
    out.push_str(&text[..attr.span.start]);
    out.push_str(&text[attr.span.end..]);
    out
}

/// Find the `]` terminating a tag, honoring quoted property values.
fn find_tag_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    let mut in_quotes = false;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_quotes && i + 1 < bytes.len() => i += 2,
            b'"' => {
                in_quotes = !in_quotes;
                i += 1;
            }
            b']' if !in_quotes => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Process one tag body: close tag, self-closing tag, or open tag.
fn handle_tag(
    tag_start: usize,
    tag_end: usize,
    body: &str,
    stack: &mut Vec<OpenTag>,
    attrs: &mut Vec<MarkupAttribute>,
) -> Result<(), MarkupError> {
    let trimmed = body.trim();

    // Closing tag: `[/name]` or close-nearest `[/]`.
    if let Some(close_name) = trimmed.strip_prefix('/') {
        let close_name = close_name.trim();
        let open = stack.pop().ok_or_else(|| MarkupError::UnmatchedClose {
            found: close_name.to_string(),
            at: tag_start,
        })?;
        if !close_name.is_empty() && close_name != open.name {
            return Err(MarkupError::UnmatchedClose {
                found: close_name.to_string(),
                at: tag_start,
            });
        }
        attrs.push(MarkupAttribute {
            name: open.name,
            span: open.span_start..tag_end + 1,
            inner: open.inner_start..tag_start,
            properties: open.properties,
        });
        return Ok(());
    }

    let (self_closing, body_inner) = match trimmed.strip_suffix('/') {
        Some(rest) => (true, rest.trim_end()),
        None => (false, trimmed),
    };
    if body_inner.is_empty() {
        return Err(MarkupError::EmptyTag(tag_start));
    }

    let (name, properties) = parse_tag_body(body_inner, tag_start)?;
    if self_closing {
        attrs.push(MarkupAttribute {
            name,
            span: tag_start..tag_end + 1,
            inner: tag_end + 1..tag_end + 1,
            properties,
        });
    } else {
        stack.push(OpenTag {
            name,
            span_start: tag_start,
            inner_start: tag_end + 1,
            properties,
        });
    }
    Ok(())
}

/// Parse `name`, optional shorthand value, and `key=value` properties.
fn parse_tag_body(body: &str, at: usize) -> Result<(String, Vec<MarkupProperty>), MarkupError> {
    let mut cur = Cursor::new(body);
    cur.skip_ws();

    let name = cur.ident();
    if name.is_empty() {
        return Err(MarkupError::EmptyTag(at));
    }

    let mut properties = Vec::new();

    // Shorthand `[wave=3]` reads as a property named after the attribute.
    if cur.peek() == Some('=') {
        cur.bump();
        let value = cur.value().ok_or(MarkupError::BadProperty(at))?;
        properties.push(MarkupProperty {
            name: name.clone(),
            value,
        });
    }

    loop {
        cur.skip_ws();
        if cur.at_end() {
            break;
        }
        let key = cur.ident();
        if key.is_empty() {
            return Err(MarkupError::BadProperty(at));
        }
        if cur.peek() == Some('=') {
            cur.bump();
            let value = cur.value().ok_or(MarkupError::BadProperty(at))?;
            properties.push(MarkupProperty { name: key, value });
        } else {
            // Bare key is a boolean flag.
            properties.push(MarkupProperty {
                name: key,
                value: "true".to_string(),
            });
        }
    }

    Ok((name, properties))
}

/// Character cursor over a tag body.
struct Cursor<'a> {
    s: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self { s, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.s[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.s.len()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    /// Consume an identifier: alphanumerics, `_` and `-`.
    fn ident(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_' || c == '-') {
            self.bump();
        }
        self.s[start..self.pos].to_string()
    }

    /// Consume a property value: quoted with `\"` escapes, or a bare word.
    fn value(&mut self) -> Option<String> {
        if self.peek() == Some('"') {
            self.bump();
            let mut out = String::new();
            loop {
                match self.peek() {
                    None => return None,
                    Some('"') => {
                        self.bump();
                        return Some(out);
                    }
                    Some('\\') => {
                        self.bump();
                        let escaped = self.peek()?;
                        out.push(escaped);
                        self.bump();
                    }
                    Some(c) => {
                        out.push(c);
                        self.bump();
                    }
                }
            }
        } else {
            let start = self.pos;
            while matches!(self.peek(), Some(c) if !c.is_whitespace()) {
                self.bump();
            }
            if self.pos == start {
                None
            } else {
                Some(self.s[start..self.pos].to_string())
            }
        }
    }
}
