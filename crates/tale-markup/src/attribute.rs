//! Attribute model produced by the markup parser.

use std::ops::Range;

/// One `key=value` property attached to a markup attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkupProperty {
    /// Property key.
    pub name: String,
    /// Property value with quotes removed and escapes resolved.
    pub value: String,
}

/// A markup attribute located in a line of text.
///
/// Spans are byte ranges into the original text. `span` covers the whole
/// attribute including its tags; `inner` covers only the text between the
/// open and close tags (and is empty for self-closing attributes).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkupAttribute {
    /// Attribute name, e.g. `character` in `[character name="Ava"]`.
    pub name: String,
    /// Byte range from the start of the open tag to the end of the close tag.
    pub span: Range<usize>,
    /// Byte range of the enclosed text, without the tags.
    pub inner: Range<usize>,
    /// Properties declared in the open tag, in source order.
    pub properties: Vec<MarkupProperty>,
}

impl MarkupAttribute {
    /// Look up a property value by key.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Whether the attribute was written self-closing (`[pause/]`).
    pub fn is_self_closing(&self) -> bool {
        self.inner.is_empty() && self.inner.start == self.span.end
    }
}
