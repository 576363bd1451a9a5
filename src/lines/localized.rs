//! Localized line values handed to the presentation layer.

use tale_markup::{
    parse_attributes, strip_attribute, MarkupAttribute, CHARACTER_ATTRIBUTE,
    CHARACTER_NAME_PROPERTY,
};
use tracing::warn;

use crate::lines::table::LineId;

/// A request for localized text: the line id plus the ordered substitution
/// values the interpreter computed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRequest {
    /// Stable line identifier.
    pub id: LineId,
    /// Ordered substitution strings for `{0}`, `{1}`, …
    pub substitutions: Vec<String>,
}

impl LineRequest {
    /// Request with no substitutions.
    pub fn new(id: impl Into<LineId>) -> Self {
        Self {
            id: id.into(),
            substitutions: Vec::new(),
        }
    }

    /// Attach the ordered substitution values.
    pub fn with_substitutions(mut self, substitutions: Vec<String>) -> Self {
        self.substitutions = substitutions;
        self
    }
}

/// A localized line resolved for presentation.
///
/// Substitutions are already applied and markup is still present in `text`.
/// Created fresh per lookup and immutable once returned; lookups share no
/// mutable state.
#[derive(Debug, Clone)]
pub struct LocalizedLine {
    id: LineId,
    text: String,
    substitutions: Vec<String>,
    tags: Vec<String>,
}

impl LocalizedLine {
    pub(crate) fn new(
        id: LineId,
        text: String,
        substitutions: Vec<String>,
        tags: Vec<String>,
    ) -> Self {
        Self {
            id,
            text,
            substitutions,
            tags,
        }
    }

    /// The line's identifier.
    pub fn id(&self) -> &LineId {
        &self.id
    }

    /// Substitution-filled text, markup included.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The substitution values that were applied.
    pub fn substitutions(&self) -> &[String] {
        &self.substitutions
    }

    /// Metadata tags attached to the line.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Display name of the speaking character, read from the reserved
    /// `character` attribute's `name` property. `None` when the line has no
    /// speaker.
    pub fn character_name(&self) -> Option<String> {
        self.character_attribute()
            .and_then(|attr| attr.property(CHARACTER_NAME_PROPERTY).map(str::to_string))
    }

    /// The text with exactly the `character` attribute's span removed.
    ///
    /// All other markup stays intact. Lines without the attribute come back
    /// unchanged.
    pub fn text_without_character_name(&self) -> String {
        match self.character_attribute() {
            Some(attr) => strip_attribute(&self.text, &attr),
            None => self.text.clone(),
        }
    }

    fn character_attribute(&self) -> Option<MarkupAttribute> {
        match parse_attributes(&self.text) {
            Ok(attrs) => attrs.into_iter().find(|a| a.name == CHARACTER_ATTRIBUTE),
            Err(err) => {
                warn!(line = %self.id, error = %err, "line markup failed to parse");
                None
            }
        }
    }
}

/// Replace `{0}`, `{1}`, … with the ordered substitution values.
///
/// Placeholders without a matching value are left verbatim.
pub(crate) fn apply_substitutions(text: &str, substitutions: &[String]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if !after[..close].is_empty()
                && after[..close].bytes().all(|b| b.is_ascii_digit()) =>
            {
                match after[..close].parse::<usize>().ok().and_then(|i| substitutions.get(i)) {
                    Some(value) => {
                        out.push_str(value);
                    }
                    None => {
                        // Out-of-range placeholder stays as authored.
                        out.push('{');
                        out.push_str(&after[..close]);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
