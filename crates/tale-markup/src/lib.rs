//! # tale-markup
//!
//! Parsing for the bracket-style markup embedded in dialogue line text.
//!
//! Line text authored for narrative scripts carries inline attributes of the
//! form `[name key="value"]spanned text[/name]`, used for styling, timing and
//! speaker identification. This crate locates those attributes and their byte
//! spans without rewriting the surrounding text, so callers can strip or
//! inspect exactly the spans they care about and leave everything else
//! untouched.
//!
//! ## Quick Start
//!
//! ```rust
//! use tale_markup::{parse_attributes, strip_attribute, CHARACTER_ATTRIBUTE};
//!
//! let text = r#"[character name="Ava"]Ava: [/character]Hello there!"#;
//! let attrs = parse_attributes(text).expect("valid markup");
//!
//! let character = attrs
//!     .iter()
//!     .find(|a| a.name == CHARACTER_ATTRIBUTE)
//!     .expect("line has a speaker");
//! assert_eq!(character.property("name"), Some("Ava"));
//! assert_eq!(strip_attribute(text, character), "Hello there!");
//! ```
//!
//! ## Supported syntax
//!
//! - Open/close pairs: `[wave]text[/wave]`
//! - Properties: `[wave speed="2.5" loop]` (a bare key reads as `"true"`)
//! - Shorthand: `[wave=3]` is `[wave wave="3"]`
//! - Self-closing: `[pause length="0.5"/]`
//! - Close-nearest: `[/]` closes the innermost open attribute
//! - Escapes: `\[` and `\]` are literal brackets, not markup

#![deny(clippy::all)]
#![warn(missing_docs)]

mod attribute;
mod parser;

pub use attribute::{MarkupAttribute, MarkupProperty};
pub use parser::{parse_attributes, strip_attribute};

use thiserror::Error;

/// Reserved attribute naming the speaking character.
///
/// The attribute's span covers the speaker prefix of the line (typically
/// `Name: `), and its `name` property carries the display name.
pub const CHARACTER_ATTRIBUTE: &str = "character";

/// Property of [`CHARACTER_ATTRIBUTE`] holding the character's display name.
pub const CHARACTER_NAME_PROPERTY: &str = "name";

/// Errors raised while scanning markup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    /// A `[` was opened but the tag never closed with `]`.
    #[error("unterminated markup tag at byte {0}")]
    UnterminatedTag(usize),

    /// An attribute was opened but its closing tag never appeared.
    #[error("attribute '{0}' is never closed")]
    UnterminatedAttribute(String),

    /// A closing tag did not match the innermost open attribute.
    #[error("closing tag '[/{found}]' at byte {at} does not match open attribute")]
    UnmatchedClose {
        /// Name in the closing tag.
        found: String,
        /// Byte offset of the closing tag.
        at: usize,
    },

    /// A tag carried no attribute name, e.g. `[]`.
    #[error("empty markup tag at byte {0}")]
    EmptyTag(usize),

    /// A property inside a tag could not be parsed.
    #[error("malformed property in tag at byte {0}")]
    BadProperty(usize),
}
