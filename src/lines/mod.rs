//! Localized line resolution.
//!
//! The interpreter asks for player-facing text by stable line id; a
//! [`LineProvider`] answers in the active locale. The compiled-in
//! [`StringTable`] serves the project's base locale; other locales go through
//! a [`TranslationSource`]. Providers backed by delayed-load resources wrap
//! the base provider in a [`PreparedLineProvider`] so the interpreter can
//! suspend until the lines it needs are in.

mod locale;
mod localized;
mod prepared;
mod provider;
mod table;

pub use locale::{is_valid_locale_code, matches_base_locale, primary_subtag};
pub use localized::{LineRequest, LocalizedLine};
pub use prepared::{PreparedLineProvider, ResourceLoader};
pub use provider::{LineProvider, TableLineProvider, TranslationSource};
pub use table::{LineId, StringEntry, StringTable, TableError};
