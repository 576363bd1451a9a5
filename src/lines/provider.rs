//! Line providers: resolving line ids to localized text.

use std::sync::Arc;

use crate::error::LineError;
use crate::lines::locale::matches_base_locale;
use crate::lines::localized::{apply_substitutions, LineRequest, LocalizedLine};
use crate::lines::table::{LineId, StringTable};

/// Locale-specific text source consulted when the active locale is not the
/// project's base locale.
///
/// Typically backed by translated string files keyed by line identifier.
pub trait TranslationSource: Send + Sync {
    /// Translated text for `id` in `locale`, if available.
    fn localized_text(&self, locale: &str, id: &LineId) -> Option<String>;
}

/// Resolves line identifiers to user-facing localized text.
///
/// The active locale is fixed per provider instance. Implementations backed
/// by delayed-load resources report readiness through
/// [`lines_available`](Self::lines_available); callers must check it before
/// requesting lines — querying while unavailable is a contract violation.
pub trait LineProvider: Send + Sync {
    /// Active locale code (BCP-47 style).
    fn locale(&self) -> &str;

    /// Hint that these lines may soon be requested.
    ///
    /// The default provider is always ready and ignores the hint.
    /// Implementations that load external resources begin preparation here
    /// and flip `lines_available` to false until the lines are in.
    fn prepare_for_lines(&self, _ids: &[LineId]) {}

    /// Whether `get_localized_line` may currently be called.
    fn lines_available(&self) -> bool {
        true
    }

    /// Resolve one line in the active locale.
    fn get_localized_line(&self, request: &LineRequest) -> Result<LocalizedLine, LineError>;
}

/// Always-ready provider over the compiled base table, with an optional
/// translation source for non-base locales.
///
/// Locale rule: when the active locale's primary language subtag matches the
/// table's base locale, text comes from the table; otherwise the translation
/// source is consulted, keyed by line id. Metadata tags always come from the
/// base table.
pub struct TableLineProvider {
    locale: String,
    table: StringTable,
    translations: Option<Arc<dyn TranslationSource>>,
}

impl TableLineProvider {
    /// Provider for `locale` over the compiled `table`.
    pub fn new(locale: impl Into<String>, table: StringTable) -> Self {
        Self {
            locale: locale.into(),
            table,
            translations: None,
        }
    }

    /// Attach the translation source used for non-base locales.
    pub fn with_translations(mut self, source: Arc<dyn TranslationSource>) -> Self {
        self.translations = Some(source);
        self
    }

    /// The underlying base table.
    pub fn table(&self) -> &StringTable {
        &self.table
    }

    fn resolve_text(&self, id: &LineId) -> Result<(String, Vec<String>), LineError> {
        let entry = self
            .table
            .get(id)
            .ok_or_else(|| LineError::UnknownLine(id.clone()))?;
        let tags = entry.tags.clone();

        if matches_base_locale(&self.locale, self.table.base_locale()) {
            return Ok((entry.text.clone(), tags));
        }
        match self
            .translations
            .as_deref()
            .and_then(|s| s.localized_text(&self.locale, id))
        {
            Some(text) => Ok((text, tags)),
            None => Err(LineError::NoTranslation {
                id: id.clone(),
                locale: self.locale.clone(),
            }),
        }
    }
}

impl LineProvider for TableLineProvider {
    fn locale(&self) -> &str {
        &self.locale
    }

    fn get_localized_line(&self, request: &LineRequest) -> Result<LocalizedLine, LineError> {
        let (text, tags) = self.resolve_text(&request.id)?;
        let text = apply_substitutions(&text, &request.substitutions);
        Ok(LocalizedLine::new(
            request.id.clone(),
            text,
            request.substitutions.clone(),
            tags,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn table() -> StringTable {
        let mut table = StringTable::new("en");
        table.add(
            "line:greet",
            r#"[character name="Ava"]Ava: [/character]Hello, {0}!"#,
        );
        table
    }

    struct MapSource(HashMap<(String, String), String>);

    impl TranslationSource for MapSource {
        fn localized_text(&self, locale: &str, id: &LineId) -> Option<String> {
            self.0
                .get(&(locale.to_string(), id.as_str().to_string()))
                .cloned()
        }
    }

    #[test]
    fn test_base_locale_prefix_match_uses_table() {
        let provider = TableLineProvider::new("en-GB", table());
        assert!(provider.lines_available());
        let line = provider
            .get_localized_line(&LineRequest::new("line:greet").with_substitutions(vec![
                "traveller".to_string(),
            ]))
            .unwrap();
        assert_eq!(line.text_without_character_name(), "Hello, traveller!");
        assert_eq!(line.character_name().as_deref(), Some("Ava"));
    }

    #[test]
    fn test_non_base_locale_requires_translations() {
        let provider = TableLineProvider::new("fr-FR", table());
        let err = provider
            .get_localized_line(&LineRequest::new("line:greet"))
            .unwrap_err();
        assert_eq!(err.error_code(), "no_translation");

        let mut translated = HashMap::new();
        translated.insert(
            ("fr-FR".to_string(), "line:greet".to_string()),
            "Bonjour, {0} !".to_string(),
        );
        let provider =
            TableLineProvider::new("fr-FR", table()).with_translations(Arc::new(MapSource(translated)));
        let line = provider
            .get_localized_line(
                &LineRequest::new("line:greet").with_substitutions(vec!["voyageur".to_string()]),
            )
            .unwrap();
        assert_eq!(line.text(), "Bonjour, voyageur !");
        // Metadata still comes from the base table.
        assert!(line.tags().is_empty());
    }

    #[test]
    fn test_unknown_line() {
        let provider = TableLineProvider::new("en", table());
        let err = provider
            .get_localized_line(&LineRequest::new("line:missing"))
            .unwrap_err();
        assert_eq!(err.error_code(), "unknown_line");
    }
}
