//! Integration tests for localized line resolution, from config file to
//! presentation-ready text.

use std::io::Write;
use std::sync::Arc;

use tale_runtime::config::{validate, Config};
use tale_runtime::{
    LineId, LineProvider, LineRequest, StringTable, TableLineProvider, TranslationSource,
};

const STRINGS_TOML: &str = r##"
base_locale = "en"

[lines."line:greet_0"]
text = '[character name="Ava"]Ava: [/character]Hello, {0}!'
tags = ["#greeting"]

[lines."line:narrate_0"]
text = "The door creaks open."
"##;

fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}

fn provider_for(locale: &str) -> TableLineProvider {
    let strings = write_temp(STRINGS_TOML);
    let table = StringTable::load(strings.path()).expect("load string table");
    TableLineProvider::new(locale, table)
}

#[test]
fn test_config_file_drives_the_provider() {
    let strings = write_temp(STRINGS_TOML);
    let config_toml = format!(
        r#"
strings_file = "{}"

[locale]
code = "en-GB"
"#,
        strings.path().display()
    );
    let config_file = write_temp(&config_toml);

    let config = Config::load(config_file.path()).expect("load config");
    validate(&config).expect("valid config");

    let table = StringTable::load(config.strings_file.as_ref().unwrap()).expect("load table");
    let provider = TableLineProvider::new(config.locale.code.clone(), table);

    assert!(provider.lines_available());
    let line = provider
        .get_localized_line(&LineRequest::new("line:narrate_0"))
        .unwrap();
    assert_eq!(line.text(), "The door creaks open.");
}

#[test]
fn test_base_locale_prefix_match() {
    // "en-GB" against base "en": the primary subtag matches, the compiled
    // table answers.
    let provider = provider_for("en-GB");
    let line = provider
        .get_localized_line(
            &LineRequest::new("line:greet_0").with_substitutions(vec!["traveller".to_string()]),
        )
        .unwrap();
    assert_eq!(line.character_name().as_deref(), Some("Ava"));
    assert_eq!(line.text_without_character_name(), "Hello, traveller!");
    assert_eq!(line.tags(), ["#greeting"]);

    // "fr-FR" against base "en": no match, and with no translation source
    // the lookup fails.
    let provider = provider_for("fr-FR");
    let err = provider
        .get_localized_line(&LineRequest::new("line:greet_0"))
        .unwrap_err();
    assert_eq!(err.error_code(), "no_translation");
}

#[test]
fn test_translated_locale_goes_through_the_source() {
    struct French;
    impl TranslationSource for French {
        fn localized_text(&self, locale: &str, id: &LineId) -> Option<String> {
            (locale == "fr-FR" && id.as_str() == "line:greet_0")
                .then(|| "Bonjour, {0} !".to_string())
        }
    }

    let provider = provider_for("fr-FR").with_translations(Arc::new(French));
    let line = provider
        .get_localized_line(
            &LineRequest::new("line:greet_0").with_substitutions(vec!["voyageur".to_string()]),
        )
        .unwrap();
    assert_eq!(line.text(), "Bonjour, voyageur !");
    // No character markup in the translation: text passes through unchanged.
    assert_eq!(line.character_name(), None);
    assert_eq!(line.text_without_character_name(), line.text());
    // Tags still come from the base table.
    assert_eq!(line.tags(), ["#greeting"]);
}

#[test]
fn test_lines_are_fresh_per_lookup() {
    let provider = provider_for("en");
    let request = LineRequest::new("line:greet_0").with_substitutions(vec!["you".to_string()]);
    let first = provider.get_localized_line(&request).unwrap();
    let second = provider.get_localized_line(&request).unwrap();
    assert_eq!(first.text(), second.text());
    // Each lookup owns its value; mutating one view is impossible by
    // construction (all accessors borrow), so equality is the whole check.
}
