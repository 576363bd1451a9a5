//! Core configuration types and loading.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The config file is not valid TOML of the expected shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Locale selection for line providers.
    pub locale: LocaleConfig,
    /// Dispatch options.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Optional path to the compiled base string table.
    pub strings_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Locale selection.
#[derive(Debug, Clone, Deserialize)]
pub struct LocaleConfig {
    /// Active locale code (BCP-47 style, e.g. `"en-US"`).
    pub code: String,
    /// The project's base locale, the one the compiled table is authored in.
    #[serde(default = "default_base_locale")]
    pub base: String,
}

fn default_base_locale() -> String {
    "en".to_string()
}

/// Dispatch options.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Register the built-in commands and functions at startup.
    #[serde(default = "default_true")]
    pub builtins: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { builtins: true }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let config: Config = toml::from_str(
            r#"
[locale]
code = "en-US"
"#,
        )
        .unwrap();
        assert_eq!(config.locale.code, "en-US");
        assert_eq!(config.locale.base, "en");
        assert!(config.dispatch.builtins);
        assert!(config.strings_file.is_none());
    }

    #[test]
    fn test_parse_full() {
        let config: Config = toml::from_str(
            r#"
strings_file = "lines.toml"

[locale]
code = "pt-BR"
base = "pt"

[dispatch]
builtins = false
"#,
        )
        .unwrap();
        assert_eq!(config.locale.base, "pt");
        assert!(!config.dispatch.builtins);
        assert_eq!(
            config.strings_file.as_deref(),
            Some(Path::new("lines.toml"))
        );
    }
}
