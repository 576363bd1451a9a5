//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use thiserror::Error;

use super::Config;
use crate::lines::is_valid_locale_code;

/// Validation errors for configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `locale.code` is empty.
    #[error("locale.code is required")]
    MissingLocaleCode,
    /// `locale.code` is not a plausible locale code.
    #[error("locale.code '{0}' is not a valid locale code")]
    InvalidLocaleCode(String),
    /// `locale.base` is not a plausible locale code.
    #[error("locale.base '{0}' is not a valid locale code")]
    InvalidBaseLocale(String),
    /// `strings_file` points at a missing file.
    #[error("strings_file does not exist: {0}")]
    StringsFileNotFound(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.locale.code.is_empty() {
        errors.push(ValidationError::MissingLocaleCode);
    } else if !is_valid_locale_code(&config.locale.code) {
        errors.push(ValidationError::InvalidLocaleCode(
            config.locale.code.clone(),
        ));
    }

    if !is_valid_locale_code(&config.locale.base) {
        errors.push(ValidationError::InvalidBaseLocale(
            config.locale.base.clone(),
        ));
    }

    if let Some(path) = &config.strings_file
        && !path.exists()
    {
        errors.push(ValidationError::StringsFileNotFound(
            path.display().to_string(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
