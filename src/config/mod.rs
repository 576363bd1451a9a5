//! Runtime configuration.
//!
//! Loading (TOML) and validation are separate steps: [`Config::load`] only
//! parses, [`validate`] returns every problem found so hosts can report them
//! all at once at startup.

mod types;
mod validation;

pub use types::{Config, ConfigError, DispatchConfig, LocaleConfig};
pub use validation::{validate, ValidationError};
