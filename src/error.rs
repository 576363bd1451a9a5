//! Unified error handling for tale-runtime.
//!
//! One enum per failure domain, each with an `error_code()` accessor giving a
//! static label for structured logging. Nothing here is fatal to the process:
//! dispatch failures are returned as typed results and the dispatch loop
//! continues.

use thiserror::Error;

use crate::lines::LineId;

// ============================================================================
// Argument Errors (token-to-type marshaling)
// ============================================================================

/// Errors produced while converting command-line tokens into typed arguments.
///
/// Resolution fails fast: the first failing parameter is reported and no
/// partial argument list is ever handed to a handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// Token count does not match the handler's declared parameter count.
    #[error("expected {expected} argument(s), got {got}")]
    ArityMismatch {
        /// Declared parameter count (minimum count when a collector is present).
        expected: usize,
        /// Tokens actually supplied.
        got: usize,
    },

    /// A boolean parameter received a token that is neither `true`/`false`
    /// nor the parameter's own name.
    #[error("argument '{token}' is not a boolean for parameter '{param}'")]
    InvalidBool {
        /// Declared parameter name.
        param: String,
        /// Offending token.
        token: String,
    },

    /// A numeric parameter received an unparseable token.
    #[error("argument '{token}' is not a number for parameter '{param}'")]
    InvalidNumber {
        /// Declared parameter name.
        param: String,
        /// Offending token.
        token: String,
    },

    /// A node-typed parameter's lookup key did not resolve to a host object.
    #[error("no node named '{token}' found for parameter '{param}'")]
    UnresolvedNode {
        /// Declared parameter name.
        param: String,
        /// Lookup key that failed.
        token: String,
    },

    /// A node-typed parameter was declared but no resolver is installed.
    #[error("parameter '{param}' requires a node resolver, but none is installed")]
    NoNodeResolver {
        /// Declared parameter name.
        param: String,
    },
}

impl ArgumentError {
    /// Static error label for structured logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ArityMismatch { .. } => "arity_mismatch",
            Self::InvalidBool { .. } => "invalid_bool",
            Self::InvalidNumber { .. } => "invalid_number",
            Self::UnresolvedNode { .. } => "unresolved_node",
            Self::NoNodeResolver { .. } => "no_node_resolver",
        }
    }
}

// ============================================================================
// Handler Errors (failures inside host code)
// ============================================================================

/// Errors a handler reports back to the dispatcher.
///
/// These surface as `DispatchResult::InvocationError` for synchronous
/// handlers and as a `Faulted` pending call for asynchronous ones.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Free-form failure message from the handler.
    #[error("{0}")]
    Message(String),

    /// Resolved arguments did not line up with what the handler expected.
    /// Indicates a mismatch between the registered signature and the body.
    #[error("resolved arguments did not match the handler signature")]
    ArgumentMismatch,

    /// Handler panicked; the payload message is preserved.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// Underlying host failure with its full cause chain.
    #[error(transparent)]
    Host(#[from] anyhow::Error),
}

impl HandlerError {
    /// Convenience constructor for free-form failures.
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    /// Static error label for structured logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Message(_) => "handler_failed",
            Self::ArgumentMismatch => "argument_mismatch",
            Self::Panicked(_) => "handler_panicked",
            Self::Host(_) => "host_error",
        }
    }
}

/// Result type for handler bodies.
pub type HandlerResult = Result<crate::value::Value, HandlerError>;

// ============================================================================
// Registry Errors (registration-time signature validation)
// ============================================================================

/// Errors raised when a handler signature is structurally invalid.
///
/// These are programming errors in the host's registration code, caught at
/// registration time rather than at dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A collector parameter was declared somewhere other than last.
    #[error("collector parameter '{param}' must be the last parameter")]
    CollectorNotLast {
        /// Name of the misplaced parameter.
        param: String,
    },

    /// More than one collector parameter was declared.
    #[error("at most one collector parameter may be declared")]
    MultipleCollectors,
}

impl RegistryError {
    /// Static error label for structured logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CollectorNotLast { .. } => "collector_not_last",
            Self::MultipleCollectors => "multiple_collectors",
        }
    }
}

// ============================================================================
// Line Errors (localization lookups)
// ============================================================================

/// Errors raised while resolving a localized line.
#[derive(Debug, Error)]
pub enum LineError {
    /// The provider was queried before `lines_available()` reported true.
    /// Calling out of contract is a caller bug; debug builds assert.
    #[error("line provider is not ready")]
    NotReady,

    /// The line id is not present in the base string table.
    #[error("unknown line id: {0}")]
    UnknownLine(LineId),

    /// No translated text exists for the line in the active locale.
    #[error("no translation for line {id} in locale '{locale}'")]
    NoTranslation {
        /// Line that was requested.
        id: LineId,
        /// Active locale of the provider.
        locale: String,
    },

    /// An auxiliary resource for the line failed to load.
    #[error("failed to load resource for line {id}: {reason}")]
    ResourceLoad {
        /// Line whose resource failed.
        id: LineId,
        /// Loader's failure description.
        reason: String,
    },
}

impl LineError {
    /// Static error label for structured logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotReady => "not_ready",
            Self::UnknownLine(_) => "unknown_line",
            Self::NoTranslation { .. } => "no_translation",
            Self::ResourceLoad { .. } => "resource_load",
        }
    }
}
