//! tale-runtime — dialogue runtime core.
//!
//! The runtime glue between a narrative-script interpreter and a host
//! application: resolves script-authored commands and functions to registered
//! handlers, marshals string arguments into typed parameters, tracks
//! asynchronous handler invocations so the interpreter can suspend on them,
//! and resolves line identifiers to localized, substitution-filled text.
//!
//! The dialogue language itself, its virtual machine, and all presentation
//! are out of scope; this crate sits between them.
//!
//! ## Quick Start
//!
//! ```rust
//! use tale_runtime::{
//!     DispatchContext, DispatchResult, Dispatcher, HandlerDescriptor, ParamSpec, Value,
//! };
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.registry_mut().register(
//!     HandlerDescriptor::function("greet")
//!         .param(ParamSpec::string("who"))
//!         .handle(|args| Ok(Value::from(format!("Hi, {}!", args.str(0).unwrap_or("?")))))
//!         .unwrap(),
//! );
//!
//! match dispatcher.dispatch("greet Ava", &DispatchContext::new()) {
//!     DispatchResult::Success(value) => assert_eq!(value, Value::from("Hi, Ava!")),
//!     other => panic!("unexpected outcome: {other:?}"),
//! }
//! ```
//!
//! Asynchronous handlers return [`DispatchResult::Pending`] with a
//! [`PendingHandle`]; the interpreter awaits [`PendingHandle::wait`] to
//! suspend until the call resolves. They require an ambient tokio runtime.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod lines;
pub mod pending;
pub mod value;

pub use config::{Config, ConfigError, ValidationError};
pub use dispatch::{
    register_builtins, split_command_line, DispatchContext, DispatchResult, Dispatcher,
    HandlerDescriptor, HandlerKind, HandlerRegistry, HandlerSet, ParamSpec, ParamType,
};
pub use error::{ArgumentError, HandlerError, HandlerResult, LineError, RegistryError};
pub use lines::{
    LineId, LineProvider, LineRequest, LocalizedLine, PreparedLineProvider, StringEntry,
    StringTable, TableLineProvider, TranslationSource,
};
pub use pending::{CallId, CallState, PendingCallTracker, PendingHandle};
pub use value::{NodeRef, Value};
