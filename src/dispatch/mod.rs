//! Command and function dispatch.
//!
//! The dispatch pipeline, leaf-first: the [`HandlerRegistry`] maps script
//! command/function names to [`HandlerDescriptor`]s; the argument resolver
//! converts raw tokens into the typed [`Args`] a descriptor declares; the
//! [`Dispatcher`] ties it together and reports each call's outcome as a
//! [`DispatchResult`], handing back a pending handle when the handler is
//! asynchronous.

pub mod builtins;
mod context;
mod dispatcher;
mod registry;
mod resolver;

pub use builtins::register_builtins;
pub use context::{DispatchContext, NodeResolver};
pub use dispatcher::{split_command_line, DispatchResult, Dispatcher};
pub use registry::{
    AsyncHandlerFn, HandlerBuilder, HandlerDescriptor, HandlerKind, HandlerRegistry, HandlerSet,
    HandlerTarget, SyncHandlerFn,
};
pub use resolver::{Arg, Args, ParamSpec, ParamType};
