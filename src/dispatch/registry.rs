//! Handler registry: command/function name to handler descriptor.
//!
//! The registry is an explicit instance owned by the dispatcher, not a
//! process-wide singleton, so independent dispatch scopes (per test, per
//! project) coexist without shared mutable state. Population is an explicit,
//! testable step: hosts call [`HandlerRegistry::register`] directly or
//! implement [`HandlerSet`] to enumerate a type's handlers in one place.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::dispatch::context::NodeResolver;
use crate::dispatch::resolver::{Args, ParamSpec, ParamType};
use crate::error::{HandlerResult, RegistryError};
use crate::value::NodeRef;

/// Synchronous handler body.
pub type SyncHandlerFn = Arc<dyn Fn(Args) -> HandlerResult + Send + Sync>;

/// Asynchronous handler body. Receives the call's cancellation token for
/// cooperative cancellation.
pub type AsyncHandlerFn =
    Arc<dyn Fn(Args, CancellationToken) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// The callable behind a descriptor.
///
/// Instance handlers are closures capturing the host object (typically an
/// `Arc`); static handlers capture nothing.
#[derive(Clone)]
pub enum HandlerTarget {
    /// Completes before dispatch returns.
    Sync(SyncHandlerFn),
    /// Spawned as a pending call; completes later.
    Async(AsyncHandlerFn),
}

impl fmt::Debug for HandlerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Sync(..)"),
            Self::Async(_) => f.write_str("Async(..)"),
        }
    }
}

/// Whether a handler is a script command or a value-returning function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Script instruction with no return value.
    Command,
    /// Script expression call returning a value to the interpreter.
    Function,
}

impl HandlerKind {
    /// Kind label for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Function => "function",
        }
    }
}

/// A registered handler: name, signature, and target.
#[derive(Debug, Clone)]
pub struct HandlerDescriptor {
    name: String,
    kind: HandlerKind,
    params: Vec<ParamSpec>,
    target: HandlerTarget,
    injector: Option<String>,
}

impl HandlerDescriptor {
    /// Start building a command handler.
    pub fn command(name: impl Into<String>) -> HandlerBuilder {
        HandlerBuilder::new(name, HandlerKind::Command)
    }

    /// Start building a function handler.
    pub fn function(name: impl Into<String>) -> HandlerBuilder {
        HandlerBuilder::new(name, HandlerKind::Function)
    }

    /// Registered name (case-sensitive).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Command or function.
    pub fn kind(&self) -> HandlerKind {
        self.kind
    }

    /// Declared parameter list.
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Named injector overriding node resolution for this handler.
    pub fn injector(&self) -> Option<&str> {
        self.injector.as_deref()
    }

    /// Whether dispatch produces a pending call.
    pub fn is_async(&self) -> bool {
        matches!(self.target, HandlerTarget::Async(_))
    }

    pub(crate) fn target(&self) -> &HandlerTarget {
        &self.target
    }
}

/// Builder for [`HandlerDescriptor`].
///
/// Finishing with [`handle`](Self::handle) or
/// [`handle_async`](Self::handle_async) validates the signature.
pub struct HandlerBuilder {
    name: String,
    kind: HandlerKind,
    params: Vec<ParamSpec>,
    injector: Option<String>,
}

impl HandlerBuilder {
    fn new(name: impl Into<String>, kind: HandlerKind) -> Self {
        Self {
            name: name.into(),
            kind,
            params: Vec::new(),
            injector: None,
        }
    }

    /// Append one declared parameter.
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Append several declared parameters.
    pub fn params(mut self, specs: impl IntoIterator<Item = ParamSpec>) -> Self {
        self.params.extend(specs);
        self
    }

    /// Use the named injector for node-typed parameters instead of the
    /// dispatch context's resolver.
    pub fn injector(mut self, name: impl Into<String>) -> Self {
        self.injector = Some(name.into());
        self
    }

    /// Finish with a synchronous body.
    pub fn handle<F>(self, body: F) -> Result<HandlerDescriptor, RegistryError>
    where
        F: Fn(Args) -> HandlerResult + Send + Sync + 'static,
    {
        validate_params(&self.params)?;
        Ok(HandlerDescriptor {
            name: self.name,
            kind: self.kind,
            params: self.params,
            target: HandlerTarget::Sync(Arc::new(body)),
            injector: self.injector,
        })
    }

    /// Finish with an asynchronous body.
    pub fn handle_async<F, Fut>(self, body: F) -> Result<HandlerDescriptor, RegistryError>
    where
        F: Fn(Args, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        validate_params(&self.params)?;
        Ok(HandlerDescriptor {
            name: self.name,
            kind: self.kind,
            params: self.params,
            target: HandlerTarget::Async(Arc::new(move |args, token| Box::pin(body(args, token)))),
            injector: self.injector,
        })
    }
}

/// Enforce the collector invariant: at most one, and last.
fn validate_params(params: &[ParamSpec]) -> Result<(), RegistryError> {
    let collectors = params
        .iter()
        .filter(|p| p.ty() == ParamType::Collector)
        .count();
    if collectors > 1 {
        return Err(RegistryError::MultipleCollectors);
    }
    for (i, p) in params.iter().enumerate() {
        if p.ty() == ParamType::Collector && i != params.len() - 1 {
            return Err(RegistryError::CollectorNotLast {
                param: p.name().to_string(),
            });
        }
    }
    Ok(())
}

/// Host type exposing a set of handlers.
///
/// The discovery counterpart to attribute-driven registration: instead of a
/// reflective scan, the type enumerates its handlers in one explicit method,
/// capturing `self` in the closures that need an instance.
pub trait HandlerSet {
    /// Register every handler this set provides.
    fn register_handlers(&self, registry: &mut HandlerRegistry) -> Result<(), RegistryError>;
}

/// Registry of command and function handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, HandlerDescriptor>,
    injectors: HashMap<String, NodeResolver>,
    /// Dispatch counters per command name, for usage statistics.
    dispatch_counts: HashMap<String, Arc<AtomicU64>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler descriptor.
    ///
    /// Re-registering a name is a warning, not an error: the previous entry
    /// is displaced and returned.
    pub fn register(&mut self, descriptor: HandlerDescriptor) -> Option<HandlerDescriptor> {
        let name = descriptor.name().to_string();
        self.dispatch_counts
            .entry(name.clone())
            .or_insert_with(|| Arc::new(AtomicU64::new(0)));
        let displaced = self.handlers.insert(name.clone(), descriptor);
        if displaced.is_some() {
            warn!(
                command = %name,
                "duplicate handler registration; previous handler replaced"
            );
        }
        displaced
    }

    /// Remove a handler. No-op returning `None` when absent.
    pub fn unregister(&mut self, name: &str) -> Option<HandlerDescriptor> {
        self.handlers.remove(name)
    }

    /// Look a handler up by its registered name.
    pub fn lookup(&self, name: &str) -> Option<&HandlerDescriptor> {
        self.handlers.get(name)
    }

    /// Whether a handler is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered handler names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Apply every registration a [`HandlerSet`] declares.
    pub fn add_handler_set(&mut self, set: &dyn HandlerSet) -> Result<(), RegistryError> {
        set.register_handlers(self)
    }

    /// Install a named injector for handlers that override node resolution.
    pub fn register_injector<F>(&mut self, name: impl Into<String>, resolver: F)
    where
        F: Fn(&str) -> Option<NodeRef> + Send + Sync + 'static,
    {
        self.injectors.insert(name.into(), Arc::new(resolver));
    }

    /// Look a named injector up.
    pub fn injector(&self, name: &str) -> Option<&NodeResolver> {
        self.injectors.get(name)
    }

    /// Count one dispatch of `name`.
    pub(crate) fn note_dispatch(&self, name: &str) {
        if let Some(counter) = self.dispatch_counts.get(name) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Command usage statistics: dispatched commands with nonzero counts,
    /// most used first.
    pub fn command_stats(&self) -> Vec<(String, u64)> {
        let mut stats: Vec<_> = self
            .dispatch_counts
            .iter()
            .map(|(name, count)| (name.clone(), count.load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();
        stats.sort_by(|a, b| b.1.cmp(&a.1));
        stats
    }
}
