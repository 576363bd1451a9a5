//! Command dispatch: lookup, argument resolution, invocation.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, span, Level};

use crate::dispatch::context::{DispatchContext, NodeResolver};
use crate::dispatch::registry::{HandlerRegistry, HandlerTarget};
use crate::dispatch::resolver::resolve_args;
use crate::error::{ArgumentError, HandlerError, RegistryError};
use crate::pending::{panic_message, PendingCallTracker, PendingHandle};
use crate::value::Value;

/// Outcome of dispatching one command line.
#[derive(Debug)]
pub enum DispatchResult {
    /// No handler is registered under the command's name. Whether this is
    /// fatal or silently ignored is interpreter policy, not decided here.
    NotFound {
        /// The unresolved command name.
        command: String,
    },
    /// A synchronous handler completed; commands yield [`Value::Null`],
    /// functions their return value.
    Success(Value),
    /// An asynchronous handler was started; the interpreter suspends on the
    /// handle until the call resolves.
    Pending(PendingHandle),
    /// Token-to-argument resolution failed; the handler was never invoked.
    ArgumentError {
        /// Command whose invocation was malformed.
        command: String,
        /// The first failing conversion.
        source: ArgumentError,
    },
    /// The handler itself failed (error return or panic).
    InvocationError {
        /// Command whose handler failed.
        command: String,
        /// The underlying failure.
        source: HandlerError,
    },
}

impl DispatchResult {
    /// Whether the dispatch completed synchronously and successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Whether the dispatch started a pending call.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

/// Dispatches script command lines to registered handlers.
///
/// Owns its [`HandlerRegistry`] — there is no process-wide registry, so
/// independent dispatch scopes coexist (one per test, per loaded project).
/// Asynchronous handlers are spawned on the ambient tokio runtime and
/// tracked by the dispatcher's [`PendingCallTracker`].
pub struct Dispatcher {
    registry: HandlerRegistry,
    pending: Arc<PendingCallTracker>,
}

impl Dispatcher {
    /// Dispatcher with an empty registry.
    pub fn new() -> Self {
        Self::with_registry(HandlerRegistry::new())
    }

    /// Dispatcher over an already-populated registry.
    pub fn with_registry(registry: HandlerRegistry) -> Self {
        Self {
            registry,
            pending: Arc::new(PendingCallTracker::new()),
        }
    }

    /// Dispatcher set up from configuration: the built-in handlers are
    /// registered when `dispatch.builtins` is enabled.
    pub fn from_config(config: &crate::config::Config) -> Result<Self, RegistryError> {
        let mut dispatcher = Self::new();
        if config.dispatch.builtins {
            crate::dispatch::builtins::register_builtins(dispatcher.registry_mut())?;
        }
        Ok(dispatcher)
    }

    /// The owned registry.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Mutable access for registration.
    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }

    /// The tracker holding this dispatcher's pending calls.
    pub fn pending(&self) -> &Arc<PendingCallTracker> {
        &self.pending
    }

    /// Dispatch one command line.
    ///
    /// The line is split into a name token and argument tokens; the
    /// interpreter has already removed and validated the surrounding control
    /// syntax. Handler failures are returned, never propagated: dispatch
    /// itself does not panic and the dispatch loop can always continue.
    pub fn dispatch(&self, line: &str, ctx: &DispatchContext) -> DispatchResult {
        let tokens = split_command_line(line);
        let Some((name, arg_tokens)) = tokens.split_first() else {
            return DispatchResult::NotFound {
                command: String::new(),
            };
        };

        let cmd_span = span!(Level::DEBUG, "dialogue.command", command = %name);
        let _enter = cmd_span.enter();

        let Some(descriptor) = self.registry.lookup(name) else {
            debug!(command = %name, "no handler registered");
            return DispatchResult::NotFound {
                command: name.clone(),
            };
        };
        self.registry.note_dispatch(name);

        // A handler's named injector overrides the context's node resolver.
        let node_resolver: Option<&NodeResolver> = match descriptor.injector() {
            Some(injector) => self.registry.injector(injector),
            None => ctx.node_resolver(),
        };

        let args = match resolve_args(descriptor.params(), arg_tokens, node_resolver) {
            Ok(args) => args,
            Err(source) => {
                debug!(
                    command = %name,
                    error = %source,
                    code = source.error_code(),
                    "argument resolution failed"
                );
                return DispatchResult::ArgumentError {
                    command: name.clone(),
                    source,
                };
            }
        };

        match descriptor.target() {
            HandlerTarget::Sync(body) => {
                let body = Arc::clone(body);
                match catch_unwind(AssertUnwindSafe(move || body(args))) {
                    Ok(Ok(value)) => DispatchResult::Success(value),
                    Ok(Err(source)) => {
                        debug!(command = %name, error = %source, code = source.error_code(), "handler failed");
                        DispatchResult::InvocationError {
                            command: name.clone(),
                            source,
                        }
                    }
                    Err(payload) => {
                        let source = HandlerError::Panicked(panic_message(payload));
                        debug!(command = %name, error = %source, "handler panicked");
                        DispatchResult::InvocationError {
                            command: name.clone(),
                            source,
                        }
                    }
                }
            }
            HandlerTarget::Async(body) => {
                let body = Arc::clone(body);
                let handle =
                    PendingCallTracker::spawn(&self.pending, name, move |token| body(args, token));
                debug!(command = %name, call = %handle.id(), "pending call started");
                DispatchResult::Pending(handle)
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a command line into tokens: whitespace-separated, double quotes
/// group words, `\"` escapes inside quotes. Backslashes outside quotes are
/// literal.
pub fn split_command_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut started = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                started = true;
            }
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            c if c.is_whitespace() && !in_quotes => {
                if started {
                    tokens.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if started {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::registry::HandlerDescriptor;
    use crate::dispatch::resolver::ParamSpec;
    use crate::value::NodeRef;

    fn ctx() -> DispatchContext {
        DispatchContext::new()
    }

    #[test]
    fn test_split_plain_tokens() {
        assert_eq!(
            split_command_line("fade_out 2.5 wait"),
            vec!["fade_out", "2.5", "wait"]
        );
    }

    #[test]
    fn test_split_quoted_regions() {
        assert_eq!(
            split_command_line(r#"say "two words" now"#),
            vec!["say", "two words", "now"]
        );
        assert_eq!(split_command_line(r#"say """#), vec!["say", ""]);
        assert_eq!(
            split_command_line(r#"say "a \"quoted\" word""#),
            vec!["say", r#"a "quoted" word"#]
        );
    }

    #[test]
    fn test_split_empty_line() {
        assert!(split_command_line("").is_empty());
        assert!(split_command_line("   ").is_empty());
    }

    #[test]
    fn test_dispatch_not_found() {
        let dispatcher = Dispatcher::new();
        match dispatcher.dispatch("unknown_cmd arg1", &ctx()) {
            DispatchResult::NotFound { command } => assert_eq!(command, "unknown_cmd"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_dispatch_sync_function_value() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.registry_mut().register(
            HandlerDescriptor::function("add")
                .param(ParamSpec::int("a"))
                .param(ParamSpec::int("b"))
                .handle(|args| {
                    let a = args.int(0).ok_or(HandlerError::ArgumentMismatch)?;
                    let b = args.int(1).ok_or(HandlerError::ArgumentMismatch)?;
                    Ok(Value::from(a + b))
                })
                .unwrap(),
        );
        match dispatcher.dispatch("add 2 3", &ctx()) {
            DispatchResult::Success(Value::Number(n)) => assert_eq!(n, 5.0),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn test_dispatch_argument_error_names_command() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.registry_mut().register(
            HandlerDescriptor::command("shake")
                .param(ParamSpec::float("strength"))
                .handle(|_| Ok(Value::Null))
                .unwrap(),
        );
        match dispatcher.dispatch("shake hard", &ctx()) {
            DispatchResult::ArgumentError { command, source } => {
                assert_eq!(command, "shake");
                assert_eq!(source.error_code(), "invalid_number");
            }
            other => panic!("expected argument error, got {other:?}"),
        }
    }

    #[test]
    fn test_dispatch_catches_handler_panic() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.registry_mut().register(
            HandlerDescriptor::command("explode")
                .handle(|_| panic!("kaboom"))
                .unwrap(),
        );
        match dispatcher.dispatch("explode", &ctx()) {
            DispatchResult::InvocationError { command, source } => {
                assert_eq!(command, "explode");
                assert!(source.to_string().contains("kaboom"));
            }
            other => panic!("expected invocation error, got {other:?}"),
        }
        // The dispatcher survives and keeps working.
        assert!(matches!(
            dispatcher.dispatch("explode", &ctx()),
            DispatchResult::InvocationError { .. }
        ));
    }

    #[test]
    fn test_injector_overrides_context_resolver() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .registry_mut()
            .register_injector("props", |key: &str| {
                (key == "door").then(|| NodeRef::new("a door".to_string()))
            });
        dispatcher.registry_mut().register(
            HandlerDescriptor::command("open")
                .param(ParamSpec::node("target"))
                .injector("props")
                .handle(|args| {
                    args.node(0)
                        .and_then(|n| n.downcast_ref::<String>())
                        .map(|_| Value::Null)
                        .ok_or(HandlerError::ArgumentMismatch)
                })
                .unwrap(),
        );

        // Context resolver knows nothing; the injector resolves anyway.
        let result = dispatcher.dispatch("open door", &ctx());
        assert!(result.is_success(), "got {result:?}");

        let result = dispatcher.dispatch("open window", &ctx());
        assert!(matches!(result, DispatchResult::ArgumentError { .. }));
    }

    #[test]
    fn test_from_config_respects_builtins_toggle() {
        let config: crate::config::Config = toml::from_str(
            r#"
[locale]
code = "en"

[dispatch]
builtins = false
"#,
        )
        .unwrap();
        let dispatcher = Dispatcher::from_config(&config).unwrap();
        assert!(dispatcher.registry().is_empty());

        let config: crate::config::Config = toml::from_str("[locale]\ncode = \"en\"").unwrap();
        let dispatcher = Dispatcher::from_config(&config).unwrap();
        assert!(dispatcher.registry().contains("wait"));
    }

    #[test]
    fn test_command_stats_count_dispatches() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.registry_mut().register(
            HandlerDescriptor::command("nop")
                .handle(|_| Ok(Value::Null))
                .unwrap(),
        );
        dispatcher.dispatch("nop", &ctx());
        dispatcher.dispatch("nop", &ctx());
        assert_eq!(
            dispatcher.registry().command_stats(),
            vec![("nop".to_string(), 2)]
        );
    }
}
