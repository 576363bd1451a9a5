//! Pending-call tracking for asynchronous handler invocations.
//!
//! Each asynchronous dispatch registers one call here. The interpreter holds
//! the returned [`PendingHandle`] and suspends on [`PendingHandle::wait`] (or
//! [`PendingCallTracker::wait_all`]) until the call reaches a terminal state.
//!
//! State machine per call: `Running` → `Completed` | `Cancelled` | `Faulted`.
//! A terminal call never re-enters `Running`, and a result arriving after
//! cancellation is discarded — cancellation is cooperative, the tracker does
//! not force-terminate host code it does not control.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, span, Instrument, Level};

use crate::error::HandlerResult;
use crate::value::Value;

/// Identifier of one in-flight asynchronous call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallId(u64);

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call#{}", self.0)
    }
}

/// Lifecycle state of a pending call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallState {
    /// The handler is still executing.
    Running,
    /// The handler finished normally with this value.
    Completed(Value),
    /// The interpreter abandoned the call before it finished.
    Cancelled,
    /// The handler failed (or panicked) after starting.
    Faulted(String),
}

impl CallState {
    /// Whether the call can no longer change state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

struct CallEntry {
    command: String,
    state: watch::Sender<CallState>,
    cancel: CancellationToken,
}

/// Tracks every in-flight asynchronous handler invocation.
///
/// Shared between the dispatcher (which registers calls) and the interpreter
/// (which waits on them). Internally thread-safe; terminal entries are kept
/// until [`reap_terminal`](Self::reap_terminal) so late waiters still observe
/// the outcome.
#[derive(Default)]
pub struct PendingCallTracker {
    calls: DashMap<u64, CallEntry>,
    next_id: AtomicU64,
}

impl PendingCallTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register and spawn one asynchronous call on `tracker`.
    ///
    /// `make` receives the call's cancellation token and returns the handler
    /// future; the future runs on the ambient tokio runtime. Panics inside
    /// the handler surface as `Faulted`, never as a crash of the dispatcher.
    pub(crate) fn spawn<F>(tracker: &Arc<Self>, command: &str, make: F) -> PendingHandle
    where
        F: FnOnce(CancellationToken) -> BoxFuture<'static, HandlerResult>,
    {
        let id = tracker.next_id.fetch_add(1, Ordering::Relaxed);
        let (state, rx) = watch::channel(CallState::Running);
        let cancel = CancellationToken::new();
        tracker.calls.insert(
            id,
            CallEntry {
                command: command.to_string(),
                state,
                cancel: cancel.clone(),
            },
        );

        let future = make(cancel);
        let task_tracker = Arc::clone(tracker);
        let task_span = span!(Level::DEBUG, "dialogue.pending", command = %command, call = id);
        tokio::spawn(
            async move {
                let outcome = match AssertUnwindSafe(future).catch_unwind().await {
                    Ok(Ok(value)) => CallState::Completed(value),
                    Ok(Err(err)) => CallState::Faulted(err.to_string()),
                    Err(payload) => CallState::Faulted(panic_message(payload)),
                };
                task_tracker.finish(id, outcome);
            }
            .instrument(task_span),
        );

        PendingHandle {
            id: CallId(id),
            command: command.to_string(),
            state: rx,
            tracker: Arc::clone(tracker),
        }
    }

    /// Apply a terminal outcome. Results arriving after cancellation (or any
    /// other terminal state) are discarded.
    fn finish(&self, id: u64, outcome: CallState) {
        let Some(entry) = self.calls.get(&id) else {
            return;
        };
        let applied = entry.state.send_if_modified(|state| {
            if matches!(state, CallState::Running) {
                *state = outcome.clone();
                true
            } else {
                false
            }
        });
        if !applied {
            debug!(call = id, command = %entry.command, "late result discarded");
        }
    }

    /// Request cancellation of a call.
    ///
    /// The call transitions to `Cancelled` immediately if still running; the
    /// handler is signalled through its token and its eventual result is
    /// discarded.
    pub fn cancel(&self, id: CallId) {
        let Some(entry) = self.calls.get(&id.0) else {
            return;
        };
        entry.cancel.cancel();
        let applied = entry.state.send_if_modified(|state| {
            if matches!(state, CallState::Running) {
                *state = CallState::Cancelled;
                true
            } else {
                false
            }
        });
        if applied {
            debug!(call = id.0, command = %entry.command, "call cancelled");
        }
    }

    /// Current state of a call, `None` if unknown or already reaped.
    pub fn state(&self, id: CallId) -> Option<CallState> {
        self.calls.get(&id.0).map(|e| e.state.borrow().clone())
    }

    /// Number of calls still running.
    pub fn running_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|e| !e.state.borrow().is_terminal())
            .count()
    }

    /// Suspend until every tracked call reaches a terminal state.
    ///
    /// Completion order of concurrent calls is not FIFO; this waits for the
    /// whole in-flight set as of the moment of the call.
    pub async fn wait_all(&self) {
        let receivers: Vec<_> = self
            .calls
            .iter()
            .filter(|e| !e.state.borrow().is_terminal())
            .map(|e| e.state.subscribe())
            .collect();
        for mut rx in receivers {
            let _ = rx.wait_for(CallState::is_terminal).await;
        }
    }

    /// Drop every terminal entry, returning how many were removed.
    pub fn reap_terminal(&self) -> usize {
        let before = self.calls.len();
        self.calls.retain(|_, e| !e.state.borrow().is_terminal());
        before - self.calls.len()
    }
}

/// Handle to one pending call, returned from dispatch.
#[derive(Clone)]
pub struct PendingHandle {
    id: CallId,
    command: String,
    state: watch::Receiver<CallState>,
    tracker: Arc<PendingCallTracker>,
}

impl PendingHandle {
    /// Identifier of the tracked call.
    pub fn id(&self) -> CallId {
        self.id
    }

    /// Name of the command that started the call.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Current state.
    pub fn state(&self) -> CallState {
        self.state.borrow().clone()
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.tracker.cancel(self.id);
    }

    /// Suspend until the call reaches a terminal state, and return it.
    ///
    /// Usable even after the tracker reaped the entry: the handle keeps its
    /// own view of the final state.
    pub async fn wait(&self) -> CallState {
        let mut rx = self.state.clone();
        match rx.wait_for(CallState::is_terminal).await {
            Ok(state) => (*state).clone(),
            // The tracker dropped the entry while the call was still
            // running; treat it as abandoned.
            Err(_) => CallState::Cancelled,
        }
    }
}

impl fmt::Debug for PendingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingHandle")
            .field("id", &self.id)
            .field("command", &self.command)
            .field("state", &self.state())
            .finish()
    }
}

/// Render a panic payload as text.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use std::time::Duration;

    fn spawn_sleeper(
        tracker: &Arc<PendingCallTracker>,
        sleep_ms: u64,
    ) -> PendingHandle {
        PendingCallTracker::spawn(tracker, "wait", move |token| {
            Box::pin(async move {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_millis(sleep_ms)) => Ok(Value::Null),
                    _ = token.cancelled() => Ok(Value::Null),
                }
            })
        })
    }

    #[tokio::test]
    async fn test_completion() {
        let tracker = Arc::new(PendingCallTracker::new());
        let handle =
            PendingCallTracker::spawn(&tracker, "roll", |_| Box::pin(async { Ok(Value::Number(4.0)) }));
        assert_eq!(handle.wait().await, CallState::Completed(Value::Number(4.0)));
        assert_eq!(tracker.running_count(), 0);
    }

    #[tokio::test]
    async fn test_fault_carries_handler_error() {
        let tracker = Arc::new(PendingCallTracker::new());
        let handle = PendingCallTracker::spawn(&tracker, "boom", |_| {
            Box::pin(async { Err(HandlerError::message("exploded")) })
        });
        match handle.wait().await {
            CallState::Faulted(reason) => assert!(reason.contains("exploded")),
            other => panic!("expected fault, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_panic_becomes_fault() {
        let tracker = Arc::new(PendingCallTracker::new());
        let handle =
            PendingCallTracker::spawn(&tracker, "panicky", |_| Box::pin(async { panic!("oh no") }));
        match handle.wait().await {
            CallState::Faulted(reason) => assert!(reason.contains("oh no")),
            other => panic!("expected fault, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_call_never_reports_completed() {
        let tracker = Arc::new(PendingCallTracker::new());
        let handle = spawn_sleeper(&tracker, 10_000);
        handle.cancel();
        assert_eq!(handle.wait().await, CallState::Cancelled);

        // The sleeper observes its token and returns; the late result must
        // not overwrite the terminal state.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(handle.state(), CallState::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_after_completion_is_ignored() {
        let tracker = Arc::new(PendingCallTracker::new());
        let handle =
            PendingCallTracker::spawn(&tracker, "quick", |_| Box::pin(async { Ok(Value::Null) }));
        let state = handle.wait().await;
        assert_eq!(state, CallState::Completed(Value::Null));
        handle.cancel();
        assert_eq!(handle.state(), CallState::Completed(Value::Null));
    }

    #[tokio::test]
    async fn test_wait_all_covers_the_inflight_set() {
        let tracker = Arc::new(PendingCallTracker::new());
        let first = spawn_sleeper(&tracker, 5);
        let second = spawn_sleeper(&tracker, 15);
        tracker.wait_all().await;
        assert!(first.state().is_terminal());
        assert!(second.state().is_terminal());
    }

    #[tokio::test]
    async fn test_reap_keeps_running_calls() {
        let tracker = Arc::new(PendingCallTracker::new());
        let done =
            PendingCallTracker::spawn(&tracker, "quick", |_| Box::pin(async { Ok(Value::Null) }));
        done.wait().await;
        let running = spawn_sleeper(&tracker, 10_000);

        assert_eq!(tracker.reap_terminal(), 1);
        assert_eq!(tracker.state(done.id()), None);
        assert!(tracker.state(running.id()).is_some());

        // The handle still knows the final state after the reap.
        assert_eq!(done.wait().await, CallState::Completed(Value::Null));
        running.cancel();
    }
}
