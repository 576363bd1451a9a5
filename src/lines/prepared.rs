//! Delayed-resource line provider.
//!
//! Some lines depend on external resources — voice-over clips, late-loaded
//! translation tables. This wrapper turns `prepare_for_lines` into a real
//! suspension point: it kicks off asynchronous loading through a
//! [`ResourceLoader`] and keeps `lines_available` false until every requested
//! line is in.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::LineError;
use crate::lines::localized::{LineRequest, LocalizedLine};
use crate::lines::provider::{LineProvider, TableLineProvider};
use crate::lines::table::LineId;

/// Loads the auxiliary resource behind one line.
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    /// Load the resource for `id`. Called at most once per line id.
    async fn load(&self, id: &LineId) -> Result<(), LineError>;
}

struct PrepareState {
    loaded: HashSet<LineId>,
    in_flight: usize,
}

struct Shared {
    loader: Arc<dyn ResourceLoader>,
    state: Mutex<PrepareState>,
    ready: watch::Sender<bool>,
}

/// Provider wrapper that defers availability until per-line resources load.
///
/// Loading runs on the ambient tokio runtime; the interpreter suspends on
/// [`wait_until_available`](Self::wait_until_available) (or polls
/// `lines_available`) before requesting lines.
pub struct PreparedLineProvider {
    inner: TableLineProvider,
    shared: Arc<Shared>,
}

impl PreparedLineProvider {
    /// Wrap a table provider with a resource loader.
    pub fn new(inner: TableLineProvider, loader: Arc<dyn ResourceLoader>) -> Self {
        let (ready, _) = watch::channel(true);
        Self {
            inner,
            shared: Arc::new(Shared {
                loader,
                state: Mutex::new(PrepareState {
                    loaded: HashSet::new(),
                    in_flight: 0,
                }),
                ready,
            }),
        }
    }

    /// The wrapped always-ready provider.
    pub fn inner(&self) -> &TableLineProvider {
        &self.inner
    }

    /// Suspend until `lines_available` is true.
    pub async fn wait_until_available(&self) {
        let mut rx = self.shared.ready.subscribe();
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

impl LineProvider for PreparedLineProvider {
    fn locale(&self) -> &str {
        self.inner.locale()
    }

    fn prepare_for_lines(&self, ids: &[LineId]) {
        let missing: Vec<LineId> = {
            let mut state = self.shared.state.lock();
            let missing: Vec<LineId> = ids
                .iter()
                .filter(|id| !state.loaded.contains(*id))
                .cloned()
                .collect();
            if missing.is_empty() {
                return;
            }
            state.in_flight += 1;
            missing
        };

        self.shared.ready.send_replace(false);
        debug!(count = missing.len(), "preparing line resources");

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            for id in missing {
                if let Err(err) = shared.loader.load(&id).await {
                    // A failed load still counts as prepared; the failure
                    // resurfaces from the loader's owner when the line is
                    // actually used.
                    warn!(line = %id, error = %err, "line resource failed to load");
                }
                shared.state.lock().loaded.insert(id);
            }
            let mut state = shared.state.lock();
            state.in_flight -= 1;
            if state.in_flight == 0 {
                drop(state);
                shared.ready.send_replace(true);
                debug!("line resources ready");
            }
        });
    }

    fn lines_available(&self) -> bool {
        *self.shared.ready.borrow()
    }

    fn get_localized_line(&self, request: &LineRequest) -> Result<LocalizedLine, LineError> {
        debug_assert!(
            self.lines_available(),
            "get_localized_line called while lines_available() is false"
        );
        if !self.lines_available() {
            return Err(LineError::NotReady);
        }
        self.inner.get_localized_line(request)
    }
}
