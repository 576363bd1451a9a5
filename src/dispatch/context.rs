//! Per-dispatch context supplied by the host.

use std::sync::Arc;

use crate::value::NodeRef;

/// Callback resolving a textual lookup key to a host object.
///
/// The host installs one of these so node-typed parameters can be resolved by
/// name (e.g. looking a scene-graph node up by path).
pub type NodeResolver = Arc<dyn Fn(&str) -> Option<NodeRef> + Send + Sync>;

/// Context handed to the dispatcher for one dispatch call.
///
/// Carries the host-side hooks argument resolution may need. Cheap to clone;
/// hosts typically build one at startup and reuse it for every dispatch.
#[derive(Clone, Default)]
pub struct DispatchContext {
    node_resolver: Option<NodeResolver>,
}

impl DispatchContext {
    /// Context with no host hooks installed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the node resolver used for node-typed parameters.
    pub fn with_node_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str) -> Option<NodeRef> + Send + Sync + 'static,
    {
        self.node_resolver = Some(Arc::new(resolver));
        self
    }

    /// The installed node resolver, if any.
    pub fn node_resolver(&self) -> Option<&NodeResolver> {
        self.node_resolver.as_ref()
    }
}
