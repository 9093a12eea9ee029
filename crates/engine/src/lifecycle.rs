//! Lifecycle hooks and the interceptor chain.
//!
//! The engine never wraps or patches host callbacks. Instead it exposes
//! plain lifecycle hooks through [`NodeLifecycle`], and a thin host adapter
//! invokes the [`InterceptorChain`] from whatever extension API the target
//! editor provides. Interceptors run in registration order for every hook.

use wavespeed_types::PersistedDocument;

/// Hooks a node extension can participate in.
///
/// Default implementations are no-ops so an interceptor only implements the
/// hooks it cares about.
pub trait NodeLifecycle {
    /// The node was created or became visible; bindings may be built.
    fn on_activate(&mut self) {}

    /// The host is serializing the node; contribute to the document.
    fn on_serialize(&mut self, _document: &mut PersistedDocument) {}

    /// The host loaded a document into the node; consume saved state.
    fn on_configure(&mut self, _document: &PersistedDocument) {}
}

/// Ordered list of lifecycle interceptors.
#[derive(Default)]
pub struct InterceptorChain {
    interceptors: Vec<Box<dyn NodeLifecycle>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interceptor; it will run after everything registered
    /// before it.
    pub fn register(&mut self, interceptor: Box<dyn NodeLifecycle>) {
        self.interceptors.push(interceptor);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Runs every `on_activate` hook in order.
    pub fn activate(&mut self) {
        for interceptor in &mut self.interceptors {
            interceptor.on_activate();
        }
    }

    /// Runs every `on_serialize` hook in order against one document.
    pub fn serialize(&mut self, document: &mut PersistedDocument) {
        for interceptor in &mut self.interceptors {
            interceptor.on_serialize(document);
        }
    }

    /// Runs every `on_configure` hook in order.
    pub fn configure(&mut self, document: &PersistedDocument) {
        for interceptor in &mut self.interceptors {
            interceptor.on_configure(document);
        }
    }
}
