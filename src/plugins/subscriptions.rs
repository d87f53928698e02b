//! Event-name to handler mapping owned by a plugin instance.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::traits::Event;

/// Handler bound to the owning plugin: it is handed `&mut P` on every call.
pub type EventHandler<P> = Arc<dyn Fn(&mut P, &Event) -> anyhow::Result<()> + Send + Sync>;

/// Subscriptions keyed by event name. At most one handler per name.
pub struct EventSubscriptions<P> {
    handlers: HashMap<String, EventHandler<P>>,
}

impl<P> EventSubscriptions<P> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Store `handler` under `event`. Returns `true` if it replaced one.
    pub fn insert<F>(&mut self, event: String, handler: F) -> bool
    where
        F: Fn(&mut P, &Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handlers.insert(event, Arc::new(handler)).is_some()
    }

    /// Remove the handler for `event`. Returns `false` if there was none.
    pub fn remove(&mut self, event: &str) -> bool {
        self.handlers.remove(event).is_some()
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Clone out the handler so the caller can invoke it with `&mut P`.
    pub fn get(&self, event: &str) -> Option<EventHandler<P>> {
        self.handlers.get(event).cloned()
    }

    pub fn contains(&self, event: &str) -> bool {
        self.handlers.contains_key(event)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Subscribed event names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }
}

impl<P> Default for EventSubscriptions<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for EventSubscriptions<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
