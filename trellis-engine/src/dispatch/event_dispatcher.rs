use dashmap::DashMap;
use std::sync::Arc;

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Process-local publish/subscribe fan-out keyed by event name.
///
/// Multiple independent instances exist in one process; each owns its own
/// subscriber mapping and dies with its owner. Dispatching a name nobody
/// registered for is a no-op.
pub struct EventDispatcher<T> {
    handlers: DashMap<String, Vec<Handler<T>>>,
}

impl<T> EventDispatcher<T> {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    /// Store `handler` under `event`. Handlers registered under the same
    /// name are invoked in registration order.
    pub fn register<F>(&self, event: impl Into<String>, handler: F)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.handlers
            .entry(event.into())
            .or_default()
            .push(Arc::new(handler));
    }

    /// Invoke every handler registered under `event`, passing `payload`
    /// through unchanged.
    pub fn dispatch(&self, event: &str, payload: &T) {
        // Clone the handler list out of the map first so a handler may
        // register further handlers without deadlocking the shard.
        let Some(entry) = self.handlers.get(event) else {
            return;
        };
        let handlers = entry.value().clone();
        drop(entry);

        for handler in handlers {
            handler(payload);
        }
    }
}

impl<T> Default for EventDispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}
