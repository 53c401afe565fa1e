//! Event plumbing shared by the retry, waiter and paginator helpers.
//!
//! Helpers emit typed events at each decision point (retry scheduled, poll
//! observed a status, page fetched). Callers attach listeners through the
//! `on_*` builder methods of each helper.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// An event emitted by one of the helpers.
pub trait OperationEvent: Send + Sync + fmt::Debug {
    /// Short, stable name of the event kind (e.g. "Retry", "Poll").
    fn event_type(&self) -> &'static str;

    /// When the event was produced.
    fn timestamp(&self) -> Instant;

    /// Name of the helper instance that produced the event.
    fn helper_name(&self) -> &str;
}

/// Receives events of one type.
pub trait EventListener<E: OperationEvent>: Send + Sync {
    /// Called for every emitted event.
    fn on_event(&self, event: &E);
}

/// Shared, type-erased listener.
pub type BoxedEventListener<E> = Arc<dyn EventListener<E>>;

/// The listeners attached to one helper instance.
#[derive(Clone)]
pub struct EventListeners<E: OperationEvent> {
    listeners: Vec<BoxedEventListener<E>>,
}

impl<E: OperationEvent> EventListeners<E> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Attaches a listener.
    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Delivers `event` to every listener.
    ///
    /// A panicking listener is isolated: the panic is caught and the
    /// remaining listeners still see the event.
    pub fn emit(&self, event: &E) {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            helper = event.helper_name(),
            event = event.event_type(),
            "helper event"
        );

        for listener in &self.listeners {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));
        }
    }

    /// Returns true when no listener is attached.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Number of attached listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: OperationEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: OperationEvent> fmt::Debug for EventListeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("len", &self.listeners.len())
            .finish()
    }
}

/// Closure-backed listener.
pub struct FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    f: F,
    _event: std::marker::PhantomData<fn(&E)>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    /// Wraps `f` as a listener.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _event: std::marker::PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: OperationEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}
