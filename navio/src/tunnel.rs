//! Keyed publish/subscribe channel for runtime option patches.
//!
//! ## Usage
//!
//! Mounted containers subscribe to [`TunnelEvent::UpdateOptions`] for their
//! kind; `updateOptions` calls publish an [`OptionsPatch`]. Delivery is
//! synchronous, in registration order, on the publisher's turn.
//!
//! A panicking listener is isolated: the panic is caught and logged and the
//! remaining listeners still receive the payload.

use std::{
    any::Any,
    fmt,
    hash::Hash,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{diagnostics::Diagnostics, layout::ContainerKind, options::Options};

type Listener<P> = Arc<dyn Fn(&P) + Send + Sync>;

struct ListenerEntry<P> {
    id: u64,
    listener: Listener<P>,
    /// Set for `subscribe_once` listeners; flipped on first delivery.
    fired: Option<Arc<AtomicBool>>,
}

impl<P> Clone for ListenerEntry<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            listener: Arc::clone(&self.listener),
            fired: self.fired.clone(),
        }
    }
}

type ListenerList<P> = SmallVec<[ListenerEntry<P>; 2]>;

struct Registry<E, P> {
    events: FxHashMap<E, ListenerList<P>>,
}

impl<E: Eq + Hash, P> Registry<E, P> {
    fn contains(&self, event: &E, id: u64) -> bool {
        self.events
            .get(event)
            .is_some_and(|listeners| listeners.iter().any(|entry| entry.id == id))
    }

    fn remove(&mut self, event: &E, id: u64) {
        let Some(listeners) = self.events.get_mut(event) else {
            return;
        };
        listeners.retain(|entry| entry.id != id);
        if listeners.is_empty() {
            self.events.remove(event);
        }
    }
}

/// Typed, keyed event bus.
pub struct Tunnel<E, P> {
    registry: Arc<Mutex<Registry<E, P>>>,
    next_id: AtomicU64,
    diagnostics: Diagnostics,
}

impl<E, P> Tunnel<E, P>
where
    E: Eq + Hash + Clone + fmt::Display + Send + Sync + 'static,
    P: 'static,
{
    /// Empty tunnel logging listener failures through `tracing`.
    pub fn new() -> Self {
        Self::with_diagnostics(Diagnostics::default())
    }

    pub(crate) fn with_diagnostics(diagnostics: Diagnostics) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                events: FxHashMap::default(),
            })),
            next_id: AtomicU64::new(1),
            diagnostics,
        }
    }

    /// Register `listener` for `event`.
    ///
    /// Several listeners per event are allowed. The returned handle removes
    /// the listener when [`Subscription::unsubscribe`] is called.
    pub fn subscribe<F>(&self, event: E, listener: F) -> Subscription
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.register(event, Arc::new(listener), None)
    }

    /// Register a listener that is removed after its first delivery.
    pub fn subscribe_once<F>(&self, event: E, listener: F) -> Subscription
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.register(
            event,
            Arc::new(listener),
            Some(Arc::new(AtomicBool::new(false))),
        )
    }

    fn register(
        &self,
        event: E,
        listener: Listener<P>,
        fired: Option<Arc<AtomicBool>>,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry
            .lock()
            .events
            .entry(event.clone())
            .or_default()
            .push(ListenerEntry {
                id,
                listener,
                fired,
            });

        let registry: Weak<Mutex<Registry<E, P>>> = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.lock().remove(&event, id);
            }
        })
    }

    /// Deliver `payload` to every listener of `event`.
    ///
    /// Returns how many listeners ran to completion. Publishing an event with
    /// no listeners is a no-op.
    ///
    /// Only listeners registered when the publish starts are considered, and
    /// each is skipped if it was unsubscribed before its turn, including by an
    /// earlier listener of the same publish.
    pub fn publish(&self, event: &E, payload: &P) -> usize {
        // Never hold the lock across a listener call: listeners may subscribe
        // or unsubscribe while running.
        let snapshot: ListenerList<P> = match self.registry.lock().events.get(event) {
            Some(listeners) => listeners.clone(),
            None => return 0,
        };

        let mut delivered = 0;
        for entry in snapshot {
            {
                let mut registry = self.registry.lock();
                if !registry.contains(event, entry.id) {
                    continue;
                }
                if let Some(fired) = &entry.fired {
                    if fired.swap(true, Ordering::AcqRel) {
                        continue;
                    }
                    registry.remove(event, entry.id);
                }
            }
            let listener = entry.listener;
            match catch_unwind(AssertUnwindSafe(|| (*listener)(payload))) {
                Ok(()) => delivered += 1,
                Err(panic) => self.diagnostics.error(format!(
                    "listener for \"{event}\" panicked: {}",
                    panic_message(&*panic)
                )),
            }
        }
        delivered
    }

    /// Number of listeners currently registered for `event`.
    pub fn listener_count(&self, event: &E) -> usize {
        self.registry
            .lock()
            .events
            .get(event)
            .map_or(0, |listeners| listeners.len())
    }
}

impl<E, P> Default for Tunnel<E, P>
where
    E: Eq + Hash + Clone + fmt::Display + Send + Sync + 'static,
    P: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E, P> fmt::Debug for Tunnel<E, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tunnel")
            .field("events", &self.registry.lock().events.len())
            .finish_non_exhaustive()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic payload>"
    }
}

/// Handle returned by [`Tunnel::subscribe`].
///
/// Dropping the handle keeps the listener registered.
#[must_use = "dropping a Subscription keeps the listener registered forever"]
pub struct Subscription {
    remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new(remove: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            remove: Some(Box::new(remove)),
        }
    }

    /// Remove the listener. Safe to call after the tunnel is gone.
    pub fn unsubscribe(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Events navio publishes internally.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TunnelEvent {
    /// Options of an item of a container of this kind were patched.
    UpdateOptions(ContainerKind),
}

impl fmt::Display for TunnelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TunnelEvent::UpdateOptions(kind) => write!(f, "{kind}.updateOptions"),
        }
    }
}

/// Payload of [`TunnelEvent::UpdateOptions`].
#[derive(Clone, Debug, PartialEq)]
pub struct OptionsPatch {
    /// Item name inside its container.
    pub name: String,
    /// Partial options, merged over earlier patches for the same name.
    pub options: Options,
}

/// The tunnel type used by [`crate::Navio`].
pub type NavioTunnel = Tunnel<TunnelEvent, OptionsPatch>;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::diagnostics::{LogLevel, MemorySink};

    type BoxedListener = Box<dyn Fn(&OptionsPatch) + Send + Sync>;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&'static str) -> BoxedListener) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let make = move |tag: &'static str| -> BoxedListener {
            let sink = Arc::clone(&sink);
            Box::new(move |patch: &OptionsPatch| {
                sink.lock().push(format!("{tag}:{}", patch.name));
            })
        };
        (seen, make)
    }

    fn patch(name: &str) -> OptionsPatch {
        OptionsPatch {
            name: name.to_owned(),
            options: Options::new(),
        }
    }

    const TABS: TunnelEvent = TunnelEvent::UpdateOptions(ContainerKind::Tabs);
    const DRAWERS: TunnelEvent = TunnelEvent::UpdateOptions(ContainerKind::Drawers);

    #[test]
    fn event_names_match_the_public_vocabulary() {
        assert_eq!(TABS.to_string(), "tabs.updateOptions");
        assert_eq!(DRAWERS.to_string(), "drawers.updateOptions");
    }

    #[test]
    fn delivers_in_registration_order_to_matching_event_only() {
        let tunnel = NavioTunnel::new();
        let (seen, make) = recorder();
        let _a = tunnel.subscribe(TABS, make("a"));
        let _b = tunnel.subscribe(TABS, make("b"));
        let _c = tunnel.subscribe(DRAWERS, make("c"));

        assert_eq!(tunnel.publish(&TABS, &patch("One")), 2);
        assert_eq!(*seen.lock(), vec!["a:One", "b:One"]);
    }

    #[test]
    fn publish_without_listeners_is_a_no_op() {
        let tunnel = NavioTunnel::new();
        assert_eq!(tunnel.publish(&TABS, &patch("One")), 0);
    }

    #[test]
    fn once_listeners_fire_exactly_once() {
        let tunnel = NavioTunnel::new();
        let (seen, make) = recorder();
        let _once = tunnel.subscribe_once(TABS, make("once"));
        let _always = tunnel.subscribe(TABS, make("always"));

        tunnel.publish(&TABS, &patch("1"));
        tunnel.publish(&TABS, &patch("2"));

        assert_eq!(*seen.lock(), vec!["once:1", "always:1", "always:2"]);
        assert_eq!(tunnel.listener_count(&TABS), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let tunnel = NavioTunnel::new();
        let (seen, make) = recorder();
        let sub = tunnel.subscribe(TABS, make("a"));

        sub.unsubscribe();
        tunnel.publish(&TABS, &patch("One"));

        assert!(seen.lock().is_empty());
        assert_eq!(tunnel.listener_count(&TABS), 0);
    }

    #[test]
    fn listener_may_unsubscribe_itself_while_running() {
        let tunnel = Arc::new(NavioTunnel::new());
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let hits = Arc::new(AtomicU64::new(0));

        let inner_slot = Arc::clone(&slot);
        let inner_hits = Arc::clone(&hits);
        let sub = tunnel.subscribe(TABS, move |_| {
            inner_hits.fetch_add(1, Ordering::SeqCst);
            if let Some(sub) = inner_slot.lock().take() {
                sub.unsubscribe();
            }
        });
        *slot.lock() = Some(sub);

        tunnel.publish(&TABS, &patch("x"));
        tunnel.publish(&TABS, &patch("y"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_unsubscribed_by_an_earlier_one_is_skipped() {
        let tunnel = NavioTunnel::new();
        let (seen, make) = recorder();
        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&victim);
        let _first = tunnel.subscribe(TABS, move |_| {
            if let Some(sub) = slot.lock().take() {
                sub.unsubscribe();
            }
        });
        *victim.lock() = Some(tunnel.subscribe(TABS, make("second")));
        let _third = tunnel.subscribe(TABS, make("third"));

        assert_eq!(tunnel.publish(&TABS, &patch("One")), 2);
        assert_eq!(*seen.lock(), vec!["third:One"]);
        assert_eq!(tunnel.listener_count(&TABS), 2);
    }

    #[test]
    fn listener_subscribed_during_publish_waits_for_the_next_one() {
        let tunnel = Arc::new(NavioTunnel::new());
        let (seen, make) = recorder();
        let make = Arc::new(make);
        let added: Arc<Mutex<Vec<Subscription>>> = Arc::new(Mutex::new(Vec::new()));

        let inner_tunnel = Arc::downgrade(&tunnel);
        let inner_added = Arc::clone(&added);
        let inner_make = Arc::clone(&make);
        let _adder = tunnel.subscribe(TABS, move |_| {
            let Some(tunnel) = inner_tunnel.upgrade() else {
                return;
            };
            if inner_added.lock().is_empty() {
                let sub = tunnel.subscribe(TABS, (*inner_make)("late"));
                inner_added.lock().push(sub);
            }
        });

        tunnel.publish(&TABS, &patch("1"));
        assert!(seen.lock().is_empty());
        tunnel.publish(&TABS, &patch("2"));
        assert_eq!(*seen.lock(), vec!["late:2"]);
    }

    #[test]
    fn panicking_listener_is_isolated_and_logged() {
        let sink = Arc::new(MemorySink::new());
        let tunnel = NavioTunnel::with_diagnostics(Diagnostics::new(sink.clone()));
        let (seen, make) = recorder();
        let _boom = tunnel.subscribe(TABS, |_| panic!("boom"));
        let _after = tunnel.subscribe(TABS, make("after"));

        assert_eq!(tunnel.publish(&TABS, &patch("One")), 1);
        assert_eq!(*seen.lock(), vec!["after:One"]);
        assert!(sink.contains(LogLevel::Error, "boom"));
        assert!(sink.contains(LogLevel::Error, "tabs.updateOptions"));
    }
}
