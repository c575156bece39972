//! Observer registry
//!
//! Listeners are registered per [`PeerEventKind`] and invoked synchronously on
//! the emitting task, after the registry lock has been released. A listener may
//! therefore register or remove listeners (including itself) while running.

use super::{PeerEvent, PeerEventKind};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Handle returned on registration, used to remove the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&PeerEvent) + Send + Sync>;

struct Registration {
    id: ListenerId,
    kind: PeerEventKind,
    once: bool,
    listener: Listener,
}

/// Per-peer registry of event listeners
#[derive(Default)]
pub struct Observers {
    next_id: AtomicU64,
    listeners: Mutex<Vec<Registration>>,
}

impl Observers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for every event of `kind`
    pub fn on<F>(&self, kind: PeerEventKind, listener: F) -> ListenerId
    where
        F: Fn(&PeerEvent) + Send + Sync + 'static,
    {
        self.register(kind, false, Arc::new(listener))
    }

    /// Register `listener` for the next event of `kind` only
    pub fn once<F>(&self, kind: PeerEventKind, listener: F) -> ListenerId
    where
        F: Fn(&PeerEvent) + Send + Sync + 'static,
    {
        self.register(kind, true, Arc::new(listener))
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|registration| registration.id != id);
        listeners.len() != before
    }

    /// Remove every listener for `kind`, returning how many were removed
    pub fn remove_all(&self, kind: PeerEventKind) -> usize {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|registration| registration.kind != kind);
        before - listeners.len()
    }

    /// Remove every listener
    pub fn clear(&self) {
        self.listeners.lock().clear();
    }

    #[must_use]
    pub fn listener_count(&self, kind: PeerEventKind) -> usize {
        self.listeners
            .lock()
            .iter()
            .filter(|registration| registration.kind == kind)
            .count()
    }

    /// Total registered listeners
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    /// Invoke every listener registered for the event's kind.
    ///
    /// Returns the number of listeners invoked.
    pub fn emit(&self, event: &PeerEvent) -> usize {
        let kind = event.kind();
        let matching: Vec<Listener> = {
            let mut listeners = self.listeners.lock();
            let matching = listeners
                .iter()
                .filter(|registration| registration.kind == kind)
                .map(|registration| Arc::clone(&registration.listener))
                .collect();
            listeners.retain(|registration| !(registration.once && registration.kind == kind));
            matching
        };

        for listener in &matching {
            listener(event);
        }
        matching.len()
    }

    fn register(&self, kind: PeerEventKind, once: bool, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push(Registration {
            id,
            kind,
            once,
            listener,
        });
        id
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("listeners", &self.len())
            .finish()
    }
}
