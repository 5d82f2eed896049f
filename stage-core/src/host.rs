//! Host element abstraction.
//!
//! The stage never talks to a DOM directly. The mount target (container) and
//! the measuring wrapper are reached through [`HostElement`], which lets the
//! same lifecycle code run against a browser binding or the in-process
//! [`HeadlessElement`].

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::PointerEventKind;

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a host element; surfaces are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementHandle(u64);

impl ElementHandle {
    /// Allocate a handle unique within the process.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "element-{}", self.0)
    }
}

/// Registration token for an event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Registration token for a resize observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

/// A DOM-like element the stage can mount into or measure.
pub trait HostElement {
    /// Stable identity of the element.
    fn element_handle(&self) -> ElementHandle;

    /// Current layout size in physical pixels.
    fn client_size(&self) -> (f64, f64);

    /// Start delivering pointer events of `kind` to the stage.
    fn add_listener(&self, kind: PointerEventKind) -> ListenerId;

    /// Stop delivering events for `id`. Returns whether it was registered.
    fn remove_listener(&self, id: ListenerId) -> bool;

    /// Start delivering resize notifications for this element.
    fn observe_resize(&self) -> ObserverId;

    /// Stop delivering resize notifications for `id`. Returns whether it was
    /// registered.
    fn unobserve_resize(&self, id: ObserverId) -> bool;
}

/// An in-process element that records registrations.
#[derive(Debug)]
pub struct HeadlessElement {
    handle: ElementHandle,
    size: Cell<(f64, f64)>,
    next_token: Cell<u64>,
    listeners: RefCell<BTreeMap<ListenerId, PointerEventKind>>,
    observers: RefCell<BTreeSet<ObserverId>>,
}

impl HeadlessElement {
    /// Create an element with the given layout size.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            handle: ElementHandle::next(),
            size: Cell::new((width, height)),
            next_token: Cell::new(1),
            listeners: RefCell::new(BTreeMap::new()),
            observers: RefCell::new(BTreeSet::new()),
        }
    }

    /// Change the layout size. The caller is responsible for delivering the
    /// resize notification.
    pub fn set_size(&self, width: f64, height: f64) {
        self.size.set((width, height));
    }

    /// Number of listeners currently attached.
    #[must_use]
    pub fn live_listeners(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Whether a listener for `kind` is attached.
    #[must_use]
    pub fn is_listening(&self, kind: PointerEventKind) -> bool {
        self.listeners.borrow().values().any(|&k| k == kind)
    }

    /// Number of resize observers currently attached.
    #[must_use]
    pub fn live_observers(&self) -> usize {
        self.observers.borrow().len()
    }

    fn token(&self) -> u64 {
        let token = self.next_token.get();
        self.next_token.set(token + 1);
        token
    }
}

impl HostElement for HeadlessElement {
    fn element_handle(&self) -> ElementHandle {
        self.handle
    }

    fn client_size(&self) -> (f64, f64) {
        self.size.get()
    }

    fn add_listener(&self, kind: PointerEventKind) -> ListenerId {
        let id = ListenerId(self.token());
        self.listeners.borrow_mut().insert(id, kind);
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.borrow_mut().remove(&id).is_some()
    }

    fn observe_resize(&self) -> ObserverId {
        let id = ObserverId(self.token());
        self.observers.borrow_mut().insert(id);
        id
    }

    fn unobserve_resize(&self, id: ObserverId) -> bool {
        self.observers.borrow_mut().remove(&id)
    }
}
