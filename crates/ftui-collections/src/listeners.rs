#![forbid(unsafe_code)]

//! Ordered listener registry with RAII unsubscription.
//!
//! # Design
//!
//! Listeners are stored as `Weak` callbacks; the strong `Rc` lives inside
//! the [`Subscription`] handed back to the caller, next to a shared
//! `registered` flag. Dropping (or explicitly
//! [`unsubscribe`](Subscription::unsubscribe)-ing) the subscription clears
//! the flag at once, and unregistered entries are pruned lazily on the next
//! snapshot.
//!
//! Dispatch never iterates the registry itself. [`ListenerSet::snapshot`]
//! upgrades the registered callbacks into an owned `Vec` first, so listeners
//! that subscribe or unsubscribe while a notification is in flight cannot
//! disturb the iteration; their change is visible from the next dispatch
//! onward. The snapshot keeps an unsubscribed callback's `Rc` alive until the
//! dispatch ends, which is why liveness is read from the flag and not from
//! the `Weak` strong count.
//!
//! # Performance
//!
//! | Operation      | Complexity          |
//! |----------------|---------------------|
//! | `add()`        | O(1) amortized      |
//! | `live_count()` | O(L)                |
//! | `snapshot()`   | O(L), L = listeners |

use std::cell::Cell;
use std::rc::{Rc, Weak};

type CallbackRc<A> = Rc<dyn Fn(&A)>;
type CallbackWeak<A> = Weak<dyn Fn(&A)>;

struct Entry<A: ?Sized> {
    callback: CallbackWeak<A>,
    registered: Rc<Cell<bool>>,
}

impl<A: ?Sized> Entry<A> {
    fn is_live(&self) -> bool {
        self.registered.get() && self.callback.strong_count() > 0
    }
}

/// Registration-ordered set of callbacks receiving `&A`.
pub(crate) struct ListenerSet<A: ?Sized> {
    entries: Vec<Entry<A>>,
}

impl<A: ?Sized> ListenerSet<A> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Listeners whose subscription is still held, even while an in-flight
    /// snapshot keeps an unsubscribed callback alive.
    pub(crate) fn live_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_live()).count()
    }

    /// Prune dead entries and return the live callbacks in registration order.
    pub(crate) fn snapshot(&mut self) -> Vec<CallbackRc<A>> {
        self.entries.retain(Entry::is_live);
        self.entries
            .iter()
            .filter_map(|e| e.callback.upgrade())
            .collect()
    }
}

impl<A: ?Sized + 'static> ListenerSet<A> {
    /// Register `callback`; the returned guard keeps it alive.
    pub(crate) fn add(&mut self, callback: impl Fn(&A) + 'static) -> Subscription {
        let strong: CallbackRc<A> = Rc::new(callback);
        let registered = Rc::new(Cell::new(true));
        self.entries.push(Entry {
            callback: Rc::downgrade(&strong),
            registered: Rc::clone(&registered),
        });
        Subscription {
            _guard: Box::new(strong),
            registered,
        }
    }
}

/// RAII guard for a registered listener.
///
/// Dropping the `Subscription` unregisters the callback: it will not be
/// invoked by any dispatch that starts afterwards.
#[must_use = "dropping a Subscription immediately unregisters the listener"]
pub struct Subscription {
    /// Type-erased strong reference keeping the callback `Rc` alive.
    _guard: Box<dyn std::any::Any>,
    /// Shared with the registry entry; cleared on drop.
    registered: Rc<Cell<bool>>,
}

impl Subscription {
    /// Unregister the listener now. Equivalent to dropping the guard.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registered.set(false);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
