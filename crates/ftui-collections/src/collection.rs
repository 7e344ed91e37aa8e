#![forbid(unsafe_code)]

//! Observable ordered collection with batched range operations.
//!
//! # Design
//!
//! [`ObservableVec<T>`] keeps its elements in shared, reference-counted
//! storage (`Rc<RefCell<..>>`), like `Observable` in `ftui-runtime`.
//! Cloning the handle shares the same elements and the same listeners.
//!
//! Every mutation follows the same four steps:
//!
//! 1. materialize any input sequence into a snapshot `Vec<T>`;
//! 2. check the reentrancy guard, then validate indices (nothing has been
//!    touched yet, so a rejected call leaves the collection unchanged);
//! 3. edit the storage, reporting each element effect to the
//!    [`CollectionHooks`];
//! 4. release the storage borrow and raise `Count` (for `Add`, `Remove`,
//!    `Reset`, and a `Replace` that changed the length), then `Item[]`,
//!    then exactly one [`ChangeNotification`].
//!
//! Listeners run with no borrow held, so they may read the collection, and
//! a sole listener may even mutate it.
//!
//! # Reentrancy
//!
//! While a change notification is being dispatched the guard depth is
//! non-zero. A mutation attempted at that point fails with
//! [`CollectionError::ReentrancyViolation`] if more than one change listener
//! is registered (or always, under [`ReentrancyPolicy::Strict`]). The
//! remaining listeners still receive the in-flight notification.
//!
//! # Performance
//!
//! | Operation                 | Complexity                        |
//! |---------------------------|-----------------------------------|
//! | `get()` / `len()`         | O(1)                              |
//! | `insert_range()`          | O(n + k), one notification        |
//! | `remove_range()`          | O(n + k), one notification        |
//! | `replace_range()`         | O(n + k + m), one notification    |
//! | `move_item()`             | O(\|old - new\|)                  |
//! | dispatch                  | O(L), L = live listeners          |

use std::cell::{RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use tracing::{debug_span, trace, warn};

use crate::change::{ChangeNotification, CollectionProperty};
use crate::config::CollectionConfig;
use crate::error::{CollectionError, CollectionResult};
use crate::guard::{ReentrancyGuard, ReentrancyMonitor, ReentrancyPolicy};
use crate::hooks::{CollectionHooks, NoHooks};
use crate::listeners::{ListenerSet, Subscription};

struct Inner<T> {
    items: Vec<T>,
    version: u64,
    policy: ReentrancyPolicy,
    change_listeners: ListenerSet<ChangeNotification<T>>,
    property_listeners: ListenerSet<CollectionProperty>,
    hooks: Box<dyn CollectionHooks<T>>,
}

/// Whether a change notification is preceded by a `Count` signal.
/// `Item[]` is raised for every change.
#[derive(Clone, Copy, PartialEq, Eq)]
enum CountSignal {
    Raise,
    Skip,
}

/// A shared, ordered, observable collection.
///
/// # Invariants
///
/// 1. Each successful mutating call raises at most one change notification.
/// 2. Notification payloads list items in collection order.
/// 3. A failed call leaves elements, version, and listeners untouched.
/// 4. `version` increments by exactly 1 per raised change notification.
/// 5. Listeners are notified in registration order.
pub struct ObservableVec<T> {
    inner: Rc<RefCell<Inner<T>>>,
    monitor: ReentrancyMonitor,
}

// Manual Clone: shares the same Rc.
impl<T> Clone for ObservableVec<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            monitor: self.monitor.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ObservableVec")
            .field("items", &inner.items)
            .field("version", &inner.version)
            .field("listeners", &inner.change_listeners.live_count())
            .field("depth", &self.monitor.depth())
            .finish()
    }
}

impl<T: Clone + 'static> Default for ObservableVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> FromIterator<T> for ObservableVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T: Clone + 'static> From<Vec<T>> for ObservableVec<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T: Clone + 'static> ObservableVec<T> {
    /// Create an empty collection with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CollectionConfig::default())
    }

    /// Create an empty collection.
    #[must_use]
    pub fn with_config(config: CollectionConfig) -> Self {
        Self::build(Vec::with_capacity(config.initial_capacity), &config)
    }

    /// Take ownership of an existing ordered sequence.
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self::build(items, &CollectionConfig::default())
    }

    /// Take ownership of an existing ordered sequence.
    #[must_use]
    pub fn from_vec_with_config(mut items: Vec<T>, config: CollectionConfig) -> Self {
        items.reserve(config.initial_capacity.saturating_sub(items.len()));
        Self::build(items, &config)
    }

    /// Copy the elements of `source`, in iteration order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::InvalidArgument`] if `source` is `None`. An empty
    /// source is accepted.
    pub fn from_iter_checked<I>(source: Option<I>) -> CollectionResult<Self>
    where
        I: IntoIterator<Item = T>,
    {
        source
            .map(|items| items.into_iter().collect::<Self>())
            .ok_or(CollectionError::InvalidArgument { name: "collection" })
    }

    fn build(items: Vec<T>, config: &CollectionConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                items,
                version: 0,
                policy: config.reentrancy_policy,
                change_listeners: ListenerSet::new(),
                property_listeners: ListenerSet::new(),
                hooks: Box::new(NoHooks),
            })),
            monitor: ReentrancyMonitor::default(),
        }
    }

    /// Install per-element hooks, replacing any previous ones.
    #[must_use]
    pub fn with_hooks(self, hooks: impl CollectionHooks<T> + 'static) -> Self {
        self.inner.borrow_mut().hooks = Box::new(hooks);
        self
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Register a change listener. Dropping the returned guard unsubscribes.
    pub fn subscribe(&self, callback: impl Fn(&ChangeNotification<T>) + 'static) -> Subscription {
        self.inner.borrow_mut().change_listeners.add(callback)
    }

    /// Register a property listener for `Count` and `Item[]` signals.
    pub fn subscribe_property(
        &self,
        callback: impl Fn(CollectionProperty) + 'static,
    ) -> Subscription {
        self.inner
            .borrow_mut()
            .property_listeners
            .add(move |property: &CollectionProperty| callback(*property))
    }

    /// Number of live change listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().change_listeners.live_count()
    }

    /// Number of live property listeners.
    #[must_use]
    pub fn property_listener_count(&self) -> usize {
        self.inner.borrow().property_listeners.live_count()
    }

    // -----------------------------------------------------------------------
    // Reentrancy
    // -----------------------------------------------------------------------

    /// Block reentrant mutation until the returned guard drops.
    ///
    /// For composing layers that raise several notifications of their own
    /// and need the guard to span all of them.
    pub fn block_reentrancy(&self) -> ReentrancyGuard {
        self.monitor.enter()
    }

    /// Run `f` with reentrancy blocked. The block is released on every exit
    /// path, including a panic inside `f`.
    pub fn with_reentrancy_blocked<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        let _guard = self.monitor.enter();
        f(self)
    }

    /// Current guard depth (0 when idle).
    #[must_use]
    pub fn reentrancy_depth(&self) -> usize {
        self.monitor.depth()
    }

    /// Whether a dispatch or explicit block is in progress.
    #[must_use]
    pub fn is_dispatching(&self) -> bool {
        self.monitor.depth() > 0
    }

    /// The reentrancy policy in force.
    #[must_use]
    pub fn reentrancy_policy(&self) -> ReentrancyPolicy {
        self.inner.borrow().policy
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Clone of the element at `index`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfRange`] if `index >= len()`.
    pub fn get(&self, index: usize) -> CollectionResult<T> {
        let inner = self.inner.borrow();
        inner
            .items
            .get(index)
            .cloned()
            .ok_or_else(|| CollectionError::out_of_range(index, 1, inner.items.len()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().items.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<T> {
        self.inner.borrow().items.first().cloned()
    }

    #[must_use]
    pub fn last(&self) -> Option<T> {
        self.inner.borrow().items.last().cloned()
    }

    /// Clone of all elements, in order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.inner.borrow().items.clone()
    }

    /// Access the elements by reference without cloning.
    ///
    /// Mutating calls made from inside `f` fail with
    /// [`CollectionError::ReentrancyViolation`]; the storage is borrowed
    /// until `f` returns.
    ///
    /// # Panics
    ///
    /// Panics if `f` subscribes a listener to this collection.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.inner.borrow().items)
    }

    /// Number of change notifications raised so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    // -----------------------------------------------------------------------
    // Single-element mutations
    // -----------------------------------------------------------------------

    /// Insert `item` at `index`, shifting later elements right.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfRange`] if `index > len()`;
    /// [`CollectionError::ReentrancyViolation`] during a guarded dispatch.
    pub fn insert(&self, index: usize, item: T) -> CollectionResult<()> {
        self.insert_block("insert", Some(index), vec![item])
    }

    /// Append `item` at the end.
    ///
    /// # Errors
    ///
    /// [`CollectionError::ReentrancyViolation`] during a guarded dispatch.
    pub fn push(&self, item: T) -> CollectionResult<()> {
        self.insert_block("push", None, vec![item])
    }

    /// Remove and return the element at `index`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfRange`] if `index >= len()`;
    /// [`CollectionError::ReentrancyViolation`] during a guarded dispatch.
    pub fn remove_at(&self, index: usize) -> CollectionResult<T> {
        let mut inner = self.begin("remove_at")?;
        check_index(index, inner.items.len())?;
        let Inner { items, hooks, .. } = &mut *inner;
        let item = items.remove(index);
        hooks.on_remove(index, &item);
        let change = ChangeNotification::Remove {
            old_items: vec![item.clone()],
            start_index: index,
        };
        self.commit(inner, "remove_at", change, CountSignal::Raise);
        Ok(item)
    }

    /// Substitute the element at `index`, returning the old one.
    ///
    /// Reported to hooks as a removal followed by an insertion.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfRange`] if `index >= len()`;
    /// [`CollectionError::ReentrancyViolation`] during a guarded dispatch.
    pub fn replace_at(&self, index: usize, item: T) -> CollectionResult<T> {
        let mut inner = self.begin("replace_at")?;
        check_index(index, inner.items.len())?;
        let Inner { items, hooks, .. } = &mut *inner;
        let old = std::mem::replace(&mut items[index], item.clone());
        hooks.on_remove(index, &old);
        hooks.on_insert(index, &item);
        let change = ChangeNotification::Replace {
            old_items: vec![old.clone()],
            new_items: vec![item],
            start_index: index,
        };
        self.commit(inner, "replace_at", change, CountSignal::Skip);
        Ok(old)
    }

    /// Indexer assignment: like [`replace_at`](Self::replace_at), but
    /// reported to hooks through `on_set`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfRange`] if `index >= len()`;
    /// [`CollectionError::ReentrancyViolation`] during a guarded dispatch.
    pub fn set(&self, index: usize, item: T) -> CollectionResult<T> {
        let mut inner = self.begin("set")?;
        check_index(index, inner.items.len())?;
        let Inner { items, hooks, .. } = &mut *inner;
        let old = std::mem::replace(&mut items[index], item.clone());
        hooks.on_set(index, &old, &item);
        let change = ChangeNotification::Replace {
            old_items: vec![old.clone()],
            new_items: vec![item],
            start_index: index,
        };
        self.commit(inner, "set", change, CountSignal::Skip);
        Ok(old)
    }

    /// Relocate the element at `old_index` to `new_index`, preserving the
    /// relative order of all other elements.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfRange`] if either index is `>= len()`;
    /// [`CollectionError::ReentrancyViolation`] during a guarded dispatch.
    pub fn move_item(&self, old_index: usize, new_index: usize) -> CollectionResult<()> {
        let mut inner = self.begin("move_item")?;
        let len = inner.items.len();
        check_index(old_index, len)?;
        check_index(new_index, len)?;
        let Inner { items, hooks, .. } = &mut *inner;
        if old_index < new_index {
            items[old_index..=new_index].rotate_left(1);
        } else {
            items[new_index..=old_index].rotate_right(1);
        }
        let item = items[new_index].clone();
        hooks.on_move(old_index, new_index, &item);
        let change = ChangeNotification::Move {
            item,
            new_index,
            old_index,
        };
        self.commit(inner, "move_item", change, CountSignal::Skip);
        Ok(())
    }

    /// Remove every element. Always raises `Count`, `Item[]` and `Reset`,
    /// even when already empty.
    ///
    /// # Errors
    ///
    /// [`CollectionError::ReentrancyViolation`] during a guarded dispatch.
    pub fn clear(&self) -> CollectionResult<()> {
        let mut inner = self.begin("clear")?;
        let len = inner.items.len();
        let Inner { items, hooks, .. } = &mut *inner;
        detach(items, &mut **hooks, 0, len);
        self.commit(inner, "clear", ChangeNotification::Reset, CountSignal::Raise);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Range mutations
    // -----------------------------------------------------------------------

    /// Append `items` at the end as one block.
    ///
    /// # Errors
    ///
    /// [`CollectionError::ReentrancyViolation`] during a guarded dispatch.
    pub fn append_range<I>(&self, items: I) -> CollectionResult<()>
    where
        I: IntoIterator<Item = T>,
    {
        self.insert_block("append_range", None, items.into_iter().collect())
    }

    /// Insert `items` as a contiguous block starting at `index`.
    ///
    /// An empty `items` still raises an `Add` with an empty payload.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfRange`] if `index > len()`;
    /// [`CollectionError::ReentrancyViolation`] during a guarded dispatch.
    pub fn insert_range<I>(&self, index: usize, items: I) -> CollectionResult<()>
    where
        I: IntoIterator<Item = T>,
    {
        self.insert_block("insert_range", Some(index), items.into_iter().collect())
    }

    /// Remove the `count` elements starting at `index`.
    ///
    /// `count == 0` still raises a `Remove` with an empty payload.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfRange`] if `index + count > len()`;
    /// [`CollectionError::ReentrancyViolation`] during a guarded dispatch.
    pub fn remove_range(&self, index: usize, count: usize) -> CollectionResult<()> {
        let mut inner = self.begin("remove_range")?;
        let end = check_span(index, count, inner.items.len())?;
        let Inner { items, hooks, .. } = &mut *inner;
        let old_items = detach(items, &mut **hooks, index, end);
        let change = ChangeNotification::Remove {
            old_items,
            start_index: index,
        };
        self.commit(inner, "remove_range", change, CountSignal::Raise);
        Ok(())
    }

    /// Substitute the `count` elements starting at `index` with `items`,
    /// which may have a different length.
    ///
    /// Raises a single `Replace` when both spans are non-empty. A pure
    /// insertion (`count == 0`, including the empty case) raises `Add` and a
    /// pure removal (empty `items`) raises `Remove`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfRange`] if `index + count > len()`;
    /// [`CollectionError::ReentrancyViolation`] during a guarded dispatch.
    pub fn replace_range<I>(&self, index: usize, count: usize, items: I) -> CollectionResult<()>
    where
        I: IntoIterator<Item = T>,
    {
        let new_items: Vec<T> = items.into_iter().collect();
        let mut inner = self.begin("replace_range")?;
        let old_len = inner.items.len();
        let end = check_span(index, count, old_len)?;
        let Inner { items, hooks, .. } = &mut *inner;
        let old_items = detach(items, &mut **hooks, index, end);
        attach(items, &mut **hooks, index, &new_items);
        let new_len = items.len();
        let (change, count) = match (old_items.is_empty(), new_items.is_empty()) {
            (true, _) => (
                ChangeNotification::Add {
                    new_items,
                    start_index: index,
                },
                CountSignal::Raise,
            ),
            (false, true) => (
                ChangeNotification::Remove {
                    old_items,
                    start_index: index,
                },
                CountSignal::Raise,
            ),
            (false, false) => (
                ChangeNotification::Replace {
                    old_items,
                    new_items,
                    start_index: index,
                },
                if old_len == new_len {
                    CountSignal::Skip
                } else {
                    CountSignal::Raise
                },
            ),
        };
        self.commit(inner, "replace_range", change, count);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Borrow the storage for mutation after the reentrancy check.
    ///
    /// A call from inside [`with`](Self::with) or a hook finds the storage
    /// already borrowed and is rejected the same way.
    fn begin(&self, op: &'static str) -> CollectionResult<RefMut<'_, Inner<T>>> {
        let depth = self.monitor.depth();
        let Ok(inner) = self.inner.try_borrow_mut() else {
            let listeners = self
                .inner
                .try_borrow()
                .map_or(0, |inner| inner.change_listeners.live_count());
            warn!(
                op,
                depth,
                listeners,
                "rejected collection change while storage is borrowed"
            );
            return Err(CollectionError::ReentrancyViolation { depth, listeners });
        };
        if depth > 0 {
            let listeners = inner.change_listeners.live_count();
            if !inner.policy.permits(depth, listeners) {
                warn!(op, depth, listeners, "rejected reentrant collection change");
                return Err(CollectionError::ReentrancyViolation { depth, listeners });
            }
        }
        Ok(inner)
    }

    /// Shared body of every insertion. `index == None` appends at the
    /// length observed under the borrow.
    fn insert_block(
        &self,
        op: &'static str,
        index: Option<usize>,
        new_items: Vec<T>,
    ) -> CollectionResult<()> {
        let mut inner = self.begin(op)?;
        let len = inner.items.len();
        let index = index.unwrap_or(len);
        if index > len {
            return Err(CollectionError::out_of_range(index, 0, len));
        }
        let Inner { items, hooks, .. } = &mut *inner;
        attach(items, &mut **hooks, index, &new_items);
        let change = ChangeNotification::Add {
            new_items,
            start_index: index,
        };
        self.commit(inner, op, change, CountSignal::Raise);
        Ok(())
    }

    /// Bump the version, release the storage, and raise notifications.
    fn commit(
        &self,
        mut inner: RefMut<'_, Inner<T>>,
        op: &'static str,
        change: ChangeNotification<T>,
        count: CountSignal,
    ) {
        inner.version += 1;
        trace!(
            op,
            change = %change,
            len = inner.items.len(),
            version = inner.version,
            "collection changed"
        );
        drop(inner);

        if count == CountSignal::Raise {
            self.raise_property(CollectionProperty::Count);
        }
        self.raise_property(CollectionProperty::Indexer);
        self.raise_change(&change);
    }

    fn raise_property(&self, property: CollectionProperty) {
        let callbacks = self.inner.borrow_mut().property_listeners.snapshot();
        for cb in &callbacks {
            cb(&property);
        }
    }

    fn raise_change(&self, change: &ChangeNotification<T>) {
        let callbacks = self.inner.borrow_mut().change_listeners.snapshot();
        if callbacks.is_empty() {
            return;
        }
        let _span = debug_span!(
            "collection_dispatch",
            kind = change.kind().as_str(),
            listeners = callbacks.len()
        )
        .entered();
        let _guard = self.monitor.enter();
        for cb in &callbacks {
            cb(change);
        }
    }
}

impl<T: Clone + PartialEq + 'static> ObservableVec<T> {
    /// Index of the first element equal to `item`.
    #[must_use]
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.inner.borrow().items.iter().position(|x| x == item)
    }

    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.index_of(item).is_some()
    }

    /// Remove the first element equal to `item`. Returns `false`, raising
    /// nothing, if there is none.
    ///
    /// # Errors
    ///
    /// [`CollectionError::ReentrancyViolation`] during a guarded dispatch.
    pub fn remove_item(&self, item: &T) -> CollectionResult<bool> {
        match self.index_of(item) {
            Some(index) => self.remove_at(index).map(|_| true),
            None => Ok(false),
        }
    }
}

fn check_index(index: usize, len: usize) -> CollectionResult<()> {
    if index < len {
        Ok(())
    } else {
        Err(CollectionError::out_of_range(index, 1, len))
    }
}

fn check_span(index: usize, count: usize, len: usize) -> CollectionResult<usize> {
    match index.checked_add(count) {
        Some(end) if end <= len => Ok(end),
        _ => Err(CollectionError::out_of_range(index, count, len)),
    }
}

/// Detach `start..end`, reporting removals highest index first. The
/// returned block keeps collection order.
fn detach<T>(
    items: &mut Vec<T>,
    hooks: &mut dyn CollectionHooks<T>,
    start: usize,
    end: usize,
) -> Vec<T> {
    let removed: Vec<T> = items.drain(start..end).collect();
    for (offset, item) in removed.iter().enumerate().rev() {
        hooks.on_remove(start + offset, item);
    }
    removed
}

/// Attach `new_items` at `start`, reporting insertions lowest index first.
fn attach<T: Clone>(
    items: &mut Vec<T>,
    hooks: &mut dyn CollectionHooks<T>,
    start: usize,
    new_items: &[T],
) {
    items.splice(start..start, new_items.iter().cloned());
    for (offset, item) in new_items.iter().enumerate() {
        hooks.on_insert(start + offset, item);
    }
}
