#![forbid(unsafe_code)]

//! Per-element mutation hooks.
//!
//! A [`CollectionHooks`] implementation sees every single-element effect of
//! every operation, including the ones buried inside range operations, so a
//! specialized collection can react to element arrival and departure without
//! re-deriving the range logic.
//!
//! Hooks run during the storage phase, before any notification is raised.
//! They receive the collection's state as it is at that step of the
//! sequential edit:
//!
//! - removals are reported from the highest index to the lowest, each index
//!   valid before that element is detached;
//! - insertions are reported from the lowest index to the highest, each
//!   index valid after that element is attached.
//!
//! Hooks must not call back into the collection; the storage is borrowed
//! while they run. A mutating call made from a hook fails with
//! [`CollectionError::ReentrancyViolation`](crate::CollectionError::ReentrancyViolation),
//! and a read panics.

/// Observer of single-element storage effects. Every method defaults to a
/// no-op.
pub trait CollectionHooks<T> {
    /// `item` now lives at `index`.
    fn on_insert(&mut self, index: usize, item: &T) {
        let _ = (index, item);
    }

    /// `item` was detached from `index`.
    fn on_remove(&mut self, index: usize, item: &T) {
        let _ = (index, item);
    }

    /// The element at `index` was substituted: `old` out, `new` in.
    fn on_set(&mut self, index: usize, old: &T, new: &T) {
        let _ = (index, old, new);
    }

    /// `item` was relocated from `old_index` to `new_index`.
    fn on_move(&mut self, old_index: usize, new_index: usize, item: &T) {
        let _ = (old_index, new_index, item);
    }
}

/// Hooks that do nothing. The default for every collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl<T> CollectionHooks<T> for NoHooks {}
