#![forbid(unsafe_code)]

//! Change notification payloads.
//!
//! A [`ChangeNotification`] describes one mutation of an
//! [`ObservableVec`](crate::ObservableVec): what kind of change happened,
//! where it started, and which values were added or taken away. Range
//! operations produce a single coalesced notification, so dispatch cost is
//! O(1) per operation rather than per element.
//!
//! # Invariants
//!
//! 1. `Add` carries no old items; `Remove` carries no new items.
//! 2. `Replace` carries non-empty old and new spans sharing one start index.
//! 3. `Reset` carries nothing; listeners must discard cached state and
//!    re-read the collection.
//! 4. Item order in every payload is the left-to-right order of the
//!    collection, regardless of the order in which elements were detached.
//!
//! # Single-index consumers
//!
//! Listeners that only understand one-element changes can call
//! [`ChangeNotification::to_single_item_changes`], which expands a range
//! notification into an equivalent ordered sequence of one-element
//! notifications.

use std::fmt;

use crate::error::{CollectionError, CollectionResult};

/// Discriminant of a [`ChangeNotification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Add,
    Remove,
    Replace,
    Move,
    Reset,
}

impl ChangeKind {
    /// Stable lowercase name, used as a tracing field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Replace => "replace",
            Self::Move => "move",
            Self::Reset => "reset",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named property signals raised alongside change notifications.
///
/// `Count` fires when the length changes. `Indexer` fires after every
/// mutation and tells generic listeners that any index may now hold a
/// different value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionProperty {
    Count,
    Indexer,
}

impl CollectionProperty {
    /// The conventional property name (`"Count"` or `"Item[]"`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Count => "Count",
            Self::Indexer => "Item[]",
        }
    }
}

impl fmt::Display for CollectionProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An immutable description of one collection mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeNotification<T> {
    /// `new_items` were inserted as a contiguous block at `start_index`.
    Add { new_items: Vec<T>, start_index: usize },
    /// `old_items` were removed from the contiguous block at `start_index`.
    Remove { old_items: Vec<T>, start_index: usize },
    /// The block `old_items` at `start_index` was substituted by `new_items`.
    Replace {
        old_items: Vec<T>,
        new_items: Vec<T>,
        start_index: usize,
    },
    /// `item` was relocated from `old_index` to `new_index`.
    Move {
        item: T,
        new_index: usize,
        old_index: usize,
    },
    /// The whole collection was invalidated.
    Reset,
}

/// What a mirror must do after [`ChangeNotification::apply_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The mirror now matches the source.
    Applied,
    /// The mirror was cleared and must be re-read from the source.
    ResyncRequired,
}

impl<T> ChangeNotification<T> {
    #[must_use]
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::Add { .. } => ChangeKind::Add,
            Self::Remove { .. } => ChangeKind::Remove,
            Self::Replace { .. } => ChangeKind::Replace,
            Self::Move { .. } => ChangeKind::Move,
            Self::Reset => ChangeKind::Reset,
        }
    }

    /// Items that entered the collection. A `Move` reports its item here.
    #[must_use]
    pub fn new_items(&self) -> &[T] {
        match self {
            Self::Add { new_items, .. } | Self::Replace { new_items, .. } => new_items,
            Self::Move { item, .. } => std::slice::from_ref(item),
            Self::Remove { .. } | Self::Reset => &[],
        }
    }

    /// Items that left the collection. A `Move` reports its item here.
    #[must_use]
    pub fn old_items(&self) -> &[T] {
        match self {
            Self::Remove { old_items, .. } | Self::Replace { old_items, .. } => old_items,
            Self::Move { item, .. } => std::slice::from_ref(item),
            Self::Add { .. } | Self::Reset => &[],
        }
    }

    /// Index where the change begins. For `Move` this is the destination.
    /// `None` for `Reset`.
    #[must_use]
    pub fn start_index(&self) -> Option<usize> {
        match self {
            Self::Add { start_index, .. }
            | Self::Remove { start_index, .. }
            | Self::Replace { start_index, .. } => Some(*start_index),
            Self::Move { new_index, .. } => Some(*new_index),
            Self::Reset => None,
        }
    }

    /// Source index of a `Move`.
    #[must_use]
    pub fn old_index(&self) -> Option<usize> {
        match self {
            Self::Move { old_index, .. } => Some(*old_index),
            _ => None,
        }
    }

    /// Net change in collection length caused by this notification.
    /// `None` for `Reset`, whose effect is unknown to the listener.
    #[must_use]
    pub fn len_delta(&self) -> Option<isize> {
        match self {
            Self::Reset => None,
            _ => Some(self.new_items().len() as isize - self.old_items().len() as isize),
        }
    }
}

impl<T: Clone> ChangeNotification<T> {
    /// Replay this change onto `mirror`, a copy of the collection's
    /// contents as they were before the change.
    ///
    /// `Reset` clears the mirror and asks the caller to re-read the source.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfRange`] if the notification does not fit
    /// the mirror, which means the mirror is out of sync. The mirror is left
    /// unchanged in that case.
    pub fn apply_to(&self, mirror: &mut Vec<T>) -> CollectionResult<ApplyOutcome> {
        let len = mirror.len();
        match self {
            Self::Add {
                new_items,
                start_index,
            } => {
                if *start_index > len {
                    return Err(CollectionError::out_of_range(*start_index, 0, len));
                }
                mirror.splice(*start_index..*start_index, new_items.iter().cloned());
            }
            Self::Remove {
                old_items,
                start_index,
            } => {
                let end = span_end(*start_index, old_items.len(), len)?;
                mirror.drain(*start_index..end);
            }
            Self::Replace {
                old_items,
                new_items,
                start_index,
            } => {
                let end = span_end(*start_index, old_items.len(), len)?;
                mirror.splice(*start_index..end, new_items.iter().cloned());
            }
            Self::Move {
                new_index,
                old_index,
                ..
            } => {
                if *old_index >= len || *new_index >= len {
                    return Err(CollectionError::out_of_range(
                        (*old_index).max(*new_index),
                        1,
                        len,
                    ));
                }
                let item = mirror.remove(*old_index);
                mirror.insert(*new_index, item);
            }
            Self::Reset => {
                mirror.clear();
                return Ok(ApplyOutcome::ResyncRequired);
            }
        }
        Ok(ApplyOutcome::Applied)
    }

    /// Expand into one-element notifications with the same net effect.
    ///
    /// Removals are listed from the highest index down so every reported
    /// index is valid at the moment it applies; insertions follow from the
    /// lowest index up. A `Replace` of equal-length spans becomes one
    /// single-item `Replace` per position. `Move` and `Reset` are returned
    /// unchanged.
    #[must_use]
    pub fn to_single_item_changes(&self) -> Vec<ChangeNotification<T>> {
        match self {
            Self::Add {
                new_items,
                start_index,
            } => singles_added(new_items, *start_index).collect(),
            Self::Remove {
                old_items,
                start_index,
            } => singles_removed(old_items, *start_index).collect(),
            Self::Replace {
                old_items,
                new_items,
                start_index,
            } if old_items.len() == new_items.len() => old_items
                .iter()
                .zip(new_items)
                .enumerate()
                .map(|(offset, (old, new))| Self::Replace {
                    old_items: vec![old.clone()],
                    new_items: vec![new.clone()],
                    start_index: start_index + offset,
                })
                .collect(),
            Self::Replace {
                old_items,
                new_items,
                start_index,
            } => singles_removed(old_items, *start_index)
                .chain(singles_added(new_items, *start_index))
                .collect(),
            Self::Move { .. } | Self::Reset => vec![self.clone()],
        }
    }
}

fn span_end(start: usize, count: usize, len: usize) -> CollectionResult<usize> {
    match start.checked_add(count) {
        Some(end) if end <= len => Ok(end),
        _ => Err(CollectionError::out_of_range(start, count, len)),
    }
}

fn singles_removed<T: Clone>(
    items: &[T],
    start: usize,
) -> impl Iterator<Item = ChangeNotification<T>> + '_ {
    items
        .iter()
        .enumerate()
        .rev()
        .map(move |(offset, item)| ChangeNotification::Remove {
            old_items: vec![item.clone()],
            start_index: start + offset,
        })
}

fn singles_added<T: Clone>(
    items: &[T],
    start: usize,
) -> impl Iterator<Item = ChangeNotification<T>> + '_ {
    items
        .iter()
        .enumerate()
        .map(move |(offset, item)| ChangeNotification::Add {
            new_items: vec![item.clone()],
            start_index: start + offset,
        })
}

impl<T> fmt::Display for ChangeNotification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add {
                new_items,
                start_index,
            } => write!(f, "Add[{}] @{start_index}", new_items.len()),
            Self::Remove {
                old_items,
                start_index,
            } => write!(f, "Remove[{}] @{start_index}", old_items.len()),
            Self::Replace {
                old_items,
                new_items,
                start_index,
            } => write!(
                f,
                "Replace[{}->{}] @{start_index}",
                old_items.len(),
                new_items.len()
            ),
            Self::Move {
                new_index,
                old_index,
                ..
            } => write!(f, "Move {old_index}->{new_index}"),
            Self::Reset => f.write_str("Reset"),
        }
    }
}
