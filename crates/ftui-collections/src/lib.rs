#![forbid(unsafe_code)]

//! Observable range collections for FrankenTUI.
//!
//! [`ObservableVec<T>`] is an ordered, indexable collection that publishes a
//! structured [`ChangeNotification`] after every mutation. Range operations
//! (`append_range`, `insert_range`, `remove_range`, `replace_range`) coalesce
//! into a single notification, so listeners pay O(1) dispatch per operation
//! rather than per element.
//!
//! - [`ObservableVec`]: the collection handle (cheap `Clone`, shared state).
//! - [`ChangeNotification`]: what changed, where, and old vs new values.
//! - [`CollectionProperty`]: `Count` / `Item[]` property signals.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`ReentrancyGuard`]: scoped block against reentrant mutation.
//! - [`CollectionHooks`]: per-element storage hooks for specialized variants.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use ftui_collections::{ChangeNotification, ObservableVec};
//!
//! let items: ObservableVec<char> = "abcde".chars().collect();
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = Rc::clone(&seen);
//! let _sub = items.subscribe(move |change| log.borrow_mut().push(change.clone()));
//!
//! items.remove_range(1, 2).unwrap();
//! assert_eq!(items.to_vec(), vec!['a', 'd', 'e']);
//! assert_eq!(
//!     seen.borrow()[0],
//!     ChangeNotification::Remove { old_items: vec!['b', 'c'], start_index: 1 }
//! );
//! ```
//!
//! # Threading
//!
//! The collection is single-threaded (`Rc` based, `!Send`). Cross-thread use
//! goes through an owner that serializes access and forwards notifications.
//!
//! # Invariants
//!
//! 1. Every successful mutation raises at most one change notification.
//! 2. Listeners are notified synchronously, in registration order.
//! 3. A failed mutation leaves the collection exactly as it was.
//! 4. With two or more change listeners, no listener can mutate the
//!    collection while a notification is in flight.

pub mod change;
pub mod collection;
pub mod config;
pub mod error;
pub mod guard;
pub mod hooks;
pub mod listeners;

pub use change::{ApplyOutcome, ChangeKind, ChangeNotification, CollectionProperty};
pub use collection::ObservableVec;
pub use config::{CollectionConfig, CollectionConfigError, CollectionConfigParse};
pub use error::{CollectionError, CollectionResult};
pub use guard::{ReentrancyGuard, ReentrancyPolicy};
pub use hooks::{CollectionHooks, NoHooks};
pub use listeners::Subscription;
