//! Scenario tests for `ObservableVec` notifications.
//!
//! Each test drives the public API and checks the resulting contents, the
//! single change notification, and the `Count` / `Item[]` property signals.

use std::cell::RefCell;
use std::rc::Rc;

use ftui_collections::{
    ChangeKind, ChangeNotification, CollectionError, CollectionProperty, ObservableVec,
    Subscription,
};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Change(ChangeNotification<char>),
    Property(CollectionProperty),
}

/// Records every change and property signal in arrival order.
struct Recorder {
    events: Rc<RefCell<Vec<Event>>>,
    _subs: [Subscription; 2],
}

impl Recorder {
    fn attach(vec: &ObservableVec<char>) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let e1 = Rc::clone(&events);
        let e2 = Rc::clone(&events);
        let change = vec.subscribe(move |c| e1.borrow_mut().push(Event::Change(c.clone())));
        let property = vec.subscribe_property(move |p| e2.borrow_mut().push(Event::Property(p)));
        Self {
            events,
            _subs: [change, property],
        }
    }

    fn changes(&self) -> Vec<ChangeNotification<char>> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Change(c) => Some(c.clone()),
                Event::Property(_) => None,
            })
            .collect()
    }

    fn properties(&self) -> Vec<CollectionProperty> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Property(p) => Some(*p),
                Event::Change(_) => None,
            })
            .collect()
    }

    fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

fn chars(s: &str) -> ObservableVec<char> {
    s.chars().collect()
}

fn contents(vec: &ObservableVec<char>) -> String {
    vec.with(|items| items.iter().collect())
}

// ---------------------------------------------------------------------------
// Concrete scenarios
// ---------------------------------------------------------------------------

#[test]
fn remove_range_middle_block() {
    let vec = chars("ABCDE");
    let rec = Recorder::attach(&vec);

    vec.remove_range(1, 2).unwrap();

    assert_eq!(contents(&vec), "ADE");
    assert_eq!(
        rec.changes(),
        vec![ChangeNotification::Remove {
            old_items: vec!['B', 'C'],
            start_index: 1,
        }]
    );
    assert_eq!(
        rec.properties(),
        vec![CollectionProperty::Count, CollectionProperty::Indexer]
    );
}

#[test]
fn replace_range_shrinking_block() {
    let vec = chars("ABCDE");
    let rec = Recorder::attach(&vec);

    vec.replace_range(1, 3, ['X', 'Y']).unwrap();

    assert_eq!(contents(&vec), "AXYE");
    assert_eq!(
        rec.changes(),
        vec![ChangeNotification::Replace {
            old_items: vec!['B', 'C', 'D'],
            new_items: vec!['X', 'Y'],
            start_index: 1,
        }]
    );
}

#[test]
fn append_range_into_empty() {
    let vec = ObservableVec::new();
    let rec = Recorder::attach(&vec);

    vec.append_range(['P', 'Q', 'R']).unwrap();

    assert_eq!(contents(&vec), "PQR");
    assert_eq!(
        rec.changes(),
        vec![ChangeNotification::Add {
            new_items: vec!['P', 'Q', 'R'],
            start_index: 0,
        }]
    );
    assert!(rec.properties().contains(&CollectionProperty::Count));
}

#[test]
fn move_item_forward_without_count_signal() {
    let vec = chars("ABCD");
    let rec = Recorder::attach(&vec);

    vec.move_item(0, 2).unwrap();

    assert_eq!(contents(&vec), "BCAD");
    assert_eq!(
        rec.changes(),
        vec![ChangeNotification::Move {
            item: 'A',
            new_index: 2,
            old_index: 0,
        }]
    );
    assert_eq!(rec.properties(), vec![CollectionProperty::Indexer]);
}

// ---------------------------------------------------------------------------
// Single-element operations
// ---------------------------------------------------------------------------

#[test]
fn insert_push_and_remove_at() {
    let vec = chars("AC");
    let rec = Recorder::attach(&vec);

    vec.insert(1, 'B').unwrap();
    vec.push('D').unwrap();
    assert_eq!(vec.remove_at(0).unwrap(), 'A');

    assert_eq!(contents(&vec), "BCD");
    assert_eq!(
        rec.changes(),
        vec![
            ChangeNotification::Add {
                new_items: vec!['B'],
                start_index: 1,
            },
            ChangeNotification::Add {
                new_items: vec!['D'],
                start_index: 3,
            },
            ChangeNotification::Remove {
                old_items: vec!['A'],
                start_index: 0,
            },
        ]
    );
}

#[test]
fn replace_at_emits_indexer_only() {
    let vec = chars("ABC");
    let rec = Recorder::attach(&vec);

    assert_eq!(vec.replace_at(1, 'Z').unwrap(), 'B');

    assert_eq!(contents(&vec), "AZC");
    assert_eq!(
        rec.changes(),
        vec![ChangeNotification::Replace {
            old_items: vec!['B'],
            new_items: vec!['Z'],
            start_index: 1,
        }]
    );
    assert_eq!(rec.properties(), vec![CollectionProperty::Indexer]);
}

#[test]
fn set_matches_replace_at_notification() {
    let vec = chars("AB");
    let rec = Recorder::attach(&vec);
    assert_eq!(vec.set(0, 'Q').unwrap(), 'A');
    assert_eq!(rec.changes()[0].kind(), ChangeKind::Replace);
    assert_eq!(rec.properties(), vec![CollectionProperty::Indexer]);
}

#[test]
fn remove_item_by_value() {
    let vec = chars("ABCB");
    let rec = Recorder::attach(&vec);

    assert!(vec.remove_item(&'B').unwrap());
    assert!(!vec.remove_item(&'Z').unwrap());

    assert_eq!(contents(&vec), "ACB");
    assert_eq!(
        rec.changes(),
        vec![ChangeNotification::Remove {
            old_items: vec!['B'],
            start_index: 1,
        }]
    );
}

// ---------------------------------------------------------------------------
// Derived property signals
// ---------------------------------------------------------------------------

#[test]
fn property_signals_precede_change() {
    let vec = chars("A");
    let rec = Recorder::attach(&vec);
    vec.push('B').unwrap();
    let events = rec.events.borrow();
    assert_eq!(events[0], Event::Property(CollectionProperty::Count));
    assert_eq!(events[1], Event::Property(CollectionProperty::Indexer));
    assert!(matches!(events[2], Event::Change(_)));
}

#[test]
fn replace_range_count_signal_follows_length() {
    let vec = chars("ABCD");
    let rec = Recorder::attach(&vec);

    vec.replace_range(0, 2, ['X', 'Y']).unwrap();
    assert_eq!(rec.properties(), vec![CollectionProperty::Indexer]);

    rec.clear();
    vec.replace_range(0, 2, ['Z']).unwrap();
    assert_eq!(
        rec.properties(),
        vec![CollectionProperty::Count, CollectionProperty::Indexer]
    );
}

// ---------------------------------------------------------------------------
// Clear / Reset
// ---------------------------------------------------------------------------

#[test]
fn clear_non_empty_emits_one_reset() {
    let vec = chars("ABC");
    let rec = Recorder::attach(&vec);

    vec.clear().unwrap();

    assert!(vec.is_empty());
    assert_eq!(rec.changes(), vec![ChangeNotification::Reset]);
    assert_eq!(
        rec.properties(),
        vec![CollectionProperty::Count, CollectionProperty::Indexer]
    );
}

#[test]
fn clear_empty_still_emits_reset() {
    let vec: ObservableVec<char> = ObservableVec::new();
    let rec = Recorder::attach(&vec);

    vec.clear().unwrap();
    vec.clear().unwrap();

    assert_eq!(
        rec.changes(),
        vec![ChangeNotification::Reset, ChangeNotification::Reset]
    );
    assert_eq!(
        rec.properties(),
        vec![
            CollectionProperty::Count,
            CollectionProperty::Indexer,
            CollectionProperty::Count,
            CollectionProperty::Indexer,
        ]
    );
    assert_eq!(vec.version(), 2);
}

// ---------------------------------------------------------------------------
// Degenerate ranges
// ---------------------------------------------------------------------------

#[test]
fn empty_ranges_still_notify() {
    let vec = chars("AB");
    let rec = Recorder::attach(&vec);

    vec.append_range(std::iter::empty()).unwrap();
    vec.insert_range(1, Vec::new()).unwrap();
    vec.remove_range(1, 0).unwrap();
    vec.replace_range(0, 0, []).unwrap();

    assert_eq!(contents(&vec), "AB");
    assert_eq!(
        rec.changes(),
        vec![
            ChangeNotification::Add {
                new_items: vec![],
                start_index: 2,
            },
            ChangeNotification::Add {
                new_items: vec![],
                start_index: 1,
            },
            ChangeNotification::Remove {
                old_items: vec![],
                start_index: 1,
            },
            ChangeNotification::Add {
                new_items: vec![],
                start_index: 0,
            },
        ]
    );
    assert_eq!(
        rec.properties(),
        [CollectionProperty::Count, CollectionProperty::Indexer].repeat(4)
    );
    assert_eq!(vec.version(), 4);
}

#[test]
fn empty_range_still_validates_index() {
    let vec = chars("AB");
    let rec = Recorder::attach(&vec);

    assert!(vec.insert_range(3, Vec::new()).is_err());
    assert!(vec.remove_range(3, 0).is_err());
    assert!(vec.replace_range(3, 0, []).is_err());

    assert!(rec.events.borrow().is_empty());
    assert_eq!(vec.version(), 0);
}

#[test]
fn replace_range_degenerates_to_add_or_remove() {
    let vec = chars("AB");
    let rec = Recorder::attach(&vec);

    vec.replace_range(1, 0, ['X']).unwrap();
    vec.replace_range(0, 1, []).unwrap();

    assert_eq!(contents(&vec), "XB");
    let kinds: Vec<_> = rec.changes().iter().map(ChangeNotification::kind).collect();
    assert_eq!(kinds, vec![ChangeKind::Add, ChangeKind::Remove]);
}

// ---------------------------------------------------------------------------
// Errors leave the collection untouched
// ---------------------------------------------------------------------------

#[test]
fn out_of_range_errors() {
    let vec = chars("ABC");
    let rec = Recorder::attach(&vec);

    assert_eq!(
        vec.insert(4, 'X'),
        Err(CollectionError::IndexOutOfRange {
            index: 4,
            count: 0,
            len: 3,
        })
    );
    assert!(vec.remove_at(3).is_err());
    assert!(vec.replace_at(3, 'X').is_err());
    assert!(vec.remove_range(2, 2).is_err());
    assert!(vec.remove_range(usize::MAX, 2).is_err());
    assert!(vec.replace_range(1, 3, ['X']).is_err());
    assert!(vec.insert_range(5, ['X']).is_err());
    assert!(vec.move_item(0, 3).is_err());
    assert!(vec.move_item(3, 0).is_err());
    assert_eq!(
        vec.get(3),
        Err(CollectionError::IndexOutOfRange {
            index: 3,
            count: 1,
            len: 3,
        })
    );

    assert_eq!(contents(&vec), "ABC");
    assert!(rec.events.borrow().is_empty());
    assert_eq!(vec.version(), 0);
}

// ---------------------------------------------------------------------------
// Construction and reads
// ---------------------------------------------------------------------------

#[test]
fn construction_variants() {
    let absent: Option<Vec<char>> = None;
    assert_eq!(
        ObservableVec::from_iter_checked(absent).unwrap_err(),
        CollectionError::InvalidArgument { name: "collection" }
    );

    let empty = ObservableVec::from_iter_checked(Some(Vec::<char>::new())).unwrap();
    assert!(empty.is_empty());

    let from_iter = ObservableVec::from_iter_checked(Some("xyz".chars())).unwrap();
    assert_eq!(contents(&from_iter), "xyz");

    let owned = ObservableVec::from_vec(vec!['a', 'b']);
    assert_eq!(owned.len(), 2);
    assert_eq!(owned.first(), Some('a'));
    assert_eq!(owned.last(), Some('b'));
    assert!(owned.contains(&'b'));
    assert_eq!(owned.index_of(&'b'), Some(1));
    assert_eq!(owned.index_of(&'q'), None);
}

#[test]
fn snapshot_is_independent_of_source() {
    let source = vec!['P', 'Q'];
    let vec = ObservableVec::new();
    let rec = Recorder::attach(&vec);

    vec.append_range(source.iter().copied()).unwrap();
    drop(source);

    assert_eq!(
        rec.changes()[0].new_items(),
        &['P', 'Q'],
        "payload outlives the caller's sequence"
    );
}

#[test]
fn unsubscribed_listener_stops_receiving() {
    let vec = chars("A");
    let hits = Rc::new(RefCell::new(0));
    let h = Rc::clone(&hits);
    let sub = vec.subscribe(move |_| *h.borrow_mut() += 1);

    vec.push('B').unwrap();
    sub.unsubscribe();
    vec.push('C').unwrap();

    assert_eq!(*hits.borrow(), 1);
    assert_eq!(vec.listener_count(), 0);
}
