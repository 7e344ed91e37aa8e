#![forbid(unsafe_code)]

//! Reentrancy guard for notification dispatch.
//!
//! The monitor is a depth counter with two observable states: idle
//! (`depth == 0`) and dispatching (`depth > 0`). Every change dispatch holds
//! a [`ReentrancyGuard`] for its duration, and composing layers can hold one
//! across several notifications through
//! [`ObservableVec::block_reentrancy`](crate::ObservableVec::block_reentrancy).
//!
//! Release happens in `Drop`, so the depth is restored on every exit path,
//! including a listener panic unwinding through the dispatch loop.

use std::cell::Cell;
use std::rc::Rc;

/// Whether a mutation may run while a dispatch is in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReentrancyPolicy {
    /// Allow it when exactly one change listener is registered. A sole
    /// listener cannot leave another listener holding a stale notification,
    /// so it may edit the collection from inside its own callback.
    #[default]
    AllowSingleListener,
    /// Reject every mutation while `depth > 0`.
    Strict,
}

impl ReentrancyPolicy {
    /// Parse `single-listener` / `strict` (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "single-listener" | "single_listener" | "single" => Some(Self::AllowSingleListener),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }

    /// Decide whether a mutation is permitted at `depth` with `listeners`
    /// live change listeners.
    #[must_use]
    pub fn permits(self, depth: usize, listeners: usize) -> bool {
        if depth == 0 {
            return true;
        }
        match self {
            Self::AllowSingleListener => listeners <= 1,
            Self::Strict => false,
        }
    }
}

/// Shared dispatch-depth counter.
#[derive(Debug, Clone, Default)]
pub(crate) struct ReentrancyMonitor {
    depth: Rc<Cell<usize>>,
}

impl ReentrancyMonitor {
    pub(crate) fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Increment the depth until the returned guard drops.
    pub(crate) fn enter(&self) -> ReentrancyGuard {
        self.depth.set(self.depth.get() + 1);
        ReentrancyGuard {
            depth: Rc::clone(&self.depth),
        }
    }
}

/// Scoped reentrancy block. Decrements the dispatch depth on drop.
#[must_use = "the block is released as soon as the guard drops"]
#[derive(Debug)]
pub struct ReentrancyGuard {
    depth: Rc<Cell<usize>>,
}

impl ReentrancyGuard {
    /// Depth including this guard.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Release the block now. Equivalent to dropping the guard.
    pub fn release(self) {}
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}
