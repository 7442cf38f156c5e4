#![forbid(unsafe_code)]

//! Recursion guard for one attribute's writes.
//!
//! The guard tracks which observers are in flight for the outermost write on
//! an attribute. Nested writes (an observer assigning the attribute it is
//! observing, directly or through another attribute) share the same set, so
//! an observer that would run a second time is detected instead of recursing.
//!
//! The guard also keeps the stack of observers whose call is currently
//! running, so a rejected nested write can name the observer that issued it.
//!
//! # Invariants
//!
//! 1. The set is only populated while at least one [`GuardScope`] is alive.
//! 2. Dropping the outermost scope empties the set and the running stack, on
//!    every exit path including errors and unwinding.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use crate::observer::ObserverId;

/// In-flight observer set for one attribute.
#[derive(Debug, Default)]
pub struct RecursionGuard {
    in_flight: RefCell<HashSet<ObserverId>>,
    running: RefCell<Vec<String>>,
    depth: Cell<usize>,
}

impl RecursionGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a write. The returned scope must be held for the write's extent.
    pub fn enter(&self) -> GuardScope<'_> {
        self.depth.set(self.depth.get() + 1);
        GuardScope { guard: self }
    }

    /// Whether no write is in progress and nothing is tracked.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.depth.get() == 0
            && self.in_flight.borrow().is_empty()
            && self.running.borrow().is_empty()
    }

    /// Whether `id` already ran, or is running, within the current write.
    #[must_use]
    pub fn is_in_flight(&self, id: ObserverId) -> bool {
        self.in_flight.borrow().contains(&id)
    }

    /// Name of the innermost observer whose call is on the stack.
    #[must_use]
    pub fn running(&self) -> Option<String> {
        self.running.borrow().last().cloned()
    }

    /// Number of observers currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.borrow().len()
    }

    /// Nesting depth of writes in progress.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth.get()
    }
}

/// RAII scope of one write on the guarded attribute.
#[derive(Debug)]
pub struct GuardScope<'a> {
    guard: &'a RecursionGuard,
}

impl GuardScope<'_> {
    /// Mark `id` as in flight. Returns `false` if it already was.
    pub fn admit(&self, id: ObserverId) -> bool {
        self.guard.in_flight.borrow_mut().insert(id)
    }

    /// Record `name` as running until the returned entry is dropped.
    pub fn run_as(&self, name: &str) -> RunningEntry<'_> {
        self.guard.running.borrow_mut().push(name.to_string());
        RunningEntry { guard: self.guard }
    }
}

/// Marks one observer call as running; popped on drop.
#[derive(Debug)]
pub struct RunningEntry<'a> {
    guard: &'a RecursionGuard,
}

impl Drop for RunningEntry<'_> {
    fn drop(&mut self) {
        self.guard.running.borrow_mut().pop();
    }
}

impl Drop for GuardScope<'_> {
    fn drop(&mut self) {
        let depth = self.guard.depth.get().saturating_sub(1);
        self.guard.depth.set(depth);
        if depth == 0 {
            self.guard.in_flight.borrow_mut().clear();
            self.guard.running.borrow_mut().clear();
        }
    }
}
