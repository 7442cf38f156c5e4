#![forbid(unsafe_code)]

//! Per-attribute subscriber registry with before/after ordering.
//!
//! # Invariants
//!
//! 1. An observer appears at most once across both phases.
//! 2. Observers within a phase keep subscription order.
//! 3. Re-subscribing to the same phase is a no-op and keeps the original
//!    position; subscribing to the other phase moves the observer to the end
//!    of that phase.
//! 4. [`Subscribers::snapshot`] hands out a copy, so observers may subscribe
//!    or unsubscribe while a notification is running.

use std::cell::RefCell;
use std::fmt;

use crate::observer::Observer;

/// When an observer runs relative to the storage update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Runs before the new value is committed; reads see the old value.
    Before,
    /// Runs after the new value is committed.
    #[default]
    After,
}

impl Phase {
    /// Both phases in firing order.
    pub const ALL: [Phase; 2] = [Phase::Before, Phase::After];

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct PhaseLists<O, T> {
    before: Vec<Observer<O, T>>,
    after: Vec<Observer<O, T>>,
}

impl<O, T> PhaseLists<O, T> {
    fn list(&self, phase: Phase) -> &Vec<Observer<O, T>> {
        match phase {
            Phase::Before => &self.before,
            Phase::After => &self.after,
        }
    }

    fn list_mut(&mut self, phase: Phase) -> &mut Vec<Observer<O, T>> {
        match phase {
            Phase::Before => &mut self.before,
            Phase::After => &mut self.after,
        }
    }
}

/// Ordered observers of one attribute, split by phase.
pub struct Subscribers<O, T> {
    lists: RefCell<PhaseLists<O, T>>,
}

impl<O, T> Default for Subscribers<O, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O, T> fmt::Debug for Subscribers<O, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lists = self.lists.borrow();
        f.debug_struct("Subscribers")
            .field("before", &lists.before.len())
            .field("after", &lists.after.len())
            .finish()
    }
}

impl<O, T> Subscribers<O, T> {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lists: RefCell::new(PhaseLists {
                before: Vec::new(),
                after: Vec::new(),
            }),
        }
    }

    /// Register `observer` in `phase`.
    ///
    /// Returns `false` when the observer was already registered in that
    /// phase.
    pub fn subscribe(&self, observer: &Observer<O, T>, phase: Phase) -> bool {
        let mut lists = self.lists.borrow_mut();
        if lists.list(phase).contains(observer) {
            return false;
        }
        let other = match phase {
            Phase::Before => Phase::After,
            Phase::After => Phase::Before,
        };
        lists.list_mut(other).retain(|o| o != observer);
        lists.list_mut(phase).push(observer.clone());
        true
    }

    /// Remove `observer` from whichever phase holds it.
    pub fn unsubscribe(&self, observer: &Observer<O, T>) -> bool {
        let mut lists = self.lists.borrow_mut();
        let before = lists.before.len() + lists.after.len();
        lists.before.retain(|o| o != observer);
        lists.after.retain(|o| o != observer);
        before != lists.before.len() + lists.after.len()
    }

    /// Remove every observer. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut lists = self.lists.borrow_mut();
        let removed = lists.before.len() + lists.after.len();
        lists.before.clear();
        lists.after.clear();
        removed
    }

    /// Phase the observer is registered in, if any.
    #[must_use]
    pub fn phase_of(&self, observer: &Observer<O, T>) -> Option<Phase> {
        let lists = self.lists.borrow();
        Phase::ALL
            .into_iter()
            .find(|phase| lists.list(*phase).contains(observer))
    }

    /// Copy of the observers registered in `phase`, in subscription order.
    #[must_use]
    pub fn snapshot(&self, phase: Phase) -> Vec<Observer<O, T>> {
        self.lists.borrow().list(phase).clone()
    }

    /// Number of observers in `phase`.
    #[must_use]
    pub fn count(&self, phase: Phase) -> usize {
        self.lists.borrow().list(phase).len()
    }

    /// Number of observers across both phases.
    #[must_use]
    pub fn len(&self) -> usize {
        let lists = self.lists.borrow();
        lists.before.len() + lists.after.len()
    }

    /// Whether no observer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Owner;

    fn observer() -> Observer<Owner, i32> {
        Observer::new(|_, _, _| Ok(()))
    }

    #[test]
    fn default_phase_is_after() {
        assert_eq!(Phase::default(), Phase::After);
        assert_eq!(Phase::Before.to_string(), "before");
    }

    #[test]
    fn subscribe_is_idempotent_per_phase() {
        let subs = Subscribers::new();
        let a = observer();
        assert!(subs.subscribe(&a, Phase::After));
        assert!(!subs.subscribe(&a, Phase::After));
        assert!(!subs.subscribe(&a.clone(), Phase::After));
        assert_eq!(subs.count(Phase::After), 1);
        assert_eq!(subs.len(), 1);
    }

    #[test]
    fn subscribing_other_phase_moves_observer() {
        let subs = Subscribers::new();
        let a = observer();
        subs.subscribe(&a, Phase::After);
        subs.subscribe(&a, Phase::Before);
        assert_eq!(subs.phase_of(&a), Some(Phase::Before));
        assert_eq!(subs.count(Phase::After), 0);
        assert_eq!(subs.count(Phase::Before), 1);
    }

    #[test]
    fn order_is_subscription_order() {
        let subs = Subscribers::new();
        let (a, b, c) = (observer(), observer(), observer());
        subs.subscribe(&a, Phase::After);
        subs.subscribe(&b, Phase::After);
        subs.subscribe(&c, Phase::After);
        // Re-subscribing keeps the original position.
        subs.subscribe(&a, Phase::After);
        assert_eq!(subs.snapshot(Phase::After), vec![a, b, c]);
    }

    #[test]
    fn unsubscribe_reports_removal() {
        let subs = Subscribers::new();
        let a = observer();
        let never = observer();
        subs.subscribe(&a, Phase::Before);
        assert!(!subs.unsubscribe(&never));
        assert!(subs.unsubscribe(&a));
        assert!(!subs.unsubscribe(&a));
        assert!(subs.is_empty());
        assert_eq!(subs.phase_of(&a), None);
    }

    #[test]
    fn clear_removes_both_phases() {
        let subs = Subscribers::new();
        subs.subscribe(&observer(), Phase::Before);
        subs.subscribe(&observer(), Phase::After);
        subs.subscribe(&observer(), Phase::After);
        assert_eq!(subs.clear(), 3);
        assert!(subs.is_empty());
        assert_eq!(subs.clear(), 0);
    }

    #[test]
    fn snapshot_is_detached() {
        let subs = Subscribers::new();
        let a = observer();
        subs.subscribe(&a, Phase::After);
        let snap = subs.snapshot(Phase::After);
        subs.unsubscribe(&a);
        assert_eq!(snap.len(), 1);
        assert!(subs.snapshot(Phase::After).is_empty());
    }

    #[test]
    fn debug_shows_counts() {
        let subs = Subscribers::new();
        subs.subscribe(&observer(), Phase::Before);
        let dbg = format!("{subs:?}");
        assert!(dbg.contains("Subscribers"));
        assert!(dbg.contains("before: 1"));
    }
}
