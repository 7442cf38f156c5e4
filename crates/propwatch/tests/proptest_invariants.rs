//! Property-based invariant tests for observable attributes.
//!
//! 1. Read-after-write: after any successful write the attribute reads back
//!    the written value, and every after-observer saw it stored.
//! 2. Before-observers always read the previous value.
//! 3. Observers of a phase fire in subscription order, once per write.
//! 4. Subscribing the same observer repeatedly never duplicates it.
//! 5. The recursion guard is idle after every write, failed or not.
//! 6. Version counts committed writes only.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use propwatch::{
    ObservableError, ObservableProperty, Observer, Phase, observable_attributes, subscribe,
};

struct Cell32 {
    value: ObservableProperty<Cell32, i32>,
}

observable_attributes!(Cell32 { value });

impl Cell32 {
    fn new(initial: i32) -> Self {
        Self {
            value: ObservableProperty::new("value", initial),
        }
    }
}

// ── Strategies ────────────────────────────────────────────────────────────

fn writes_strategy(max_len: usize) -> impl Strategy<Value = Vec<i32>> {
    proptest::collection::vec(any::<i32>(), 1..=max_len)
}

fn phases_strategy(max_len: usize) -> impl Strategy<Value = Vec<bool>> {
    proptest::collection::vec(any::<bool>(), 1..=max_len)
}

proptest! {
    #[test]
    fn read_after_write(initial in any::<i32>(), writes in writes_strategy(32)) {
        let cell = Cell32::new(initial);
        let stored = Rc::new(RefCell::new(Vec::new()));
        let stored_clone = Rc::clone(&stored);
        let after = Observer::new(move |c: &Cell32, _: &str, v: &i32| {
            stored_clone.borrow_mut().push((c.value.get(c), *v));
            Ok(())
        });
        subscribe(&after, &cell, "value", Phase::After).unwrap();

        for w in &writes {
            cell.value.set(&cell, *w).unwrap();
            prop_assert_eq!(cell.value.get(&cell), *w);
        }
        let expected: Vec<(i32, i32)> = writes.iter().map(|w| (*w, *w)).collect();
        prop_assert_eq!(&*stored.borrow(), &expected);
    }

    #[test]
    fn before_reads_previous_value(initial in any::<i32>(), writes in writes_strategy(32)) {
        let cell = Cell32::new(initial);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let before = Observer::new(move |c: &Cell32, _: &str, v: &i32| {
            seen_clone.borrow_mut().push((c.value.get(c), *v));
            Ok(())
        });
        subscribe(&before, &cell, "value", Phase::Before).unwrap();

        let mut previous = initial;
        let mut expected = Vec::new();
        for w in &writes {
            expected.push((previous, *w));
            cell.value.set(&cell, *w).unwrap();
            previous = *w;
        }
        prop_assert_eq!(&*seen.borrow(), &expected);
    }

    #[test]
    fn phase_order_is_subscription_order(phases in phases_strategy(12), repeats in 1usize..4) {
        let cell = Cell32::new(0);
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut observers = Vec::new();
        for (idx, before) in phases.iter().enumerate() {
            let events = Rc::clone(&events);
            let obs = Observer::new(move |_: &Cell32, _: &str, _: &i32| {
                events.borrow_mut().push(idx);
                Ok(())
            });
            let phase = if *before { Phase::Before } else { Phase::After };
            for _ in 0..repeats {
                subscribe(&obs, &cell, "value", phase).unwrap();
            }
            observers.push(obs);
        }

        cell.value.set(&cell, 1).unwrap();

        let befores = phases.iter().enumerate().filter(|(_, b)| **b).map(|(i, _)| i);
        let afters = phases.iter().enumerate().filter(|(_, b)| !**b).map(|(i, _)| i);
        let expected: Vec<usize> = befores.chain(afters).collect();
        prop_assert_eq!(&*events.borrow(), &expected);
        prop_assert_eq!(cell.value.subscribers().len(), observers.len());
    }

    #[test]
    fn guard_idle_after_any_write(writes in writes_strategy(24), threshold in any::<i32>()) {
        let cell = Cell32::new(0);
        let bounce = Observer::new(move |c: &Cell32, _: &str, v: &i32| {
            if *v > threshold {
                // Re-entrant write: rejected.
                c.value.set(c, v.wrapping_sub(1))
            } else {
                Ok(())
            }
        });
        subscribe(&bounce, &cell, "value", Phase::Before).unwrap();

        let mut committed = 0u64;
        for w in &writes {
            let before = cell.value.get(&cell);
            match cell.value.set(&cell, *w) {
                Ok(()) => {
                    committed += 1;
                    prop_assert_eq!(cell.value.get(&cell), *w);
                }
                Err(ObservableError::Mutation { .. }) => {
                    prop_assert!(*w > threshold);
                    prop_assert_eq!(cell.value.get(&cell), before);
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
            prop_assert!(cell.value.guard().is_idle());
        }
        prop_assert_eq!(cell.value.version(), committed);
    }
}
