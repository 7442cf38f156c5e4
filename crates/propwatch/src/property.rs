#![forbid(unsafe_code)]

//! Observable attribute: the interception point for reads and writes.
//!
//! # Design
//!
//! An [`ObservableProperty<O, T>`] is a field of its owner `O`. It holds the
//! attribute name, the storage (either the value itself or an accessor pair
//! over the owner's backing fields), the attribute's [`Subscribers`] and its
//! [`RecursionGuard`]. Registries are per instance: two owners of the same
//! type never share observers.
//!
//! A write runs in three steps:
//!
//! 1. every `before` observer, in subscription order (reads see the old value),
//! 2. the commit to storage,
//! 3. every `after` observer, in subscription order.
//!
//! Manual notification runs steps 1 and 3 without step 2. A transition
//! notification ([`notify_transition`]) additionally makes reads return the
//! old value while step 1 runs, for attributes whose backing state already
//! changed.
//!
//! # Failure Modes
//!
//! - **Re-entrant write**: a nested write reaching an observer already in
//!   flight for the current write is rejected with
//!   [`ObservableError::Mutation`] before anything runs or is committed. The
//!   error names the observer whose call issued the nested write.
//! - **Observer error**: the first failing observer stops the write; later
//!   observers are not called.
//! - **Borrow conflict**: calling `set()` from inside a [`with`] closure on
//!   the same property panics (RefCell borrow rules).
//!
//! [`with`]: ObservableProperty::with
//! [`notify_transition`]: ObservableProperty::notify_transition

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;

#[cfg(feature = "tracing")]
use tracing::{debug, trace, warn};

use crate::error::{ObservableError, Result, short_type_name};
use crate::guard::{GuardScope, RecursionGuard};
use crate::observer::Observer;
use crate::registry::{Phase, Subscribers};

type Getter<O, T> = Box<dyn Fn(&O) -> T>;
type Setter<O, T> = Box<dyn Fn(&O, T)>;

enum Storage<O, T> {
    Owned(RefCell<T>),
    Accessor {
        get: Getter<O, T>,
        set: Option<Setter<O, T>>,
    },
}

/// An attribute whose writes run registered observers.
pub struct ObservableProperty<O, T> {
    name: &'static str,
    storage: Storage<O, T>,
    subscribers: Subscribers<O, T>,
    guard: RecursionGuard,
    version: Cell<u64>,
    pending_old: RefCell<Option<T>>,
    deferred_error: RefCell<Option<ObservableError>>,
}

impl<O, T: fmt::Debug> fmt::Debug for ObservableProperty<O, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ObservableProperty");
        s.field("name", &self.name);
        match &self.storage {
            Storage::Owned(cell) => s.field("value", &*cell.borrow()),
            Storage::Accessor { set, .. } => s.field(
                "value",
                &if set.is_some() {
                    "<accessor>"
                } else {
                    "<computed>"
                },
            ),
        };
        s.field("version", &self.version.get())
            .field("subscribers", &self.subscribers)
            .finish()
    }
}

impl<O: 'static, T: Clone + 'static> ObservableProperty<O, T> {
    /// Attribute storing its own value.
    #[must_use]
    pub fn new(name: &'static str, initial: T) -> Self {
        Self::build(name, Storage::Owned(RefCell::new(initial)))
    }

    /// Attribute backed by the owner's own fields through a read/write
    /// accessor pair.
    pub fn with_accessors<G, S>(name: &'static str, get: G, set: S) -> Self
    where
        G: Fn(&O) -> T + 'static,
        S: Fn(&O, T) + 'static,
    {
        Self::build(
            name,
            Storage::Accessor {
                get: Box::new(get),
                set: Some(Box::new(set)),
            },
        )
    }

    /// Read-only attribute derived from other state.
    ///
    /// Writes fail with [`ObservableError::ReadOnly`]; the owner announces
    /// changes with [`notify`](Self::notify).
    pub fn computed<G>(name: &'static str, get: G) -> Self
    where
        G: Fn(&O) -> T + 'static,
    {
        Self::build(
            name,
            Storage::Accessor {
                get: Box::new(get),
                set: None,
            },
        )
    }

    fn build(name: &'static str, storage: Storage<O, T>) -> Self {
        Self {
            name,
            storage,
            subscribers: Subscribers::new(),
            guard: RecursionGuard::new(),
            version: Cell::new(0),
            pending_old: RefCell::new(None),
            deferred_error: RefCell::new(None),
        }
    }

    /// Current value. Never notifies.
    ///
    /// While the `before` phase of [`notify_transition`](Self::notify_transition)
    /// runs, this is the old value.
    #[must_use]
    pub fn get(&self, owner: &O) -> T {
        if let Some(old) = self.pending_old.borrow().as_ref() {
            return old.clone();
        }
        match &self.storage {
            Storage::Owned(cell) => cell.borrow().clone(),
            Storage::Accessor { get, .. } => get(owner),
        }
    }

    /// Access the current value by reference.
    ///
    /// Owned storage is borrowed without cloning; accessor storage computes
    /// the value first.
    pub fn with<R>(&self, owner: &O, f: impl FnOnce(&T) -> R) -> R {
        let pending = self.pending_old.borrow().clone();
        if let Some(old) = pending {
            return f(&old);
        }
        match &self.storage {
            Storage::Owned(cell) => f(&*cell.borrow()),
            Storage::Accessor { get, .. } => f(&get(owner)),
        }
    }

    /// Assign a new value, running `before` observers, committing, then
    /// running `after` observers.
    ///
    /// # Errors
    ///
    /// - [`ObservableError::ReadOnly`] for computed attributes.
    /// - [`ObservableError::Mutation`] when an observer re-enters this write.
    /// - Any error returned by an observer.
    pub fn set(&self, owner: &O, value: T) -> Result<()> {
        if self.is_read_only() {
            return Err(ObservableError::ReadOnly {
                type_name: short_type_name::<O>(),
                attribute: self.name.to_string(),
            });
        }

        #[cfg(feature = "tracing")]
        trace!(
            owner = short_type_name::<O>(),
            attribute = self.name,
            before = self.subscribers.count(Phase::Before),
            after = self.subscribers.count(Phase::After),
            "observable write"
        );

        let scope = self.guard.enter();
        self.reject_reentry(&Phase::ALL)?;
        self.run_phase(&scope, owner, &value, Phase::Before)?;
        self.commit(owner, value.clone());
        self.run_phase(&scope, owner, &value, Phase::After)
    }

    /// Run `before` then `after` observers with `value` without touching
    /// storage.
    ///
    /// Used when the attribute changes as a side effect of other state, such
    /// as a computed attribute.
    ///
    /// # Errors
    ///
    /// Same as [`set`](Self::set), minus `ReadOnly`.
    pub fn notify(&self, owner: &O, value: &T) -> Result<()> {
        #[cfg(feature = "tracing")]
        trace!(
            owner = short_type_name::<O>(),
            attribute = self.name,
            observers = self.subscribers.len(),
            "observable manual notify"
        );

        let scope = self.guard.enter();
        self.reject_reentry(&Phase::ALL)?;
        self.run_phase(&scope, owner, value, Phase::Before)?;
        self.run_phase(&scope, owner, value, Phase::After)
    }

    /// Announce a change from `old` to `new` whose storage already holds
    /// `new`.
    ///
    /// `before` observers read `old` through [`get`](Self::get) and
    /// [`with`](Self::with), as they would during a normal write; `after`
    /// observers read the current value.
    ///
    /// # Errors
    ///
    /// Same as [`notify`](Self::notify).
    pub fn notify_transition(&self, owner: &O, old: &T, new: &T) -> Result<()> {
        #[cfg(feature = "tracing")]
        trace!(
            owner = short_type_name::<O>(),
            attribute = self.name,
            observers = self.subscribers.len(),
            "observable transition notify"
        );

        let scope = self.guard.enter();
        self.reject_reentry(&Phase::ALL)?;
        {
            let _old = PendingOld::install(&self.pending_old, old.clone());
            self.run_phase(&scope, owner, new, Phase::Before)?;
        }
        self.run_phase(&scope, owner, new, Phase::After)
    }

    /// Run the observers of a single phase with `value` without touching
    /// storage.
    ///
    /// # Errors
    ///
    /// Same as [`notify`](Self::notify).
    pub fn notify_phase(&self, owner: &O, value: &T, phase: Phase) -> Result<()> {
        let scope = self.guard.enter();
        self.reject_reentry(&[phase])?;
        self.run_phase(&scope, owner, value, phase)
    }

    /// Fail a nested write that would reach an observer already in flight.
    fn reject_reentry(&self, phases: &[Phase]) -> Result<()> {
        let blocked = phases
            .iter()
            .flat_map(|phase| self.subscribers.snapshot(*phase))
            .find(|observer| self.guard.is_in_flight(observer.id()));
        match blocked {
            Some(observer) => {
                let offender = self
                    .guard
                    .running()
                    .unwrap_or_else(|| observer.name().to_string());
                Err(self.mutation_error(offender))
            }
            None => Ok(()),
        }
    }

    fn mutation_error(&self, observer: String) -> ObservableError {
        #[cfg(feature = "tracing")]
        warn!(
            observer = observer.as_str(),
            owner = short_type_name::<O>(),
            attribute = self.name,
            "rejected re-entrant write"
        );
        ObservableError::Mutation {
            observer,
            type_name: short_type_name::<O>(),
            attribute: self.name.to_string(),
        }
    }

    fn run_phase(&self, scope: &GuardScope<'_>, owner: &O, value: &T, phase: Phase) -> Result<()> {
        for observer in self.subscribers.snapshot(phase) {
            // Moved to this phase by an observer of the same write.
            if !scope.admit(observer.id()) {
                return Err(self.mutation_error(observer.name().to_string()));
            }
            let _running = scope.run_as(observer.name());
            observer.call(owner, self.name, value)?;
        }
        Ok(())
    }

    fn commit(&self, owner: &O, value: T) {
        match &self.storage {
            Storage::Owned(cell) => {
                cell.replace(value);
            }
            Storage::Accessor { set: Some(set), .. } => set(owner, value),
            // Rejected in `set()` before any observer ran.
            Storage::Accessor { set: None, .. } => {}
        }
        self.version.set(self.version.get() + 1);
    }

    /// Register `observer` for this attribute.
    ///
    /// Returns `false` when it was already registered in `phase`.
    pub fn subscribe(&self, observer: &Observer<O, T>, phase: Phase) -> bool {
        let added = self.subscribers.subscribe(observer, phase);
        #[cfg(feature = "tracing")]
        debug!(
            observer = observer.name(),
            owner = short_type_name::<O>(),
            attribute = self.name,
            phase = phase.as_str(),
            added,
            "subscribe"
        );
        added
    }

    /// Remove `observer` from whichever phase holds it.
    pub fn unsubscribe(&self, observer: &Observer<O, T>) -> bool {
        let removed = self.subscribers.unsubscribe(observer);
        #[cfg(feature = "tracing")]
        debug!(
            observer = observer.name(),
            owner = short_type_name::<O>(),
            attribute = self.name,
            removed,
            "unsubscribe"
        );
        removed
    }
}

impl<O, T> ObservableProperty<O, T> {
    /// Declared attribute name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the attribute has no setter.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        matches!(self.storage, Storage::Accessor { set: None, .. })
    }

    /// Number of committed writes. Manual notification does not count.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.get()
    }

    /// Observers of this attribute.
    #[must_use]
    pub fn subscribers(&self) -> &Subscribers<O, T> {
        &self.subscribers
    }

    /// Recursion guard of this attribute.
    #[must_use]
    pub fn guard(&self) -> &RecursionGuard {
        &self.guard
    }

    /// Take the notification error left by a scoped change that was dropped
    /// without [`finish`](crate::PendingChange::finish).
    pub fn take_deferred_error(&self) -> Option<ObservableError> {
        self.deferred_error.borrow_mut().take()
    }

    pub(crate) fn defer_error(&self, err: ObservableError) {
        self.deferred_error.replace(Some(err));
    }
}

/// Old value visible to reads until dropped.
struct PendingOld<'a, T> {
    slot: &'a RefCell<Option<T>>,
}

impl<'a, T> PendingOld<'a, T> {
    fn install(slot: &'a RefCell<Option<T>>, old: T) -> Self {
        slot.replace(Some(old));
        Self { slot }
    }
}

impl<T> Drop for PendingOld<'_, T> {
    fn drop(&mut self) {
        self.slot.replace(None);
    }
}

/// Type-erased view of an [`ObservableProperty`], used for lookups by name.
pub trait AnyProperty {
    /// Declared attribute name.
    fn name(&self) -> &'static str;
    /// Name of the value type.
    fn value_type(&self) -> &'static str;
    /// Number of registered observers across both phases.
    fn observer_count(&self) -> usize;
    /// Remove every observer. Returns how many were removed.
    fn clear_observers(&self) -> usize;
    /// Upcast for downcasting to the concrete property type.
    fn as_any(&self) -> &dyn Any;
}

impl<O: 'static, T: 'static> AnyProperty for ObservableProperty<O, T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn value_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn observer_count(&self) -> usize {
        self.subscribers.len()
    }

    fn clear_observers(&self) -> usize {
        let removed = self.subscribers.clear();
        #[cfg(feature = "tracing")]
        debug!(
            owner = short_type_name::<O>(),
            attribute = self.name,
            removed,
            "unsubscribe all"
        );
        removed
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
