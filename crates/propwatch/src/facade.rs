#![forbid(unsafe_code)]

//! Convenience façade: instance-scoped subscription and change helpers.
//!
//! Opt in with an empty impl:
//!
//! ```
//! use propwatch::{Observable, ObservableProperty, Phase, observable_attributes};
//!
//! struct Counter {
//!     value: ObservableProperty<Counter, i32>,
//! }
//! observable_attributes!(Counter { value });
//! impl Observable for Counter {}
//!
//! let counter = Counter { value: ObservableProperty::new("value", 0) };
//! let handle = counter
//!     .on_change("value", Phase::After, |v: &i32| {
//!         println!("value is now {v}");
//!         Ok(())
//!     })
//!     .unwrap();
//! counter.value.set(&counter, 3).unwrap();
//! assert!(counter.unsubscribe("value", &handle).unwrap());
//! ```
//!
//! # Scoped changes
//!
//! Methods that update several backing fields feeding one attribute wrap the
//! update in [`Observable::begin_change`] (or [`Observable::changing`]). The
//! scope captures the old value on entry and, on exit, runs the same
//! `before`/`after` sequence as a normal write with the value read at exit:
//! `before` observers read the captured old value, `after` observers the new
//! one.

use std::fmt;

#[cfg(feature = "tracing")]
use tracing::warn;

use crate::api;
use crate::declare::{ObservableType, attribute};
use crate::error::{ObservableError, Result};
use crate::observer::Observer;
use crate::property::ObservableProperty;
use crate::registry::Phase;

/// Instance-scoped subscription, unsubscription and notification.
pub trait Observable: ObservableType {
    /// Subscribe `observer` to this object's attribute `name`.
    ///
    /// # Errors
    ///
    /// [`ObservableError::NotObservable`] for undeclared names.
    fn subscribe<T: Clone + 'static>(
        &self,
        name: &str,
        observer: &Observer<Self, T>,
        phase: Phase,
    ) -> Result<()> {
        api::subscribe(observer, self, name, phase)
    }

    /// Unsubscribe `observer` from this object's attribute `name`.
    ///
    /// # Errors
    ///
    /// [`ObservableError::NotObservable`] for undeclared names.
    fn unsubscribe<T: Clone + 'static>(&self, name: &str, observer: &Observer<Self, T>) -> Result<bool> {
        api::unsubscribe(observer, self, name)
    }

    /// Remove every observer of this object's attribute `name`.
    ///
    /// # Errors
    ///
    /// [`ObservableError::NotObservable`] for undeclared names.
    fn unsubscribe_all(&self, name: &str) -> Result<usize> {
        api::unsubscribe_all(self, name)
    }

    /// Subscribe a callback that only receives the new value.
    ///
    /// Returns the handle to unsubscribe it later.
    ///
    /// # Errors
    ///
    /// [`ObservableError::NotObservable`] for undeclared names.
    fn on_change<T, F>(&self, name: &str, phase: Phase, callback: F) -> Result<Observer<Self, T>>
    where
        T: Clone + 'static,
        F: Fn(&T) -> Result<()> + 'static,
    {
        let observer = Observer::from_value(callback);
        api::subscribe(&observer, self, name, phase)?;
        Ok(observer)
    }

    /// Run the observers of attribute `name` with `value` without assigning
    /// it. For methods that change backing state directly.
    ///
    /// # Errors
    ///
    /// Lookup errors, the re-entrancy error, or any observer error.
    fn notify_change<T: Clone + 'static>(&self, name: &str, value: &T) -> Result<()> {
        api::notify(self, name, value)
    }

    /// Open a scoped change of attribute `name`.
    ///
    /// # Errors
    ///
    /// Lookup errors only; notification errors surface from
    /// [`PendingChange::finish`].
    fn begin_change<T: Clone + 'static>(&self, name: &str) -> Result<PendingChange<'_, Self, T>> {
        let property = attribute::<Self, T>(self, name)?;
        Ok(PendingChange {
            owner: self,
            old: property.get(self),
            property,
            finished: false,
        })
    }

    /// Run `update` inside a scoped change of attribute `name`.
    ///
    /// Observers run after `update` returns, whether it succeeded or not.
    /// An error from `update` takes precedence over a notification error.
    ///
    /// # Errors
    ///
    /// Lookup errors, the error returned by `update`, or a notification error.
    fn changing<T, R, E, F>(&self, name: &str, update: F) -> Result<R, E>
    where
        T: Clone + 'static,
        E: From<ObservableError>,
        F: FnOnce(&Self) -> Result<R, E>,
    {
        let change = self.begin_change::<T>(name)?;
        let outcome = update(self);
        let notified = change.finish();
        let value = outcome?;
        notified?;
        Ok(value)
    }
}

/// Scoped change of one attribute.
///
/// Created by [`Observable::begin_change`]. Observers run on
/// [`finish`](Self::finish), or when the scope is dropped on an early return.
/// Errors from the drop path cannot be returned; they are kept on the
/// attribute for [`ObservableProperty::take_deferred_error`]. No notification
/// is sent while the thread is panicking.
pub struct PendingChange<'a, O: ObservableType, T: Clone + 'static> {
    owner: &'a O,
    property: &'a ObservableProperty<O, T>,
    old: T,
    finished: bool,
}

impl<O: ObservableType, T: Clone + fmt::Debug + 'static> fmt::Debug for PendingChange<'_, O, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingChange")
            .field("attribute", &self.property.name())
            .field("old", &self.old)
            .field("finished", &self.finished)
            .finish()
    }
}

impl<O: ObservableType, T: Clone + 'static> PendingChange<'_, O, T> {
    /// Value captured when the scope was opened.
    #[must_use]
    pub fn old_value(&self) -> &T {
        &self.old
    }

    /// Attribute name.
    #[must_use]
    pub fn attribute(&self) -> &'static str {
        self.property.name()
    }

    /// Close the scope and run the observers with the current value.
    ///
    /// # Errors
    ///
    /// The re-entrancy error or any observer error.
    pub fn finish(mut self) -> Result<()> {
        self.finished = true;
        self.fire()
    }

    fn fire(&self) -> Result<()> {
        let new = self.property.get(self.owner);
        self.property.notify_transition(self.owner, &self.old, &new)
    }
}

impl<O: ObservableType, T: Clone + 'static> Drop for PendingChange<'_, O, T> {
    fn drop(&mut self) {
        if self.finished || std::thread::panicking() {
            return;
        }
        self.finished = true;
        if let Err(err) = self.fire() {
            #[cfg(feature = "tracing")]
            warn!(
                attribute = self.property.name(),
                error = %err,
                "change notification failed on scope exit"
            );
            self.property.defer_error(err);
        }
    }
}
