#![forbid(unsafe_code)]

//! Free-function entry points addressing attributes by name.
//!
//! These work on any [`ObservableType`]; the [`Observable`](crate::Observable)
//! façade offers the same operations as methods.

use crate::declare::{ObservableType, attribute, lookup};
use crate::error::Result;
use crate::observer::Observer;
use crate::registry::Phase;

/// Subscribe `observer` to `target`'s attribute `name` in `phase`.
///
/// Subscribing an observer again in the same phase has no effect; in the
/// other phase it moves the observer there.
///
/// # Errors
///
/// [`ObservableError::NotObservable`](crate::ObservableError::NotObservable)
/// if `name` is not declared observable on `target`'s type.
pub fn subscribe<O, T>(observer: &Observer<O, T>, target: &O, name: &str, phase: Phase) -> Result<()>
where
    O: ObservableType,
    T: Clone + 'static,
{
    attribute::<O, T>(target, name)?.subscribe(observer, phase);
    Ok(())
}

/// Unsubscribe `observer` from `target`'s attribute `name`.
///
/// Returns `false` when the observer was not subscribed.
///
/// # Errors
///
/// [`ObservableError::NotObservable`](crate::ObservableError::NotObservable)
/// if `name` is not declared observable on `target`'s type.
pub fn unsubscribe<O, T>(observer: &Observer<O, T>, target: &O, name: &str) -> Result<bool>
where
    O: ObservableType,
    T: Clone + 'static,
{
    Ok(attribute::<O, T>(target, name)?.unsubscribe(observer))
}

/// Remove every observer of `target`'s attribute `name`, in both phases.
///
/// Returns the number of observers removed.
///
/// # Errors
///
/// [`ObservableError::NotObservable`](crate::ObservableError::NotObservable)
/// if `name` is not declared observable on `target`'s type.
pub fn unsubscribe_all<O: ObservableType>(target: &O, name: &str) -> Result<usize> {
    Ok(lookup(target, name)?.clear_observers())
}

/// Run the observers of `target`'s attribute `name` with `value`, without
/// assigning it.
///
/// # Errors
///
/// Lookup errors as for [`subscribe`], the re-entrancy error, or any error an
/// observer returns.
pub fn notify<O, T>(target: &O, name: &str, value: &T) -> Result<()>
where
    O: ObservableType,
    T: Clone + 'static,
{
    attribute::<O, T>(target, name)?.notify(target, value)
}

/// Assign `value` to `target`'s attribute `name`.
///
/// # Errors
///
/// Lookup errors as for [`subscribe`], plus everything
/// [`ObservableProperty::set`](crate::ObservableProperty::set) reports.
pub fn set<O, T>(target: &O, name: &str, value: T) -> Result<()>
where
    O: ObservableType,
    T: Clone + 'static,
{
    attribute::<O, T>(target, name)?.set(target, value)
}

/// Read `target`'s attribute `name`.
///
/// # Errors
///
/// Lookup errors as for [`subscribe`].
pub fn get<O, T>(target: &O, name: &str) -> Result<T>
where
    O: ObservableType,
    T: Clone + 'static,
{
    Ok(attribute::<O, T>(target, name)?.get(target))
}
