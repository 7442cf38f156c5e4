#![forbid(unsafe_code)]

//! Observer handles: callback identity and the supported callback shapes.
//!
//! # Design
//!
//! An [`Observer<O, T>`] is a cheap, cloneable handle around a shared
//! callback. Identity is the handle's allocation, so every clone of a handle
//! refers to the same observer and can be used to unsubscribe it.
//!
//! Two shapes are accepted and adapted at construction time into one
//! internal three-argument call:
//!
//! | Constructor | Callback receives |
//! |-------------|-------------------|
//! | [`Observer::new`] | `(owner, attribute, new_value)` |
//! | [`Observer::from_value`] | `new_value` only |
//! | [`Observer::from_async`] | `(owner, attribute, new_value)`, returns a future |
//! | [`Observer::from_async_value`] | `new_value` only, returns a future |
//!
//! # Failure Modes
//!
//! - **Async observers** are driven to completion in place with
//!   `futures::executor::block_on`. An async observer reached while another
//!   executor is running on the thread (for example from inside another async
//!   observer's future) is not called; it fails with
//!   [`ObservableError::NestedAsync`](crate::ObservableError::NestedAsync).

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::error::{ObservableError, Result};

type SyncFn<O, T> = dyn Fn(&O, &str, &T) -> Result<()>;
type AsyncFn<O, T> = dyn Fn(&O, &str, &T) -> LocalBoxFuture<'static, Result<()>>;

enum Callback<O, T> {
    Sync(Box<SyncFn<O, T>>),
    Async(Box<AsyncFn<O, T>>),
}

struct ObserverInner<O, T> {
    name: String,
    callback: Callback<O, T>,
}

/// Identity of an observer, stable for as long as any handle is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

/// Shared handle to a change callback for attributes of type `T` on owners
/// of type `O`.
pub struct Observer<O, T> {
    inner: Rc<ObserverInner<O, T>>,
}

// Manual Clone: shares the same Rc, and so the same identity.
impl<O, T> Clone for Observer<O, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<O, T> PartialEq for Observer<O, T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<O, T> Eq for Observer<O, T> {}

impl<O, T> fmt::Debug for Observer<O, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("name", &self.inner.name)
            .field("is_async", &self.is_async())
            .finish()
    }
}

impl<O: 'static, T: 'static> Observer<O, T> {
    /// Observer receiving the owner, the attribute name and the new value.
    ///
    /// The observer is named after the callback's type, which for plain
    /// functions is the function path.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&O, &str, &T) -> Result<()> + 'static,
    {
        Self::with_name(std::any::type_name::<F>(), callback)
    }

    /// Same as [`Observer::new`] with an explicit name used in error messages.
    pub fn with_name<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&O, &str, &T) -> Result<()> + 'static,
    {
        Self::build(name.into(), Callback::Sync(Box::new(callback)))
    }

    /// Instance-bound observer that only receives the new value.
    pub fn from_value<F>(callback: F) -> Self
    where
        F: Fn(&T) -> Result<()> + 'static,
    {
        let name = std::any::type_name::<F>();
        Self::build(
            name.to_string(),
            Callback::Sync(Box::new(move |_owner: &O, _attr: &str, value: &T| {
                callback(value)
            })),
        )
    }

    /// Observer returning a future, driven to completion before the next
    /// observer in the same phase runs.
    ///
    /// The future must own what it needs; copy values out of the arguments
    /// before the `async` block.
    pub fn from_async<F, Fut>(callback: F) -> Self
    where
        F: Fn(&O, &str, &T) -> Fut + 'static,
        Fut: Future<Output = Result<()>> + 'static,
    {
        let name = std::any::type_name::<F>();
        Self::build(
            name.to_string(),
            Callback::Async(Box::new(move |owner: &O, attr: &str, value: &T| {
                callback(owner, attr, value).boxed_local()
            })),
        )
    }

    /// Async observer that only receives the new value.
    pub fn from_async_value<F, Fut>(callback: F) -> Self
    where
        F: Fn(&T) -> Fut + 'static,
        Fut: Future<Output = Result<()>> + 'static,
    {
        let name = std::any::type_name::<F>();
        Self::build(
            name.to_string(),
            Callback::Async(Box::new(move |_owner: &O, _attr: &str, value: &T| {
                callback(value).boxed_local()
            })),
        )
    }

    fn build(name: String, callback: Callback<O, T>) -> Self {
        Self {
            inner: Rc::new(ObserverInner { name, callback }),
        }
    }
}

impl<O, T> Observer<O, T> {
    /// Identity of this observer.
    #[must_use]
    pub fn id(&self) -> ObserverId {
        ObserverId(Rc::as_ptr(&self.inner) as *const () as usize)
    }

    /// Name used in error messages and logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether the callback returns a future.
    #[must_use]
    pub fn is_async(&self) -> bool {
        matches!(self.inner.callback, Callback::Async(_))
    }

    /// Run the callback to completion.
    pub(crate) fn call(&self, owner: &O, attribute: &str, value: &T) -> Result<()> {
        let outcome = match &self.inner.callback {
            Callback::Sync(f) => f(owner, attribute, value),
            Callback::Async(f) => {
                // `block_on` panics when nested.
                match futures::executor::enter() {
                    Ok(enter) => drop(enter),
                    Err(_) => {
                        return Err(ObservableError::NestedAsync {
                            observer: self.inner.name.clone(),
                        });
                    }
                }
                futures::executor::block_on(f(owner, attribute, value))
            }
        };
        outcome.map_err(|err| err.with_observer_name(&self.inner.name))
    }
}
