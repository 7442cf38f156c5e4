#![forbid(unsafe_code)]

//! Observable attributes with synchronous change callbacks.
//!
//! Any type can expose selected attributes as observable: every assignment
//! to such an attribute runs the registered observers, either immediately
//! before or immediately after the value is stored.
//!
//! - [`ObservableProperty`]: the attribute itself (storage, observers,
//!   recursion guard).
//! - [`Observer`]: cloneable callback handle; clones share identity.
//! - [`observable_attributes!`]: declares a type's observable attributes so
//!   they can be addressed by name.
//! - [`api`]: free functions `subscribe`, `unsubscribe`, `unsubscribe_all`,
//!   `notify`.
//! - [`Observable`]: optional façade with the same operations as methods,
//!   plus scoped changes for derived attributes.
//!
//! # Example
//!
//! ```
//! use propwatch::{Observer, ObservableProperty, Phase, observable_attributes};
//!
//! struct Item {
//!     value: ObservableProperty<Item, i32>,
//! }
//! observable_attributes!(Item { value });
//!
//! impl Item {
//!     fn set_value(&self, v: i32) -> propwatch::Result<()> {
//!         self.value.set(self, v)
//!     }
//! }
//!
//! let item = Item { value: ObservableProperty::new("value", 1000) };
//! let printer = Observer::new(|item: &Item, name: &str, new: &i32| {
//!     println!("Item.{name} changes from {} to {new}", item.value.get(item));
//!     Ok(())
//! });
//! propwatch::subscribe(&printer, &item, "value", Phase::Before).unwrap();
//! item.set_value(2000).unwrap();
//! ```
//!
//! # Invariants
//!
//! 1. Observers of one phase run in subscription order.
//! 2. `before` observers read the old value; `after` observers read the new
//!    one. Both receive the new value as argument.
//! 3. An observer is never invoked twice within one write; a re-entrant write
//!    fails with [`ObservableError::Mutation`] and is never committed.
//! 4. The recursion guard is empty once the outermost write returns,
//!    whatever the outcome.
//!
//! # Threading
//!
//! Everything is single-threaded (`Rc`/`RefCell`); observers run on the
//! thread performing the write. Async observers are driven to completion
//! before the next observer runs.

pub mod api;
pub mod declare;
pub mod error;
pub mod facade;
pub mod guard;
pub mod observer;
pub mod property;
pub mod registry;

pub use api::{notify, subscribe, unsubscribe, unsubscribe_all};
pub use declare::ObservableType;
pub use error::{ObservableError, Result};
pub use facade::{Observable, PendingChange};
pub use guard::RecursionGuard;
pub use observer::{Observer, ObserverId};
pub use property::{AnyProperty, ObservableProperty};
pub use registry::{Phase, Subscribers};
