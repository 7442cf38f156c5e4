#![forbid(unsafe_code)]

//! Declaring which attributes of a type are observable.
//!
//! A type declares its observable attributes by listing the
//! [`ObservableProperty`] fields in [`observable_attributes!`]. The macro
//! implements [`ObservableType`], which is what the name-based entry points
//! ([`crate::api`], [`crate::Observable`]) use to find an attribute.
//!
//! ```
//! use propwatch::{ObservableProperty, ObservableType, observable_attributes};
//!
//! struct Thermostat {
//!     target: ObservableProperty<Thermostat, f32>,
//!     label: String,
//! }
//!
//! observable_attributes!(Thermostat { target });
//!
//! let t = Thermostat {
//!     target: ObservableProperty::new("target", 20.5),
//!     label: "hall".into(),
//! };
//! assert_eq!(t.observable_names(), vec!["target"]);
//! assert!(propwatch::declare::is_observable(&t, "target"));
//! assert!(!propwatch::declare::is_observable(&t, "label"));
//! ```
//!
//! Lookups use the name each property was constructed with, so the field
//! name and the attribute name may differ.

use crate::error::{ObservableError, Result, short_type_name};
use crate::property::{AnyProperty, ObservableProperty};

/// A type with observable attributes.
///
/// Implement with [`observable_attributes!`].
pub trait ObservableType: Sized + 'static {
    /// Declared attribute with this name, if any.
    fn observable_attribute(&self, name: &str) -> Option<&dyn AnyProperty>;

    /// Names of the declared attributes, in declaration order.
    fn observable_names(&self) -> Vec<&'static str>;
}

/// Implement [`ObservableType`] for a type from its [`ObservableProperty`]
/// fields.
#[macro_export]
macro_rules! observable_attributes {
    ($owner:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::ObservableType for $owner {
            fn observable_attribute(
                &self,
                name: &str,
            ) -> ::std::option::Option<&dyn $crate::AnyProperty> {
                $(
                    if $crate::AnyProperty::name(&self.$field) == name {
                        return ::std::option::Option::Some(&self.$field);
                    }
                )+
                ::std::option::Option::None
            }

            fn observable_names(&self) -> ::std::vec::Vec<&'static str> {
                ::std::vec![$($crate::AnyProperty::name(&self.$field)),+]
            }
        }
    };
}

/// Whether `name` is a declared observable attribute of `target`.
#[must_use]
pub fn is_observable<O: ObservableType>(target: &O, name: &str) -> bool {
    target.observable_attribute(name).is_some()
}

/// Type-erased attribute by name.
///
/// # Errors
///
/// [`ObservableError::NotObservable`] if the name is not declared.
pub fn lookup<'a, O: ObservableType>(target: &'a O, name: &str) -> Result<&'a dyn AnyProperty> {
    target
        .observable_attribute(name)
        .ok_or_else(|| ObservableError::NotObservable {
            type_name: short_type_name::<O>(),
            attribute: name.to_string(),
        })
}

/// Typed attribute by name.
///
/// # Errors
///
/// - [`ObservableError::NotObservable`] if the name is not declared.
/// - [`ObservableError::TypeMismatch`] if it holds another value type.
pub fn attribute<'a, O, T>(target: &'a O, name: &str) -> Result<&'a ObservableProperty<O, T>>
where
    O: ObservableType,
    T: 'static,
{
    lookup(target, name)?
        .as_any()
        .downcast_ref::<ObservableProperty<O, T>>()
        .ok_or_else(|| ObservableError::TypeMismatch {
            type_name: short_type_name::<O>(),
            attribute: name.to_string(),
            expected: std::any::type_name::<T>(),
        })
}
