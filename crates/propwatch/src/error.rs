#![forbid(unsafe_code)]

//! Error kinds raised by observable attributes.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Unknown attribute | Name not declared observable on the type | `NotObservable` |
//! | Re-entrant write | Observer writes the attribute it is observing | `Mutation` |
//! | Wrong value type | Name declared with another value type | `TypeMismatch` |
//! | Write to derived value | Attribute declared with `computed` | `ReadOnly` |
//! | Observer failure | Observer returned `ObservableError::callback` | `Callback` |
//! | Nested async observer | Async observer reached while another is being driven | `NestedAsync` |
//!
//! Nothing is retried. The recursion guard is always released before an error
//! leaves the write that detected it.

use std::fmt;

/// Result alias used throughout the crate.
pub type Result<T, E = ObservableError> = std::result::Result<T, E>;

/// Errors from observable attribute operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservableError {
    /// The attribute is not declared observable on the target's type.
    NotObservable {
        type_name: &'static str,
        attribute: String,
    },
    /// An observer tried to re-enter a write on the attribute it is being
    /// notified about.
    Mutation {
        observer: String,
        type_name: &'static str,
        attribute: String,
    },
    /// The attribute exists but holds a different value type.
    TypeMismatch {
        type_name: &'static str,
        attribute: String,
        expected: &'static str,
    },
    /// The attribute is derived and has no setter.
    ReadOnly {
        type_name: &'static str,
        attribute: String,
    },
    /// An observer reported its own failure.
    Callback { observer: String, message: String },
    /// An async observer was reached from inside another async observer's
    /// future, where it cannot be driven in place.
    NestedAsync { observer: String },
}

impl ObservableError {
    /// Failure reported from inside an observer.
    ///
    /// The observer name is filled in by the notification engine when the
    /// error leaves the callback.
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback {
            observer: String::new(),
            message: message.into(),
        }
    }

    /// Whether this is a rejected re-entrant write.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Mutation { .. })
    }

    /// Whether the attribute name was not observable.
    #[must_use]
    pub fn is_not_observable(&self) -> bool {
        matches!(self, Self::NotObservable { .. })
    }

    pub(crate) fn with_observer_name(self, name: &str) -> Self {
        match self {
            Self::Callback { observer, message } if observer.is_empty() => Self::Callback {
                observer: name.to_string(),
                message,
            },
            other => other,
        }
    }
}

impl fmt::Display for ObservableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotObservable {
                type_name,
                attribute,
            } => write!(f, "{attribute} is not an observable property of {type_name}"),
            Self::Mutation {
                observer,
                type_name,
                attribute,
            } => write!(
                f,
                "'{observer}' is not allowed to modify observable property '{type_name}.{attribute}'"
            ),
            Self::TypeMismatch {
                type_name,
                attribute,
                expected,
            } => write!(
                f,
                "observable property '{type_name}.{attribute}' does not hold values of type {expected}"
            ),
            Self::ReadOnly {
                type_name,
                attribute,
            } => write!(f, "observable property '{type_name}.{attribute}' is read-only"),
            Self::Callback { observer, message } => {
                write!(f, "observer '{observer}' failed: {message}")
            }
            Self::NestedAsync { observer } => write!(
                f,
                "async observer '{observer}' cannot run inside another async observer"
            ),
        }
    }
}

impl std::error::Error for ObservableError {}

/// Last path segment of a type name, e.g. `Counter` for `my_app::model::Counter`.
///
/// Generic arguments are kept as written by the compiler.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}
