//! The `Maybe` sentinel: "no value supplied" as distinct from an explicit null.

use std::fmt;

/// A possibly-missing argument or attribute value.
///
/// `Missing` means the caller did not supply anything; it is never stored in
/// an object. `Present(Value::Null)` is an explicit null and is a perfectly
/// valid attribute value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Maybe<T> {
    #[default]
    Missing,
    Present(T),
}

pub use Maybe::{Missing, Present};

impl<T> Maybe<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Missing)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Present(_))
    }

    pub fn as_ref(&self) -> Maybe<&T> {
        match self {
            Present(v) => Present(v),
            Missing => Missing,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Present(v) => Some(v),
            Missing => None,
        }
    }

    /// Keep `self` if present, otherwise fall back to `other`.
    pub fn or(self, other: Maybe<T>) -> Maybe<T> {
        match self {
            Present(v) => Present(v),
            Missing => other,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Maybe<U> {
        match self {
            Present(v) => Present(f(v)),
            Missing => Missing,
        }
    }

    pub fn take(&mut self) -> Maybe<T> {
        std::mem::take(self)
    }
}

impl<T> From<Option<T>> for Maybe<T> {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => Present(v),
            None => Missing,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Maybe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Present(v) => v.fmt(f),
            Missing => write!(f, "MISSING"),
        }
    }
}
