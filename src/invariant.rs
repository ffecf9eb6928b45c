//! Declared invariants and their provenance.
//!
//! An invariant is a directive-borne assertion about the build: it carries a
//! predicate, a message for the user, and the source location of the call
//! that constructed it. Predicates are either eager booleans or deferred
//! closures evaluated at check time; the location is always captured at
//! construction time so reports point at the target definition, not at the
//! composition call.

use std::fmt;
use std::sync::Arc;

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::directive::Directive;
use crate::error::Violation;

/// Where a violation originated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Provenance {
    /// Source location of the call that constructed the invariant.
    CallSite {
        /// Source file of the constructing call.
        file: String,
        /// Line within `file`.
        line: u32,
        /// Column within `line`.
        column: u32,
    },
    /// Filesystem path involved in a failed resolution.
    Path(Utf8PathBuf),
    /// No provenance was captured.
    Unknown,
}

impl Provenance {
    /// Capture the source location of the caller.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        let location = std::panic::Location::caller();
        Self::CallSite {
            file: location.file().to_owned(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CallSite { file, line, .. } => write!(f, "{file}:{line}"),
            Self::Path(path) => write!(f, "{path}"),
            Self::Unknown => f.write_str("<unknown>"),
        }
    }
}

/// An invariant predicate.
///
/// `Value` predicates are evaluated by the caller before the directive is
/// constructed. `Deferred` predicates are evaluated once, at check time,
/// which lets a directive assert conditions that may change between target
/// definition and composition (a manifest appearing on disk, say).
#[derive(Clone)]
pub enum Predicate {
    /// An eagerly evaluated boolean.
    Value(bool),
    /// A zero-argument closure evaluated at check time.
    Deferred(Arc<dyn Fn() -> bool + Send + Sync>),
}

impl Predicate {
    /// Wrap a closure for evaluation at check time.
    pub fn deferred(predicate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Self::Deferred(Arc::new(predicate))
    }

    /// Evaluate the predicate.
    #[must_use]
    pub fn holds(&self) -> bool {
        match self {
            Self::Value(value) => *value,
            Self::Deferred(predicate) => predicate(),
        }
    }
}

impl From<bool> for Predicate {
    fn from(value: bool) -> Self {
        Self::Value(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// A named assertion attached to call-site provenance.
#[derive(Clone, Debug)]
pub struct Invariant {
    /// The condition that must hold for composition to proceed.
    pub predicate: Predicate,
    /// Message reported to the user when the predicate does not hold.
    pub message: String,
    /// Source location captured when the invariant was constructed.
    pub location: Provenance,
}

impl Invariant {
    /// Construct an invariant, capturing the caller's location.
    #[must_use]
    #[track_caller]
    pub fn new(predicate: impl Into<Predicate>, message: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
            message: message.into(),
            location: Provenance::caller(),
        }
    }

    /// Evaluate the invariant's predicate.
    #[must_use]
    pub fn holds(&self) -> bool {
        self.predicate.holds()
    }
}

/// Evaluate every invariant in `directives`, collecting a [`Violation`] for
/// each unmet predicate in original order.
///
/// Checking never short-circuits: a single composition surfaces every
/// violated invariant in one report.
pub(crate) fn check_invariants(directives: &[Directive]) -> Vec<Violation> {
    directives
        .iter()
        .filter_map(|directive| match directive {
            Directive::Invariant(invariant) => Some(invariant),
            _ => None,
        })
        .filter(|invariant| !invariant.holds())
        .map(|invariant| Violation {
            message: invariant.message.clone(),
            location: invariant.location.clone(),
        })
        .collect()
}
