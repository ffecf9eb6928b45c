//! The failure half of the composition result.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::config::BundlerConfig;
use crate::invariant::Provenance;

/// Result of [`compose`](crate::compose): exactly one of a configuration or
/// a failure report, never both, never partial.
pub type ComposeResult = Result<BundlerConfig, InvalidConfig>;

/// A single violated invariant or failed resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Message reported to the user.
    pub message: String,
    /// Where the violation originated.
    pub location: Provenance,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// An invalid configuration, carrying every error collected while applying
/// directives.
///
/// Composition never panics on bad input: callers receive this value and
/// decide how to report it, typically through
/// [`report::render_report`](crate::report::render_report).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("configuration is invalid: {} violation(s)", .errors.len())]
pub struct InvalidConfig {
    /// Violations in original directive order.
    pub errors: Vec<Violation>,
}

impl InvalidConfig {
    /// Wrap a list of violations.
    #[must_use]
    pub fn new(errors: Vec<Violation>) -> Self {
        Self { errors }
    }
}

impl From<Violation> for InvalidConfig {
    fn from(violation: Violation) -> Self {
        Self::new(vec![violation])
    }
}
