//! Rendering of composition failures for humans.
//!
//! The engine never writes to an output stream and never terminates the
//! process; callers render the report and decide where it goes.

use std::fmt::Write as _;

use crate::error::InvalidConfig;

const LOCATION_HEADING: &str = "Location";
const ERROR_HEADING: &str = "Error";

/// Render a two-column report, one row per violation, in original order.
///
/// ```text
/// Location                    | Error
/// --------                    | -----
/// webpack/targets/dll.rs:5    | Target requires the environment to be ...
/// ```
#[must_use]
pub fn render_report(invalid: &InvalidConfig) -> String {
    let locations: Vec<String> = invalid
        .errors
        .iter()
        .map(|violation| violation.location.to_string())
        .collect();
    let width = locations
        .iter()
        .map(String::len)
        .chain(std::iter::once(LOCATION_HEADING.len()))
        .max()
        .unwrap_or(LOCATION_HEADING.len());

    let mut out = String::new();
    let _ = writeln!(out, "{LOCATION_HEADING:<width$} | {ERROR_HEADING}");
    let _ = writeln!(
        out,
        "{:<width$} | {}",
        "-".repeat(LOCATION_HEADING.len()),
        "-".repeat(ERROR_HEADING.len())
    );
    for (location, violation) in locations.iter().zip(&invalid.errors) {
        let _ = writeln!(out, "{location:<width$} | {}", violation.message);
    }
    out
}
