//! Rendering of failure reports.

use bundle_compose::report::render_report;
use bundle_compose::{InvalidConfig, Provenance, Violation};
use rstest::rstest;

#[rstest]
fn reports_list_every_violation_with_its_location() {
    let invalid = InvalidConfig::new(vec![
        Violation {
            message: "first problem".to_owned(),
            location: Provenance::CallSite {
                file: "targets/app.rs".to_owned(),
                line: 12,
                column: 5,
            },
        },
        Violation {
            message: "second problem".to_owned(),
            location: Provenance::Path("/tmp/manifest.json".into()),
        },
    ]);

    let report = render_report(&invalid);
    let lines: Vec<&str> = report.lines().collect();

    assert!(lines[0].starts_with("Location"));
    assert!(lines[0].contains("| Error"));
    assert!(lines[2].contains("targets/app.rs:12"));
    assert!(lines[2].contains("first problem"));
    assert!(lines[3].contains("/tmp/manifest.json"));
    assert!(lines[3].contains("second problem"));
}

#[rstest]
fn reports_keep_violations_in_original_order() {
    let invalid = InvalidConfig::new(vec![
        Violation {
            message: "a".to_owned(),
            location: Provenance::Unknown,
        },
        Violation {
            message: "b".to_owned(),
            location: Provenance::Unknown,
        },
    ]);

    let report = render_report(&invalid);
    let a = report.find(" | a").expect("first message present");
    let b = report.find(" | b").expect("second message present");
    assert!(a < b);
}
