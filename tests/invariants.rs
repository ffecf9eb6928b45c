//! Invariant evaluation, provenance capture, and failure gating.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bundle_compose::{
    ComposeOptions, Predicate, Provenance, builders as b, compose,
};
use rstest::rstest;

#[rstest]
fn every_invariant_is_evaluated_even_after_the_first_failure() {
    let invalid = compose(
        &ComposeOptions::default(),
        vec![
            b::invariant(false, "first"),
            b::invariant(false, "second"),
            b::invariant(true, "third"),
        ],
    )
    .expect_err("composition must fail");

    let messages: Vec<&str> = invalid
        .errors
        .iter()
        .map(|violation| violation.message.as_str())
        .collect();
    assert_eq!(messages, vec!["first", "second"]);
}

#[rstest]
fn held_invariants_do_not_fail_composition() {
    let result = compose(
        &ComposeOptions::default(),
        vec![b::invariant(true, "fine"), b::dev_tool("eval")],
    );

    assert!(result.is_ok());
}

#[rstest]
fn deferred_predicates_are_evaluated_at_check_time() {
    let flag = Arc::new(AtomicBool::new(false));
    let probe = Arc::clone(&flag);
    let directives = vec![b::invariant(
        Predicate::deferred(move || probe.load(Ordering::SeqCst)),
        "flag must be set",
    )];

    // The predicate was false at construction; flipping the flag before
    // composing must make the invariant hold.
    flag.store(true, Ordering::SeqCst);

    assert!(compose(&ComposeOptions::default(), directives).is_ok());
}

#[rstest]
fn violations_carry_the_construction_call_site() {
    let invalid = compose(
        &ComposeOptions::default(),
        vec![b::invariant(false, "boom")],
    )
    .expect_err("composition must fail");

    match &invalid.errors[0].location {
        Provenance::CallSite { file, line, .. } => {
            assert!(file.ends_with("invariants.rs"), "unexpected file: {file}");
            assert!(*line > 0);
        }
        other => panic!("unexpected provenance: {other:?}"),
    }
}

#[rstest]
fn ensure_env_rejects_a_mismatched_environment() {
    let invalid = compose(
        &ComposeOptions::default(),
        vec![b::ensure_env("development", "test")],
    )
    .expect_err("composition must fail");

    assert!(
        invalid.errors[0]
            .message
            .contains("requires the environment to be set to \"test\"")
    );
}

#[rstest]
fn ensure_env_accepts_a_matching_environment() {
    assert!(compose(&ComposeOptions::default(), vec![b::ensure_env("test", "test")]).is_ok());
}

#[rstest]
fn compile_requires_a_pattern() {
    let invalid = compose(
        &ComposeOptions::default(),
        vec![b::compile(b::CompileOptions {
            loaders: vec![b::loader(b::LoaderSpec {
                name: "babel-loader".to_owned(),
                ..b::LoaderSpec::default()
            })],
            ..b::CompileOptions::default()
        })],
    )
    .expect_err("composition must fail");

    assert!(invalid.errors[0].message.contains("You must pass a pattern"));
}

#[rstest]
fn compile_requires_at_least_one_enabled_loader() {
    let invalid = compose(
        &ComposeOptions::default(),
        vec![b::compile(b::CompileOptions {
            pattern: Some(bundle_compose::file_types::JS.to_owned()),
            loaders: vec![b::loader(b::LoaderSpec {
                name: "babel-loader".to_owned(),
                enabled: false,
                ..b::LoaderSpec::default()
            })],
            ..b::CompileOptions::default()
        })],
    )
    .expect_err("composition must fail");

    assert!(
        invalid.errors[0]
            .message
            .contains("at least one loader")
    );
}

#[rstest]
fn failing_invariants_suppress_manifest_resolution() {
    // The DLL manifest does not exist; its guarding invariant and the
    // explicit one must both be reported, and the pipeline must never run
    // (a resolution failure would otherwise surface as a third error).
    let invalid = compose(
        &ComposeOptions::default(),
        vec![
            b::invariant(false, "boom"),
            b::use_dll("/nonexistent/manifest.json".into(), None),
        ],
    )
    .expect_err("composition must fail");

    assert_eq!(invalid.errors.len(), 2);
    assert_eq!(invalid.errors[0].message, "boom");
    assert!(invalid.errors[1].message.contains("could not be found"));
}
