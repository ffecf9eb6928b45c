//! Plugin assembly: stage ordering, descriptor construction, and gated
//! manifest resolution.

use std::collections::BTreeMap;
use std::io::Write as _;

use bundle_compose::{
    BundleParams, ChunkCount, ComposeOptions, Directive, DllReferenceParams, PluginDescriptor,
    Provenance, builders as b, compose,
};
use camino::Utf8PathBuf;
use rstest::rstest;
use serde_json::{Value, json};

fn write_manifest(contents: &str) -> (tempfile::TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("manifest.json"))
        .expect("utf-8 temp path");
    let mut file = std::fs::File::create(&path).expect("create manifest");
    file.write_all(contents.as_bytes()).expect("write manifest");
    (dir, path)
}

#[rstest]
fn generate_dll_defines_the_bundle_entry_library_and_plugin() {
    let config = compose(
        &ComposeOptions::default(),
        vec![b::generate_dll(b::DllOptions {
            path: "/tmp/vendor-manifest.json".into(),
            name: "vendor".to_owned(),
            library_name: None,
            modules: vec!["lodash".to_owned()],
        })],
    )
    .expect("valid configuration");

    assert_eq!(
        config
            .entry
            .as_ref()
            .and_then(|entry| entry.get("vendor"))
            .map(Vec::len),
        Some(1)
    );
    assert_eq!(
        config
            .output
            .as_ref()
            .and_then(|output| output.library.as_deref()),
        Some(b::DEFAULT_DLL_LIBRARY_NAME)
    );
    assert!(matches!(
        config.plugins.first(),
        Some(PluginDescriptor::DllDefinition { name, .. }) if name == b::DEFAULT_DLL_LIBRARY_NAME
    ));
}

#[rstest]
fn use_dll_resolves_the_manifest_contents() {
    let (_dir, path) = write_manifest(r#"{ "name": "vendor", "content": {} }"#);

    let config = compose(
        &ComposeOptions::default(),
        vec![b::use_dll(path, Some("/workspace".into()))],
    )
    .expect("valid configuration");

    match config.plugins.first() {
        Some(PluginDescriptor::DllReference { context, manifest }) => {
            assert_eq!(context.as_deref().map(|p| p.as_str()), Some("/workspace"));
            assert_eq!(manifest, &json!({ "name": "vendor", "content": {} }));
        }
        other => panic!("unexpected plugin: {other:?}"),
    }
}

#[rstest]
fn an_unreadable_manifest_becomes_a_structured_failure() {
    // Constructed directly, bypassing the builder's guarding invariant, so
    // the internally gated resolution is what reports the failure.
    let invalid = compose(
        &ComposeOptions::default(),
        vec![
            Directive::UseDll(DllReferenceParams {
                path: "/nonexistent/manifest.json".into(),
                context: None,
            })
            .into(),
        ],
    )
    .expect_err("composition must fail");

    assert_eq!(invalid.errors.len(), 1);
    assert!(
        invalid.errors[0]
            .message
            .contains("/nonexistent/manifest.json")
    );
    assert_eq!(
        invalid.errors[0].location,
        Provenance::Path("/nonexistent/manifest.json".into())
    );
}

#[rstest]
fn a_malformed_manifest_becomes_a_structured_failure() {
    let (_dir, path) = write_manifest("not json");

    let invalid = compose(
        &ComposeOptions::default(),
        vec![
            Directive::UseDll(DllReferenceParams {
                path,
                context: None,
            })
            .into(),
        ],
    )
    .expect_err("composition must fail");

    assert!(invalid.errors[0].message.contains("not valid JSON"));
}

#[rstest]
fn dll_definitions_precede_references_regardless_of_directive_order() {
    let (_dir, path) = write_manifest("{}");

    let config = compose(
        &ComposeOptions::default(),
        vec![
            b::use_dll(path, None),
            b::generate_dll(b::DllOptions {
                path: "/tmp/vendor-manifest.json".into(),
                name: "vendor".to_owned(),
                library_name: None,
                modules: Vec::new(),
            }),
        ],
    )
    .expect("valid configuration");

    assert!(matches!(
        config.plugins.first(),
        Some(PluginDescriptor::DllDefinition { .. })
    ));
    assert!(matches!(
        config.plugins.last(),
        Some(PluginDescriptor::DllReference { .. })
    ));
}

#[rstest]
fn runtime_constants_are_json_encoded() {
    let config = compose(
        &ComposeOptions::default(),
        vec![b::define_constants(BTreeMap::from([(
            "NODE_ENV".to_owned(),
            json!("production"),
        )]))],
    )
    .expect("valid configuration");

    match config.plugins.first() {
        Some(PluginDescriptor::RuntimeConstants { definitions }) => {
            assert_eq!(
                definitions.get("NODE_ENV").map(String::as_str),
                Some("\"production\"")
            );
        }
        other => panic!("unexpected plugin: {other:?}"),
    }
}

#[rstest]
fn common_bundles_install_a_strict_commons_chunk() {
    let config = compose(
        &ComposeOptions::default(),
        vec![b::generate_common_bundle(
            "vendor",
            vec!["lodash".to_owned()],
        )],
    )
    .expect("valid configuration");

    match config.plugins.first() {
        Some(PluginDescriptor::CommonsChunk {
            name,
            filename,
            min_chunks,
            ..
        }) => {
            assert_eq!(name, "vendor");
            assert_eq!(filename, "vendor.js");
            assert_eq!(*min_chunks, Some(ChunkCount::Infinity));
        }
        other => panic!("unexpected plugin: {other:?}"),
    }
    assert_eq!(
        config
            .entry
            .as_ref()
            .and_then(|entry| entry.get("vendor"))
            .map(Vec::len),
        Some(1)
    );
}

#[rstest]
fn common_bundles_honour_a_numeric_admission_threshold() {
    let config = compose(
        &ComposeOptions::default(),
        vec![
            Directive::Bundle(BundleParams {
                name: "vendor".to_owned(),
                modules: vec!["lodash".to_owned()],
                common: true,
                strict: false,
                min_chunks: Some(2),
                plugin_options: BTreeMap::new(),
            })
            .into(),
        ],
    )
    .expect("valid configuration");

    match config.plugins.first() {
        Some(PluginDescriptor::CommonsChunk { min_chunks, .. }) => {
            assert_eq!(*min_chunks, Some(ChunkCount::Limit(2)));
        }
        other => panic!("unexpected plugin: {other:?}"),
    }
}

#[rstest]
fn parallel_rules_install_a_worker_pool_with_forwarded_options() {
    let options = ComposeOptions {
        pool_options: BTreeMap::from([("threads".to_owned(), json!(4))]),
    };

    let config = compose(
        &options,
        vec![b::compile(b::CompileOptions {
            pattern: Some(bundle_compose::file_types::JS.to_owned()),
            parallel: true,
            loaders: vec![b::loader(b::LoaderSpec {
                name: "babel-loader".to_owned(),
                ..b::LoaderSpec::default()
            })],
            ..b::CompileOptions::default()
        })],
    )
    .expect("valid configuration");

    match config.plugins.first() {
        Some(PluginDescriptor::WorkerPool { id, loaders, options }) => {
            assert_eq!(id, bundle_compose::file_types::JS);
            assert_eq!(loaders, &vec!["babel-loader".to_owned()]);
            assert_eq!(options.get("threads"), Some(&json!(4)));
        }
        other => panic!("unexpected plugin: {other:?}"),
    }

    // The rule itself routes through the pool.
    let rules = config
        .module
        .and_then(|module| module.rules)
        .expect("rules composed");
    assert_eq!(
        rules[0].loaders,
        Some(vec![format!(
            "worker-pool/loader?id={}",
            bundle_compose::file_types::JS
        )])
    );
}

#[rstest]
fn minification_honours_source_map_requests() {
    let config = compose(
        &ComposeOptions::default(),
        vec![
            b::generate_source_maps(),
            b::optimize_js(BTreeMap::from([("compress".to_owned(), json!(true))])),
        ],
    )
    .expect("valid configuration");

    match config.plugins.first() {
        Some(PluginDescriptor::Minify {
            options,
            source_maps,
        }) => {
            assert!(source_maps);
            assert_eq!(options.get("compress"), Some(&json!(true)));
        }
        other => panic!("unexpected plugin: {other:?}"),
    }
}

#[rstest]
fn presence_directives_install_their_plugins() {
    let config = compose(
        &ComposeOptions::default(),
        vec![
            b::sort_bundle_modules(),
            b::dont_emit_on_error(),
            b::compile_html(BTreeMap::from([(
                "template".to_owned(),
                json!("src/index.html"),
            )])),
            b::plugin(json!({ "name": "extract-text" })),
        ],
    )
    .expect("valid configuration");

    assert!(matches!(
        config.plugins.first(),
        Some(PluginDescriptor::HtmlFile { .. })
    ));
    assert!(
        config
            .plugins
            .iter()
            .any(|plugin| matches!(plugin, PluginDescriptor::OccurrenceOrder))
    );
    assert!(
        config
            .plugins
            .iter()
            .any(|plugin| matches!(plugin, PluginDescriptor::NoEmitOnError))
    );
    assert!(matches!(
        config.plugins.last(),
        Some(PluginDescriptor::Custom { plugin: Value::Object(_) })
    ));
}

#[rstest]
fn instrumentation_adds_a_post_rule_and_a_coverage_constant() {
    let config = compose(
        &ComposeOptions::default(),
        vec![b::instrument_js(b::InstrumentOptions {
            loader: "istanbul-loader".to_owned(),
            ..b::InstrumentOptions::default()
        })],
    )
    .expect("valid configuration");

    let post_rules = config
        .module
        .and_then(|module| module.post_rules)
        .expect("post rules composed");
    assert_eq!(post_rules[0].test, bundle_compose::file_types::JS);
    assert_eq!(post_rules[0].loader.as_deref(), Some("istanbul-loader"));

    assert!(matches!(
        config.plugins.first(),
        Some(PluginDescriptor::RuntimeConstants { .. })
    ));
}
