//! The composition engine: a deterministic fold of a flat directive
//! sequence into one configuration tree or one failure report.
//!
//! Each output field is produced independently by a dedicated function with
//! the merge strategy the field calls for: last-entire-wins, key-union
//! merge, named-map accumulation, list concatenation, or a derivation from
//! directives of a different kind. The tie-break is uniform: the most
//! recent directive in sequence order wins any scalar conflict; for maps
//! and lists, later entries override and non-conflicting earlier entries
//! persist.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::config::{
    BundlerConfig, ModuleConfig, ModuleRule, NodeOptions, OutputConfig, ResolveConfig,
    ResolveLoaderConfig, WatchConfig,
};
use crate::directive::{Directive, DirectiveTree, LoaderParams, RuleParams, flatten};
use crate::error::{ComposeResult, InvalidConfig};
use crate::invariant::check_invariants;
use crate::pipeline;

/// Cross-cutting options for one composition call.
#[derive(Clone, Debug, Default)]
pub struct ComposeOptions {
    /// Options forwarded verbatim into every worker-pool descriptor.
    pub pool_options: BTreeMap<String, Value>,
}

/// Fold `directives` into a configuration, or into a failure report when
/// any declared invariant does not hold.
///
/// Every invariant is evaluated before any field is composed; when one or
/// more fail, the field composer and the plugin pipeline never run and no
/// external manifest is resolved.
///
/// # Errors
///
/// Returns an [`InvalidConfig`] carrying every violated invariant, or a
/// single violation when a DLL manifest referenced by a directive cannot be
/// resolved.
pub fn compose(options: &ComposeOptions, directives: Vec<DirectiveTree>) -> ComposeResult {
    let flat = flatten(directives);

    emit_messages(&flat);

    let failures = check_invariants(&flat);
    if !failures.is_empty() {
        return Err(InvalidConfig::new(failures));
    }

    let plugins = pipeline::assemble(options, &flat)?;

    Ok(BundlerConfig {
        context: compose_context(&flat),
        dev_tool: compose_dev_tool(&flat),
        entry: Some(compose_entries(&flat)),
        externals: Some(compose_externals(&flat)),
        module: Some(compose_module(&flat)),
        node: compose_node(&flat),
        output: Some(compose_output(&flat)),
        plugins,
        resolve: Some(compose_resolve(&flat)),
        resolve_loader: Some(compose_resolve_loader(&flat)),
        watch: compose_watch(&flat),
        watch_options: Some(compose_watch_options(&flat)),
    })
}

/// Surface each diagnostic message exactly once, success or failure.
fn emit_messages(directives: &[Directive]) {
    for text in directives.iter().filter_map(|directive| match directive {
        Directive::Message(text) => Some(text),
        _ => None,
    }) {
        tracing::info!(target: "bundle_compose", "{text}");
    }
}

fn compose_context(directives: &[Directive]) -> Option<camino::Utf8PathBuf> {
    directives
        .iter()
        .rev()
        .find_map(|directive| match directive {
            Directive::Context(directory) => Some(directory.clone()),
            _ => None,
        })
}

fn compose_dev_tool(directives: &[Directive]) -> Option<String> {
    let explicit = directives
        .iter()
        .rev()
        .find_map(|directive| match directive {
            Directive::DevTool(tool) => Some(tool.clone()),
            _ => None,
        });

    explicit.or_else(|| {
        directives
            .iter()
            .any(|directive| matches!(directive, Directive::SourceMaps))
            .then(|| "source-map".to_owned())
    })
}

/// Named-map accumulation: one entry per bundle name, a reused name
/// replacing the earlier modules entirely.
fn compose_entries(directives: &[Directive]) -> BTreeMap<String, Vec<String>> {
    directives
        .iter()
        .filter_map(|directive| match directive {
            Directive::Bundle(bundle) => Some((bundle.name.clone(), bundle.modules.clone())),
            _ => None,
        })
        .collect()
}

/// Key-union merge across external-module directives.
fn compose_externals(directives: &[Directive]) -> BTreeMap<String, Value> {
    directives
        .iter()
        .filter_map(|directive| match directive {
            Directive::ExternalModules(externals) => Some(externals.clone()),
            _ => None,
        })
        .fold(BTreeMap::new(), |mut map, externals| {
            map.extend(externals);
            map
        })
}

fn compose_module(directives: &[Directive]) -> ModuleConfig {
    let no_parse = directives
        .iter()
        .filter_map(|directive| match directive {
            Directive::DontParse(patterns) => Some(patterns.clone()),
            _ => None,
        })
        .fold(Vec::new(), |mut list, patterns| {
            list.extend(patterns);
            list
        });

    let rules = directives
        .iter()
        .filter_map(|directive| match directive {
            Directive::Rule(rule) => Some(compose_rule(rule)),
            _ => None,
        })
        .collect();

    let post_rules = directives
        .iter()
        .filter_map(|directive| match directive {
            Directive::CoverageRule(rule) => Some(ModuleRule {
                test: rule.pattern.clone(),
                loaders: None,
                loader: Some(rule.loader.clone()),
                include: rule.include.clone(),
                exclude: rule.exclude.clone(),
            }),
            _ => None,
        })
        .collect();

    ModuleConfig {
        no_parse: Some(no_parse),
        rules: Some(rules),
        post_rules: Some(post_rules),
    }
}

fn compose_rule(rule: &RuleParams) -> ModuleRule {
    // Parallel rules defer to their worker pool; the pipeline emits the
    // matching pool descriptor.
    let loaders = if rule.parallel {
        vec![format!("worker-pool/loader?id={}", rule.pool_id())]
    } else {
        rule.loaders.iter().map(LoaderParams::request).collect()
    };

    ModuleRule {
        test: rule.pattern.clone(),
        loaders: Some(loaders),
        loader: None,
        include: rule.include.clone(),
        exclude: rule.exclude.clone(),
    }
}

fn compose_node(directives: &[Directive]) -> Option<NodeOptions> {
    directives
        .iter()
        .any(|directive| matches!(directive, Directive::DisableNodeShims))
        .then_some(NodeOptions { buffer: false })
}

/// Last-entire-wins over the output params, then the two derived values:
/// the library name from the last DLL definition, and the public path from
/// dev-server directives. The derivations read the already-composed base,
/// so they run after it.
fn compose_output(directives: &[Directive]) -> OutputConfig {
    let mut output = directives
        .iter()
        .rev()
        .find_map(|directive| match directive {
            Directive::Output(params) => Some(params.clone()),
            _ => None,
        })
        .map(OutputConfig::from)
        .unwrap_or_default();

    if let Some(dll) = directives
        .iter()
        .rev()
        .find_map(|directive| match directive {
            Directive::DefineDll(params) => Some(params),
            _ => None,
        })
    {
        output.library = Some(dll.name.clone());
    }

    let base_public_path = output.public_path.clone();
    for server in directives.iter().filter_map(|directive| match directive {
        Directive::DevServer(params) => Some(params),
        _ => None,
    }) {
        let public_path = base_public_path.as_deref().unwrap_or("/");
        output.public_path = Some(format!("{}{public_path}", server.host));
    }

    output
}

fn compose_resolve(directives: &[Directive]) -> ResolveConfig {
    let params = directives
        .iter()
        .rev()
        .find_map(|directive| match directive {
            Directive::Resolve(params) => Some(params.clone()),
            _ => None,
        })
        .unwrap_or_default();

    let alias = directives
        .iter()
        .filter_map(|directive| match directive {
            Directive::Alias(aliases) => Some(aliases.clone()),
            _ => None,
        })
        .fold(BTreeMap::new(), |mut map, aliases| {
            map.extend(aliases);
            map
        });

    ResolveConfig {
        directories: params.directories,
        relative_directories: params.relative_directories,
        extensions: params.extensions,
        fallback_directories: params.fallback_directories,
        package_mains: params.package_mains,
        alias: Some(alias),
    }
}

fn compose_resolve_loader(directives: &[Directive]) -> ResolveLoaderConfig {
    let params = directives
        .iter()
        .rev()
        .find_map(|directive| match directive {
            Directive::ResolveLoader(params) => Some(params.clone()),
            _ => None,
        })
        .unwrap_or_default();

    let alias = directives
        .iter()
        .filter_map(|directive| match directive {
            Directive::AliasLoader(aliases) => Some(aliases.clone()),
            _ => None,
        })
        .fold(BTreeMap::new(), |mut map, aliases| {
            map.extend(aliases);
            map
        });

    ResolveLoaderConfig {
        directories: params.directories,
        relative_directories: params.relative_directories,
        extensions: params.extensions,
        fallback_directories: params.fallback_directories,
        module_templates: params.module_templates,
        package_mains: params.package_mains,
        alias: Some(alias),
    }
}

fn compose_watch(directives: &[Directive]) -> Option<bool> {
    directives
        .iter()
        .any(|directive| matches!(directive, Directive::Watch(_)))
        .then_some(true)
}

/// Key-union merge: later watch directives override the fields they set,
/// earlier fields persist.
fn compose_watch_options(directives: &[Directive]) -> WatchConfig {
    directives
        .iter()
        .filter_map(|directive| match directive {
            Directive::Watch(params) => Some(params),
            _ => None,
        })
        .fold(WatchConfig::default(), |mut merged, params| {
            if params.aggregate_timeout.is_some() {
                merged.aggregate_timeout = params.aggregate_timeout;
            }
            if params.poll.is_some() {
                merged.poll = params.poll;
            }
            merged
        })
}
