//! Ordered assembly of plugin descriptors.
//!
//! The pipeline is a declared table of stage functions executed strictly in
//! order, each appending descriptors built from the directives it consumes.
//! Order is load-bearing: DLL definitions must land before references, and
//! a failed manifest resolution must surface before later stages run.

use std::collections::BTreeMap;

use camino::Utf8Path;
use serde_json::Value;

use crate::compose::ComposeOptions;
use crate::config::{ChunkCount, PluginDescriptor};
use crate::directive::{Directive, LoaderParams};
use crate::error::{InvalidConfig, Violation};
use crate::invariant::Provenance;

struct StageContext<'a> {
    pool_options: &'a BTreeMap<String, Value>,
}

type Stage = fn(&StageContext<'_>, &[Directive], &mut Vec<PluginDescriptor>) -> Result<(), Violation>;

const STAGES: [Stage; 10] = [
    dll_definitions,
    runtime_constants,
    html_files,
    commons_chunks,
    worker_pools,
    module_sorting,
    minification,
    no_emit_on_error,
    dll_references,
    custom_plugins,
];

/// Run every stage in declared order, accumulating descriptors.
///
/// # Errors
///
/// Returns an [`InvalidConfig`] when a stage fails; only manifest
/// resolution in the DLL-reference stage can fail, and it is converted
/// into a structured violation rather than propagated as an I/O error.
pub(crate) fn assemble(
    options: &ComposeOptions,
    directives: &[Directive],
) -> Result<Vec<PluginDescriptor>, InvalidConfig> {
    let context = StageContext {
        pool_options: &options.pool_options,
    };
    let mut plugins = Vec::new();
    for stage in STAGES {
        stage(&context, directives, &mut plugins).map_err(InvalidConfig::from)?;
    }
    Ok(plugins)
}

fn dll_definitions(
    _context: &StageContext<'_>,
    directives: &[Directive],
    plugins: &mut Vec<PluginDescriptor>,
) -> Result<(), Violation> {
    for params in directives.iter().filter_map(|directive| match directive {
        Directive::DefineDll(params) => Some(params),
        _ => None,
    }) {
        plugins.push(PluginDescriptor::DllDefinition {
            name: params.name.clone(),
            path: params.path.clone(),
        });
    }
    Ok(())
}

fn runtime_constants(
    _context: &StageContext<'_>,
    directives: &[Directive],
    plugins: &mut Vec<PluginDescriptor>,
) -> Result<(), Violation> {
    for mapping in directives.iter().filter_map(|directive| match directive {
        Directive::RuntimeConstants(mapping) => Some(mapping),
        _ => None,
    }) {
        // Values are JSON-encoded so callers do not have to quote them.
        let definitions = mapping
            .iter()
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect();
        plugins.push(PluginDescriptor::RuntimeConstants { definitions });
    }
    Ok(())
}

fn html_files(
    _context: &StageContext<'_>,
    directives: &[Directive],
    plugins: &mut Vec<PluginDescriptor>,
) -> Result<(), Violation> {
    for options in directives.iter().filter_map(|directive| match directive {
        Directive::HtmlFile(options) => Some(options),
        _ => None,
    }) {
        plugins.push(PluginDescriptor::HtmlFile {
            options: options.clone(),
        });
    }
    Ok(())
}

fn commons_chunks(
    _context: &StageContext<'_>,
    directives: &[Directive],
    plugins: &mut Vec<PluginDescriptor>,
) -> Result<(), Violation> {
    for bundle in directives
        .iter()
        .filter_map(|directive| match directive {
            Directive::Bundle(bundle) if bundle.common => Some(bundle),
            _ => None,
        })
    {
        plugins.push(PluginDescriptor::CommonsChunk {
            name: bundle.name.clone(),
            filename: format!("{}.js", bundle.name),
            // Strict chunking admits no module beyond the declared entry.
            min_chunks: if bundle.strict {
                Some(ChunkCount::Infinity)
            } else {
                bundle.min_chunks.map(ChunkCount::Limit)
            },
            options: bundle.plugin_options.clone(),
        });
    }
    Ok(())
}

fn worker_pools(
    context: &StageContext<'_>,
    directives: &[Directive],
    plugins: &mut Vec<PluginDescriptor>,
) -> Result<(), Violation> {
    for rule in directives.iter().filter_map(|directive| match directive {
        Directive::Rule(rule) if rule.parallel => Some(rule),
        _ => None,
    }) {
        plugins.push(PluginDescriptor::WorkerPool {
            id: rule.pool_id(),
            loaders: rule.loaders.iter().map(LoaderParams::request).collect(),
            options: context.pool_options.clone(),
        });
    }
    Ok(())
}

fn module_sorting(
    _context: &StageContext<'_>,
    directives: &[Directive],
    plugins: &mut Vec<PluginDescriptor>,
) -> Result<(), Violation> {
    if directives
        .iter()
        .any(|directive| matches!(directive, Directive::SortBundleModules))
    {
        plugins.push(PluginDescriptor::OccurrenceOrder);
    }
    Ok(())
}

fn minification(
    _context: &StageContext<'_>,
    directives: &[Directive],
    plugins: &mut Vec<PluginDescriptor>,
) -> Result<(), Violation> {
    let options = directives
        .iter()
        .rev()
        .find_map(|directive| match directive {
            Directive::OptimizeJs(options) => Some(options),
            _ => None,
        });

    if let Some(options) = options {
        let source_maps = directives
            .iter()
            .any(|directive| matches!(directive, Directive::SourceMaps));
        plugins.push(PluginDescriptor::Minify {
            options: options.clone(),
            source_maps,
        });
    }
    Ok(())
}

fn no_emit_on_error(
    _context: &StageContext<'_>,
    directives: &[Directive],
    plugins: &mut Vec<PluginDescriptor>,
) -> Result<(), Violation> {
    if directives
        .iter()
        .any(|directive| matches!(directive, Directive::DontEmitOnError))
    {
        plugins.push(PluginDescriptor::NoEmitOnError);
    }
    Ok(())
}

fn dll_references(
    _context: &StageContext<'_>,
    directives: &[Directive],
    plugins: &mut Vec<PluginDescriptor>,
) -> Result<(), Violation> {
    for params in directives.iter().filter_map(|directive| match directive {
        Directive::UseDll(params) => Some(params),
        _ => None,
    }) {
        let manifest = resolve_manifest(&params.path)?;
        plugins.push(PluginDescriptor::DllReference {
            context: params.context.clone(),
            manifest,
        });
    }
    Ok(())
}

fn custom_plugins(
    _context: &StageContext<'_>,
    directives: &[Directive],
    plugins: &mut Vec<PluginDescriptor>,
) -> Result<(), Violation> {
    for plugin in directives.iter().filter_map(|directive| match directive {
        Directive::CustomPlugin(plugin) => Some(plugin),
        _ => None,
    }) {
        plugins.push(PluginDescriptor::Custom {
            plugin: plugin.clone(),
        });
    }
    Ok(())
}

/// Read and parse a DLL manifest.
///
/// Resolution is always gated: any failure becomes a structured violation
/// naming the path, never an unhandled error.
fn resolve_manifest(path: &Utf8Path) -> Result<Value, Violation> {
    let data = std::fs::read_to_string(path).map_err(|source| Violation {
        message: format!("unable to read DLL manifest '{path}': {source}"),
        location: Provenance::Path(path.to_owned()),
    })?;
    serde_json::from_str(&data).map_err(|source| Violation {
        message: format!("DLL manifest '{path}' is not valid JSON: {source}"),
        location: Provenance::Path(path.to_owned()),
    })
}
