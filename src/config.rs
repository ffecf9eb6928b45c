//! The composed configuration tree consumed by the downstream build tool.
//!
//! Every type here is an owned snapshot: the tree holds no references into
//! the directive sequence it was composed from, so callers may keep or
//! mutate it freely after composition returns.

use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use serde::Serialize;
use serde_json::Value;

use crate::directive::OutputParams;

/// A complete bundler configuration.
///
/// Field presence follows the composition rules exactly: fields a directive
/// never touched are `None`, containers a directive touched but left empty
/// are `Some` and empty. Apply [`strip`](crate::strip) to prune the latter.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlerConfig {
    /// Directory modules are resolved from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Utf8PathBuf>,
    /// Dev tool used for the resulting bundle.
    #[serde(rename = "devtool", skip_serializing_if = "Option::is_none")]
    pub dev_tool: Option<String>,
    /// Named entry-point map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<BTreeMap<String, Vec<String>>>,
    /// External-module map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub externals: Option<BTreeMap<String, Value>>,
    /// Module transformation rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<ModuleConfig>,
    /// Node shim configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeOptions>,
    /// Output descriptor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
    /// Plugin descriptors in pipeline order.
    pub plugins: Vec<PluginDescriptor>,
    /// Module resolution configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve: Option<ResolveConfig>,
    /// Loader resolution configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve_loader: Option<ResolveLoaderConfig>,
    /// Whether the watcher is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch: Option<bool>,
    /// Watcher tuning options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_options: Option<WatchConfig>,
}

/// The composed output descriptor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    /// Template for emitted bundle file names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Directory bundles are written to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Utf8PathBuf>,
    /// Public URL prefix of the emitted assets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_path: Option<String>,
    /// Library identifier exported by the bundle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
}

impl OutputConfig {
    pub(crate) fn is_unset(&self) -> bool {
        self.filename.is_none()
            && self.path.is_none()
            && self.public_path.is_none()
            && self.library.is_none()
    }
}

impl From<OutputParams> for OutputConfig {
    fn from(params: OutputParams) -> Self {
        Self {
            filename: params.filename,
            path: params.path,
            public_path: params.public_path,
            library: params.library,
        }
    }
}

/// The composed module-resolution configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveConfig {
    /// Absolute directories to resolve modules from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directories: Option<Vec<String>>,
    /// Directory names resolved relative to the requiring module.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_directories: Option<Vec<String>>,
    /// File extensions tried during resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
    /// Directories consulted when ordinary resolution fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_directories: Option<Vec<String>>,
    /// Package manifest fields consulted to pick a module's main file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_mains: Option<Vec<String>>,
    /// Alias map, later directives overriding same-named keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<BTreeMap<String, String>>,
}

impl ResolveConfig {
    pub(crate) fn is_unset(&self) -> bool {
        self.directories.is_none()
            && self.relative_directories.is_none()
            && self.extensions.is_none()
            && self.fallback_directories.is_none()
            && self.package_mains.is_none()
            && self.alias.is_none()
    }
}

/// The composed loader-resolution configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveLoaderConfig {
    /// Absolute directories to resolve loaders from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directories: Option<Vec<String>>,
    /// Directory names resolved relative to the requiring module.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_directories: Option<Vec<String>>,
    /// File extensions tried during resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
    /// Directories consulted when ordinary resolution fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_directories: Option<Vec<String>>,
    /// Naming templates tried when resolving a loader module.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_templates: Option<Vec<String>>,
    /// Package manifest fields consulted to pick a loader's main file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_mains: Option<Vec<String>>,
    /// Loader alias map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<BTreeMap<String, String>>,
}

impl ResolveLoaderConfig {
    pub(crate) fn is_unset(&self) -> bool {
        self.directories.is_none()
            && self.relative_directories.is_none()
            && self.extensions.is_none()
            && self.fallback_directories.is_none()
            && self.module_templates.is_none()
            && self.package_mains.is_none()
            && self.alias.is_none()
    }
}

/// The composed module-transform configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleConfig {
    /// Patterns excluded from loader processing entirely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_parse: Option<Vec<String>>,
    /// Transform rules in directive order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<ModuleRule>>,
    /// Post-processing rules, coverage instrumentation for instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_rules: Option<Vec<ModuleRule>>,
}

impl ModuleConfig {
    pub(crate) fn is_unset(&self) -> bool {
        self.no_parse.is_none() && self.rules.is_none() && self.post_rules.is_none()
    }
}

/// One composed module-transform rule.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRule {
    /// File pattern the rule applies to.
    pub test: String,
    /// Loader request strings, first to last.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaders: Option<Vec<String>>,
    /// Single loader request, used by post-processing rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loader: Option<String>,
    /// Patterns the rule is restricted to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,
    /// Patterns excluded from the rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
}

/// Node shim configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeOptions {
    /// Whether the `Buffer` shim is provided.
    pub buffer: bool,
}

/// Composed watcher options; a key-union merge across watch directives.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchConfig {
    /// Milliseconds to aggregate changes before rebuilding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate_timeout: Option<u64>,
    /// Poll the filesystem instead of relying on change events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll: Option<bool>,
}

impl WatchConfig {
    pub(crate) fn is_unset(&self) -> bool {
        self.aggregate_timeout.is_none() && self.poll.is_none()
    }
}

/// A constructed plugin descriptor.
///
/// Descriptors are plain data: the engine never instantiates downstream
/// plugins, it only records what the build tool should construct.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PluginDescriptor {
    /// Emit a DLL bundle and its manifest.
    DllDefinition {
        /// Library identifier exported by the bundle.
        name: String,
        /// Where the manifest is written.
        path: Utf8PathBuf,
    },
    /// Expose constants to modules at runtime.
    RuntimeConstants {
        /// Identifier to JSON-encoded value.
        definitions: BTreeMap<String, String>,
    },
    /// Generate an HTML file wrapping the bundles.
    HtmlFile {
        /// Options forwarded to the HTML generator verbatim.
        options: BTreeMap<String, Value>,
    },
    /// Extract common modules into a shared chunk.
    CommonsChunk {
        /// Chunk name.
        name: String,
        /// Emitted file name.
        filename: String,
        /// Module admission threshold; `Infinity` pins the chunk to its
        /// declared entry modules.
        #[serde(skip_serializing_if = "Option::is_none")]
        min_chunks: Option<ChunkCount>,
        /// Descriptor overrides forwarded verbatim.
        options: BTreeMap<String, Value>,
    },
    /// Compile a rule's files through a parallel worker pool.
    WorkerPool {
        /// Pool identifier, matched by the rule's loader request.
        id: String,
        /// Loader request strings the pool applies.
        loaders: Vec<String>,
        /// Cross-cutting pool options forwarded from compose options.
        options: BTreeMap<String, Value>,
    },
    /// Sort bundle modules by occurrence for deterministic output.
    OccurrenceOrder,
    /// Minify the resulting bundles.
    Minify {
        /// Minifier options.
        options: BTreeMap<String, Value>,
        /// Emit source maps alongside minified output.
        source_maps: bool,
    },
    /// Do not emit bundles when a module error occurs.
    NoEmitOnError,
    /// Reference a pre-built DLL.
    DllReference {
        /// Directory the manifest's files are resolved from.
        #[serde(skip_serializing_if = "Option::is_none")]
        context: Option<Utf8PathBuf>,
        /// The resolved manifest contents.
        manifest: Value,
    },
    /// An opaque, caller-supplied descriptor.
    Custom {
        /// The descriptor, forwarded verbatim.
        plugin: Value,
    },
}

/// Module admission threshold for a commons chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChunkCount {
    /// No module is admitted beyond the declared entry modules.
    Infinity,
    /// Admit modules referenced by at least this many chunks.
    Limit(u32),
}
