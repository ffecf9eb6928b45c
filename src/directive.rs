//! The directive model: tagged configuration contributions and their
//! flattening into a single ordered sequence.
//!
//! Directives are immutable once constructed. Their position in the input
//! sequence is semantically significant: every composition rule resolves
//! conflicts in favour of the most recent matching directive.

use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use serde_json::Value;

use crate::invariant::Invariant;

/// One configuration contribution.
///
/// The set of directive kinds is closed; each composition function matches
/// exhaustively so a new variant cannot be added without deciding how every
/// field and pipeline stage treats it.
#[derive(Clone, Debug)]
pub enum Directive {
    /// Set the directory modules are resolved from.
    Context(Utf8PathBuf),
    /// Configure the output descriptor.
    Output(OutputParams),
    /// Configure module resolution.
    Resolve(ResolveParams),
    /// Configure loader resolution.
    ResolveLoader(ResolveLoaderParams),
    /// Define module aliases.
    Alias(BTreeMap<String, String>),
    /// Define loader aliases.
    AliasLoader(BTreeMap<String, String>),
    /// Define a named entry-point bundle.
    Bundle(BundleParams),
    /// Map modules to externally provided values.
    ExternalModules(BTreeMap<String, Value>),
    /// Compile files matching a pattern through a list of loaders.
    Rule(RuleParams),
    /// Instrument files for coverage collection with a post-processing rule.
    CoverageRule(CoverageRuleParams),
    /// Exclude files from loader processing entirely.
    DontParse(Vec<String>),
    /// Select the dev tool used for the resulting bundle.
    DevTool(String),
    /// Request source maps.
    SourceMaps,
    /// Serve bundles through a development server.
    DevServer(DevServerParams),
    /// Enable the watcher, optionally tuning its behaviour.
    Watch(WatchParams),
    /// Expose constants to modules at runtime.
    RuntimeConstants(BTreeMap<String, Value>),
    /// Generate an HTML file wrapping the bundles.
    HtmlFile(BTreeMap<String, Value>),
    /// Minify the resulting bundles.
    OptimizeJs(BTreeMap<String, Value>),
    /// Sort bundle modules for deterministic output.
    SortBundleModules,
    /// Do not emit bundles when a module error occurs.
    DontEmitOnError,
    /// Disable node feature shims in the output.
    DisableNodeShims,
    /// Generate a bundle usable as a DLL.
    DefineDll(DllDefinitionParams),
    /// Reference a pre-built DLL through its manifest.
    UseDll(DllReferenceParams),
    /// Append an opaque plugin descriptor verbatim.
    CustomPlugin(Value),
    /// Assert a condition that must hold for composition to proceed.
    Invariant(Invariant),
    /// Surface a diagnostic message once during composition.
    Message(String),
}

/// Parameters for the output descriptor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputParams {
    /// Template for emitted bundle file names.
    pub filename: Option<String>,
    /// Directory bundles are written to.
    pub path: Option<Utf8PathBuf>,
    /// Public URL prefix of the emitted assets. Rewired when a dev-server
    /// directive is present.
    pub public_path: Option<String>,
    /// Library identifier exported by the bundle. Overridden when a DLL is
    /// being defined.
    pub library: Option<String>,
}

/// Parameters for module resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolveParams {
    /// Absolute directories to resolve modules from.
    pub directories: Option<Vec<String>>,
    /// Directory names resolved relative to the requiring module.
    pub relative_directories: Option<Vec<String>>,
    /// File extensions tried during resolution.
    pub extensions: Option<Vec<String>>,
    /// Directories consulted when ordinary resolution fails.
    pub fallback_directories: Option<Vec<String>>,
    /// Package manifest fields consulted to pick a module's main file.
    pub package_mains: Option<Vec<String>>,
}

/// Parameters for loader resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolveLoaderParams {
    /// Absolute directories to resolve loaders from.
    pub directories: Option<Vec<String>>,
    /// Directory names resolved relative to the requiring module.
    pub relative_directories: Option<Vec<String>>,
    /// File extensions tried during resolution.
    pub extensions: Option<Vec<String>>,
    /// Directories consulted when ordinary resolution fails.
    pub fallback_directories: Option<Vec<String>>,
    /// Naming templates tried when resolving a loader module.
    pub module_templates: Option<Vec<String>>,
    /// Package manifest fields consulted to pick a loader's main file.
    pub package_mains: Option<Vec<String>>,
}

/// Parameters for a named entry-point bundle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BundleParams {
    /// Bundle name, usable in `[name]` interpolation.
    pub name: String,
    /// Modules the bundle contains.
    pub modules: Vec<String>,
    /// Whether this is the commons bundle shared by the others.
    pub common: bool,
    /// Restrict the commons bundle to exactly the listed modules.
    pub strict: bool,
    /// Admit modules referenced by at least this many chunks into the
    /// commons chunk. Ignored when `strict` is set.
    pub min_chunks: Option<u32>,
    /// Options forwarded to the commons-chunk descriptor verbatim.
    pub plugin_options: BTreeMap<String, Value>,
}

/// Parameters for a module rule.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleParams {
    /// File pattern the rule applies to (a regex source).
    pub pattern: String,
    /// Loaders applied to matching files, first to last.
    pub loaders: Vec<LoaderParams>,
    /// Patterns the loaders are restricted to.
    pub include: Option<Vec<String>>,
    /// Patterns excluded from the loaders.
    pub exclude: Option<Vec<String>>,
    /// Route matching files through a worker pool for parallel compilation.
    pub parallel: bool,
    /// Identifier of the worker pool; defaults to the rule pattern.
    pub pool_id: Option<String>,
}

impl RuleParams {
    /// The worker-pool identifier for this rule.
    #[must_use]
    pub fn pool_id(&self) -> String {
        self.pool_id.clone().unwrap_or_else(|| self.pattern.clone())
    }
}

/// A loader reference with optional serialisable options.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoaderParams {
    /// Name of the loader module.
    pub name: String,
    /// JSON-serialisable loader options.
    pub options: Option<Value>,
}

impl LoaderParams {
    /// Render the loader as a request string, appending options as a query
    /// when present.
    #[must_use]
    pub fn request(&self) -> String {
        match &self.options {
            Some(options) => format!("{}?{options}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Parameters for a coverage-instrumentation rule.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoverageRuleParams {
    /// File pattern to instrument.
    pub pattern: String,
    /// The instrumenting loader.
    pub loader: String,
    /// Patterns instrumentation is restricted to.
    pub include: Option<Vec<String>>,
    /// Patterns excluded from instrumentation.
    pub exclude: Option<Vec<String>>,
}

/// Parameters for the development server.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DevServerParams {
    /// Host of the dev server, like `http://localhost:9090`.
    pub host: String,
}

/// Watcher tuning parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WatchParams {
    /// Milliseconds to aggregate changes before rebuilding.
    pub aggregate_timeout: Option<u64>,
    /// Poll the filesystem instead of relying on change events.
    pub poll: Option<bool>,
}

/// Parameters defining a DLL bundle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DllDefinitionParams {
    /// Library identifier exported by the DLL bundle.
    pub name: String,
    /// Where the DLL's manifest will be written.
    pub path: Utf8PathBuf,
}

/// Parameters referencing a pre-built DLL.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DllReferenceParams {
    /// Path to the DLL's manifest.
    pub path: Utf8PathBuf,
    /// Directory the manifest's files are resolved from.
    pub context: Option<Utf8PathBuf>,
}

/// An ordered, arbitrarily nested sequence of directives.
///
/// Nesting represents directives grouped by upstream helpers, conditionally
/// applied profiles for instance. Empty groups are legal and contribute
/// nothing.
#[derive(Clone, Debug)]
pub enum DirectiveTree {
    /// A single directive.
    Leaf(Directive),
    /// A nested group of entries.
    Group(Vec<DirectiveTree>),
}

impl DirectiveTree {
    fn flatten_into(self, out: &mut Vec<Directive>) {
        match self {
            Self::Leaf(directive) => out.push(directive),
            Self::Group(entries) => {
                for entry in entries {
                    entry.flatten_into(out);
                }
            }
        }
    }
}

impl From<Directive> for DirectiveTree {
    fn from(directive: Directive) -> Self {
        Self::Leaf(directive)
    }
}

impl From<Vec<DirectiveTree>> for DirectiveTree {
    fn from(entries: Vec<DirectiveTree>) -> Self {
        Self::Group(entries)
    }
}

/// Fully resolve nesting into a single ordered, flat sequence.
///
/// Relative order is preserved; no directive contains further directives
/// after flattening.
#[must_use]
pub fn flatten(entries: Vec<DirectiveTree>) -> Vec<Directive> {
    let mut flat = Vec::new();
    for entry in entries {
        entry.flatten_into(&mut flat);
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_preserves_relative_order() {
        let entries = vec![
            DirectiveTree::from(Directive::DevTool("eval".to_owned())),
            DirectiveTree::Group(vec![
                DirectiveTree::Group(Vec::new()),
                Directive::SourceMaps.into(),
                DirectiveTree::Group(vec![Directive::SortBundleModules.into()]),
            ]),
            Directive::DontEmitOnError.into(),
        ];

        let flat = flatten(entries);
        assert_eq!(flat.len(), 4);
        assert!(matches!(flat[0], Directive::DevTool(_)));
        assert!(matches!(flat[1], Directive::SourceMaps));
        assert!(matches!(flat[2], Directive::SortBundleModules));
        assert!(matches!(flat[3], Directive::DontEmitOnError));
    }

    #[test]
    fn empty_groups_contribute_nothing() {
        let entries = vec![DirectiveTree::Group(vec![DirectiveTree::Group(Vec::new())])];
        assert!(flatten(entries).is_empty());
    }

    #[test]
    fn loader_request_appends_options_as_query() {
        let bare = LoaderParams {
            name: "babel-loader".to_owned(),
            options: None,
        };
        assert_eq!(bare.request(), "babel-loader");

        let with_options = LoaderParams {
            name: "babel-loader".to_owned(),
            options: Some(serde_json::json!({ "presets": ["es2015"] })),
        };
        assert_eq!(
            with_options.request(),
            r#"babel-loader?{"presets":["es2015"]}"#
        );
    }
}
