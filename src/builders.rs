//! Convenience constructors for directives.
//!
//! These helpers are the supported way to produce [`Directive`] values:
//! they bundle the invariants a directive depends on alongside the
//! directive itself, and capture the caller's source location so a failing
//! composition points at the target definition.
//!
//! Helpers never read the process environment. Environment-conditional
//! helpers like [`when_env`] and [`ensure_env`] take the resolved
//! environment value as an argument, keeping composition inputs fully
//! self-contained and reproducible.

use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use serde_json::Value;

use crate::directive::{
    BundleParams, CoverageRuleParams, DevServerParams, Directive, DirectiveTree,
    DllDefinitionParams, DllReferenceParams, LoaderParams, OutputParams, ResolveLoaderParams,
    ResolveParams, RuleParams, WatchParams,
};
use crate::file_types;
use crate::invariant::{Invariant, Predicate};

/// Library identifier assigned to DLL bundles that do not name their own.
pub const DEFAULT_DLL_LIBRARY_NAME: &str = "dll_[name]_[hash]";

/// Group a set of directives so they can be reused as a composite target.
#[must_use]
pub fn use_profile(profile: Vec<DirectiveTree>) -> DirectiveTree {
    DirectiveTree::Group(profile)
}

/// Configure the output descriptor.
///
/// Later output directives fully replace earlier ones; partial merging
/// across authors is deliberately not supported for this field.
#[must_use]
pub fn output(params: OutputParams) -> DirectiveTree {
    Directive::Output(params).into()
}

/// Configure module resolution. To define aliases, see [`alias`].
#[must_use]
pub fn resolve_modules(params: ResolveParams) -> DirectiveTree {
    Directive::Resolve(params).into()
}

/// Configure loader resolution. Like [`resolve_modules`] but for loaders.
#[must_use]
pub fn resolve_loaders(params: ResolveLoaderParams) -> DirectiveTree {
    Directive::ResolveLoader(params).into()
}

/// Define module aliases. Keys are module names as they appear in import
/// statements; values are the modules to use instead. Later directives
/// override same-named keys, earlier keys persist.
#[must_use]
pub fn alias(aliases: BTreeMap<String, String>) -> DirectiveTree {
    Directive::Alias(aliases).into()
}

/// Like [`alias`] but for loaders.
#[must_use]
pub fn alias_loader(aliases: BTreeMap<String, String>) -> DirectiveTree {
    Directive::AliasLoader(aliases).into()
}

/// Expose constants to modules at runtime.
///
/// Values are JSON-encoded during composition, so pass them unquoted.
#[must_use]
pub fn define_constants(definitions: BTreeMap<String, Value>) -> DirectiveTree {
    Directive::RuntimeConstants(definitions).into()
}

/// Sort bundle modules so output is consistent between runs.
#[must_use]
pub fn sort_bundle_modules() -> DirectiveTree {
    Directive::SortBundleModules.into()
}

/// Exclude files from loader processing even when rules match them.
///
/// Useful for pre-processed vendor files that only cost time to re-parse.
#[must_use]
pub fn dont_parse(patterns: Vec<String>) -> DirectiveTree {
    Directive::DontParse(patterns).into()
}

/// Generate an HTML file wrapping the bundles. Options are forwarded to
/// the HTML generator verbatim.
#[must_use]
pub fn compile_html(options: BTreeMap<String, Value>) -> DirectiveTree {
    Directive::HtmlFile(options).into()
}

/// Generate a bundle from a set of modules.
///
/// The name is usable in `[name]` interpolation patterns; naming a bundle
/// twice replaces the earlier module list entirely.
#[must_use]
pub fn generate_bundle(name: impl Into<String>, modules: Vec<String>) -> DirectiveTree {
    Directive::Bundle(BundleParams {
        name: name.into(),
        modules,
        common: false,
        strict: false,
        min_chunks: None,
        plugin_options: BTreeMap::new(),
    })
    .into()
}

/// Generate the "commons" bundle shared by the other bundles.
///
/// Chunking is strict: only the listed modules are admitted into the
/// chunk. Construct [`BundleParams`] directly for looser behaviour or to
/// forward descriptor overrides.
#[must_use]
pub fn generate_common_bundle(name: impl Into<String>, modules: Vec<String>) -> DirectiveTree {
    Directive::Bundle(BundleParams {
        name: name.into(),
        modules,
        common: true,
        strict: true,
        min_chunks: None,
        plugin_options: BTreeMap::new(),
    })
    .into()
}

/// Select the dev tool used for the resulting bundle.
#[must_use]
pub fn dev_tool(tool: impl Into<String>) -> DirectiveTree {
    Directive::DevTool(tool.into()).into()
}

/// Map modules to externally provided values so they are not bundled.
#[must_use]
pub fn define_external_modules(externals: BTreeMap<String, Value>) -> DirectiveTree {
    Directive::ExternalModules(externals).into()
}

/// Options accepted by [`compile`].
#[derive(Clone, Debug, Default)]
pub struct CompileOptions {
    /// File pattern the rule applies to. Required; see [`file_types`] for
    /// pre-defined patterns.
    pub pattern: Option<String>,
    /// Loaders produced by [`loader`]. Disabled loaders are filtered out.
    pub loaders: Vec<Option<LoaderParams>>,
    /// Patterns the loaders are restricted to.
    pub include: Option<Vec<String>>,
    /// Patterns excluded from the loaders.
    pub exclude: Option<Vec<String>>,
    /// Compile matching files through a parallel worker pool.
    pub parallel: bool,
    /// Treat the loader list as one pre-composed loader; worker pools are
    /// not honoured when set.
    pub single_loader: bool,
}

/// Compile files matching a pattern through a list of loaders.
///
/// The returned group carries two invariants alongside the rule: a pattern
/// must be given, and at least one loader must remain after filtering
/// disabled ones.
#[must_use]
#[track_caller]
pub fn compile(options: CompileOptions) -> DirectiveTree {
    let loaders: Vec<LoaderParams> = options.loaders.into_iter().flatten().collect();
    let pattern_present = options.pattern.is_some();
    let pattern = options.pattern.unwrap_or_default();

    DirectiveTree::Group(vec![
        invariant(
            pattern_present,
            "You must pass a pattern to \"compile\".",
        ),
        invariant(
            !loaders.is_empty(),
            "You must define at least one loader to compile.",
        ),
        Directive::Rule(RuleParams {
            parallel: options.parallel && !options.single_loader,
            pool_id: Some(pattern.clone()),
            pattern,
            include: options.include,
            exclude: options.exclude,
            loaders,
        })
        .into(),
    ])
}

/// A loader reference for use in [`CompileOptions::loaders`].
#[derive(Clone, Debug)]
pub struct LoaderSpec {
    /// Name of the loader module, like `babel-loader`.
    pub name: String,
    /// JSON-serialisable loader options.
    pub options: Option<Value>,
    /// Set to `false` to conditionally exclude this loader.
    pub enabled: bool,
}

impl Default for LoaderSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            options: None,
            enabled: true,
        }
    }
}

/// Construct a loader for [`compile`], or `None` when disabled.
#[must_use]
pub fn loader(spec: LoaderSpec) -> Option<LoaderParams> {
    spec.enabled.then(|| LoaderParams {
        name: spec.name,
        options: spec.options,
    })
}

/// Apply `directives` only when `condition` holds.
#[must_use]
pub fn when(condition: bool, directives: Vec<DirectiveTree>) -> DirectiveTree {
    if condition {
        DirectiveTree::Group(directives)
    } else {
        DirectiveTree::Group(Vec::new())
    }
}

/// Apply `directives` only when `condition` does not hold.
#[must_use]
pub fn unless(condition: bool, directives: Vec<DirectiveTree>) -> DirectiveTree {
    when(!condition, directives)
}

/// Apply `directives` only in the given environment.
///
/// `env` is a resolved environment snapshot supplied by the caller; the
/// engine itself never consults ambient process state.
#[must_use]
pub fn when_env(env: &str, target: &str, directives: Vec<DirectiveTree>) -> DirectiveTree {
    when(env == target, directives)
}

/// Break the build unless the environment matches the expected value.
#[must_use]
#[track_caller]
pub fn ensure_env(env: &str, target: &str) -> DirectiveTree {
    invariant(
        env == target,
        format!(
            "Target requires the environment to be set to \"{target}\" while it is \
             set to \"{env}\". Please re-run with the expected environment."
        ),
    )
}

/// Serve bundles through a development server at `host`.
///
/// The composed output's public path is rewired to include the host.
#[must_use]
pub fn enable_dev_server(host: impl Into<String>) -> DirectiveTree {
    Directive::DevServer(DevServerParams { host: host.into() }).into()
}

/// Generate source maps. When minification is also requested, the minifier
/// is instructed to emit source maps as well.
#[must_use]
pub fn generate_source_maps() -> DirectiveTree {
    Directive::SourceMaps.into()
}

/// Minify the resulting bundles. Options are forwarded to the minifier.
#[must_use]
pub fn optimize_js(options: BTreeMap<String, Value>) -> DirectiveTree {
    Directive::OptimizeJs(options).into()
}

/// Do not emit bundles when a module error occurs. Useful in production
/// builds; in watch mode a broken rebuild is usually acceptable.
#[must_use]
pub fn dont_emit_on_error() -> DirectiveTree {
    Directive::DontEmitOnError.into()
}

/// Options accepted by [`instrument_js`].
#[derive(Clone, Debug)]
pub struct InstrumentOptions {
    /// File pattern to instrument; defaults to [`file_types::JS`].
    pub pattern: String,
    /// The instrumenting loader.
    pub loader: String,
    /// Patterns instrumentation is restricted to.
    pub include: Option<Vec<String>>,
    /// Patterns excluded from instrumentation; excluded files do not count
    /// towards coverage.
    pub exclude: Option<Vec<String>>,
}

impl Default for InstrumentOptions {
    fn default() -> Self {
        Self {
            pattern: file_types::JS.to_owned(),
            loader: String::new(),
            include: None,
            exclude: None,
        }
    }
}

/// Collect coverage information from matching modules.
///
/// Expands to two directives: a runtime constant `COVERAGE=1` for modules
/// that need to detect instrumentation, and the instrumenting rule itself.
#[must_use]
pub fn instrument_js(options: InstrumentOptions) -> DirectiveTree {
    DirectiveTree::Group(vec![
        define_constants(BTreeMap::from([("COVERAGE".to_owned(), Value::from("1"))])),
        Directive::CoverageRule(CoverageRuleParams {
            pattern: options.pattern,
            loader: options.loader,
            include: options.include,
            exclude: options.exclude,
        })
        .into(),
    ])
}

/// Use a pre-built DLL through its manifest.
///
/// The group carries a deferred invariant checking that the manifest
/// exists at composition time; a missing manifest usually means the DLL
/// target was never built.
#[must_use]
#[track_caller]
pub fn use_dll(path: Utf8PathBuf, context: Option<Utf8PathBuf>) -> DirectiveTree {
    let manifest = path.clone();
    DirectiveTree::Group(vec![
        invariant(
            Predicate::deferred(move || manifest.is_file()),
            format!(
                "The DLL manifest at '{path}' could not be found. This likely means \
                 you have forgotten to build that target."
            ),
        ),
        Directive::UseDll(DllReferenceParams { path, context }).into(),
    ])
}

/// Options accepted by [`generate_dll`].
#[derive(Clone, Debug, Default)]
pub struct DllOptions {
    /// Where the DLL's manifest will be written.
    pub path: Utf8PathBuf,
    /// Name of the generated bundle.
    pub name: String,
    /// Identifier for the function the bundle exports; defaults to
    /// [`DEFAULT_DLL_LIBRARY_NAME`].
    pub library_name: Option<String>,
    /// Modules to include in the bundle.
    pub modules: Vec<String>,
}

/// Generate a bundle usable as a DLL.
///
/// Expands to a bundle directive plus the DLL definition; the composed
/// output's library field is set to the DLL's library name implicitly.
#[must_use]
pub fn generate_dll(options: DllOptions) -> DirectiveTree {
    DirectiveTree::Group(vec![
        generate_bundle(options.name, options.modules),
        Directive::DefineDll(DllDefinitionParams {
            path: options.path,
            name: options
                .library_name
                .unwrap_or_else(|| DEFAULT_DLL_LIBRARY_NAME.to_owned()),
        })
        .into(),
    ])
}

/// Set the directory modules are resolved from. When unset, downstream
/// tools commonly default to the working directory, which is rarely what
/// you want.
#[must_use]
pub fn context(directory: Utf8PathBuf) -> DirectiveTree {
    Directive::Context(directory).into()
}

/// Disable node feature shims, currently the `Buffer` shim, in the output.
#[must_use]
pub fn disable_node_shims() -> DirectiveTree {
    Directive::DisableNodeShims.into()
}

/// Enable the watcher, optionally tuning its behaviour. Options from later
/// watch directives override, earlier ones persist.
#[must_use]
pub fn watch(options: WatchParams) -> DirectiveTree {
    Directive::Watch(options).into()
}

/// Break the build when a condition does not hold.
///
/// The caller's source location is captured here, at construction, so the
/// failure report points at the target definition.
#[must_use]
#[track_caller]
pub fn invariant(predicate: impl Into<Predicate>, message: impl Into<String>) -> DirectiveTree {
    Directive::Invariant(Invariant::new(predicate, message)).into()
}

/// Surface a diagnostic message once during composition, success or
/// failure. Useful for announcing conditional directives.
#[must_use]
pub fn message(text: impl Into<String>) -> DirectiveTree {
    Directive::Message(text.into()).into()
}

/// Append an opaque plugin descriptor verbatim.
#[must_use]
pub fn plugin(descriptor: Value) -> DirectiveTree {
    Directive::CustomPlugin(descriptor).into()
}
