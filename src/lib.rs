//! Deterministic composition of bundler build configurations from ordered
//! directive sequences.
//!
//! A build target is described as an ordered, possibly nested sequence of
//! [`Directive`] values, usually produced through the [`builders`] helpers.
//! [`compose`] flattens the sequence, checks every declared invariant, and
//! folds the directives into a [`BundlerConfig`]. When any invariant fails
//! it instead returns an [`InvalidConfig`] listing every violation with its
//! call-site provenance. Composition is pure: it never panics on bad input,
//! never terminates the process, and never returns a partial configuration.
//!
//! ```rust
//! use bundle_compose::{builders as b, compose, ComposeOptions};
//!
//! let result = compose(
//!     &ComposeOptions::default(),
//!     vec![
//!         b::context("/workspace/app".into()),
//!         b::generate_bundle("app", vec!["./src/index.js".to_owned()]),
//!         b::dev_tool("source-map"),
//!     ],
//! );
//!
//! let config = result.expect("valid configuration");
//! assert_eq!(config.dev_tool.as_deref(), Some("source-map"));
//! ```

pub mod builders;
mod compose;
mod config;
mod directive;
mod error;
pub mod file_types;
mod invariant;
mod pipeline;
pub mod report;
mod strip;

pub use compose::{ComposeOptions, compose};
pub use config::{
    BundlerConfig, ChunkCount, ModuleConfig, ModuleRule, NodeOptions, OutputConfig,
    PluginDescriptor, ResolveConfig, ResolveLoaderConfig, WatchConfig,
};
pub use directive::{
    BundleParams, CoverageRuleParams, DevServerParams, Directive, DirectiveTree,
    DllDefinitionParams, DllReferenceParams, LoaderParams, OutputParams, ResolveLoaderParams,
    ResolveParams, RuleParams, WatchParams, flatten,
};
pub use error::{ComposeResult, InvalidConfig, Violation};
pub use invariant::{Invariant, Predicate, Provenance};
pub use strip::{strip, strip_result};
