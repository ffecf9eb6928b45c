//! Optional pruning of empty containers from a composed configuration.
//!
//! Composition leaves touched-but-empty containers in place so field
//! presence mirrors the directive sequence exactly. Some consumers treat an
//! empty container differently from an absent one; stripping removes, bottom
//! up, every container that is empty after removing unset values, at a fixed
//! set of tree paths. The pass is pure and idempotent, and it is the
//! identity on failure values.

use crate::config::{BundlerConfig, ModuleConfig, ModuleRule, ResolveConfig, ResolveLoaderConfig};
use crate::error::ComposeResult;

/// Return a copy of `config` with empty containers and all-unset
/// sub-structures removed. `config` itself is left untouched.
#[must_use]
pub fn strip(config: &BundlerConfig) -> BundlerConfig {
    let mut stripped = config.clone();

    stripped.entry = stripped.entry.take().filter(|entry| !entry.is_empty());
    stripped.externals = stripped
        .externals
        .take()
        .filter(|externals| !externals.is_empty());
    stripped.module = stripped
        .module
        .take()
        .map(strip_module)
        .filter(|module| !module.is_unset());
    stripped.output = stripped.output.take().filter(|output| !output.is_unset());
    stripped.resolve = stripped
        .resolve
        .take()
        .map(strip_resolve)
        .filter(|resolve| !resolve.is_unset());
    stripped.resolve_loader = stripped
        .resolve_loader
        .take()
        .map(strip_resolve_loader)
        .filter(|resolve| !resolve.is_unset());
    stripped.watch_options = stripped
        .watch_options
        .take()
        .filter(|watch| !watch.is_unset());

    stripped
}

/// Apply [`strip`] to a successful composition; failures pass through
/// unchanged.
#[must_use]
pub fn strip_result(result: &ComposeResult) -> ComposeResult {
    match result {
        Ok(config) => Ok(strip(config)),
        Err(invalid) => Err(invalid.clone()),
    }
}

fn strip_module(mut module: ModuleConfig) -> ModuleConfig {
    module.no_parse = module.no_parse.filter(|patterns| !patterns.is_empty());
    module.rules = module
        .rules
        .map(|rules| rules.into_iter().map(strip_rule).collect::<Vec<_>>())
        .filter(|rules| !rules.is_empty());
    module.post_rules = module
        .post_rules
        .map(|rules| rules.into_iter().map(strip_rule).collect::<Vec<_>>())
        .filter(|rules| !rules.is_empty());
    module
}

fn strip_rule(mut rule: ModuleRule) -> ModuleRule {
    rule.loaders = rule.loaders.filter(|loaders| !loaders.is_empty());
    rule.include = rule.include.filter(|include| !include.is_empty());
    rule.exclude = rule.exclude.filter(|exclude| !exclude.is_empty());
    rule
}

fn strip_resolve(mut resolve: ResolveConfig) -> ResolveConfig {
    resolve.alias = resolve.alias.filter(|alias| !alias.is_empty());
    resolve
}

fn strip_resolve_loader(mut resolve: ResolveLoaderConfig) -> ResolveLoaderConfig {
    resolve.alias = resolve.alias.filter(|alias| !alias.is_empty());
    resolve
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn stripping_an_untouched_config_removes_every_empty_container() {
        let config = BundlerConfig {
            entry: Some(BTreeMap::new()),
            externals: Some(BTreeMap::new()),
            module: Some(ModuleConfig {
                no_parse: Some(Vec::new()),
                rules: Some(Vec::new()),
                post_rules: Some(Vec::new()),
            }),
            output: Some(crate::config::OutputConfig::default()),
            resolve: Some(ResolveConfig {
                alias: Some(BTreeMap::new()),
                ..ResolveConfig::default()
            }),
            resolve_loader: Some(ResolveLoaderConfig {
                alias: Some(BTreeMap::new()),
                ..ResolveLoaderConfig::default()
            }),
            watch_options: Some(crate::config::WatchConfig::default()),
            ..BundlerConfig::default()
        };

        let stripped = strip(&config);
        assert_eq!(stripped, BundlerConfig::default());
    }

    #[test]
    fn stripping_is_idempotent() {
        let config = BundlerConfig {
            entry: Some(BTreeMap::from([(
                "app".to_owned(),
                vec!["./src/index.js".to_owned()],
            )])),
            externals: Some(BTreeMap::new()),
            ..BundlerConfig::default()
        };

        let once = strip(&config);
        let twice = strip(&once);
        assert_eq!(once, twice);
    }
}
