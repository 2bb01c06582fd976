use anyhow::{Context, Result};

use crate::content::ContentBundle;

const BUILTIN_SOURCES: &[(&str, &str)] = &[
    ("chunking", include_str!("../../content/chunking.toml")),
    ("vector-stores", include_str!("../../content/vector-stores.toml")),
    ("customization", include_str!("../../content/customization.toml")),
];

/// Topic bundles compiled into the binary.
pub fn builtin_bundles() -> Result<Vec<ContentBundle>> {
    BUILTIN_SOURCES
        .iter()
        .map(|(name, source)| {
            ContentBundle::parse_toml(source)
                .with_context(|| format!("built-in topic {name} is invalid"))
        })
        .collect()
}

pub fn builtin_topics() -> Vec<&'static str> {
    BUILTIN_SOURCES.iter().map(|(name, _)| *name).collect()
}

#[cfg(test)]
mod tests {
    use super::{builtin_bundles, builtin_topics};
    use crate::decision::evaluate;
    use crate::scoring::{compare, DEFAULT_MAX_SELECTION};

    #[test]
    fn every_builtin_bundle_loads() {
        let bundles = builtin_bundles().expect("builtins are valid");
        let topics: Vec<_> = bundles.iter().map(|b| b.topic.as_str()).collect();
        assert_eq!(topics, builtin_topics());
    }

    #[test]
    fn every_builtin_terminal_resolves() {
        for bundle in builtin_bundles().expect("builtins are valid") {
            let tree = bundle.tree.as_ref().expect("builtin topics ship a tree");
            for key in tree.terminal_keys() {
                assert!(
                    bundle.recommendations.resolve(&key).is_some(),
                    "{} has no recommendation for {key}",
                    bundle.topic
                );
            }
        }
    }

    #[test]
    fn chunking_paths_reach_expected_recommendations() {
        let bundles = builtin_bundles().expect("builtins are valid");
        let chunking = bundles
            .iter()
            .find(|b| b.topic == "chunking")
            .expect("chunking builtin");
        let tree = chunking.tree.as_ref().expect("tree");

        let done = evaluate(tree, &[1, 0, 0]).expect("valid path");
        assert_eq!(done.terminal().map(|k| k.as_str()), Some("hierarchical"));
        let done = evaluate(tree, &[0]).expect("valid path");
        assert_eq!(done.terminal().map(|k| k.as_str()), Some("no_chunking"));
        let done = evaluate(tree, &[1, 1, 1]).expect("valid path");
        assert_eq!(done.terminal().map(|k| k.as_str()), Some("fixed_size"));
    }

    #[test]
    fn builtin_catalogs_compare_within_the_default_cap() {
        for bundle in builtin_bundles().expect("builtins are valid") {
            let catalog = bundle.scoring.as_ref().expect("builtin topics ship scores");
            let ids: Vec<&str> = catalog.candidates().iter().map(|c| c.id.as_str()).collect();
            let profiles = compare(&ids, catalog, DEFAULT_MAX_SELECTION).expect("comparable");
            assert_eq!(profiles.len(), ids.len().min(DEFAULT_MAX_SELECTION));
            for profile in &profiles {
                assert_eq!(profile.values.len(), catalog.dimensions().len());
            }
        }
    }
}
