pub mod builtin;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::decision::{DecisionTree, StructuralTreeError, TerminalKey, TreeDefinition};
use crate::scoring::{CatalogDefinition, ScoringCatalog, ScoringError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    pub key: TerminalKey,
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub details: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommendationCatalog {
    entries: BTreeMap<TerminalKey, Recommendation>,
}

impl RecommendationCatalog {
    pub fn resolve(&self, key: &TerminalKey) -> Option<&Recommendation> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Terminals of `tree` with no catalog entry.
    pub fn unresolved(&self, tree: &DecisionTree) -> Vec<TerminalKey> {
        tree.terminal_keys()
            .into_iter()
            .filter(|key| !self.entries.contains_key(key))
            .collect()
    }
}

/// One topic page's content as authored in TOML or JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleDefinition {
    pub topic: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tree: Option<TreeDefinition>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub scoring: Option<CatalogDefinition>,
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("topic {topic}: {source}")]
    Tree {
        topic: String,
        #[source]
        source: StructuralTreeError,
    },
    #[error("topic {topic}: {source}")]
    Scoring {
        topic: String,
        #[source]
        source: ScoringError,
    },
    #[error("topic {topic}: recommendation {key} is defined more than once")]
    DuplicateRecommendation { topic: String, key: TerminalKey },
    #[error("topic {topic}: terminals without a recommendation: {}", join_keys(.keys))]
    UnresolvedTerminals {
        topic: String,
        keys: Vec<TerminalKey>,
    },
    #[error("topic slug must not be empty")]
    MissingTopic,
    #[error("topic {topic}: cannot fingerprint bundle: {source}")]
    Fingerprint {
        topic: String,
        #[source]
        source: serde_json::Error,
    },
}

fn join_keys(keys: &[TerminalKey]) -> String {
    keys.iter()
        .map(TerminalKey::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ContentError {
    /// Individual problems, one per line of a validation report.
    pub fn problems(&self) -> Vec<String> {
        match self {
            Self::Tree { source, .. } => source.violations.iter().map(|v| v.to_string()).collect(),
            other => vec![other.to_string()],
        }
    }
}

/// A topic's validated tree, recommendations and scoring catalog.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContentBundle {
    pub topic: String,
    pub title: String,
    pub description: String,
    pub tree: Option<DecisionTree>,
    pub recommendations: RecommendationCatalog,
    pub scoring: Option<ScoringCatalog>,
    pub fingerprint: String,
}

impl ContentBundle {
    pub fn from_definition(definition: BundleDefinition) -> Result<Self, ContentError> {
        let topic = definition.topic.trim().to_string();
        if topic.is_empty() {
            return Err(ContentError::MissingTopic);
        }
        let fingerprint =
            bundle_fingerprint(&definition).map_err(|source| ContentError::Fingerprint {
                topic: topic.clone(),
                source,
            })?;

        let tree = definition
            .tree
            .map(DecisionTree::new)
            .transpose()
            .map_err(|source| ContentError::Tree {
                topic: topic.clone(),
                source,
            })?;

        let mut entries = BTreeMap::new();
        for recommendation in definition.recommendations {
            let key = recommendation.key.clone();
            if entries.insert(key.clone(), recommendation).is_some() {
                return Err(ContentError::DuplicateRecommendation { topic, key });
            }
        }
        let recommendations = RecommendationCatalog { entries };

        if let Some(tree) = &tree {
            let keys = recommendations.unresolved(tree);
            if !keys.is_empty() {
                return Err(ContentError::UnresolvedTerminals { topic, keys });
            }
        }

        let scoring = definition
            .scoring
            .map(ScoringCatalog::new)
            .transpose()
            .map_err(|source| ContentError::Scoring {
                topic: topic.clone(),
                source,
            })?;

        Ok(Self {
            topic,
            title: definition.title,
            description: definition.description,
            tree,
            recommendations,
            scoring,
            fingerprint,
        })
    }

    pub fn parse_toml(data: &str) -> Result<Self> {
        let definition: BundleDefinition =
            toml::from_str(data).context("failed parsing TOML content bundle")?;
        Ok(Self::from_definition(definition)?)
    }

    pub fn parse_json(data: &str) -> Result<Self> {
        let definition: BundleDefinition =
            serde_json::from_str(data).context("failed parsing JSON content bundle")?;
        Ok(Self::from_definition(definition)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed reading content bundle: {}", path.display()))?;
        let parsed = if is_json(path) {
            Self::parse_json(&data)
        } else {
            Self::parse_toml(&data)
        };
        parsed.with_context(|| format!("invalid content bundle: {}", path.display()))
    }

    pub fn short_fingerprint(&self) -> &str {
        self.fingerprint.get(..12).unwrap_or(&self.fingerprint)
    }
}

/// SHA-256 over the canonical JSON of `definition`, hex encoded.
pub fn bundle_fingerprint(definition: &BundleDefinition) -> Result<String, serde_json::Error> {
    let canonical = serde_json::to_string(definition)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

fn is_bundle_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("toml") || ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
}

/// Bundle files directly inside `dir`, sorted by path.
pub fn bundle_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed reading content directory: {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if is_bundle_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleReport {
    pub source: String,
    pub topic: Option<String>,
    pub ok: bool,
    pub fingerprint: Option<String>,
    pub problems: Vec<String>,
}

/// Loads `path` and reports every problem found, without failing.
pub fn check_file(path: &Path) -> BundleReport {
    let source = path.display().to_string();
    match ContentBundle::load(path) {
        Ok(bundle) => BundleReport {
            source,
            topic: Some(bundle.topic.clone()),
            ok: true,
            fingerprint: Some(bundle.fingerprint.clone()),
            problems: Vec::new(),
        },
        Err(err) => {
            let problems = match err.downcast_ref::<ContentError>() {
                Some(content) => content.problems(),
                None => vec![format!("{err:#}")],
            };
            BundleReport {
                source,
                topic: None,
                ok: false,
                fingerprint: None,
                problems,
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TopicRegistry {
    bundles: Vec<ContentBundle>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        for bundle in builtin::builtin_bundles()? {
            registry.insert(bundle);
        }
        Ok(registry)
    }

    /// Adds `bundle`, replacing any bundle with the same topic.
    pub fn insert(&mut self, bundle: ContentBundle) {
        if let Some(existing) = self.bundles.iter_mut().find(|b| b.topic == bundle.topic) {
            info!(
                "replacing topic {} ({} -> {})",
                bundle.topic,
                existing.short_fingerprint(),
                bundle.short_fingerprint()
            );
            *existing = bundle;
        } else {
            debug!("registered topic {}", bundle.topic);
            self.bundles.push(bundle);
        }
    }

    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        if !dir.exists() {
            warn!("content directory does not exist: {}", dir.display());
            return Ok(0);
        }
        let files = bundle_files(dir)?;
        for path in &files {
            self.insert(ContentBundle::load(path)?);
        }
        Ok(files.len())
    }

    pub fn bundles(&self) -> &[ContentBundle] {
        &self.bundles
    }

    pub fn by_topic(&self, topic: &str) -> Option<&ContentBundle> {
        let wanted = topic.trim();
        self.bundles
            .iter()
            .find(|b| b.topic.eq_ignore_ascii_case(wanted))
    }

    pub fn require(&self, topic: &str) -> Result<&ContentBundle> {
        self.by_topic(topic).ok_or_else(|| {
            let known = self
                .bundles
                .iter()
                .map(|b| b.topic.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            anyhow!("unknown topic {topic}; known topics: {known}")
        })
    }
}
