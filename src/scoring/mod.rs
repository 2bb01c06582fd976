pub mod profile;
pub mod selection;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use profile::{
    compare, dimension_leaders, profile, CandidateProfile, DimensionLeader, DimensionValue,
};
pub use selection::{ComparisonSelection, SelectionChange, SelectionState};

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;
pub const MIN_SELECTION: usize = 2;
/// Cap used by the comparison views when no other is configured.
pub const DEFAULT_MAX_SELECTION: usize = 4;

/// Rating on the fixed 1..=5 ordinal scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
    pub fn new(value: u8) -> Option<Self> {
        (MIN_SCORE..=MAX_SCORE).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Score {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("score {value} outside {MIN_SCORE}..={MAX_SCORE}"))
    }
}

impl From<Score> for u8 {
    fn from(value: Score) -> Self {
        value.0
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{MAX_SCORE}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dimension {
    pub key: String,
    pub label: String,
}

impl Dimension {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Candidate {
    pub id: String,
    pub label: String,
    scores: BTreeMap<String, Score>,
}

impl Candidate {
    pub fn score(&self, dimension_key: &str) -> Option<Score> {
        self.scores.get(dimension_key).copied()
    }
}

/// Candidate as authored; scores are raw integers until the catalog checks them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateDefinition {
    pub id: String,
    pub label: String,
    pub scores: BTreeMap<String, i64>,
}

impl CandidateDefinition {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            scores: BTreeMap::new(),
        }
    }

    pub fn with_score(mut self, dimension_key: impl Into<String>, value: i64) -> Self {
        self.scores.insert(dimension_key.into(), value);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogDefinition {
    pub dimensions: Vec<Dimension>,
    pub candidates: Vec<CandidateDefinition>,
}

/// Dimensions plus fully scored candidates. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "CatalogDefinition", into = "CatalogDefinition")]
pub struct ScoringCatalog {
    dimensions: Vec<Dimension>,
    candidates: Vec<Candidate>,
}

impl ScoringCatalog {
    pub fn new(definition: CatalogDefinition) -> Result<Self, ScoringError> {
        let mut dimension_keys = BTreeSet::new();
        for dimension in &definition.dimensions {
            if !dimension_keys.insert(dimension.key.as_str()) {
                return Err(ScoringError::DuplicateDimension(dimension.key.clone()));
            }
        }

        let mut seen = BTreeSet::new();
        let mut candidates = Vec::with_capacity(definition.candidates.len());
        for raw in &definition.candidates {
            if !seen.insert(raw.id.as_str()) {
                return Err(ScoringError::DuplicateCandidate(raw.id.clone()));
            }
            if let Some(unknown) = raw
                .scores
                .keys()
                .find(|key| !dimension_keys.contains(key.as_str()))
            {
                return Err(ScoringError::UnknownDimension {
                    candidate: raw.id.clone(),
                    dimension: unknown.clone(),
                });
            }

            let mut scores = BTreeMap::new();
            for dimension in &definition.dimensions {
                let raw_value = raw.scores.get(&dimension.key).copied().ok_or_else(|| {
                    ScoringError::MissingDimensionScore {
                        candidate: raw.id.clone(),
                        dimension: dimension.key.clone(),
                    }
                })?;
                let score = u8::try_from(raw_value)
                    .ok()
                    .and_then(Score::new)
                    .ok_or_else(|| ScoringError::ScoreOutOfRange {
                        candidate: raw.id.clone(),
                        dimension: dimension.key.clone(),
                        value: raw_value,
                    })?;
                scores.insert(dimension.key.clone(), score);
            }

            candidates.push(Candidate {
                id: raw.id.clone(),
                label: raw.label.clone(),
                scores,
            });
        }

        Ok(Self {
            dimensions: definition.dimensions,
            candidates,
        })
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn candidate(&self, id: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == id)
    }
}

impl TryFrom<CatalogDefinition> for ScoringCatalog {
    type Error = ScoringError;

    fn try_from(value: CatalogDefinition) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScoringCatalog> for CatalogDefinition {
    fn from(value: ScoringCatalog) -> Self {
        let candidates = value
            .candidates
            .into_iter()
            .map(|c| CandidateDefinition {
                id: c.id,
                label: c.label,
                scores: c
                    .scores
                    .into_iter()
                    .map(|(key, score)| (key, i64::from(score.value())))
                    .collect(),
            })
            .collect();
        Self {
            dimensions: value.dimensions,
            candidates,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("comparison needs at least {minimum} candidates, got {selected}")]
    InsufficientSelection { selected: usize, minimum: usize },
    #[error("candidate {candidate} has no score for dimension {dimension}")]
    MissingDimensionScore { candidate: String, dimension: String },
    #[error("candidate {candidate} scores {value} on {dimension}; scores must be 1..=5")]
    ScoreOutOfRange {
        candidate: String,
        dimension: String,
        value: i64,
    },
    #[error("candidate {candidate} scores undeclared dimension {dimension}")]
    UnknownDimension { candidate: String, dimension: String },
    #[error("candidate id {0} is defined more than once")]
    DuplicateCandidate(String),
    #[error("dimension key {0} is declared more than once")]
    DuplicateDimension(String),
    #[error("unknown candidate: {0}")]
    UnknownCandidate(String),
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::{CandidateDefinition, CatalogDefinition, Dimension, ScoringCatalog};

    pub fn vector_store_definition() -> CatalogDefinition {
        CatalogDefinition {
            dimensions: vec![
                Dimension::new("scale", "Scale"),
                Dimension::new("latency", "Query latency"),
                Dimension::new("ops", "Operational ease"),
            ],
            candidates: vec![
                CandidateDefinition::new("opensearch", "OpenSearch Serverless")
                    .with_score("scale", 5)
                    .with_score("latency", 4)
                    .with_score("ops", 4),
                CandidateDefinition::new("aurora", "Aurora pgvector")
                    .with_score("scale", 3)
                    .with_score("latency", 4)
                    .with_score("ops", 3),
                CandidateDefinition::new("neptune", "Neptune Analytics")
                    .with_score("scale", 4)
                    .with_score("latency", 3)
                    .with_score("ops", 3),
                CandidateDefinition::new("memorydb", "MemoryDB")
                    .with_score("scale", 3)
                    .with_score("latency", 5)
                    .with_score("ops", 3),
                CandidateDefinition::new("kendra", "Kendra")
                    .with_score("scale", 4)
                    .with_score("latency", 3)
                    .with_score("ops", 5),
            ],
        }
    }

    pub fn vector_store_catalog() -> ScoringCatalog {
        ScoringCatalog::new(vector_store_definition()).expect("fixture catalog is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{vector_store_catalog, vector_store_definition};
    use super::*;

    #[test]
    fn score_accepts_only_one_through_five() {
        assert!(Score::new(0).is_none());
        assert_eq!(Score::new(1).map(Score::value), Some(1));
        assert_eq!(Score::new(5).map(Score::value), Some(5));
        assert!(Score::new(6).is_none());
        assert_eq!(Score::new(3).expect("valid").to_string(), "3/5");
    }

    #[test]
    fn builds_catalog_from_complete_definition() {
        let catalog = vector_store_catalog();
        assert_eq!(catalog.dimensions().len(), 3);
        assert_eq!(catalog.candidates().len(), 5);
        let aurora = catalog.candidate("aurora").expect("aurora present");
        assert_eq!(aurora.score("scale").map(Score::value), Some(3));
    }

    #[test]
    fn missing_score_is_a_load_error() {
        let mut definition = vector_store_definition();
        definition.candidates[1].scores.remove("latency");
        assert_eq!(
            ScoringCatalog::new(definition),
            Err(ScoringError::MissingDimensionScore {
                candidate: "aurora".to_string(),
                dimension: "latency".to_string(),
            })
        );
    }

    #[test]
    fn rejects_out_of_range_unknown_and_duplicate_entries() {
        let mut definition = vector_store_definition();
        definition.candidates[0].scores.insert("ops".to_string(), 7);
        assert!(matches!(
            ScoringCatalog::new(definition),
            Err(ScoringError::ScoreOutOfRange { value: 7, .. })
        ));

        let mut definition = vector_store_definition();
        definition.candidates[0].scores.insert("ops".to_string(), -1);
        assert!(matches!(
            ScoringCatalog::new(definition),
            Err(ScoringError::ScoreOutOfRange { value: -1, .. })
        ));

        let mut definition = vector_store_definition();
        definition.candidates[2].scores.insert("price".to_string(), 2);
        assert!(matches!(
            ScoringCatalog::new(definition),
            Err(ScoringError::UnknownDimension { .. })
        ));

        let mut definition = vector_store_definition();
        let copy = definition.candidates[0].clone();
        definition.candidates.push(copy);
        assert_eq!(
            ScoringCatalog::new(definition),
            Err(ScoringError::DuplicateCandidate("opensearch".to_string()))
        );

        let mut definition = vector_store_definition();
        definition.dimensions.push(Dimension::new("scale", "Scale again"));
        assert_eq!(
            ScoringCatalog::new(definition),
            Err(ScoringError::DuplicateDimension("scale".to_string()))
        );
    }

    #[test]
    fn deserializing_checks_scores() {
        let raw = r#"{
            "dimensions": [{"key": "cost", "label": "Cost"}],
            "candidates": [{"id": "x", "label": "X", "scores": {"cost": 9}}]
        }"#;
        assert!(serde_json::from_str::<ScoringCatalog>(raw).is_err());
    }
}
