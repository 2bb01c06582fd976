use serde::{Deserialize, Serialize};

use crate::scoring::{Candidate, Dimension, ScoringCatalog, ScoringError, MIN_SELECTION};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DimensionValue {
    pub key: String,
    pub label: String,
    pub value: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateProfile {
    pub id: String,
    pub label: String,
    pub values: Vec<DimensionValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DimensionLeader {
    pub key: String,
    pub label: String,
    pub best: u8,
    pub candidates: Vec<String>,
}

/// Raw 1..=5 values of `candidate` in the order of `dimensions`.
pub fn profile(
    candidate: &Candidate,
    dimensions: &[Dimension],
) -> Result<Vec<DimensionValue>, ScoringError> {
    dimensions
        .iter()
        .map(|dimension| {
            let score = candidate.score(&dimension.key).ok_or_else(|| {
                ScoringError::MissingDimensionScore {
                    candidate: candidate.id.clone(),
                    dimension: dimension.key.clone(),
                }
            })?;
            Ok(DimensionValue {
                key: dimension.key.clone(),
                label: dimension.label.clone(),
                value: score.value(),
            })
        })
        .collect()
}

/// Profiles for the selected candidates, oldest selection first.
///
/// When more than `max_selected` ids are given only the most recent
/// `max_selected` are kept, matching the drop-oldest comparison cap.
pub fn compare<S: AsRef<str>>(
    candidate_ids: &[S],
    catalog: &ScoringCatalog,
    max_selected: usize,
) -> Result<Vec<CandidateProfile>, ScoringError> {
    if candidate_ids.len() < MIN_SELECTION {
        return Err(ScoringError::InsufficientSelection {
            selected: candidate_ids.len(),
            minimum: MIN_SELECTION,
        });
    }
    let cap = max_selected.max(MIN_SELECTION);
    let window = &candidate_ids[candidate_ids.len().saturating_sub(cap)..];

    window
        .iter()
        .map(|id| {
            let id = id.as_ref();
            let candidate = catalog
                .candidate(id)
                .ok_or_else(|| ScoringError::UnknownCandidate(id.to_string()))?;
            Ok(CandidateProfile {
                id: candidate.id.clone(),
                label: candidate.label.clone(),
                values: profile(candidate, catalog.dimensions())?,
            })
        })
        .collect()
}

/// Per dimension, the highest raw value among `profiles` and who holds it.
pub fn dimension_leaders(profiles: &[CandidateProfile]) -> Vec<DimensionLeader> {
    let Some(first) = profiles.first() else {
        return Vec::new();
    };
    first
        .values
        .iter()
        .enumerate()
        .map(|(pos, dimension)| {
            let best = profiles
                .iter()
                .filter_map(|p| p.values.get(pos))
                .map(|v| v.value)
                .max()
                .unwrap_or(dimension.value);
            let candidates = profiles
                .iter()
                .filter(|p| p.values.get(pos).map(|v| v.value) == Some(best))
                .map(|p| p.id.clone())
                .collect();
            DimensionLeader {
                key: dimension.key.clone(),
                label: dimension.label.clone(),
                best,
                candidates,
            }
        })
        .collect()
}
