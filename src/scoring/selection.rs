use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::scoring::{
    compare, CandidateProfile, ScoringCatalog, ScoringError, DEFAULT_MAX_SELECTION, MIN_SELECTION,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionChange {
    Selected { evicted: Option<String> },
    Deselected,
    Unchanged,
}

/// Fixed-capacity FIFO of selected candidate ids. Selecting past capacity drops
/// the oldest selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "SelectionState", into = "SelectionState")]
pub struct ComparisonSelection {
    capacity: usize,
    ids: VecDeque<String>,
}

/// Stored form of a selection. Replayed through `select` on load, so a stored
/// state never bypasses the capacity floor, the cap or deduplication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectionState {
    pub capacity: usize,
    #[serde(default)]
    pub ids: Vec<String>,
}

impl From<SelectionState> for ComparisonSelection {
    fn from(value: SelectionState) -> Self {
        let mut selection = Self::new(value.capacity);
        for id in value.ids {
            selection.select(id);
        }
        selection
    }
}

impl From<ComparisonSelection> for SelectionState {
    fn from(value: ComparisonSelection) -> Self {
        Self {
            capacity: value.capacity,
            ids: value.ids.into_iter().collect(),
        }
    }
}

impl Default for ComparisonSelection {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SELECTION)
    }
}

impl ComparisonSelection {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_SELECTION);
        Self {
            capacity,
            ids: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    /// Oldest selection first.
    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    pub fn select(&mut self, id: impl Into<String>) -> SelectionChange {
        let id = id.into();
        if self.contains(&id) {
            return SelectionChange::Unchanged;
        }
        self.ids.push_back(id);
        let evicted = if self.ids.len() > self.capacity {
            self.ids.pop_front()
        } else {
            None
        };
        SelectionChange::Selected { evicted }
    }

    pub fn deselect(&mut self, id: &str) -> SelectionChange {
        let before = self.ids.len();
        self.ids.retain(|existing| existing != id);
        if self.ids.len() < before {
            SelectionChange::Deselected
        } else {
            SelectionChange::Unchanged
        }
    }

    pub fn toggle(&mut self, id: impl Into<String>) -> SelectionChange {
        let id = id.into();
        if self.contains(&id) {
            self.deselect(&id)
        } else {
            self.select(id)
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn compare(&self, catalog: &ScoringCatalog) -> Result<Vec<CandidateProfile>, ScoringError> {
        compare(&self.ids(), catalog, self.capacity)
    }
}
