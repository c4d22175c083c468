//! Filter criteria for the element grid.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::element::{Block, Classification, ElementRecord, Series};

/// Active filters. An empty set places no constraint on that attribute.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ElementFilter {
    /// Allowed classifications.
    pub classifications: BTreeSet<Classification>,
    /// Allowed blocks.
    pub blocks: BTreeSet<Block>,
    /// Allowed inner-transition series.
    pub series: BTreeSet<Series>,
}

impl ElementFilter {
    /// Filter that matches every element.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or remove a classification.
    pub fn toggle_classification(&mut self, classification: Classification) {
        if !self.classifications.remove(&classification) {
            self.classifications.insert(classification);
        }
    }

    /// Add or remove a block.
    pub fn toggle_block(&mut self, block: Block) {
        if !self.blocks.remove(&block) {
            self.blocks.insert(block);
        }
    }

    /// Add or remove a series.
    pub fn toggle_series(&mut self, series: Series) {
        if !self.series.remove(&series) {
            self.series.insert(series);
        }
    }

    /// Reset to the match-all state.
    pub fn clear(&mut self) {
        self.classifications.clear();
        self.blocks.clear();
        self.series.clear();
    }

    /// True when no criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classifications.is_empty() && self.blocks.is_empty() && self.series.is_empty()
    }

    /// Check whether an element passes every non-empty criterion.
    #[must_use]
    pub fn matches(&self, element: &ElementRecord) -> bool {
        if !self.classifications.is_empty()
            && !self.classifications.contains(&element.classification)
        {
            return false;
        }
        if !self.blocks.is_empty() && !self.blocks.contains(&element.block) {
            return false;
        }
        if !self.series.is_empty() {
            return element
                .series()
                .is_some_and(|series| self.series.contains(&series));
        }
        true
    }
}
