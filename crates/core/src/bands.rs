//! Age bands.
//!
//! Switching behavior is stratified by age. A band covers an inclusive
//! range of whole years and carries the label overrides refer to, e.g.
//! `"21-25"` or `">35"`.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// One age stratum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBand {
    pub label: String,
    /// Youngest age covered, inclusive.
    pub min_age: u32,
    /// Oldest age covered, inclusive.
    pub max_age: u32,
}

impl AgeBand {
    pub fn new(label: impl Into<String>, min_age: u32, max_age: u32) -> Self {
        AgeBand {
            label: label.into(),
            min_age,
            max_age,
        }
    }
}

/// Ordered, non-overlapping set of age bands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgeBands {
    bands: Vec<AgeBand>,
}

impl AgeBands {
    pub fn new(bands: Vec<AgeBand>) -> Result<Self> {
        let bands = AgeBands { bands };
        bands.validate()?;
        Ok(bands)
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.bands.iter().map(|b| b.label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgeBand> {
        self.bands.iter()
    }

    pub fn get(&self, label: &str) -> Option<&AgeBand> {
        self.bands.iter().find(|b| b.label == label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// Like [`AgeBands::get`], but an error for unknown labels.
    pub fn require(&self, label: &str) -> Result<&AgeBand> {
        self.get(label)
            .ok_or_else(|| ModelError::UnknownBand(label.to_string()))
    }

    /// Band invariants: at least one band, distinct labels, each range
    /// non-empty, ranges ascending and non-overlapping.
    pub fn validate(&self) -> Result<()> {
        if self.bands.is_empty() {
            return Err(ModelError::InvalidBands("no age bands".into()));
        }
        for band in &self.bands {
            if band.min_age > band.max_age {
                return Err(ModelError::InvalidBands(format!(
                    "band {} has min age {} above max age {}",
                    band.label, band.min_age, band.max_age
                )));
            }
        }
        for pair in self.bands.windows(2) {
            if pair[1].min_age <= pair[0].max_age {
                return Err(ModelError::InvalidBands(format!(
                    "band {} overlaps or precedes band {}",
                    pair[1].label, pair[0].label
                )));
            }
        }
        for (i, band) in self.bands.iter().enumerate() {
            if self.bands[..i].iter().any(|b| b.label == band.label) {
                return Err(ModelError::InvalidBands(format!(
                    "duplicate band label {}",
                    band.label
                )));
            }
        }
        Ok(())
    }
}
