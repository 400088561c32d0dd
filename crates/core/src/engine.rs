//! Engine contract.
//!
//! The simulation proper lives behind [`Engine`]. An engine receives a
//! [`ConfigTimeline`] (baseline plus dated revisions) and a seed, and
//! reports yearly samples for a set of named channels. The scenario runner
//! treats engines as opaque and schedules them in parallel, so
//! implementations must be `Sync`.

use indexmap::IndexMap;

use crate::config::ConfigTimeline;
use crate::error::{ModelError, Result};

pub trait Engine: Sync {
    /// Engine name, for logs and diagnostics.
    fn name(&self) -> &str;

    /// Runs one simulation over the timeline. Deterministic engines may
    /// ignore `seed`; stochastic ones must derive all randomness from it.
    fn run(&self, timeline: &ConfigTimeline, seed: u64) -> Result<RunOutput>;
}

/// Yearly samples for named channels, one value per simulated year.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    years: Vec<f64>,
    channels: IndexMap<String, Vec<f64>>,
}

impl RunOutput {
    pub fn new(years: Vec<f64>) -> Self {
        RunOutput {
            years,
            channels: IndexMap::new(),
        }
    }

    /// Adds a channel. Its length must match the year axis.
    pub fn insert_channel(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.years.len() {
            return Err(ModelError::ChannelLength {
                channel: name,
                expected: self.years.len(),
                got: values.len(),
            });
        }
        self.channels.insert(name, values);
        Ok(())
    }

    pub fn years(&self) -> &[f64] {
        &self.years
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn channel(&self, name: &str) -> Option<&[f64]> {
        self.channels.get(name).map(|v| v.as_slice())
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(|k| k.as_str())
    }

    pub fn channels(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.channels.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}
