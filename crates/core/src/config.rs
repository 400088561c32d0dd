//! Baseline model configuration.
//!
//! [`ModelConfig`] is the complete parameterization an engine needs for one
//! run: the method registry, the age bands, one switching matrix per band,
//! and the starting method mix. Scenario machinery edits copies of it
//! through the name-aware operations here, which keep the matrices
//! stochastic and turn bad names into errors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::bands::AgeBands;
use crate::error::{ModelError, Result};
use crate::matrix::{SwitchingMatrix, ROW_EPS};
use crate::methods::{check_probability, MethodName, Methods};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Used in logs and as the default run label.
    pub name: String,
    /// First simulated calendar year, inclusive.
    pub start_year: i32,
    /// Last simulated calendar year, inclusive.
    pub end_year: i32,
    /// Base RNG seed. Repeat `k` of a run uses `seed + k`.
    pub seed: u64,
    pub methods: Methods,
    pub bands: AgeBands,
    /// One switching matrix per band, keyed by band label.
    pub matrices: IndexMap<String, SwitchingMatrix>,
    /// Starting method shares per band, over the registry order.
    pub initial_mix: IndexMap<String, Vec<f64>>,
}

impl ModelConfig {
    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    pub fn contains_year(&self, year: i32) -> bool {
        self.years().contains(&year)
    }

    /// Current value of one switching cell.
    pub fn transition(&self, band: &str, src: &MethodName, dst: &MethodName) -> Result<f64> {
        let matrix = self
            .matrices
            .get(band)
            .ok_or_else(|| ModelError::UnknownBand(band.to_string()))?;
        let si = self.methods.require(src)?;
        let di = self.methods.require(dst)?;
        Ok(matrix.get(si, di))
    }

    /// Sets one off-diagonal switching cell and rebalances the row's stay
    /// probability. Diagonal cells are derived and cannot be set directly.
    pub fn set_transition(
        &mut self,
        band: &str,
        src: &MethodName,
        dst: &MethodName,
        value: f64,
    ) -> Result<()> {
        check_probability(&format!("transition {src} -> {dst} in band {band}"), value)?;
        let si = self.methods.require(src)?;
        let di = self.methods.require(dst)?;
        if si == di {
            return Err(ModelError::InvalidMatrix(format!(
                "band {band}: the stay probability of {src} is balanced automatically \
                 and cannot be set directly"
            )));
        }
        let matrix = self
            .matrices
            .get_mut(band)
            .ok_or_else(|| ModelError::UnknownBand(band.to_string()))?;
        matrix.set_raw(si, di, value);
        if matrix.rebalance_row(si).is_none() {
            return Err(ModelError::DiagonalUnderflow {
                band: band.to_string(),
                method: src.clone(),
            });
        }
        Ok(())
    }

    /// Multiplies one switching cell by `factor`. The product is clamped to
    /// the row's headroom, i.e. the probability mass not already claimed by
    /// the other off-diagonal cells (exactly 1 when this is the row's only
    /// off-diagonal mass), so a large factor empties the stay probability
    /// rather than breaking the row. Returns the value actually written.
    pub fn scale_transition(
        &mut self,
        band: &str,
        src: &MethodName,
        dst: &MethodName,
        factor: f64,
    ) -> Result<f64> {
        let si = self.methods.require(src)?;
        let di = self.methods.require(dst)?;
        let matrix = self
            .matrices
            .get(band)
            .ok_or_else(|| ModelError::UnknownBand(band.to_string()))?;
        let old = matrix.get(si, di);
        let others = matrix.row_sum(si) - matrix.get(si, si) - old;
        let headroom = (1.0 - others).max(0.0);
        let mut value = old * factor;
        if value > headroom {
            warn!(
                band,
                source = %src,
                dest = %dst,
                value,
                headroom,
                "scaled transition exceeds available probability mass, clamping"
            );
            value = headroom;
        }
        self.set_transition(band, src, dst, value)?;
        Ok(value)
    }

    pub fn set_efficacy(&mut self, method: &MethodName, efficacy: f64) -> Result<()> {
        self.methods.set_efficacy(method, efficacy)
    }

    /// Introduces `new_name` as a clone of `template`: same efficacy, and
    /// every band's matrix gains a row and column copied from the template
    /// (see [`SwitchingMatrix::add_method_like`]). The new method starts
    /// with a zero share in the initial mix.
    ///
    /// The grown matrices are staged and committed only once every row
    /// rebalances, so a failure leaves the configuration as it was.
    pub fn copy_method(&mut self, new_name: &MethodName, template: &MethodName) -> Result<()> {
        if self.methods.contains(new_name) {
            return Err(ModelError::DuplicateMethod(new_name.clone()));
        }
        let ti = self.methods.require(template)?;
        let efficacy = self
            .methods
            .get(template)
            .map(|def| def.efficacy)
            .unwrap_or(0.0);
        let mut matrices = self.matrices.clone();
        for (band, matrix) in matrices.iter_mut() {
            matrix.add_method_like(ti);
            for row in 0..matrix.len() {
                if matrix.rebalance_row(row).is_none() {
                    let method = self
                        .methods
                        .name_at(row)
                        .cloned()
                        .unwrap_or_else(|| new_name.clone());
                    return Err(ModelError::DiagonalUnderflow {
                        band: band.clone(),
                        method,
                    });
                }
            }
        }
        self.methods.add(new_name.clone(), efficacy)?;
        self.matrices = matrices;
        for mix in self.initial_mix.values_mut() {
            mix.push(0.0);
        }
        Ok(())
    }

    /// Cross-field invariants. Deserialized configurations go through here
    /// before anything runs against them.
    pub fn validate(&self) -> Result<()> {
        if self.start_year > self.end_year {
            return Err(ModelError::EmptyHorizon {
                start: self.start_year,
                end: self.end_year,
            });
        }
        self.methods.validate()?;
        self.bands.validate()?;
        for label in self.bands.labels() {
            let matrix = self.matrices.get(label).ok_or_else(|| {
                ModelError::InvalidMatrix(format!("band {label} has no switching matrix"))
            })?;
            matrix.check(self.methods.len()).map_err(|err| match err {
                ModelError::InvalidMatrix(msg) => {
                    ModelError::InvalidMatrix(format!("band {label}: {msg}"))
                }
                other => other,
            })?;
            let mix = self.initial_mix.get(label).ok_or_else(|| {
                ModelError::InvalidMix(format!("band {label} has no initial mix"))
            })?;
            if mix.len() != self.methods.len() {
                return Err(ModelError::InvalidMix(format!(
                    "band {label}: {} shares for {} methods",
                    mix.len(),
                    self.methods.len()
                )));
            }
            for (i, share) in mix.iter().enumerate() {
                if !share.is_finite() || *share < 0.0 {
                    return Err(ModelError::InvalidMix(format!(
                        "band {label}: share {i} is {share}"
                    )));
                }
            }
            let sum: f64 = mix.iter().sum();
            if (sum - 1.0).abs() > ROW_EPS {
                return Err(ModelError::InvalidMix(format!(
                    "band {label}: shares sum to {sum}, expected 1"
                )));
            }
        }
        for key in self.matrices.keys() {
            if !self.bands.contains(key) {
                return Err(ModelError::InvalidMatrix(format!(
                    "matrix for unknown band {key}"
                )));
            }
        }
        for key in self.initial_mix.keys() {
            if !self.bands.contains(key) {
                return Err(ModelError::InvalidMix(format!(
                    "entry for unknown band {key}"
                )));
            }
        }
        Ok(())
    }
}

/// Piecewise-constant configuration over a horizon.
///
/// A timeline is the baseline plus zero or more dated revisions, each a
/// full configuration that takes effect at its year and holds until the
/// next one. Engines read it through [`ConfigTimeline::config_at`] and
/// never see scenario structure.
#[derive(Debug, Clone)]
pub struct ConfigTimeline {
    /// `(year, config)` points in ascending year order; the first point is
    /// the baseline at its start year. A revision landing on the start year
    /// shadows the baseline point.
    points: Vec<(i32, ModelConfig)>,
}

impl ConfigTimeline {
    pub fn baseline_only(config: ModelConfig) -> Self {
        Self::new(config, Vec::new())
    }

    /// Builds a timeline from a baseline and dated revisions. Callers
    /// supply revisions sorted ascending and within the horizon; the
    /// scenario planner is the usual producer.
    pub fn new(baseline: ModelConfig, revisions: Vec<(i32, ModelConfig)>) -> Self {
        let mut points = Vec::with_capacity(revisions.len() + 1);
        points.push((baseline.start_year, baseline));
        points.extend(revisions);
        ConfigTimeline { points }
    }

    pub fn baseline(&self) -> &ModelConfig {
        &self.points[0].1
    }

    /// Configuration in force at `year`: the last point at or before it.
    /// Years before the horizon clamp to the baseline.
    pub fn config_at(&self, year: i32) -> &ModelConfig {
        let mut current = &self.points[0].1;
        for (y, config) in &self.points {
            if *y <= year {
                current = config;
            } else {
                break;
            }
        }
        current
    }

    /// The simulated years, from the baseline's horizon.
    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.baseline().years()
    }

    /// Years at which a revision takes effect.
    pub fn change_years(&self) -> impl Iterator<Item = i32> + '_ {
        self.points.iter().skip(1).map(|(y, _)| *y)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
