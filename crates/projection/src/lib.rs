//! Deterministic method-mix projection.
//!
//! [`ProjectionEngine`] is the reference [`Engine`] of the workspace: a
//! Markov-chain projection that advances each age band's method mix through
//! the switching matrix in force each year. There are no agents and no
//! randomness; the seed is accepted and ignored, so repeats of a scenario
//! are identical and differences in the result table come entirely from
//! scenario structure.
//!
//! Each simulated year contributes one sample per channel:
//! - `mcpr`: share of the population on any method, averaged over bands
//!   weighted by band width.
//! - `failure_index`: expected unprotected share, the sum over methods of
//!   share times one minus efficacy. The none-method counts in full.
//! - `share_<method>`: population share of each registered method.
//!
//! A sample describes the state entering its year, so a switching override
//! at year Y first moves the mix visible at Y + 1, while an efficacy
//! override at year Y shows in `failure_index` at Y itself.

use indexmap::IndexMap;
use natal_core::{
    ConfigTimeline, Engine, MethodName, ModelConfig, ModelError, Result, RunOutput,
    SwitchingMatrix,
};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectionEngine;

impl Engine for ProjectionEngine {
    fn name(&self) -> &str {
        "projection"
    }

    #[instrument(skip_all, fields(baseline = timeline.baseline().name.as_str()))]
    fn run(&self, timeline: &ConfigTimeline, _seed: u64) -> Result<RunOutput> {
        let baseline = timeline.baseline();
        let weights = band_weights(baseline);

        // Band mixes entering the first year. Scenarios only ever append
        // methods, so later configurations are handled by padding.
        let start = timeline.config_at(baseline.start_year);
        let mut mixes: IndexMap<String, Vec<f64>> = start.initial_mix.clone();

        // Registry order is append-only across the timeline; remember the
        // longest name list seen so every sample aligns to it.
        let mut names: Vec<MethodName> = start.methods.names().cloned().collect();

        let mut years = Vec::new();
        let mut mcpr = Vec::new();
        let mut failure_index = Vec::new();
        let mut shares: Vec<Vec<f64>> = Vec::new();

        for year in baseline.years() {
            let config = timeline.config_at(year);
            if config.methods.len() > names.len() {
                names = config.methods.names().cloned().collect();
                for mix in mixes.values_mut() {
                    mix.resize(names.len(), 0.0);
                }
            }

            let aggregate = aggregate_mix(&weights, &mixes, names.len());
            years.push(f64::from(year));
            mcpr.push(1.0 - aggregate[0]);
            failure_index.push(
                aggregate
                    .iter()
                    .zip(config.methods.iter())
                    .map(|(share, (_, def))| share * (1.0 - def.efficacy))
                    .sum(),
            );
            shares.push(aggregate);

            for (band, mix) in mixes.iter_mut() {
                let matrix = config
                    .matrices
                    .get(band)
                    .ok_or_else(|| ModelError::UnknownBand(band.clone()))?;
                if matrix.len() != mix.len() {
                    return Err(ModelError::InvalidMatrix(format!(
                        "band {band}: matrix covers {} methods, mix has {}",
                        matrix.len(),
                        mix.len()
                    )));
                }
                *mix = advance(mix, matrix);
            }
        }

        debug!(
            years = years.len(),
            methods = names.len(),
            "projection complete"
        );

        let mut out = RunOutput::new(years);
        out.insert_channel("mcpr", mcpr)?;
        out.insert_channel("failure_index", failure_index)?;
        for (i, name) in names.iter().enumerate() {
            // Late-introduced methods hold a zero share before they exist.
            let column = shares
                .iter()
                .map(|row| row.get(i).copied().unwrap_or(0.0))
                .collect();
            out.insert_channel(format!("share_{name}"), column)?;
        }
        Ok(out)
    }
}

/// Relative band sizes, by the number of whole years each band covers.
fn band_weights(config: &ModelConfig) -> IndexMap<String, f64> {
    let total: f64 = config
        .bands
        .iter()
        .map(|b| f64::from(b.max_age - b.min_age + 1))
        .sum();
    config
        .bands
        .iter()
        .map(|b| {
            let width = f64::from(b.max_age - b.min_age + 1);
            (b.label.clone(), width / total)
        })
        .collect()
}

/// Band mixes folded into one population-level mix over `n` methods.
fn aggregate_mix(
    weights: &IndexMap<String, f64>,
    mixes: &IndexMap<String, Vec<f64>>,
    n: usize,
) -> Vec<f64> {
    let mut aggregate = vec![0.0; n];
    for (band, mix) in mixes {
        let weight = weights.get(band).copied().unwrap_or(0.0);
        for (slot, share) in aggregate.iter_mut().zip(mix) {
            *slot += weight * share;
        }
    }
    aggregate
}

/// One year of switching: `next[j] = sum_i mix[i] * P(i -> j)`. Rows are
/// normalized on the way in, so file-precision row sums do not drift the
/// total mass.
fn advance(mix: &[f64], matrix: &SwitchingMatrix) -> Vec<f64> {
    let n = mix.len();
    let mut next = vec![0.0; n];
    for (i, &share) in mix.iter().enumerate() {
        if share == 0.0 {
            continue;
        }
        let row = matrix.normalized_row(i);
        for (j, p) in row.iter().enumerate() {
            next[j] += share * p;
        }
    }
    next
}
