//! Scenario registry and batch runner.
//!
//! A [`ScenarioSet`] pairs one validated baseline with an ordered list of
//! labeled scenarios and a repeat count. [`ScenarioSet::run`] plans every
//! scenario first, so configuration problems abort before any engine
//! starts, then fans the `scenarios x repeats` runs out across threads and
//! reassembles results in a deterministic order.

use natal_core::{Engine, ModelConfig, ResultSet};
use rayon::prelude::*;
use tracing::{info, instrument, warn};

use crate::apply;
use crate::error::{Result, ScenarioError};
use crate::scenario::Scenario;

#[derive(Debug, Clone)]
struct Entry {
    label: String,
    scenario: Scenario,
}

/// An ordered batch of scenarios sharing one baseline.
#[derive(Debug, Clone)]
pub struct ScenarioSet {
    baseline: ModelConfig,
    repeats: u32,
    entries: Vec<Entry>,
}

impl ScenarioSet {
    /// A set never holds a broken baseline or a zero repeat count.
    pub fn new(baseline: ModelConfig, repeats: u32) -> Result<Self> {
        if repeats == 0 {
            return Err(ScenarioError::Configuration(
                "repeats must be at least 1".into(),
            ));
        }
        baseline.validate()?;
        Ok(ScenarioSet {
            baseline,
            repeats,
            entries: Vec::new(),
        })
    }

    pub fn baseline(&self) -> &ModelConfig {
        &self.baseline
    }

    pub fn repeats(&self) -> u32 {
        self.repeats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    /// Registers a scenario under its own label, or `"Scenario N"` when it
    /// carries none. Labels must be unique within the set.
    pub fn add(&mut self, scenario: Scenario) -> Result<()> {
        let label = match scenario.label() {
            Some(label) => label.to_string(),
            None => format!("Scenario {}", self.entries.len() + 1),
        };
        self.insert(label, scenario)
    }

    /// Registers a scenario under `label`, ignoring any label it carries.
    /// The same scenario may appear any number of times under different
    /// labels.
    pub fn add_labeled(&mut self, scenario: Scenario, label: impl Into<String>) -> Result<()> {
        self.insert(label.into(), scenario)
    }

    fn insert(&mut self, label: String, scenario: Scenario) -> Result<()> {
        if self.entries.iter().any(|e| e.label == label) {
            return Err(ScenarioError::DuplicateLabel(label));
        }
        self.entries.push(Entry { label, scenario });
        Ok(())
    }

    /// Runs every scenario `repeats` times against `engine`.
    ///
    /// Repeat `k` of every scenario runs with `baseline.seed + k`, so a
    /// repeat shares its seed across scenarios and comparisons are paired.
    /// Planning failures abort the whole batch; engine failures are
    /// collected per run in the report while the rest complete.
    #[instrument(skip_all, fields(
        engine = engine.name(),
        scenarios = self.entries.len(),
        repeats = self.repeats,
    ))]
    pub fn run<E: Engine + ?Sized>(&self, engine: &E) -> Result<RunReport> {
        if self.entries.is_empty() {
            return Err(ScenarioError::Configuration("no scenarios to run".into()));
        }
        let mut plans = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            plans.push(apply::plan(&self.baseline, &entry.scenario)?);
        }

        let jobs: Vec<(usize, u32)> = (0..self.entries.len())
            .flat_map(|i| (0..self.repeats).map(move |k| (i, k)))
            .collect();
        let outcomes: Vec<_> = jobs
            .par_iter()
            .map(|&(i, k)| {
                let seed = self.baseline.seed + u64::from(k);
                (i, k, seed, engine.run(&plans[i], seed))
            })
            .collect();

        // Parallel collect preserves job order; reassembly stays sequential
        // so the table is identical run to run.
        let mut results = ResultSet::new();
        let mut failures = Vec::new();
        for (i, k, seed, outcome) in outcomes {
            let label = &self.entries[i].label;
            match outcome {
                Ok(output) => results.push_run(label, k, seed, &output),
                Err(err) => {
                    warn!(
                        scenario = label.as_str(),
                        repeat = k,
                        error = %err,
                        "engine run failed"
                    );
                    failures.push(RunFailure {
                        scenario: label.clone(),
                        repeat: k,
                        message: err.to_string(),
                    });
                }
            }
        }
        info!(
            rows = results.len(),
            failures = failures.len(),
            "batch complete"
        );
        Ok(RunReport { results, failures })
    }
}

/// One engine run that did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    pub scenario: String,
    pub repeat: u32,
    pub message: String,
}

/// What a batch produced: the table of completed runs, plus the runs the
/// engine gave up on.
#[derive(Debug)]
pub struct RunReport {
    pub results: ResultSet,
    pub failures: Vec<RunFailure>,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
