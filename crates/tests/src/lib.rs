//! Integration test harness for natal.
//!
//! This crate provides utilities for end-to-end testing of the full
//! pipeline: define scenarios, build, register, run against the projection
//! engine, and inspect the result table.

use natal_core::{defaults, Engine, ModelConfig, ResultSet};
use natal_projection::ProjectionEngine;
use natal_scenarios::{RunReport, Scenario, ScenarioDef, ScenarioSet};

/// Test harness wrapping a [`ScenarioSet`] and the projection engine.
pub struct TestHarness {
    set: ScenarioSet,
}

impl TestHarness {
    /// Harness over the small three-method test baseline (2000 to 2010).
    ///
    /// # Panics
    ///
    /// Panics if the set cannot be created.
    pub fn tiny(repeats: u32) -> Self {
        Self::with_baseline(defaults::tiny(), repeats)
    }

    /// Harness over the six-method illustrative baseline (1990 to 2030).
    pub fn illustrative(repeats: u32) -> Self {
        Self::with_baseline(defaults::baseline(), repeats)
    }

    pub fn with_baseline(baseline: ModelConfig, repeats: u32) -> Self {
        let set = ScenarioSet::new(baseline, repeats).expect("scenario set rejected");
        TestHarness { set }
    }

    /// Builds and registers a definition.
    ///
    /// # Panics
    ///
    /// Panics if the definition fails to build or the label collides.
    pub fn add(&mut self, def: ScenarioDef) -> &mut Self {
        let scenario = def.build().expect("definition failed to build");
        self.set.add(scenario).expect("registration failed");
        self
    }

    /// Registers an already-built scenario, e.g. a combination.
    pub fn add_scenario(&mut self, scenario: Scenario) -> &mut Self {
        self.set.add(scenario).expect("registration failed");
        self
    }

    /// Registers a scenario under an explicit label.
    pub fn add_labeled(&mut self, scenario: Scenario, label: &str) -> &mut Self {
        self.set
            .add_labeled(scenario, label)
            .expect("registration failed");
        self
    }

    pub fn set(&self) -> &ScenarioSet {
        &self.set
    }

    /// Runs the batch against the projection engine.
    ///
    /// # Panics
    ///
    /// Panics if planning fails.
    pub fn run(&self) -> RunReport {
        self.run_with(&ProjectionEngine)
    }

    pub fn run_with<E: Engine + ?Sized>(&self, engine: &E) -> RunReport {
        self.set.run(engine).expect("batch failed to run")
    }
}

/// One cell of the result table: `channel` for `scenario` at year `t` of
/// repeat `repeat`.
pub fn value_at(
    results: &ResultSet,
    scenario: &str,
    repeat: u32,
    t: f64,
    channel: &str,
) -> Option<f64> {
    let column = results.channel_index(channel)?;
    results
        .rows_for(scenario)
        .find(|r| r.repeat == repeat && r.t == t)
        .map(|r| r.values[column])
}

/// A channel's yearly values for one scenario and repeat, in year order.
pub fn series(results: &ResultSet, scenario: &str, repeat: u32, channel: &str) -> Vec<f64> {
    let column = match results.channel_index(channel) {
        Some(c) => c,
        None => return Vec::new(),
    };
    results
        .rows_for(scenario)
        .filter(|r| r.repeat == repeat)
        .map(|r| r.values[column])
        .collect()
}

/// The last year's value of a channel for repeat 0.
///
/// # Panics
///
/// Panics if the scenario or channel is missing from the table.
pub fn final_value(results: &ResultSet, scenario: &str, channel: &str) -> f64 {
    *series(results, scenario, 0, channel)
        .last()
        .unwrap_or_else(|| panic!("no {channel} rows for {scenario}"))
}
