//! Applying scenarios to baselines.
//!
//! [`plan`] folds a scenario into a [`ConfigTimeline`] without running
//! anything: changes are grouped by year, years apply in ascending order,
//! and each year's edits accumulate on top of the previous ones. Within a
//! change, switching overrides apply before efficacy overrides, so one
//! change can introduce a method and immediately re-rate it. All name and
//! range problems surface here, before any engine is dispatched.

use indexmap::IndexMap;
use natal_core::{ConfigTimeline, ModelConfig};
use tracing::debug;

use crate::error::{Result, ScenarioError};
use crate::scenario::{Change, Scenario, Target, TransitionOverride};

/// Expands `scenario` against `baseline` into the timeline an engine runs.
pub fn plan(baseline: &ModelConfig, scenario: &Scenario) -> Result<ConfigTimeline> {
    let mut by_year: IndexMap<i32, Vec<&Change>> = IndexMap::new();
    for change in scenario.changes() {
        if !baseline.contains_year(change.year) {
            return Err(ScenarioError::Scheduling {
                year: change.year,
                start: baseline.start_year,
                end: baseline.end_year,
            });
        }
        by_year.entry(change.year).or_default().push(change);
    }
    by_year.sort_keys();

    let mut current = baseline.clone();
    let mut revisions = Vec::with_capacity(by_year.len());
    for (year, changes) in by_year {
        for change in changes {
            apply_change(&mut current, change)?;
        }
        revisions.push((year, current.clone()));
    }
    debug!(
        scenario = scenario.label().unwrap_or("unlabeled"),
        revisions = revisions.len(),
        "planned timeline"
    );
    Ok(ConfigTimeline::new(baseline.clone(), revisions))
}

fn apply_change(config: &mut ModelConfig, change: &Change) -> Result<()> {
    for over in &change.probs {
        apply_override(config, over)?;
    }
    for (method, value) in &change.eff {
        config.set_efficacy(method, *value)?;
    }
    Ok(())
}

fn apply_override(config: &mut ModelConfig, over: &TransitionOverride) -> Result<()> {
    if let Some(template) = &over.copy_from {
        // Introduction is global; the age selector only scopes cell edits.
        let method = over.target.method().ok_or_else(|| {
            ScenarioError::Configuration("copy_from requires a method target".into())
        })?;
        config.copy_method(method, template)?;
    }
    let (source, dest) = match &over.target {
        Target::Initiation(m) => (config.methods.none(), m.clone()),
        Target::Switch { source, dest } => (source.clone(), dest.clone()),
    };
    let bands = over.ages.resolve(&config.bands)?;
    for band in &bands {
        if let Some(value) = over.init_value {
            config.set_transition(band, &source, &dest, value)?;
        } else if let Some(factor) = over.init_factor {
            config.scale_transition(band, &source, &dest, factor)?;
        }
    }
    Ok(())
}
