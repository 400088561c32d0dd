//! Scenario values and combination.
//!
//! A [`Scenario`] is a named bundle of dated changes to a baseline: method
//! efficacies to set and switching cells to override. Scenarios are built
//! by [`crate::ScenarioDef::build`], carry no baseline references, and
//! combine with `+` into bigger scenarios without touching any model.

use std::ops::Add;

use indexmap::IndexMap;
use natal_core::MethodName;

use crate::select::AgeSelector;

/// The switching cell an override addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Initiation shorthand: the none-to-method cell.
    Initiation(MethodName),
    /// An explicit cell, e.g. pill-to-injectables or method-to-none.
    Switch {
        source: MethodName,
        dest: MethodName,
    },
}

impl Target {
    /// The method a `copy_from` introduction would create.
    pub fn method(&self) -> Option<&MethodName> {
        match self {
            Target::Initiation(m) => Some(m),
            Target::Switch { .. } => None,
        }
    }
}

/// One switching-cell override.
///
/// `init_value` replaces the cell outright and wins over `init_factor`,
/// which scales whatever the cell held when the override lands.
/// `copy_from` introduces the target method as a clone of an existing one
/// before the cell edit (if any) applies.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOverride {
    pub target: Target,
    pub ages: AgeSelector,
    pub init_factor: Option<f64>,
    pub init_value: Option<f64>,
    pub copy_from: Option<MethodName>,
}

impl TransitionOverride {
    /// The rate this override would write over a cell currently holding
    /// `baseline`, before clamping. `None` when the override only
    /// introduces a method.
    pub fn effective_rate(&self, baseline: f64) -> Option<f64> {
        self.init_value
            .or_else(|| self.init_factor.map(|f| baseline * f))
    }
}

/// Overrides taking effect at one year.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Change {
    pub year: i32,
    /// Efficacies to set, by method.
    pub eff: IndexMap<MethodName, f64>,
    /// Switching-cell overrides, applied in order before `eff`.
    pub probs: Vec<TransitionOverride>,
}

/// A named bundle of dated changes.
///
/// Combination concatenates: `a + b` carries a's changes then b's, each
/// keeping its own year. Order matters only where two overrides touch the
/// same cell in the same year, in which case the later one wins.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scenario {
    label: Option<String>,
    changes: Vec<Change>,
}

impl Scenario {
    /// Scenario that changes nothing: the baseline under another name.
    pub fn empty() -> Self {
        Scenario::default()
    }

    pub(crate) fn from_parts(label: Option<String>, changes: Vec<Change>) -> Self {
        Scenario { label, changes }
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.iter().all(|c| c.eff.is_empty() && c.probs.is_empty())
    }

    /// The scenario's year, when all its changes land on the same one.
    pub fn year(&self) -> Option<i32> {
        let mut years = self.changes.iter().map(|c| c.year);
        let first = years.next()?;
        years.all(|y| y == first).then_some(first)
    }

    /// Efficacy overrides across all changes, in application order.
    pub fn efficacy_overrides(&self) -> impl Iterator<Item = (i32, &MethodName, f64)> {
        self.changes
            .iter()
            .flat_map(|c| c.eff.iter().map(move |(m, v)| (c.year, m, *v)))
    }

    /// Switching overrides across all changes, in application order.
    pub fn probability_overrides(&self) -> impl Iterator<Item = (i32, &TransitionOverride)> {
        self.changes
            .iter()
            .flat_map(|c| c.probs.iter().map(move |o| (c.year, o)))
    }

    /// Concatenates two scenarios. Labels join with `" + "` when both
    /// sides carry one; a lone label survives. Combination is associative
    /// and never consults a baseline.
    pub fn combine(&self, other: &Scenario) -> Scenario {
        let label = match (&self.label, &other.label) {
            (Some(a), Some(b)) => Some(format!("{a} + {b}")),
            (Some(a), None) => Some(a.clone()),
            (None, Some(b)) => Some(b.clone()),
            (None, None) => None,
        };
        let mut changes = self.changes.clone();
        changes.extend(other.changes.iter().cloned());
        Scenario { label, changes }
    }
}

impl Add for Scenario {
    type Output = Scenario;

    fn add(self, rhs: Scenario) -> Scenario {
        self.combine(&rhs)
    }
}

impl Add for &Scenario {
    type Output = Scenario;

    fn add(self, rhs: &Scenario) -> Scenario {
        self.combine(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eff_change(year: i32, method: &str, value: f64) -> Change {
        let mut eff = IndexMap::new();
        eff.insert(MethodName::from(method), value);
        Change {
            year,
            eff,
            probs: Vec::new(),
        }
    }

    #[test]
    fn combine_concatenates_changes() {
        let a = Scenario::from_parts(
            Some("A".into()),
            vec![eff_change(2005, "Pill", 0.99)],
        );
        let b = Scenario::from_parts(
            Some("B".into()),
            vec![eff_change(2010, "Injectables", 0.90)],
        );
        let ab = a.clone() + b.clone();
        assert_eq!(ab.label(), Some("A + B"));
        assert_eq!(ab.changes().len(), 2);
        assert_eq!(ab.changes()[0], a.changes()[0]);
        assert_eq!(ab.changes()[1], b.changes()[0]);
        // Everything keeps its own year, so the combined year is ambiguous.
        assert_eq!(ab.year(), None);
        assert_eq!(a.year(), Some(2005));
    }

    #[test]
    fn lone_labels_survive_combination() {
        let a = Scenario::from_parts(None, vec![eff_change(2005, "Pill", 0.99)]);
        let b = a.clone().with_label("B");
        assert_eq!((&a + &b).label(), Some("B"));
        assert_eq!((&b + &a).label(), Some("B"));
        assert_eq!((&a + &a).label(), None);
    }

    #[test]
    fn empty_scenario_is_the_identity() {
        let a = Scenario::from_parts(None, vec![eff_change(2005, "Pill", 0.99)]);
        assert_eq!(Scenario::empty() + a.clone(), a);
        assert_eq!(a.clone() + Scenario::empty(), a);
        assert!(Scenario::empty().is_empty());
        assert!(!a.is_empty());
    }

    #[test]
    fn effective_rate_prefers_the_explicit_value() {
        let over = TransitionOverride {
            target: Target::Initiation(MethodName::from("Pill")),
            ages: AgeSelector::All,
            init_factor: Some(2.0),
            init_value: Some(0.3),
            copy_from: None,
        };
        assert_eq!(over.effective_rate(0.1), Some(0.3));
        let factor_only = TransitionOverride {
            init_value: None,
            ..over.clone()
        };
        assert_eq!(factor_only.effective_rate(0.1), Some(0.2));
        let introduce_only = TransitionOverride {
            init_value: None,
            init_factor: None,
            copy_from: Some(MethodName::from("Pill")),
            ..over
        };
        assert_eq!(introduce_only.effective_rate(0.1), None);
    }
}
