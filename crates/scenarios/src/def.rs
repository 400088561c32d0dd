//! Scenario definitions.
//!
//! [`ScenarioDef`] mirrors the keyword surface scenario files use: a year,
//! an `eff` map, either initiation shorthand (`method` plus `init_*` and
//! `ages`) or an explicit `probs` list, and an optional label. Definitions
//! are inert data until [`ScenarioDef::build`] validates them into a
//! [`Scenario`]; building needs no baseline, so unknown method names
//! surface later, when the scenario is planned against one.
//!
//! ```
//! use natal_scenarios::ScenarioDef;
//!
//! let scenario = ScenarioDef::new()
//!     .label("Inject push")
//!     .year(2015)
//!     .method("Injectables")
//!     .init_factor(2.0)
//!     .ages("<25")
//!     .build()
//!     .unwrap();
//! assert_eq!(scenario.label(), Some("Inject push"));
//! ```

use indexmap::IndexMap;
use natal_core::{MethodName, Methods};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScenarioError};
use crate::scenario::{Change, Scenario, Target, TransitionOverride};
use crate::select::AgeSelector;

/// One scenario as written, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ScenarioDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    year: Option<i32>,
    /// Efficacies to set, by method name.
    #[serde(skip_serializing_if = "Option::is_none")]
    eff: Option<IndexMap<String, f64>>,
    /// Initiation shorthand: the method whose none-to-method cell changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    init_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    init_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ages: Option<String>,
    /// Explicit overrides; mutually exclusive with the shorthand fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    probs: Option<Vec<OverrideDef>>,
}

impl ScenarioDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Adds one efficacy override. May be called repeatedly.
    pub fn eff(mut self, method: impl Into<String>, value: f64) -> Self {
        self.eff
            .get_or_insert_with(IndexMap::new)
            .insert(method.into(), value);
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn init_factor(mut self, factor: f64) -> Self {
        self.init_factor = Some(factor);
        self
    }

    pub fn init_value(mut self, value: f64) -> Self {
        self.init_value = Some(value);
        self
    }

    pub fn ages(mut self, ages: impl Into<String>) -> Self {
        self.ages = Some(ages.into());
        self
    }

    /// Adds one explicit override. May be called repeatedly.
    pub fn prob(mut self, def: OverrideDef) -> Self {
        self.probs.get_or_insert_with(Vec::new).push(def);
        self
    }

    /// Validates the definition into a [`Scenario`].
    ///
    /// A definition with no overrides at all builds the empty scenario,
    /// which is how a baseline entry is written. Anything with overrides
    /// needs a year. The shorthand fields synthesize a single override and
    /// cannot be mixed with an explicit `probs` list.
    pub fn build(self) -> Result<Scenario> {
        let has_shorthand = self.method.is_some()
            || self.init_factor.is_some()
            || self.init_value.is_some()
            || self.ages.is_some();
        if has_shorthand && self.probs.is_some() {
            return Err(ScenarioError::Configuration(
                "method/init_factor/init_value/ages shorthand cannot be mixed with \
                 an explicit probs list"
                    .into(),
            ));
        }

        let eff = self.eff.unwrap_or_default();
        let probs = self.probs.unwrap_or_default();
        if eff.is_empty() && probs.is_empty() && !has_shorthand {
            return Ok(Scenario::from_parts(self.label, Vec::new()));
        }

        let year = self.year.ok_or_else(|| {
            ScenarioError::Configuration("a scenario with overrides needs a year".into())
        })?;

        let mut overrides = Vec::with_capacity(probs.len() + 1);
        if has_shorthand {
            let method = self.method.ok_or_else(|| {
                ScenarioError::Configuration(
                    "init_factor/init_value/ages need a method".into(),
                )
            })?;
            overrides.push(
                OverrideDef {
                    method: Some(method),
                    ages: self.ages,
                    init_factor: self.init_factor,
                    init_value: self.init_value,
                    ..Default::default()
                }
                .validate()?,
            );
        }
        for def in probs {
            overrides.push(def.validate()?);
        }

        let mut eff_out = IndexMap::with_capacity(eff.len());
        for (method, value) in eff {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ScenarioError::Configuration(format!(
                    "efficacy of {method} is {value}, expected a probability in [0, 1]"
                )));
            }
            eff_out.insert(MethodName::from(method), value);
        }

        Ok(Scenario::from_parts(
            self.label,
            vec![Change {
                year,
                eff: eff_out,
                probs: overrides,
            }],
        ))
    }
}

/// One switching-cell override as written.
///
/// Exactly one of `method` (initiation shorthand) or the `source`/`dest`
/// pair names the cell. `copy_from` only makes sense with `method`, since
/// it introduces that method before the cell edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct OverrideDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    init_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    init_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    copy_from: Option<String>,
}

impl OverrideDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    pub fn ages(mut self, ages: impl Into<String>) -> Self {
        self.ages = Some(ages.into());
        self
    }

    pub fn init_factor(mut self, factor: f64) -> Self {
        self.init_factor = Some(factor);
        self
    }

    pub fn init_value(mut self, value: f64) -> Self {
        self.init_value = Some(value);
        self
    }

    pub fn copy_from(mut self, template: impl Into<String>) -> Self {
        self.copy_from = Some(template.into());
        self
    }

    pub fn validate(self) -> Result<TransitionOverride> {
        let OverrideDef {
            method,
            source,
            dest,
            ages,
            init_factor,
            init_value,
            copy_from,
        } = self;

        let target = match (method, source, dest) {
            (Some(m), None, None) => {
                if m == Methods::NONE {
                    return Err(ScenarioError::Configuration(format!(
                        "initiation shorthand cannot target {m}; use source and dest"
                    )));
                }
                Target::Initiation(MethodName::from(m))
            }
            (None, Some(s), Some(d)) => {
                if s == d {
                    return Err(ScenarioError::Configuration(format!(
                        "source and dest are both {s}; stay probabilities are \
                         balanced automatically"
                    )));
                }
                Target::Switch {
                    source: MethodName::from(s),
                    dest: MethodName::from(d),
                }
            }
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                return Err(ScenarioError::Configuration(
                    "method conflicts with source/dest".into(),
                ));
            }
            _ => {
                return Err(ScenarioError::Configuration(
                    "an override needs either method or both source and dest".into(),
                ));
            }
        };

        if copy_from.is_some() && target.method().is_none() {
            return Err(ScenarioError::Configuration(
                "copy_from requires a method target".into(),
            ));
        }
        if let (Some(template), Some(m)) = (&copy_from, target.method()) {
            if template == &m.0 {
                return Err(ScenarioError::Configuration(format!(
                    "{template} cannot be introduced as a copy of itself"
                )));
            }
        }
        if let Some(value) = init_value {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ScenarioError::Configuration(format!(
                    "init_value is {value}, expected a probability in [0, 1]"
                )));
            }
        }
        if let Some(factor) = init_factor {
            if !factor.is_finite() || factor < 0.0 {
                return Err(ScenarioError::Configuration(format!(
                    "init_factor is {factor}, expected a non-negative factor"
                )));
            }
        }
        if init_value.is_none() && init_factor.is_none() && copy_from.is_none() {
            return Err(ScenarioError::Configuration(
                "override changes nothing; give init_value, init_factor, or copy_from"
                    .into(),
            ));
        }

        let ages = match ages {
            Some(text) => AgeSelector::parse(&text)?,
            None => AgeSelector::All,
        };

        Ok(TransitionOverride {
            target,
            ages,
            init_factor,
            init_value,
            copy_from: copy_from.map(MethodName::from),
        })
    }
}
