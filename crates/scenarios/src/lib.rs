//! Scenario composition for natal.
//!
//! Scenarios describe changes to a baseline [`natal_core::ModelConfig`]
//! without referencing one: efficacy overrides, switching-cell overrides,
//! and method introductions, each dated to a calendar year. They are
//! written as [`ScenarioDef`]s (in code or JSON), validated into
//! [`Scenario`] values, combined with `+`, and executed in batches by a
//! [`ScenarioSet`] against any [`natal_core::Engine`].

pub mod apply;
pub mod def;
pub mod error;
pub mod scenario;
pub mod select;
pub mod set;

pub use apply::plan;
pub use def::{OverrideDef, ScenarioDef};
pub use error::{Result, ScenarioError};
pub use scenario::{Change, Scenario, Target, TransitionOverride};
pub use select::{AgeSelector, CmpOp};
pub use set::{RunFailure, RunReport, ScenarioSet};
