//! Core model types for natal.
//!
//! This crate owns the pieces every other crate agrees on: the method
//! registry, age bands, switching matrices, the baseline [`ModelConfig`],
//! the [`Engine`] contract with its [`ConfigTimeline`] input, and the
//! [`ResultSet`] table that collected runs land in. Scenario composition
//! lives in `natal-scenarios`; engines live in their own crates.

pub mod bands;
pub mod config;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod matrix;
pub mod methods;
pub mod results;

pub use bands::{AgeBand, AgeBands};
pub use config::{ConfigTimeline, ModelConfig};
pub use engine::{Engine, RunOutput};
pub use error::{ModelError, Result};
pub use matrix::SwitchingMatrix;
pub use methods::{MethodDef, MethodName, Methods};
pub use results::{ResultRow, ResultSet};
