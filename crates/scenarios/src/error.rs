use natal_core::ModelError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScenarioError>;

#[derive(Debug, Error)]
pub enum ScenarioError {
    /// A definition that cannot be turned into a scenario: missing or
    /// conflicting fields, values outside their ranges, unparsable age
    /// expressions.
    #[error("invalid scenario: {0}")]
    Configuration(String),

    #[error("override year {year} outside horizon {start}..={end}")]
    Scheduling { year: i32, start: i32, end: i32 },

    #[error("duplicate scenario label: {0}")]
    DuplicateLabel(String),

    #[error("age selector {0:?} matches no band")]
    EmptySelection(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}
