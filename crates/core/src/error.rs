use crate::methods::MethodName;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown method: {0}")]
    UnknownMethod(MethodName),

    #[error("unknown age band: {0}")]
    UnknownBand(String),

    #[error("duplicate method: {0}")]
    DuplicateMethod(MethodName),

    #[error("invalid method registry: {0}")]
    InvalidMethods(String),

    #[error("invalid age bands: {0}")]
    InvalidBands(String),

    #[error("{context} is {value}, expected a probability in [0, 1]")]
    InvalidProbability { context: String, value: f64 },

    #[error("invalid switching matrix: {0}")]
    InvalidMatrix(String),

    #[error("invalid initial mix: {0}")]
    InvalidMix(String),

    #[error("overrides on band {band} leave a negative stay probability for {method}")]
    DiagonalUnderflow { band: String, method: MethodName },

    #[error("empty horizon: start year {start} is after end year {end}")]
    EmptyHorizon { start: i32, end: i32 },

    #[error("channel {channel} has {got} samples, expected {expected}")]
    ChannelLength {
        channel: String,
        expected: usize,
        got: usize,
    },

    #[error("malformed result table: {0}")]
    Table(String),

    #[error("engine failure: {0}")]
    Engine(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
