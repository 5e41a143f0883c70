//! Error type shared by the solver.

use thiserror::Error;

/// Errors reported before or around a solve.
///
/// Everything that can go wrong with the input is detected up front by
/// [`crate::params::Params::new`]; once the genetic loop runs, no error is
/// produced except for the I/O performed by the export helpers.
#[derive(Debug, Error)]
pub enum HgsError {
    /// The instance has a depot but no client to serve.
    #[error("instance has no clients")]
    NoClients,
    /// Two input arrays disagree on the number of locations.
    #[error("{what} has length {found}, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// Vehicle capacity must be strictly positive.
    #[error("vehicle capacity must be positive, got {0}")]
    NonPositiveCapacity(f64),
    /// Duration limit, when present, must be strictly positive.
    #[error("duration limit must be positive, got {0}")]
    InvalidDurationLimit(f64),
    /// A fleet bound of zero vehicles was requested.
    #[error("fleet size must be at least one vehicle")]
    NoVehicles,
    /// An algorithm parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The population holds no individual to report.
    #[error("population is empty")]
    EmptyPopulation,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HgsError>;
