//! Error type shared by the route builder, the threshold sweep and the I/O helpers.

use thiserror::Error;

/// Errors produced by the planner.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Point or coordinate data that cannot be routed: non-finite
    /// coordinates, duplicate ids, an empty distance matrix, or sweep
    /// parameters that would never terminate.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The feasibility oracle refused a candidate route.
    ///
    /// The sweep treats this as its normal stopping condition; the variant
    /// only surfaces through [`crate::oracle::Verdict::into_result`].
    #[error("route rejected by the feasibility oracle")]
    OracleRejected,

    /// No threshold produced a feasible route.
    #[error("no threshold produced a feasible route")]
    Exhausted,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PlannerError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        PlannerError::InvalidInput(msg.into())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PlannerError>;
