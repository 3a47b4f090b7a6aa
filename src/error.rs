//! Error types.
//!
//! Only caller faults and engine faults are errors. An infeasible or
//! timed-out solve is a normal outcome and is reported through
//! [`SolveStatus`](crate::models::SolveStatus) on a well-formed response.

use thiserror::Error;

use crate::validation::ValidationError;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, RosterError>;

/// Errors raised while preparing or running an optimization.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RosterError {
    /// A shift timestamp could not be parsed, or its duration is not positive.
    #[error("malformed timestamp on shift '{shift_id}' ({value}): {reason}")]
    MalformedTimestamp {
        shift_id: String,
        value: String,
        reason: String,
    },

    /// The request is structurally invalid (missing fields, duplicate ids, bad hour caps).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The engine reported a fault unrelated to the model's feasibility.
    #[error("engine '{engine}' failed: {message}")]
    EngineInternal { engine: String, message: String },

    /// The optimizer configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RosterError {
    /// Whether the error was caused by the caller's input.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            RosterError::MalformedTimestamp { .. } | RosterError::InvalidInput(_)
        )
    }
}

impl From<Vec<ValidationError>> for RosterError {
    fn from(errors: Vec<ValidationError>) -> Self {
        // A timestamp fault keeps its own variant so callers can tell it apart.
        if let Some(ts) = errors.iter().find_map(|e| e.timestamp.clone()) {
            return ts;
        }
        let joined = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        RosterError::InvalidInput(joined)
    }
}

impl From<serde_json::Error> for RosterError {
    fn from(err: serde_json::Error) -> Self {
        RosterError::InvalidInput(err.to_string())
    }
}
