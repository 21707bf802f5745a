use std::time::Duration;
use thiserror::Error;

/// Failure of a potential evaluation, carrying the offending configuration.
#[derive(Error, Debug, Clone)]
#[error("potential failed at x={x:?}: {message}")]
pub struct PotentialError {
    pub message: String,
    pub x: Vec<f64>,
}

impl PotentialError {
    pub fn new(message: impl Into<String>, x: &[f64]) -> Self {
        Self {
            message: message.into(),
            x: x.to_vec(),
        }
    }
}

#[derive(Error, Debug)]
pub enum NsError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Potential(#[from] PotentialError),

    #[error("invariant violation: walker returned e={returned} >= cutoff {cutoff}")]
    InvariantViolation { returned: f64, cutoff: f64 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("batch timed out after {0:?}")]
    Timeout(Duration),

    #[error("trace output error: {0}")]
    Io(#[from] std::io::Error),
}

impl NsError {
    /// Process exit code for fatal termination. Configuration and output
    /// faults exit 1, walker faults 2, transport 3, timeout 4.
    pub fn exit_code(&self) -> i32 {
        match self {
            NsError::Config(_) | NsError::Io(_) => 1,
            NsError::Potential(_) | NsError::InvariantViolation { .. } => 2,
            NsError::Transport(_) => 3,
            NsError::Timeout(_) => 4,
        }
    }
}

pub type NsResult<T> = Result<T, NsError>;
