use thiserror::Error;
use tokio::time::Duration;

use crate::task::CompletionSignal;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("completion channel capacity must be at least 1")]
    ZeroCapacity,

    #[error("time unit must be greater than zero")]
    ZeroTimeUnit,

    #[error("minimum step {min_step:?} exceeds maximum step {max_step:?}")]
    InvertedStepRange { min_step: Duration, max_step: Duration },

    #[error("invalid value {value:?} for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Returned by a blocking send; hands the signal back.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("completion channel closed, signal for task {} not delivered", .0.task)]
pub struct SendError(pub CompletionSignal);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrySendError {
    #[error("completion channel full, signal for task {} not delivered", .0.task)]
    Full(CompletionSignal),

    #[error("completion channel closed, signal for task {} not delivered", .0.task)]
    Closed(CompletionSignal),
}

impl TrySendError {
    pub fn into_signal(self) -> CompletionSignal {
        match self {
            TrySendError::Full(signal) | TrySendError::Closed(signal) => signal,
        }
    }
}
