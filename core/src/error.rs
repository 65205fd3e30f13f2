use thiserror::Error;

use crate::clock::SimTime;

/// Boxed error produced by model code.
pub type ModelError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum SimError {
    /// `schedule()` was asked for a negative delay.
    #[error("cannot schedule an event in the past (delay = {delay})")]
    SchedulingInPast { delay: SimTime },

    /// NaN or infinite delay.
    #[error("delay must be a finite number, got {delay}")]
    InvalidDelay { delay: SimTime },

    #[error("invalid handler: {0}")]
    InvalidHandler(String),

    #[error("invalid arguments for handler '{handler}': {reason}")]
    InvalidArguments { handler: String, reason: String },

    /// Raised by `EventQueue::pop` when no live entry remains. The run loop
    /// checks emptiness first, so seeing this from a run is a kernel bug.
    #[error("pop from an empty event queue")]
    EmptyQueue,

    #[error("simulation yielded no results")]
    NoResult,

    #[error("cannot {operation} a kernel in state {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration")]
    Config(#[from] serde_json::Error),

    #[error("model error: {0}")]
    Model(ModelError),
}

impl SimError {
    /// Wraps a model-level failure so handlers can bail out with `?`.
    pub fn model(err: impl Into<ModelError>) -> Self {
        SimError::Model(err.into())
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
