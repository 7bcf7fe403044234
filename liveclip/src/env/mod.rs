//! Turn-based interface between an agent and the player.
//!
//! Both environments follow the same contract: `reset` must be called before
//! the first `step`, and `step` only accepts the legal actions. A `done`
//! step does not reset anything; the caller calls `reset` again.

mod live;
mod synthetic;

use thiserror::Error;

use crate::action::{Action, NUM_LEGAL_ACTIONS};
use crate::bridge::BridgeError;
use crate::observation::{Observation, ObservationSpace, ShapeError};

pub use live::LiveClipEnv;
pub use synthetic::SyntheticEnv;

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("call reset before using step")]
    NotReset,
    #[error("{0} is not a legal step action")]
    IllegalAction(Action),
    #[error("report does not match the configured shape: {0}")]
    Shape(#[from] ShapeError),
    #[error("invalid environment configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("the live environment cannot block inside an async runtime")]
    InsideRuntime,
    #[error("could not start the async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Result of one `step`. The observation is owned by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub observation: Observation,
    pub reward: f64,
    pub done: bool,
}

pub trait Environment {
    fn observation_space(&self) -> ObservationSpace;

    /// Size of the discrete action space offered to agents.
    fn num_actions(&self) -> usize {
        NUM_LEGAL_ACTIONS
    }

    /// Start a new episode.
    fn reset(&mut self) -> Result<Observation, EnvError>;

    /// Apply `action` and observe the outcome.
    fn step(&mut self, action: Action) -> Result<Step, EnvError>;
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    fn observation_space(&self) -> ObservationSpace {
        (**self).observation_space()
    }

    fn num_actions(&self) -> usize {
        (**self).num_actions()
    }

    fn reset(&mut self) -> Result<Observation, EnvError> {
        (**self).reset()
    }

    fn step(&mut self, action: Action) -> Result<Step, EnvError> {
        (**self).step(action)
    }
}

/// Preconditions shared by every `step` implementation.
fn check_step(action: Action, active: bool) -> Result<(), EnvError> {
    if !action.is_legal() {
        return Err(EnvError::IllegalAction(action));
    }
    if !active {
        return Err(EnvError::NotReset);
    }
    Ok(())
}
