//! Agent-side half of the video player bridge.
//!
//! An agent never talks to the player. It drives an [`env::Environment`]:
//! either [`env::LiveClipEnv`], which relays actions and reports through
//! the mediator with [`bridge::BridgeClient`], or [`env::SyntheticEnv`],
//! which makes everything up.

pub mod action;
pub mod agent;
pub mod bridge;
pub mod config;
pub mod env;
pub mod observation;
pub mod reward;

pub use action::{Action, NUM_LEGAL_ACTIONS};
pub use agent::{run_episode, Agent, EpisodeSummary, RandomAgent};
pub use bridge::{BridgeClient, BridgeError, CancelToken, RetryPolicy};
pub use crate::config::{build_env, EnvKind, LiveClipConfig};
pub use env::{EnvError, Environment, LiveClipEnv, Step, SyntheticEnv};
pub use observation::{Observation, ObservationShape, ObservationSpace, PlayerReport, ShapeError};
