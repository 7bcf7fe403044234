use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::action::Action;
use crate::observation::{Observation, ObservationShape, ObservationSpace};

use super::{check_step, EnvError, Environment, Step};

/// Stand-in for [`super::LiveClipEnv`] that never touches the network.
/// Observations are drawn uniformly from the observation space, rewards
/// uniformly from `[-10, 0)` and `done` is a coin flip.
pub struct SyntheticEnv {
    space: ObservationSpace,
    rng: StdRng,
    active: bool,
}

impl SyntheticEnv {
    pub fn new(shape: ObservationShape) -> Self {
        Self::with_rng(shape, StdRng::from_entropy())
    }

    /// Reproducible episodes, for tests.
    pub fn seeded(shape: ObservationShape, seed: u64) -> Self {
        Self::with_rng(shape, StdRng::seed_from_u64(seed))
    }

    fn with_rng(shape: ObservationShape, rng: StdRng) -> Self {
        Self {
            space: ObservationSpace::new(shape),
            rng,
            active: false,
        }
    }
}

impl Environment for SyntheticEnv {
    fn observation_space(&self) -> ObservationSpace {
        self.space
    }

    fn reset(&mut self) -> Result<Observation, EnvError> {
        self.active = true;
        Ok(self.space.sample(&mut self.rng))
    }

    fn step(&mut self, action: Action) -> Result<Step, EnvError> {
        check_step(action, self.active)?;
        Ok(Step {
            observation: self.space.sample(&mut self.rng),
            reward: self.rng.gen_range(-10.0..0.0),
            done: self.rng.gen_bool(0.5),
        })
    }
}
