use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::action::Action;
use crate::env::{EnvError, Environment};
use crate::observation::Observation;

/// The decision maker. How it decides is its own business; it only has to
/// return one of the first `num_actions` actions.
pub trait Agent {
    fn act(&mut self, observation: &Observation, num_actions: usize) -> Action;
}

/// Picks a legal action uniformly at random.
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for RandomAgent {
    fn act(&mut self, _observation: &Observation, num_actions: usize) -> Action {
        let ordinal = self.rng.gen_range(0..num_actions.max(1));
        Action::from_ordinal(ordinal).unwrap_or(Action::Pause)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeSummary {
    pub steps: usize,
    pub total_reward: f64,
    /// The environment reported the end of the episode (as opposed to the
    /// step limit being hit).
    pub finished: bool,
}

/// Play one episode: reset, then step until `done` or `max_steps`.
pub fn run_episode<E, A>(
    env: &mut E,
    agent: &mut A,
    max_steps: Option<usize>,
) -> Result<EpisodeSummary, EnvError>
where
    E: Environment + ?Sized,
    A: Agent + ?Sized,
{
    let num_actions = env.num_actions();
    let mut observation = env.reset()?;
    let mut summary = EpisodeSummary {
        steps: 0,
        total_reward: 0.0,
        finished: false,
    };

    while max_steps.map_or(true, |max| summary.steps < max) {
        let action = agent.act(&observation, num_actions);
        let step = env.step(action)?;
        summary.steps += 1;
        summary.total_reward += step.reward;
        observation = step.observation;
        if step.done {
            summary.finished = true;
            break;
        }
    }

    log::info!(
        "[AGENT] Episode over after {} step(s), total reward {:.3}",
        summary.steps,
        summary.total_reward
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::NUM_LEGAL_ACTIONS;
    use crate::env::SyntheticEnv;
    use crate::observation::ObservationShape;

    const SHAPE: ObservationShape = ObservationShape {
        history_size: 8,
        sliding_window_size: 3,
    };

    #[test]
    fn random_agent_only_picks_legal_actions() {
        let mut agent = RandomAgent::seeded(5);
        let mut env = SyntheticEnv::seeded(SHAPE, 5);
        let obs = env.reset().unwrap();
        for _ in 0..500 {
            assert!(agent.act(&obs, NUM_LEGAL_ACTIONS).is_legal());
        }
    }

    #[test]
    fn episode_stops_on_done() {
        let mut env = SyntheticEnv::seeded(SHAPE, 11);
        let mut agent = RandomAgent::seeded(11);
        let summary = run_episode(&mut env, &mut agent, None).unwrap();
        assert!(summary.finished);
        assert!(summary.steps >= 1);
        assert!(summary.total_reward < 0.0);
    }

    #[test]
    fn step_limit_is_honoured() {
        let mut env = SyntheticEnv::seeded(SHAPE, 2);
        let mut agent = RandomAgent::seeded(2);
        let summary = run_episode(&mut env, &mut agent, Some(0)).unwrap();
        assert_eq!(summary.steps, 0);
        assert!(!summary.finished);
    }

    struct AlwaysReset;

    impl Agent for AlwaysReset {
        fn act(&mut self, _observation: &Observation, _num_actions: usize) -> Action {
            Action::Reset
        }
    }

    #[test]
    fn illegal_agent_choice_surfaces_as_error() {
        let mut env = SyntheticEnv::seeded(SHAPE, 2);
        let res = run_episode(&mut env, &mut AlwaysReset, Some(10));
        assert!(matches!(res, Err(EnvError::IllegalAction(Action::Reset))));
    }
}
