use std::future::Future;

use tokio::runtime::{Builder, Handle, Runtime};

use crate::action::Action;
use crate::bridge::{BridgeClient, CancelToken};
use crate::observation::{Observation, ObservationShape, ObservationSpace, PlayerReport};
use crate::reward::compute_reward;

use super::{check_step, EnvError, Environment, Step};

/// Environment backed by a real player, reached through the mediator.
///
/// Every call blocks until the player has answered (or the bridge gives
/// up). Called from inside an async runtime, `reset` and `step` fail with
/// [`EnvError::InsideRuntime`] instead of blocking.
pub struct LiveClipEnv {
    bridge: BridgeClient,
    /// Only taken on drop.
    runtime: Option<Runtime>,
    space: ObservationSpace,
    /// Duration of one download chunk, in seconds of video.
    segment_size: f32,
    /// `None` until the first successful `reset`.
    state: Option<Observation>,
}

impl LiveClipEnv {
    pub fn new(
        bridge: BridgeClient,
        shape: ObservationShape,
        segment_size: f32,
    ) -> Result<Self, EnvError> {
        if shape.sliding_window_size == 0 {
            return Err(EnvError::InvalidConfig(
                "the sliding window must hold at least the current video".to_string(),
            ));
        }
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            bridge,
            runtime: Some(runtime),
            space: ObservationSpace::new(shape),
            segment_size,
            state: None,
        })
    }

    /// Abort a `reset`/`step` that is waiting on the mediator, from another
    /// thread. The interrupted call fails with a cancellation error; call
    /// `reset` on the token before using the environment again.
    pub fn cancel_token(&self) -> CancelToken {
        self.bridge.cancel_token()
    }

    /// The observation the last `reset`/`step` returned.
    pub fn state(&self) -> Option<&Observation> {
        self.state.as_ref()
    }

    fn block_on<F: Future>(&self, future: F) -> Result<F::Output, EnvError> {
        if Handle::try_current().is_ok() {
            return Err(EnvError::InsideRuntime);
        }
        let runtime = self.runtime.as_ref().ok_or(EnvError::InsideRuntime)?;
        Ok(runtime.block_on(future))
    }

    fn post_action(&self, action: Action) -> Result<(), EnvError> {
        self.block_on(self.bridge.post_action(action))??;
        Ok(())
    }

    fn fetch_report(&self) -> Result<PlayerReport, EnvError> {
        let report = self.block_on(self.bridge.get_report())??;
        report.observation.check_shape(&self.space.shape())?;
        Ok(report)
    }
}

impl Drop for LiveClipEnv {
    fn drop(&mut self) {
        // Dropping a runtime blocks, which panics inside another runtime.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl Environment for LiveClipEnv {
    fn observation_space(&self) -> ObservationSpace {
        self.space
    }

    fn reset(&mut self) -> Result<Observation, EnvError> {
        self.state = None;
        self.post_action(Action::Reset)?;
        let report = self.fetch_report()?;
        log::info!("[ENV] Episode started");

        let obs = report.observation;
        self.state = Some(obs.clone());
        Ok(obs)
    }

    fn step(&mut self, action: Action) -> Result<Step, EnvError> {
        check_step(action, self.state.is_some())?;

        self.post_action(action)?;
        let PlayerReport {
            status: done,
            wastage_cost,
            observation,
        } = self.fetch_report()?;
        let reward = compute_reward(&observation, wastage_cost, self.segment_size);
        log::debug!(
            "[ENV] {} -> reward {:.3} (wastage {:.3}, done {})",
            action,
            reward,
            wastage_cost,
            done
        );

        self.state = Some(observation.clone());
        Ok(Step {
            observation,
            reward,
            done,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::RetryPolicy;

    fn unreachable_env() -> LiveClipEnv {
        // Nothing listens on the discard port; the tests below must fail
        // before any request is made.
        let bridge = BridgeClient::new("http://127.0.0.1:9", RetryPolicy::default()).unwrap();
        let shape = ObservationShape {
            history_size: 8,
            sliding_window_size: 3,
        };
        LiveClipEnv::new(bridge, shape, 2.0).unwrap()
    }

    #[test]
    fn step_before_reset_fails_without_network() {
        let mut env = unreachable_env();
        assert!(env.state().is_none());
        for action in [Action::Pause, Action::Current, Action::Next, Action::SecondNext] {
            assert!(matches!(env.step(action), Err(EnvError::NotReset)));
        }
    }

    #[test]
    fn reset_action_is_rejected_by_step() {
        let mut env = unreachable_env();
        assert!(matches!(
            env.step(Action::Reset),
            Err(EnvError::IllegalAction(Action::Reset))
        ));
    }

    #[tokio::test]
    async fn refuses_to_block_inside_a_runtime() {
        let mut env = unreachable_env();
        assert!(matches!(env.reset(), Err(EnvError::InsideRuntime)));
        assert!(env.state().is_none());
        // Dropped here, still inside the runtime.
    }

    #[test]
    fn empty_window_is_refused() {
        let bridge = BridgeClient::new("http://127.0.0.1:9", RetryPolicy::default()).unwrap();
        let shape = ObservationShape {
            history_size: 8,
            sliding_window_size: 0,
        };
        assert!(matches!(
            LiveClipEnv::new(bridge, shape, 2.0),
            Err(EnvError::InvalidConfig(_))
        ));
    }
}
