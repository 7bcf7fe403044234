use std::time::Duration;

use config::Config;
use serde::Deserialize;

use crate::bridge::retry::DEFAULT_RETRY_STATUSES;
use crate::bridge::{BridgeClient, RetryPolicy};
use crate::env::{EnvError, Environment, LiveClipEnv, SyntheticEnv};
use crate::observation::ObservationShape;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvKind {
    /// Random observations, no mediator needed.
    Synthetic,
    /// A real player behind the mediator.
    Live,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LiveClipConfig {
    pub env: EnvKind,
    pub player_conn_base_url: String,
    pub history_size: usize,
    pub sliding_window_size: usize,
    pub segment_size: f32,

    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_secs: u64,
}

impl Default for LiveClipConfig {
    fn default() -> Self {
        Self {
            env: EnvKind::Live,
            player_conn_base_url: "http://localhost:1996".to_string(),
            history_size: 8,
            sliding_window_size: 3,
            segment_size: 2.0,
            max_attempts: 50,
            backoff_base_ms: 100,
            max_backoff_ms: 120_000,
            timeout_secs: 10 * 60,
        }
    }
}

impl LiveClipConfig {
    /// Defaults, overridden by an optional `LiveClip.{toml,json,...}` in the
    /// working directory, overridden by `LIVECLIP_*` environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(config::File::with_name("LiveClip").required(false))
            // Add in settings from env, with a prefix of LIVECLIP, e.g. LIVECLIP_ENV=synthetic
            .add_source(config::Environment::with_prefix("LIVECLIP"))
            .build()?;
        settings.try_deserialize()
    }

    pub fn shape(&self) -> ObservationShape {
        ObservationShape {
            history_size: self.history_size,
            sliding_window_size: self.sliding_window_size,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            timeout: Duration::from_secs(self.timeout_secs),
            retry_statuses: DEFAULT_RETRY_STATUSES.to_vec(),
        }
    }
}

/// Build the environment the configuration asks for.
pub fn build_env(cfg: &LiveClipConfig) -> Result<Box<dyn Environment>, EnvError> {
    match cfg.env {
        EnvKind::Synthetic => Ok(Box::new(SyntheticEnv::new(cfg.shape()))),
        EnvKind::Live => {
            let bridge = BridgeClient::new(&cfg.player_conn_base_url, cfg.retry_policy())?;
            log::info!("[ENV] Talking to the player via {}", bridge.base_url());
            let env = LiveClipEnv::new(bridge, cfg.shape(), cfg.segment_size)?;
            Ok(Box::new(env))
        }
    }
}
