use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Snapshot of the player's telemetry.
///
/// Index 0 of every `list_*` field is the video that is currently playing;
/// the following entries are the rest of the player's look-ahead window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Past download speeds, one per history sample.
    pub download_speed: Vec<f32>,
    /// How long the user stayed on each of the past videos.
    pub user_staying_time: Vec<f32>,

    // current playback state of the player
    /// Seconds into the current video.
    pub play_progress: f32,
    pub current_staying_time: f32,
    pub replay_round: f32,

    // videos in the sliding window
    pub list_video_bitrate: Vec<f32>,
    pub list_video_length: Vec<f32>,
    pub list_buffered_content: Vec<f32>,
    pub list_time_spent_downloading_videos: Vec<f32>,
    pub list_completed_videos: Vec<f32>,
}

/// What the player posts to the mediator: an observation plus episode
/// bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerReport {
    /// The episode is over.
    pub status: bool,
    /// Content downloaded but never watched.
    pub wastage_cost: f64,
    #[serde(flatten)]
    pub observation: Observation,
}

/// Lengths of the array fields. Fixed for the lifetime of an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationShape {
    pub history_size: usize,
    pub sliding_window_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field `{field}` has {actual} entries, expected {expected}")]
pub struct ShapeError {
    pub field: &'static str,
    pub expected: usize,
    pub actual: usize,
}

impl Observation {
    fn history_fields(&self) -> [(&'static str, &[f32]); 2] {
        [
            ("download_speed", self.download_speed.as_slice()),
            ("user_staying_time", self.user_staying_time.as_slice()),
        ]
    }

    fn window_fields(&self) -> [(&'static str, &[f32]); 5] {
        [
            ("list_video_bitrate", self.list_video_bitrate.as_slice()),
            ("list_video_length", self.list_video_length.as_slice()),
            ("list_buffered_content", self.list_buffered_content.as_slice()),
            (
                "list_time_spent_downloading_videos",
                self.list_time_spent_downloading_videos.as_slice(),
            ),
            ("list_completed_videos", self.list_completed_videos.as_slice()),
        ]
    }

    /// Reject observations whose arrays do not have the configured lengths.
    /// Nothing is padded or truncated.
    pub fn check_shape(&self, shape: &ObservationShape) -> Result<(), ShapeError> {
        let history = self
            .history_fields()
            .into_iter()
            .map(|(field, values)| (field, values.len(), shape.history_size));
        let window = self
            .window_fields()
            .into_iter()
            .map(|(field, values)| (field, values.len(), shape.sliding_window_size));

        for (field, actual, expected) in history.chain(window) {
            if actual != expected {
                return Err(ShapeError {
                    field,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}

/// Closed interval of admissible values for one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub low: f32,
    pub high: f32,
}

impl Bounds {
    pub const fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: f32) -> bool {
        self.low <= value && value <= self.high
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.low == self.high {
            return self.low;
        }
        rng.gen_range(self.low..=self.high)
    }
}

pub const DOWNLOAD_SPEED: Bounds = Bounds::new(0.0, 17000.0);
pub const USER_STAYING_TIME: Bounds = Bounds::new(0.0, 120.0);
pub const PLAY_PROGRESS: Bounds = Bounds::new(0.0, 60.0);
pub const CURRENT_STAYING_TIME: Bounds = Bounds::new(0.0, 120.0);
pub const REPLAY_ROUND: Bounds = Bounds::new(0.0, 0.0);
pub const VIDEO_BITRATE: Bounds = Bounds::new(1000.0, 1000.0);
pub const VIDEO_LENGTH: Bounds = Bounds::new(60.0, 60.0);
pub const BUFFERED_CONTENT: Bounds = Bounds::new(0.0, 60.0);
pub const TIME_SPENT_DOWNLOADING: Bounds = Bounds::new(0.0, 120.0);
pub const COMPLETED_VIDEOS: Bounds = Bounds::new(0.0, 1.0);

/// Shapes and bounds of every observation field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationSpace {
    shape: ObservationShape,
}

impl ObservationSpace {
    pub fn new(shape: ObservationShape) -> Self {
        Self { shape }
    }

    pub fn shape(&self) -> ObservationShape {
        self.shape
    }

    /// Draw every field uniformly from its bounds.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Observation {
        let mut vector = |bounds: Bounds, len: usize| -> Vec<f32> {
            (0..len).map(|_| bounds.sample(rng)).collect()
        };
        let history = self.shape.history_size;
        let window = self.shape.sliding_window_size;

        let download_speed = vector(DOWNLOAD_SPEED, history);
        let user_staying_time = vector(USER_STAYING_TIME, history);
        let list_video_bitrate = vector(VIDEO_BITRATE, window);
        let list_video_length = vector(VIDEO_LENGTH, window);
        let list_buffered_content = vector(BUFFERED_CONTENT, window);
        let list_time_spent_downloading_videos = vector(TIME_SPENT_DOWNLOADING, window);
        let list_completed_videos = vector(COMPLETED_VIDEOS, window);

        Observation {
            download_speed,
            user_staying_time,
            play_progress: PLAY_PROGRESS.sample(rng),
            current_staying_time: CURRENT_STAYING_TIME.sample(rng),
            replay_round: REPLAY_ROUND.sample(rng),
            list_video_bitrate,
            list_video_length,
            list_buffered_content,
            list_time_spent_downloading_videos,
            list_completed_videos,
        }
    }

    pub fn contains(&self, obs: &Observation) -> bool {
        if obs.check_shape(&self.shape).is_err() {
            return false;
        }
        fn all_in(bounds: Bounds, values: &[f32]) -> bool {
            values.iter().all(|v| bounds.contains(*v))
        }

        all_in(DOWNLOAD_SPEED, &obs.download_speed)
            && all_in(USER_STAYING_TIME, &obs.user_staying_time)
            && PLAY_PROGRESS.contains(obs.play_progress)
            && CURRENT_STAYING_TIME.contains(obs.current_staying_time)
            && REPLAY_ROUND.contains(obs.replay_round)
            && all_in(VIDEO_BITRATE, &obs.list_video_bitrate)
            && all_in(VIDEO_LENGTH, &obs.list_video_length)
            && all_in(BUFFERED_CONTENT, &obs.list_buffered_content)
            && all_in(TIME_SPENT_DOWNLOADING, &obs.list_time_spent_downloading_videos)
            && all_in(COMPLETED_VIDEOS, &obs.list_completed_videos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    const SHAPE: ObservationShape = ObservationShape {
        history_size: 8,
        sliding_window_size: 3,
    };

    #[test]
    fn samples_stay_within_bounds() {
        let space = ObservationSpace::new(SHAPE);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let obs = space.sample(&mut rng);
            assert!(obs.check_shape(&SHAPE).is_ok());
            assert!(space.contains(&obs));
            assert_eq!(obs.replay_round, 0.0);
            assert!(obs.list_video_length.iter().all(|l| *l == 60.0));
        }
    }

    #[test]
    fn report_decodes_flat_json() {
        let report: PlayerReport = serde_json::from_value(json!({
            "status": true,
            "wastage_cost": 1.5,
            "download_speed": [1.0, 2.0],
            "user_staying_time": [3.0, 4.0],
            "play_progress": 5.0,
            "current_staying_time": 6.0,
            "replay_round": 0,
            "list_video_bitrate": [1000],
            "list_video_length": [60],
            "list_buffered_content": [10],
            "list_time_spent_downloading_videos": [2.5],
            "list_completed_videos": [0],
        }))
        .expect("valid report");

        assert!(report.status);
        assert_eq!(report.wastage_cost, 1.5);
        assert_eq!(report.observation.download_speed, vec![1.0, 2.0]);
        assert_eq!(report.observation.play_progress, 5.0);
        assert_eq!(report.observation.list_buffered_content, vec![10.0]);

        let shape = ObservationShape {
            history_size: 2,
            sliding_window_size: 1,
        };
        assert!(report.observation.check_shape(&shape).is_ok());
    }

    #[test]
    fn report_missing_a_field_is_rejected() {
        let res = serde_json::from_value::<PlayerReport>(json!({
            "status": false,
            "wastage_cost": 0.0,
            "download_speed": [1.0],
        }));
        assert!(res.is_err());
    }

    #[test]
    fn shape_mismatch_names_the_field() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut obs = ObservationSpace::new(SHAPE).sample(&mut rng);
        obs.list_completed_videos.pop();

        let err = obs.check_shape(&SHAPE).unwrap_err();
        assert_eq!(
            err,
            ShapeError {
                field: "list_completed_videos",
                expected: 3,
                actual: 2,
            }
        );

        obs.list_completed_videos.push(0.0);
        obs.download_speed.push(0.0);
        let err = obs.check_shape(&SHAPE).unwrap_err();
        assert_eq!(err.field, "download_speed");
    }
}
