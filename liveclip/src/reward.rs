use crate::observation::Observation;

/// Index of the video that is currently playing in every `list_*` field.
pub const CURRENT_VIDEO: usize = 0;

/// Whether the player can keep playing the current video without stalling:
/// at least one more segment is buffered ahead of the playhead, or the whole
/// video is already buffered.
pub fn no_rebuffering(obs: &Observation, segment_size: f32) -> bool {
    let (buffered, length) = match (
        obs.list_buffered_content.get(CURRENT_VIDEO),
        obs.list_video_length.get(CURRENT_VIDEO),
    ) {
        (Some(buffered), Some(length)) => (*buffered, *length),
        _ => return false,
    };
    buffered - obs.play_progress >= segment_size || buffered == length
}

/// Reward for the transition that produced `obs`.
///
/// One point for smooth playback, minus whatever was downloaded for nothing.
pub fn compute_reward(obs: &Observation, wastage_cost: f64, segment_size: f32) -> f64 {
    // QoE
    let qoe = if no_rebuffering(obs, segment_size) {
        1.0
    } else {
        0.0
    };

    // Wastage cost
    let penalty_wastage = wastage_cost;

    qoe - penalty_wastage
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(buffered: f32, length: f32, play_progress: f32) -> Observation {
        Observation {
            download_speed: vec![0.0; 8],
            user_staying_time: vec![0.0; 8],
            play_progress,
            current_staying_time: 0.0,
            replay_round: 0.0,
            list_video_bitrate: vec![1000.0; 3],
            list_video_length: vec![length, 60.0, 60.0],
            list_buffered_content: vec![buffered, 0.0, 0.0],
            list_time_spent_downloading_videos: vec![0.0; 3],
            list_completed_videos: vec![0.0; 3],
        }
    }

    #[test]
    fn fully_buffered_video_earns_the_qoe_point() {
        let obs = observation(60.0, 60.0, 0.0);
        assert!(no_rebuffering(&obs, 2.0));
        assert_eq!(compute_reward(&obs, 0.0, 2.0), 1.0);
    }

    #[test]
    fn stalling_with_wastage_is_negative() {
        let obs = observation(1.0, 60.0, 0.0);
        assert!(!no_rebuffering(&obs, 2.0));
        assert_eq!(compute_reward(&obs, 0.5, 2.0), -0.5);
    }

    #[test]
    fn one_segment_ahead_is_enough() {
        let obs = observation(12.0, 60.0, 10.0);
        assert!(no_rebuffering(&obs, 2.0));
        assert_eq!(compute_reward(&obs, 0.25, 2.0), 0.75);

        let obs = observation(11.5, 60.0, 10.0);
        assert!(!no_rebuffering(&obs, 2.0));
        assert_eq!(compute_reward(&obs, 0.0, 2.0), 0.0);
    }

    #[test]
    fn only_the_current_video_counts() {
        let mut obs = observation(0.0, 60.0, 0.0);
        obs.list_buffered_content = vec![0.0, 60.0, 60.0];
        assert!(!no_rebuffering(&obs, 2.0));
    }
}
