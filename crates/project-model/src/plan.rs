//! Audio/video duration matching.

use serde::{Deserialize, Serialize};

/// Ratios closer than this to an integer are treated as exact multiples,
/// so float noise in probed durations does not add a spurious extra loop.
const EXACT_MULTIPLE_TOLERANCE: f64 = 1e-9;

/// How many full plays of the assembled video are needed to cover the
/// audio track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopPlan {
    /// Total plays of the video, always at least 1.
    pub loop_count: u32,

    /// Probed audio duration, when measurable.
    pub audio_secs: Option<f64>,

    /// Probed video duration, when measurable.
    pub video_secs: Option<f64>,

    /// Why the plan fell back to a single play, if it did.
    pub fallback: Option<String>,
}

impl LoopPlan {
    /// Plan from two valid durations.
    pub fn from_durations(audio_secs: f64, video_secs: f64) -> Self {
        Self {
            loop_count: compute_loop_count(audio_secs, video_secs),
            audio_secs: Some(audio_secs),
            video_secs: Some(video_secs),
            fallback: None,
        }
    }

    /// Single-play plan used when a duration could not be measured.
    pub fn single_play(
        audio_secs: Option<f64>,
        video_secs: Option<f64>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            loop_count: 1,
            audio_secs,
            video_secs,
            fallback: Some(reason.into()),
        }
    }

    /// Additional repeats requested from the engine (`loop_count - 1`).
    pub fn extra_repeats(&self) -> u32 {
        self.loop_count.saturating_sub(1)
    }

    /// Whether the engine has to be invoked to loop the video at all.
    pub fn needs_engine_loop(&self) -> bool {
        self.loop_count > 1
    }
}

/// `ceil(audio / video)` clamped to at least 1.
///
/// Non-positive or non-finite inputs yield 1.
pub fn compute_loop_count(audio_secs: f64, video_secs: f64) -> u32 {
    if !(audio_secs.is_finite() && video_secs.is_finite()) || audio_secs <= 0.0 || video_secs <= 0.0
    {
        return 1;
    }

    let ratio = audio_secs / video_secs;
    let nearest = ratio.round();
    let loops = if (ratio - nearest).abs() < EXACT_MULTIPLE_TOLERANCE {
        nearest
    } else {
        ratio.ceil()
    };

    if loops >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        (loops as u32).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_equal_durations_play_once() {
        assert_eq!(compute_loop_count(12.5, 12.5), 1);
    }

    #[test]
    fn test_shorter_audio_plays_once() {
        assert_eq!(compute_loop_count(4.0, 30.0), 1);
    }

    #[test]
    fn test_exact_multiple() {
        assert_eq!(compute_loop_count(20.0, 10.0), 2);
        assert_eq!(compute_loop_count(0.3, 0.1), 3);
    }

    #[test]
    fn test_multiple_plus_epsilon() {
        assert_eq!(compute_loop_count(20.01, 10.0), 3);
        assert_eq!(compute_loop_count(25.0, 10.0), 3);
    }

    #[test]
    fn test_invalid_durations_play_once() {
        assert_eq!(compute_loop_count(0.0, 10.0), 1);
        assert_eq!(compute_loop_count(10.0, 0.0), 1);
        assert_eq!(compute_loop_count(f64::NAN, 10.0), 1);
        assert_eq!(compute_loop_count(10.0, -1.0), 1);
    }

    #[test]
    fn test_plan_extra_repeats() {
        let plan = LoopPlan::from_durations(25.0, 10.0);
        assert_eq!(plan.loop_count, 3);
        assert_eq!(plan.extra_repeats(), 2);
        assert!(plan.needs_engine_loop());

        let fallback = LoopPlan::single_play(None, Some(10.0), "audio duration unavailable");
        assert_eq!(fallback.extra_repeats(), 0);
        assert!(!fallback.needs_engine_loop());
        assert!(fallback.fallback.is_some());
    }

    proptest! {
        #[test]
        fn prop_loop_covers_audio(audio in 0.01f64..10_000.0, video in 0.01f64..1_000.0) {
            let loops = compute_loop_count(audio, video);
            prop_assert!(loops >= 1);
            prop_assert!(f64::from(loops) * video >= audio - 1e-6);
            if loops > 1 {
                prop_assert!(f64::from(loops - 1) * video < audio);
            }
        }

        #[test]
        fn prop_exact_multiples(k in 1u32..200, video in 0.5f64..120.0) {
            prop_assert_eq!(compute_loop_count(f64::from(k) * video, video), k);
        }
    }
}
