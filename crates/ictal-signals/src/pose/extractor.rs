//! Pose signal extraction
//!
//! Turns the per-frame body landmark stream into movement scores:
//! - Tremor: rhythmic oscillation of overall activity inside the seizure band
//! - Rigidity: sustained near-zero activity (tonic phase)
//! - Symmetry: left/right activity balance

use crate::dsp::{std_dev_slice, RingBuffer, SpectralBand};
use crate::landmarks::LandmarkPoint;

use super::landmarks::{BodySide, PoseFrame, PoseLandmark};

const TRACKED: usize = PoseLandmark::ALL.len();

/// Pose extractor configuration
#[derive(Debug, Clone)]
pub struct PoseConfig {
    /// Minimum visibility for a landmark to be measured
    pub min_visibility: f32,
    /// Velocity/activity history length in frames
    pub history_size: usize,
    /// Activity below this is "still" (normalized units/frame)
    pub rigidity_threshold: f32,
    /// Consecutive still samples needed to report rigidity
    pub rigidity_min_samples: usize,
    /// Frame rate used to convert crossing periods to Hz
    pub fps: f32,
    /// Frequency band counted as tremor
    pub tremor_band: SpectralBand,
    /// Activity std below this is treated as flat
    pub tremor_min_std: f32,
    /// Zero crossings needed to estimate a period
    pub tremor_min_crossings: usize,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            min_visibility: 0.5,
            history_size: 30,
            rigidity_threshold: 0.01,
            rigidity_min_samples: 10,
            fps: 30.0,
            tremor_band: SpectralBand::new(2.0, 7.0),
            tremor_min_std: 0.001,
            tremor_min_crossings: 4,
        }
    }
}

/// Pose scores for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct PoseScores {
    /// Tremor score (0-1)
    pub tremor: f32,
    /// Rigidity progress (0-1), 1 once rigid
    pub rigidity: f32,
    /// Left/right balance (1 = symmetric)
    pub symmetry: f32,
    /// Mean displacement per frame over all tracked landmarks
    pub overall_activity: f32,
    pub is_rigid: bool,
    pub left_activity: f32,
    pub right_activity: f32,
}

impl Default for PoseScores {
    fn default() -> Self {
        Self {
            tremor: 0.0,
            rigidity: 0.0,
            symmetry: 1.0,
            overall_activity: 0.0,
            is_rigid: false,
            left_activity: 0.0,
            right_activity: 0.0,
        }
    }
}

/// Pose Signal Extractor
#[derive(Debug, Clone)]
pub struct PoseSignalExtractor {
    config: PoseConfig,
    prev_positions: [Option<LandmarkPoint>; TRACKED],
    velocity_history: Vec<RingBuffer<f32>>,
    activity_history: RingBuffer<f32>,
    still_streak: usize,
}

impl PoseSignalExtractor {
    pub fn new() -> Self {
        Self::with_config(PoseConfig::default())
    }

    pub fn with_config(config: PoseConfig) -> Self {
        let capacity = config.history_size.max(1);
        Self {
            prev_positions: [None; TRACKED],
            velocity_history: (0..TRACKED).map(|_| RingBuffer::new(capacity)).collect(),
            activity_history: RingBuffer::new(capacity),
            still_streak: 0,
            config,
        }
    }

    /// Process one frame of landmarks. `None` (or no visible tracked
    /// landmark) means the subject is gone: history is cleared.
    pub fn update(&mut self, frame: Option<&PoseFrame>) -> PoseScores {
        let Some(frame) = frame else {
            self.lose_subject();
            return PoseScores::default();
        };

        let mut total = 0.0f32;
        let mut measured = 0usize;
        let mut visible = 0usize;

        for landmark in PoseLandmark::ALL {
            let Some(point) = frame.visible(landmark, self.config.min_visibility) else {
                continue;
            };
            visible += 1;

            let slot = landmark.slot();
            if let Some(prev) = self.prev_positions[slot] {
                let displacement = prev.distance(&point);
                self.velocity_history[slot].push(displacement);
                total += displacement;
                measured += 1;
            }
            self.prev_positions[slot] = Some(point);
        }

        if visible == 0 {
            self.lose_subject();
            return PoseScores::default();
        }

        if measured > 0 {
            let sample = total / measured as f32;
            self.activity_history.push(sample);
            if sample < self.config.rigidity_threshold {
                self.still_streak += 1;
            } else {
                self.still_streak = 0;
            }
        }

        self.scores()
    }

    /// Scores from the current history without consuming a frame.
    pub fn scores(&self) -> PoseScores {
        let left_activity = self.group_activity(|l| l.side() == BodySide::Left);
        let right_activity = self.group_activity(|l| l.side() == BodySide::Right);
        let overall_activity = self.group_activity(|_| true);

        let min_samples = self.config.rigidity_min_samples.max(1);
        let is_rigid = self.still_streak >= min_samples;
        let rigidity = (self.still_streak as f32 / min_samples as f32).min(1.0);

        PoseScores {
            tremor: self.tremor_score(),
            rigidity,
            symmetry: symmetry(left_activity, right_activity),
            overall_activity,
            is_rigid,
            left_activity,
            right_activity,
        }
    }

    /// Mean of per-landmark mean displacements for landmarks in the group
    /// that have any history.
    fn group_activity(&self, in_group: impl Fn(PoseLandmark) -> bool) -> f32 {
        let means: Vec<f32> = PoseLandmark::ALL
            .iter()
            .filter(|l| in_group(**l))
            .map(|l| &self.velocity_history[l.slot()])
            .filter(|history| !history.is_empty())
            .map(|history| history.mean())
            .collect();
        if means.is_empty() {
            return 0.0;
        }
        means.iter().sum::<f32>() / means.len() as f32
    }

    /// Zero-crossing frequency estimate of the activity series.
    fn tremor_score(&self) -> f32 {
        if !self.activity_history.is_full() {
            return 0.0;
        }

        let data = self.activity_history.to_vec();
        let mean = data.iter().sum::<f32>() / data.len() as f32;
        let centered: Vec<f32> = data.iter().map(|v| v - mean).collect();

        let std = std_dev_slice(&centered);
        if std < self.config.tremor_min_std {
            return 0.0;
        }

        let crossings: Vec<usize> = centered
            .windows(2)
            .enumerate()
            .filter(|(_, w)| w[0].is_sign_negative() != w[1].is_sign_negative())
            .map(|(i, _)| i)
            .collect();
        if crossings.len() < self.config.tremor_min_crossings.max(2) {
            return 0.0;
        }

        let gaps: Vec<f32> = crossings.windows(2).map(|w| (w[1] - w[0]) as f32).collect();
        let period = 2.0 * gaps.iter().sum::<f32>() / gaps.len() as f32;
        if period <= 0.0 {
            return 0.0;
        }

        let freq = self.config.fps / period;
        log::trace!("Pose tremor estimate {:.2} Hz (std {:.4})", freq, std);

        if self.config.tremor_band.contains(freq) {
            (std * 10.0).min(1.0)
        } else {
            0.0
        }
    }

    fn lose_subject(&mut self) {
        if self.has_history() {
            log::debug!("Pose tracking lost, clearing landmark history");
        }
        self.reset();
    }

    fn has_history(&self) -> bool {
        !self.activity_history.is_empty() || self.prev_positions.iter().any(Option::is_some)
    }

    /// Number of activity samples collected
    pub fn samples(&self) -> usize {
        self.activity_history.len()
    }

    pub fn reset(&mut self) {
        self.prev_positions = [None; TRACKED];
        for history in &mut self.velocity_history {
            history.clear();
        }
        self.activity_history.clear();
        self.still_streak = 0;
    }

    pub fn config(&self) -> &PoseConfig {
        &self.config
    }
}

impl Default for PoseSignalExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// min/max of the two side activities, 1.0 when both are still.
pub fn symmetry(left: f32, right: f32) -> f32 {
    let max = left.max(right);
    if max <= 0.0 {
        return 1.0;
    }
    left.min(right) / max
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    fn still_frame() -> PoseFrame {
        let mut frame = PoseFrame::hidden(33);
        for (i, lm) in PoseLandmark::ALL.iter().enumerate() {
            frame.set(*lm, LandmarkPoint::visible(0.3 + i as f32 * 0.01, 0.5));
        }
        frame
    }

    #[test]
    fn test_absent_frame_gives_neutral_scores() {
        let mut extractor = PoseSignalExtractor::new();
        let scores = extractor.update(None);
        assert_eq!(scores, PoseScores::default());
        assert_eq!(scores.symmetry, 1.0);
    }

    #[test]
    fn test_still_body_becomes_rigid() {
        let mut extractor = PoseSignalExtractor::new();
        let frame = still_frame();

        let mut scores = PoseScores::default();
        for _ in 0..10 {
            scores = extractor.update(Some(&frame));
        }
        // First frame has no displacement, so 9 still samples so far
        assert!(!scores.is_rigid);
        assert_relative_eq!(scores.rigidity, 0.9, epsilon = 1e-6);

        scores = extractor.update(Some(&frame));
        assert!(scores.is_rigid);
        assert_eq!(scores.rigidity, 1.0);
        assert_eq!(scores.tremor, 0.0);
        assert_eq!(scores.symmetry, 1.0);
    }

    #[test]
    fn test_movement_breaks_rigidity() {
        let mut extractor = PoseSignalExtractor::new();
        let frame = still_frame();
        for _ in 0..12 {
            extractor.update(Some(&frame));
        }
        let mut moved = frame.clone();
        moved.set(PoseLandmark::LeftWrist, LandmarkPoint::visible(0.9, 0.9));
        let scores = extractor.update(Some(&moved));
        assert!(!scores.is_rigid);
        assert_eq!(scores.rigidity, 0.0);
    }

    #[test]
    fn test_one_sided_movement_is_asymmetric() {
        let mut extractor = PoseSignalExtractor::new();
        let mut frame = still_frame();
        let mut scores = PoseScores::default();
        for t in 0..20 {
            let x = if t % 2 == 0 { 0.2 } else { 0.25 };
            frame.set(PoseLandmark::LeftWrist, LandmarkPoint::visible(x, 0.5));
            scores = extractor.update(Some(&frame));
        }
        assert!(scores.left_activity > 0.0);
        assert_eq!(scores.right_activity, 0.0);
        assert_eq!(scores.symmetry, 0.0);
    }

    #[test]
    fn test_rhythmic_wrist_produces_tremor() {
        let mut extractor = PoseSignalExtractor::new();
        let mut frame = PoseFrame::hidden(33);
        let mut x = 0.5f32;
        frame.set(PoseLandmark::LeftWrist, LandmarkPoint::visible(x, 0.5));
        extractor.update(Some(&frame));

        // Displacement oscillates at 5 Hz around 0.05 per frame
        let mut scores = PoseScores::default();
        for t in 1..=30 {
            let d = 0.05 + 0.03 * (2.0 * PI * 5.0 * t as f32 / 30.0 + 0.5).sin();
            x += if t % 2 == 0 { d } else { -d };
            frame.set(PoseLandmark::LeftWrist, LandmarkPoint::visible(x, 0.5));
            scores = extractor.update(Some(&frame));
        }

        assert_eq!(extractor.samples(), 30);
        assert!(scores.tremor > 0.15, "tremor = {}", scores.tremor);
        assert!(scores.tremor <= 1.0);
    }

    #[test]
    fn test_slow_oscillation_is_not_tremor() {
        let mut extractor = PoseSignalExtractor::new();
        let mut frame = PoseFrame::hidden(33);
        let mut x = 0.5f32;
        frame.set(PoseLandmark::LeftWrist, LandmarkPoint::visible(x, 0.5));
        extractor.update(Some(&frame));

        // 1 Hz: below the band
        let mut scores = PoseScores::default();
        for t in 1..=30 {
            let d = 0.05 + 0.03 * (2.0 * PI * 1.0 * t as f32 / 30.0 + 0.5).sin();
            x += if t % 2 == 0 { d } else { -d };
            frame.set(PoseLandmark::LeftWrist, LandmarkPoint::visible(x, 0.5));
            scores = extractor.update(Some(&frame));
        }
        assert_eq!(scores.tremor, 0.0);
    }

    #[test]
    fn test_invisible_landmarks_reset_history() {
        let mut extractor = PoseSignalExtractor::new();
        let frame = still_frame();
        for _ in 0..5 {
            extractor.update(Some(&frame));
        }
        assert_eq!(extractor.samples(), 4);

        let hidden = PoseFrame::hidden(33);
        assert_eq!(extractor.update(Some(&hidden)), PoseScores::default());
        assert_eq!(extractor.samples(), 0);
    }

    #[test]
    fn test_symmetry_helper() {
        assert_eq!(symmetry(0.0, 0.0), 1.0);
        assert_relative_eq!(symmetry(0.02, 0.04), 0.5);
    }
}
