//! Fall detection
//!
//! Multi-point downward velocity of the head and trunk (nose, shoulders,
//! hips), median-smoothed and confirmed over several frames so a head tilt or
//! a single jittery frame does not register as a fall.

use crate::dsp::{median, RingBuffer};

use super::landmarks::{PoseFrame, PoseLandmark};

const FALL_POINTS: [PoseLandmark; 5] = [
    PoseLandmark::Nose,
    PoseLandmark::LeftShoulder,
    PoseLandmark::RightShoulder,
    PoseLandmark::LeftHip,
    PoseLandmark::RightHip,
];

/// Fall detector configuration
#[derive(Debug, Clone)]
pub struct FallConfig {
    /// Minimum landmark visibility
    pub min_visibility: f32,
    /// Median window over per-frame velocities
    pub velocity_smooth_frames: usize,
    /// Downward velocity (normalized units/frame) counted as falling
    pub fall_velocity_threshold: f32,
    /// Confirmation counter value that reports a fall
    pub fall_confirmation_frames: u32,
    /// Points that must contribute a velocity
    pub min_points: usize,
}

impl Default for FallConfig {
    fn default() -> Self {
        Self {
            min_visibility: 0.5,
            velocity_smooth_frames: 5,
            fall_velocity_threshold: 0.02,
            fall_confirmation_frames: 3,
            min_points: 3,
        }
    }
}

/// Fall detector output for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FallStatus {
    pub is_fallen: bool,
    /// Head at or below the shoulder line (or fallen)
    pub is_slumping: bool,
    /// Smoothed downward velocity
    pub velocity: f32,
    /// Points that contributed this frame
    pub points: usize,
    /// Confirmation counter
    pub confirmation: u32,
}

/// Fall Detector
#[derive(Debug, Clone)]
pub struct FallDetector {
    config: FallConfig,
    prev_y: [Option<f32>; FALL_POINTS.len()],
    velocities: RingBuffer<f32>,
    confirmation: u32,
}

impl FallDetector {
    pub fn new() -> Self {
        Self::with_config(FallConfig::default())
    }

    pub fn with_config(config: FallConfig) -> Self {
        Self {
            prev_y: [None; FALL_POINTS.len()],
            velocities: RingBuffer::new(config.velocity_smooth_frames.max(1)),
            confirmation: 0,
            config,
        }
    }

    /// Process one pose frame. `None` clears all tracking state.
    pub fn update(&mut self, frame: Option<&PoseFrame>) -> FallStatus {
        let Some(frame) = frame else {
            self.reset();
            return FallStatus::default();
        };

        let mut weighted = 0.0f32;
        let mut weight_sum = 0.0f32;
        let mut points = 0usize;

        for (i, landmark) in FALL_POINTS.iter().enumerate() {
            let Some(point) = frame.visible(*landmark, self.config.min_visibility) else {
                continue;
            };
            if let Some(prev) = self.prev_y[i] {
                // Positive = moving down the image
                weighted += (point.y - prev) * point.visibility;
                weight_sum += point.visibility;
                points += 1;
            }
            self.prev_y[i] = Some(point.y);
        }

        let mut velocity = 0.0;
        if points < self.config.min_points || weight_sum <= 0.0 {
            self.confirmation = self.confirmation.saturating_sub(1);
        } else {
            self.velocities.push(weighted / weight_sum);
            velocity = median(&self.velocities.to_vec());

            if velocity > self.config.fall_velocity_threshold {
                self.confirmation += 1;
            } else {
                self.confirmation = self.confirmation.saturating_sub(1);
            }
        }

        let is_fallen = self.confirmation >= self.config.fall_confirmation_frames;
        if is_fallen {
            log::trace!("Fall confirmed (velocity {:.4}, {} points)", velocity, points);
        }

        FallStatus {
            is_fallen,
            is_slumping: is_fallen || self.head_below_shoulders(frame),
            velocity,
            points,
            confirmation: self.confirmation,
        }
    }

    fn head_below_shoulders(&self, frame: &PoseFrame) -> bool {
        let min_vis = self.config.min_visibility;
        let (Some(nose), Some(left), Some(right)) = (
            frame.visible(PoseLandmark::Nose, min_vis),
            frame.visible(PoseLandmark::LeftShoulder, min_vis),
            frame.visible(PoseLandmark::RightShoulder, min_vis),
        ) else {
            return false;
        };
        nose.y >= (left.y + right.y) / 2.0
    }

    pub fn reset(&mut self) {
        self.prev_y = [None; FALL_POINTS.len()];
        self.velocities.clear();
        self.confirmation = 0;
    }

    pub fn config(&self) -> &FallConfig {
        &self.config
    }
}

impl Default for FallDetector {
    fn default() -> Self {
        Self::new()
    }
}
