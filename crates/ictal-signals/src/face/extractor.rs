//! Face signal extraction
//!
//! Head shake from nose-tip oscillation, facial distortion from eye/mouth
//! aspect-ratio variance, and a wide-open-mouth flag (tonic gasping).

use crate::dsp::{std_dev_slice, RingBuffer};
use crate::landmarks::direction_changes;

use super::landmarks::{FaceFrame, FaceLandmark};

/// Face extractor configuration
#[derive(Debug, Clone)]
pub struct FaceConfig {
    /// History length in frames
    pub history_size: usize,
    /// Samples needed before shake/distortion are scored
    pub min_samples: usize,
    /// MAR above which the mouth counts as wide open
    pub mouth_open_ratio: f32,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            history_size: 10,
            min_samples: 5,
            mouth_open_ratio: 0.6,
        }
    }
}

/// Face summary consumed by the decision engine
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FaceSignal {
    /// Head shake score (0-1)
    pub head_shake_score: f32,
    /// Facial distortion (0-1)
    pub facial_distortion: f32,
    pub mouth_open_wide: bool,
    pub face_detected: bool,
}

/// Face Signal Extractor
#[derive(Debug, Clone)]
pub struct FaceSignalExtractor {
    config: FaceConfig,
    nose_x: RingBuffer<f32>,
    nose_y: RingBuffer<f32>,
    ear_history: RingBuffer<f32>,
    mar_history: RingBuffer<f32>,
}

impl FaceSignalExtractor {
    pub fn new() -> Self {
        Self::with_config(FaceConfig::default())
    }

    pub fn with_config(config: FaceConfig) -> Self {
        let capacity = config.history_size.max(1);
        Self {
            nose_x: RingBuffer::new(capacity),
            nose_y: RingBuffer::new(capacity),
            ear_history: RingBuffer::new(capacity),
            mar_history: RingBuffer::new(capacity),
            config,
        }
    }

    /// Process one frame. A missing or incomplete mesh resets the history.
    pub fn update(&mut self, frame: Option<&FaceFrame>) -> FaceSignal {
        let Some(frame) = frame.filter(|f| f.is_complete()) else {
            if !self.nose_x.is_empty() {
                log::debug!("Face tracking lost, clearing face history");
            }
            self.reset();
            return FaceSignal::default();
        };

        let (Some(nose), Some(ear), Some(mar)) = (
            frame.get(FaceLandmark::NoseTip),
            eye_aspect_ratio(frame),
            mouth_aspect_ratio(frame),
        ) else {
            self.reset();
            return FaceSignal::default();
        };

        self.nose_x.push(nose.x);
        self.nose_y.push(nose.y);
        self.ear_history.push(ear);
        self.mar_history.push(mar);

        FaceSignal {
            head_shake_score: self.head_shake(),
            facial_distortion: self.distortion(),
            mouth_open_wide: mar > self.config.mouth_open_ratio,
            face_detected: true,
        }
    }

    fn head_shake(&self) -> f32 {
        if self.nose_x.len() < self.config.min_samples {
            return 0.0;
        }
        let xs = self.nose_x.to_vec();
        let ys = self.nose_y.to_vec();

        let changes = direction_changes(&xs) + direction_changes(&ys);
        let oscillation = changes as f32 / (2 * self.nose_x.capacity()) as f32;
        let movement = ((std_dev_slice(&xs) * 100.0 + std_dev_slice(&ys) * 100.0) / 2.0).min(1.0);

        ((oscillation * 0.5 + movement * 0.3) * 1.5).min(1.0)
    }

    fn distortion(&self) -> f32 {
        if self.ear_history.len() < self.config.min_samples {
            return 0.0;
        }
        let ear_var = std_dev_slice(&self.ear_history.to_vec()) * 10.0;
        let mar_var = std_dev_slice(&self.mar_history.to_vec()) * 5.0;
        (ear_var + mar_var).min(1.0)
    }

    pub fn reset(&mut self) {
        self.nose_x.clear();
        self.nose_y.clear();
        self.ear_history.clear();
        self.mar_history.clear();
    }

    pub fn config(&self) -> &FaceConfig {
        &self.config
    }
}

impl Default for FaceSignalExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn ratio(vertical: f32, horizontal: f32) -> f32 {
    if horizontal > 0.0 {
        vertical / horizontal
    } else {
        0.0
    }
}

/// Mean eye aspect ratio (lid gap over eye width) of both eyes.
pub fn eye_aspect_ratio(frame: &FaceFrame) -> Option<f32> {
    let eye = |top: FaceLandmark, bottom: FaceLandmark, outer: FaceLandmark, inner: FaceLandmark| -> Option<f32> {
        let top = frame.get(top)?;
        let bottom = frame.get(bottom)?;
        let outer = frame.get(outer)?;
        let inner = frame.get(inner)?;
        Some(ratio((top.y - bottom.y).abs(), (outer.x - inner.x).abs()))
    };
    let left = eye(
        FaceLandmark::LeftEyeTop,
        FaceLandmark::LeftEyeBottom,
        FaceLandmark::LeftEyeOuter,
        FaceLandmark::LeftEyeInner,
    )?;
    let right = eye(
        FaceLandmark::RightEyeTop,
        FaceLandmark::RightEyeBottom,
        FaceLandmark::RightEyeOuter,
        FaceLandmark::RightEyeInner,
    )?;
    Some((left + right) / 2.0)
}

/// Mouth aspect ratio (lip gap over mouth width).
pub fn mouth_aspect_ratio(frame: &FaceFrame) -> Option<f32> {
    let upper = frame.get(FaceLandmark::UpperLip)?;
    let lower = frame.get(FaceLandmark::LowerLip)?;
    let left = frame.get(FaceLandmark::LeftMouth)?;
    let right = frame.get(FaceLandmark::RightMouth)?;
    Some(ratio((upper.y - lower.y).abs(), (left.x - right.x).abs()))
}
