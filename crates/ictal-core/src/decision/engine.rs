//! Decision Engine
//!
//! Fuses motion, pose and face signals into one debounced alert decision:
//! 1. Baseline calibration of the subject's normal motion level
//! 2. Adaptive motion threshold (more sensitive after a fall)
//! 3. Rule-based classification (see `classifier`)
//! 4. Consecutive-frame debouncing with per-type durations
//! 5. Display / cooldown state machine: one alert per episode
//!
//! Durations are counted in frames, so `process` must be called once per
//! frame at a steady cadence.

use ictal_signals::{FaceSignal, FallStatus, PoseScores, RingBuffer};

use super::classifier::{classify, Classification, RuleInputs, RuleThresholds, SeizureType};
use super::telemetry::{AlertEvent, MonitorStatus, Telemetry};

/// Counter above which the status reads "analyzing"
const ANALYZING_COUNTER: f32 = 5.0;

/// Consecutive frames required per seizure type
#[derive(Debug, Clone)]
pub struct Durations {
    pub clonic: u32,
    pub tonic: u32,
    pub atonic: u32,
    pub fall: u32,
    pub possible: u32,
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            clonic: 15,
            tonic: 20,
            atonic: 8,
            fall: 30,
            possible: 45,
        }
    }
}

impl Durations {
    pub fn for_type(&self, seizure_type: SeizureType) -> u32 {
        match seizure_type {
            SeizureType::Clonic => self.clonic,
            SeizureType::Tonic => self.tonic,
            SeizureType::Atonic => self.atonic,
            SeizureType::Fall => self.fall,
            SeizureType::Possible => self.possible,
        }
    }
}

/// Decision engine configuration
#[derive(Debug, Clone)]
pub struct DecisionConfig {
    /// Frame rate the frame-counted timers assume
    pub fps: f32,
    /// Base motion threshold
    pub motion_threshold: f32,
    /// Threshold cap while fallen or slumping
    pub fall_threshold: f32,
    /// Upper bound of the adaptive threshold
    pub threshold_ceiling: f32,
    /// Adaptive threshold = baseline x multiplier
    pub baseline_multiplier: f32,
    /// Calibration length in seconds (0 = skip)
    pub calibration_seconds: f32,
    /// Counter decrement on an unclassified frame
    pub counter_decay: f32,
    /// "Detected" display time after an alert
    pub display_seconds: f32,
    /// Suppression frames after the display
    pub cooldown_frames: u32,
    pub durations: Durations,
    pub rules: RuleThresholds,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            motion_threshold: 0.55,
            fall_threshold: 0.35,
            threshold_ceiling: 0.85,
            baseline_multiplier: 2.5,
            calibration_seconds: 5.0,
            counter_decay: 2.0,
            display_seconds: 3.0,
            cooldown_frames: 90,
            durations: Durations::default(),
            rules: RuleThresholds::default(),
        }
    }
}

impl DecisionConfig {
    pub fn calibration_frames(&self) -> u32 {
        (self.calibration_seconds * self.fps).round().max(0.0) as u32
    }

    pub fn display_frames(&self) -> u32 {
        (self.display_seconds * self.fps).round().max(0.0) as u32
    }

    /// Whole seconds of display left, rounded up so the countdown starts at
    /// `display_seconds` and only reads 0 once the display is over.
    pub fn display_secs(&self, frames: u32) -> u32 {
        (frames as f32 / self.fps.max(1.0)).ceil() as u32
    }
}

/// Motion input for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionSignal {
    /// Smoothed seizure-band confidence (0-1)
    pub confidence: f32,
    pub dominant_frequency_hz: Option<f32>,
    /// Caller clock, microseconds
    pub timestamp_us: i64,
}

/// Pose input for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSignal {
    pub tremor: f32,
    pub rigidity: f32,
    pub is_rigid: bool,
    pub symmetry: f32,
    pub overall_activity: f32,
    pub is_fallen: bool,
    pub is_slumping: bool,
}

impl Default for PoseSignal {
    fn default() -> Self {
        Self {
            tremor: 0.0,
            rigidity: 0.0,
            is_rigid: false,
            symmetry: 1.0,
            overall_activity: 0.0,
            is_fallen: false,
            is_slumping: false,
        }
    }
}

impl PoseSignal {
    pub fn from_parts(scores: &PoseScores, fall: &FallStatus) -> Self {
        Self {
            tremor: scores.tremor,
            rigidity: scores.rigidity,
            is_rigid: scores.is_rigid,
            symmetry: scores.symmetry,
            overall_activity: scores.overall_activity,
            is_fallen: fall.is_fallen,
            is_slumping: fall.is_slumping,
        }
    }
}

/// Engine output for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub alert: bool,
    pub telemetry: Telemetry,
}

impl Decision {
    /// The alert payload when this frame triggered.
    pub fn alert_event(&self) -> Option<AlertEvent> {
        if !self.alert {
            return None;
        }
        AlertEvent::from_telemetry(&self.telemetry)
    }
}

/// Decision Engine
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: DecisionConfig,
    counter: f32,
    cooldown: u32,
    display: u32,
    baseline: f32,
    baseline_samples: u32,
    calibrated: bool,
    alert_count: u32,
    motion_history: RingBuffer<f32>,
    frame_index: u64,
}

impl DecisionEngine {
    pub fn new() -> Self {
        Self::with_config(DecisionConfig::default())
    }

    pub fn with_config(config: DecisionConfig) -> Self {
        let history = RingBuffer::new(config.rules.drop_window().max(1));
        let calibrated = config.calibration_frames() == 0;
        Self {
            config,
            counter: 0.0,
            cooldown: 0,
            display: 0,
            baseline: 0.0,
            baseline_samples: 0,
            calibrated,
            alert_count: 0,
            motion_history: history,
            frame_index: 0,
        }
    }

    /// Process one frame.
    pub fn process(&mut self, motion: &MotionSignal, pose: &PoseSignal, face: &FaceSignal) -> Decision {
        let frame_index = self.frame_index;
        self.frame_index += 1;
        self.motion_history.push(motion.confidence);

        let threshold = self.active_threshold(pose.is_fallen || pose.is_slumping);

        // Alert already raised: show it, then suppress
        if self.display > 0 {
            self.display -= 1;
            let remaining_secs = self.config.display_secs(self.display);
            let status = MonitorStatus::Detected { remaining_secs };
            return self.quiet(frame_index, status, threshold, None, motion, pose, face);
        }
        if self.cooldown > 0 {
            self.cooldown -= 1;
            return self.quiet(frame_index, MonitorStatus::Cooldown, threshold, None, motion, pose, face);
        }

        if !self.calibrated {
            self.update_baseline(motion.confidence);
        }

        let history = self.motion_history.to_vec();
        let inputs = RuleInputs {
            motion,
            pose,
            face,
            threshold,
            motion_history: &history,
        };
        let classification = classify(&inputs, &self.config.rules);

        match classification.and_then(|c| c.seizure_type) {
            Some(_) => self.counter += 1.0,
            None => self.counter = (self.counter - self.config.counter_decay).max(0.0),
        }

        if let Some(c) = classification {
            if let Some(seizure_type) = c.seizure_type {
                if self.counter >= self.config.durations.for_type(seizure_type) as f32 {
                    return self.trigger(frame_index, c, seizure_type, threshold, motion, pose, face);
                }
            }
        }

        let status = self.status(pose.is_fallen);
        self.quiet(frame_index, status, threshold, classification, motion, pose, face)
    }

    fn update_baseline(&mut self, confidence: f32) {
        self.baseline_samples += 1;
        self.baseline += (confidence - self.baseline) / self.baseline_samples as f32;

        if self.baseline_samples >= self.config.calibration_frames() {
            self.calibrated = true;
            log::info!(
                "Calibration complete: baseline motion {:.3} over {} frames",
                self.baseline,
                self.baseline_samples
            );
        }
    }

    /// Motion threshold for the current frame.
    pub fn active_threshold(&self, fallen_or_slumping: bool) -> f32 {
        let base = self.config.motion_threshold;
        let mut threshold = if self.calibrated {
            base.max(self.baseline * self.config.baseline_multiplier)
                .min(self.config.threshold_ceiling)
        } else {
            base
        };
        if fallen_or_slumping {
            threshold = threshold.min(self.config.fall_threshold);
        }
        threshold
    }

    #[allow(clippy::too_many_arguments)]
    fn trigger(
        &mut self,
        frame_index: u64,
        classification: Classification,
        seizure_type: SeizureType,
        threshold: f32,
        motion: &MotionSignal,
        pose: &PoseSignal,
        face: &FaceSignal,
    ) -> Decision {
        self.alert_count += 1;
        self.display = self.config.display_frames();
        self.cooldown = self.config.cooldown_frames;
        self.counter = 0.0;

        log::info!(
            "Seizure alert #{}: {} via {:?} (risk {:.2}) at frame {}",
            self.alert_count,
            seizure_type,
            classification.rule,
            classification.risk,
            frame_index
        );

        let remaining_secs = self.config.display_secs(self.display);
        let mut telemetry = self.telemetry(
            frame_index,
            MonitorStatus::Detected { remaining_secs },
            threshold,
            Some(classification),
            motion,
            pose,
            face,
        );
        telemetry.alert_sequence = Some(self.alert_count);

        Decision {
            alert: true,
            telemetry,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn quiet(
        &self,
        frame_index: u64,
        status: MonitorStatus,
        threshold: f32,
        classification: Option<Classification>,
        motion: &MotionSignal,
        pose: &PoseSignal,
        face: &FaceSignal,
    ) -> Decision {
        Decision {
            alert: false,
            telemetry: self.telemetry(frame_index, status, threshold, classification, motion, pose, face),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn telemetry(
        &self,
        frame_index: u64,
        status: MonitorStatus,
        threshold: f32,
        classification: Option<Classification>,
        motion: &MotionSignal,
        pose: &PoseSignal,
        face: &FaceSignal,
    ) -> Telemetry {
        let (risk, reason) = match classification {
            Some(c) => (c.risk, c.rule.reason().to_string()),
            None => (motion.confidence, String::new()),
        };
        Telemetry {
            frame_index,
            timestamp_us: motion.timestamp_us,
            status,
            risk,
            counter: self.counter,
            threshold,
            calibrated: self.calibrated,
            baseline: self.baseline,
            classification: classification.and_then(|c| c.seizure_type),
            rule: classification.map(|c| c.rule),
            reason,
            alert_sequence: None,
            motion_confidence: motion.confidence,
            dominant_frequency_hz: motion.dominant_frequency_hz,
            tremor: pose.tremor,
            head_shake: face.head_shake_score,
            is_fallen: pose.is_fallen,
        }
    }

    fn status(&self, is_fallen: bool) -> MonitorStatus {
        if !self.calibrated && self.counter <= ANALYZING_COUNTER {
            MonitorStatus::Calibrating
        } else if is_fallen {
            MonitorStatus::FallWarning
        } else if self.counter > ANALYZING_COUNTER {
            MonitorStatus::Analyzing
        } else {
            MonitorStatus::Monitoring
        }
    }

    pub fn counter(&self) -> f32 {
        self.counter
    }

    pub fn alert_count(&self) -> u32 {
        self.alert_count
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    pub fn baseline(&self) -> f32 {
        self.baseline
    }

    /// Display or cooldown timer running
    pub fn is_suppressed(&self) -> bool {
        self.display > 0 || self.cooldown > 0
    }

    /// Clear counters, timers and history; a learned baseline is kept.
    pub fn reset(&mut self) {
        self.counter = 0.0;
        self.cooldown = 0;
        self.display = 0;
        self.alert_count = 0;
        self.motion_history.clear();
        self.frame_index = 0;
    }

    /// Forget the baseline and calibrate again.
    pub fn reset_calibration(&mut self) {
        self.baseline = 0.0;
        self.baseline_samples = 0;
        self.calibrated = self.config.calibration_frames() == 0;
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new()
    }
}
