//! Seizure Monitor
//!
//! Per-frame pipeline that wires the signal processors into the decision
//! engine:
//! tracker -> ROI choice -> motion source -> spectral analyzer ->
//! pose / fall / face -> decision engine -> alert sink.
//!
//! Frame acquisition, optical flow and alert delivery stay outside the core
//! behind the `MotionSource` and `AlertSink` traits.

use ictal_signals::{
    BoundingBox, FaceFrame, FaceSignal, FaceSignalExtractor, FallDetector, FallStatus,
    ForegroundMask, ForegroundTracker, MotionAnalysis, MotionSpectralAnalyzer, PoseFrame,
    PoseScores, PoseSignalExtractor, TrackEvent,
};

use crate::config::MonitorConfig;
use crate::decision::{AlertEvent, Decision, DecisionEngine, MotionSignal, PoseSignal};

/// Region the motion source should measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisRegion {
    /// Stabilized subject box
    Roi(BoundingBox),
    /// Whole frame (no subject, or subject too small)
    FullFrame { width: u32, height: u32 },
}

impl AnalysisRegion {
    pub fn pixel_count(&self) -> usize {
        match self {
            AnalysisRegion::Roi(bbox) => bbox.area() as usize,
            AnalysisRegion::FullFrame { width, height } => *width as usize * *height as usize,
        }
    }

    pub fn is_roi(&self) -> bool {
        matches!(self, AnalysisRegion::Roi(_))
    }
}

/// Optical-flow measurement over a region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionMeasurement {
    /// Mean flow magnitude
    pub magnitude: f32,
    /// Pixels the magnitude was measured over
    pub pixel_count: usize,
}

/// Optical-flow collaborator.
pub trait MotionSource {
    /// Measure motion over `region`; `None` when nothing could be measured.
    fn measure(&mut self, region: AnalysisRegion) -> Option<MotionMeasurement>;
}

impl<F> MotionSource for F
where
    F: FnMut(AnalysisRegion) -> Option<MotionMeasurement>,
{
    fn measure(&mut self, region: AnalysisRegion) -> Option<MotionMeasurement> {
        self(region)
    }
}

/// Alert delivery collaborator (audio, messaging, event log).
pub trait AlertSink {
    fn dispatch(&mut self, event: &AlertEvent);
}

impl AlertSink for Vec<AlertEvent> {
    fn dispatch(&mut self, event: &AlertEvent) {
        self.push(event.clone());
    }
}

/// Inputs of one frame
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub timestamp_us: i64,
    pub frame_width: u32,
    pub frame_height: u32,
    pub foreground: Option<&'a ForegroundMask>,
    pub pose: Option<&'a PoseFrame>,
    pub face: Option<&'a FaceFrame>,
}

impl<'a> FrameInput<'a> {
    /// Frame with no collaborator output yet.
    pub fn new(timestamp_us: i64, frame_width: u32, frame_height: u32) -> Self {
        Self {
            timestamp_us,
            frame_width,
            frame_height,
            foreground: None,
            pose: None,
            face: None,
        }
    }

    pub fn with_foreground(mut self, mask: &'a ForegroundMask) -> Self {
        self.foreground = Some(mask);
        self
    }

    pub fn with_pose(mut self, pose: &'a PoseFrame) -> Self {
        self.pose = Some(pose);
        self
    }

    pub fn with_face(mut self, face: &'a FaceFrame) -> Self {
        self.face = Some(face);
        self
    }

    pub fn frame_area(&self) -> u64 {
        self.frame_width as u64 * self.frame_height as u64
    }
}

/// Everything computed for one frame
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub region: AnalysisRegion,
    pub stable_box: Option<BoundingBox>,
    pub track_event: TrackEvent,
    pub motion: MotionAnalysis,
    pub pose: PoseScores,
    pub fall: FallStatus,
    pub face: FaceSignal,
    pub decision: Decision,
}

impl FrameReport {
    pub fn alert(&self) -> bool {
        self.decision.alert
    }
}

/// Seizure Monitor
#[derive(Debug, Clone)]
pub struct SeizureMonitor {
    config: MonitorConfig,

    tracker: ForegroundTracker,
    motion: MotionSpectralAnalyzer,
    pose: PoseSignalExtractor,
    fall: FallDetector,
    face: FaceSignalExtractor,
    engine: DecisionEngine,

    frame_count: u64,
}

impl SeizureMonitor {
    pub fn new() -> Self {
        Self::with_config(MonitorConfig::default())
    }

    pub fn with_config(config: MonitorConfig) -> Self {
        Self {
            tracker: ForegroundTracker::with_config(config.tracker_config()),
            motion: MotionSpectralAnalyzer::with_config(config.motion_config()),
            pose: PoseSignalExtractor::with_config(config.pose_config()),
            fall: FallDetector::with_config(config.fall_config()),
            face: FaceSignalExtractor::with_config(config.face_config()),
            engine: DecisionEngine::with_config(config.decision_config()),
            config,
            frame_count: 0,
        }
    }

    /// Process a single frame
    pub fn process_frame<M, S>(&mut self, input: FrameInput<'_>, motion: &mut M, sink: &mut S) -> FrameReport
    where
        M: MotionSource + ?Sized,
        S: AlertSink + ?Sized,
    {
        self.frame_count += 1;

        // 1. Subject tracking
        let stable_box = self.tracker.update_with_config_ratio(input.foreground);
        let track_event = self.tracker.last_event();
        if track_event.is_retarget() {
            log::debug!("Subject {:?}, clearing per-subject history", track_event);
            self.motion.reset();
            self.pose.reset();
            self.fall.reset();
            self.face.reset();
        }

        // 2. Region choice
        let region = self.select_region(stable_box, &input);

        // 3. Motion
        let measurement = motion.measure(region).unwrap_or(MotionMeasurement {
            magnitude: 0.0,
            pixel_count: region.pixel_count(),
        });
        let confidence = self
            .motion
            .score_at(measurement.magnitude, measurement.pixel_count, input.timestamp_us);
        let motion_analysis = self.motion.last_analysis().clone();

        // 4. Pose, fall, face
        let pose_scores = self.pose.update(input.pose);
        let fall_status = self.fall.update(input.pose);
        let face_signal = self.face.update(input.face);

        // 5. Decision
        let motion_signal = MotionSignal {
            confidence,
            dominant_frequency_hz: motion_analysis.dominant_frequency_hz,
            timestamp_us: input.timestamp_us,
        };
        let pose_signal = PoseSignal::from_parts(&pose_scores, &fall_status);
        let decision = self.engine.process(&motion_signal, &pose_signal, &face_signal);

        if let Some(event) = decision.alert_event() {
            sink.dispatch(&event);
        }

        FrameReport {
            region,
            stable_box,
            track_event,
            motion: motion_analysis,
            pose: pose_scores,
            fall: fall_status,
            face: face_signal,
            decision,
        }
    }

    /// ROI when the subject box covers at least `min_roi_ratio` of the frame.
    fn select_region(&self, stable_box: Option<BoundingBox>, input: &FrameInput<'_>) -> AnalysisRegion {
        let full = AnalysisRegion::FullFrame {
            width: input.frame_width,
            height: input.frame_height,
        };
        let frame_area = input.frame_area();
        match stable_box {
            Some(bbox) if frame_area > 0 => {
                let ratio = bbox.area() as f64 / frame_area as f64;
                if ratio >= self.config.capture.min_roi_ratio as f64 {
                    AnalysisRegion::Roi(bbox)
                } else {
                    full
                }
            }
            _ => full,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    pub fn tracker(&self) -> &ForegroundTracker {
        &self.tracker
    }

    /// Motion confidence after the last frame
    pub fn motion_confidence(&self) -> f32 {
        self.motion.confidence()
    }

    /// Reset every component (e.g. camera reconnect). The learned baseline
    /// is kept.
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.motion.reset();
        self.pose.reset();
        self.fall.reset();
        self.face.reset();
        self.engine.reset();
        self.frame_count = 0;
        log::info!("Monitor reset");
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

impl Default for SeizureMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_motion(_: AnalysisRegion) -> Option<MotionMeasurement> {
        None
    }

    #[test]
    fn test_full_frame_without_subject() {
        let mut monitor = SeizureMonitor::new();
        let mut sink: Vec<AlertEvent> = Vec::new();
        let report = monitor.process_frame(FrameInput::new(0, 320, 240), &mut no_motion, &mut sink);
        assert_eq!(report.region, AnalysisRegion::FullFrame { width: 320, height: 240 });
        assert_eq!(report.region.pixel_count(), 76_800);
        assert!(!report.alert());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_roi_selected_for_large_subject() {
        let mut monitor = SeizureMonitor::new();
        let mut mask = ForegroundMask::empty(320, 240);
        mask.fill_rect(BoundingBox::new(100, 40, 80, 150));

        let mut seen = Vec::new();
        let mut source = |region: AnalysisRegion| {
            seen.push(region);
            Some(MotionMeasurement {
                magnitude: 0.0,
                pixel_count: region.pixel_count(),
            })
        };
        let mut sink: Vec<AlertEvent> = Vec::new();
        let input = FrameInput::new(0, 320, 240).with_foreground(&mask);
        let report = monitor.process_frame(input, &mut source, &mut sink);

        let expected = AnalysisRegion::Roi(BoundingBox::new(100, 40, 80, 150));
        assert_eq!(report.region, expected);
        assert_eq!(report.track_event, TrackEvent::Acquired);
        assert_eq!(seen, vec![expected]);
    }

    #[test]
    fn test_small_subject_falls_back_to_full_frame() {
        let mut config = MonitorConfig::default();
        config.capture.min_roi_ratio = 0.5;
        let mut monitor = SeizureMonitor::with_config(config);

        let mut mask = ForegroundMask::empty(320, 240);
        mask.fill_rect(BoundingBox::new(100, 40, 80, 150));
        let mut sink: Vec<AlertEvent> = Vec::new();
        let input = FrameInput::new(0, 320, 240).with_foreground(&mask);
        let report = monitor.process_frame(input, &mut no_motion, &mut sink);

        assert!(!report.region.is_roi());
        assert_eq!(report.stable_box, Some(BoundingBox::new(100, 40, 80, 150)));
    }

    #[test]
    fn test_monitor_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<SeizureMonitor>();
        assert_send::<FrameReport>();
    }

    #[test]
    fn test_reset_clears_counters() {
        let mut monitor = SeizureMonitor::new();
        let mut sink: Vec<AlertEvent> = Vec::new();
        for i in 0..3 {
            monitor.process_frame(FrameInput::new(i * 33_333, 320, 240), &mut no_motion, &mut sink);
        }
        assert_eq!(monitor.frame_count(), 3);
        monitor.reset();
        assert_eq!(monitor.frame_count(), 0);
        assert_eq!(monitor.tracker().stable_box(), None);
        assert_eq!(monitor.engine().counter(), 0.0);
    }
}
