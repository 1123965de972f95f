//! # ictal-signals
//!
//! Per-frame signal processors for camera-based seizure monitoring.
//!
//! This crate provides:
//! - **DSP**: fixed-capacity ring buffer, Hann window, band power, band-pass filter
//! - **Motion**: spectral seizure-band confidence from optical-flow magnitude
//! - **Vision**: foreground blob extraction and IoU-stabilized subject tracking
//! - **Pose**: tremor, rigidity, symmetry and fall signals from body landmarks
//! - **Face**: head shake, facial distortion and mouth-open signals from face landmarks
//!
//! Every processor is stateful, single-threaded and infallible: degenerate
//! input yields "no signal this frame" instead of an error.
//!
//! ## Example
//!
//! ```ignore
//! use ictal_signals::{MotionSpectralAnalyzer, ForegroundTracker};
//!
//! let mut tracker = ForegroundTracker::new();
//! let mut analyzer = MotionSpectralAnalyzer::new();
//!
//! for frame in frames {
//!     let roi = tracker.update(frame.mask.as_ref(), 0.02);
//!     let confidence = analyzer.score(frame.flow_magnitude, frame.pixel_count);
//!     println!("roi={:?} confidence={:.2}", roi, confidence);
//! }
//! ```

pub mod dsp;
pub mod face;
pub mod landmarks;
pub mod motion;
pub mod pose;
pub mod vision;

pub use dsp::{RingBuffer, SpectralBand};
pub use face::{FaceConfig, FaceFrame, FaceSignal, FaceSignalExtractor};
pub use landmarks::LandmarkPoint;
pub use motion::{MotionAnalysis, MotionAnalyzerConfig, MotionSpectralAnalyzer};
pub use pose::{
    FallConfig, FallDetector, FallStatus, PoseConfig, PoseFrame, PoseLandmark, PoseScores,
    PoseSignalExtractor,
};
pub use vision::{BoundingBox, ForegroundMask, ForegroundTracker, TrackEvent, TrackerConfig};
