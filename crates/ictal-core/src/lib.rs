//! # ictal-core
//!
//! Decision layer and per-frame pipeline for camera-based seizure monitoring.
//!
//! - **config**: TOML + environment configuration for every component
//! - **decision**: rule-based classification, debouncing, calibration and the
//!   display/cooldown state machine
//! - **monitor**: `SeizureMonitor`, wiring tracker, motion, pose and face
//!   processors into the decision engine
//!
//! The core performs no I/O per frame: optical flow is requested through
//! `MotionSource` and alerts are handed to an `AlertSink`.
//!
//! ## Example
//!
//! ```ignore
//! use ictal_core::{FrameInput, MonitorConfig, SeizureMonitor};
//!
//! let config = MonitorConfig::load_layered(Some(Path::new("ictal.toml")), None)?;
//! let mut monitor = SeizureMonitor::with_config(config);
//! let mut alerts = Vec::new();
//!
//! for frame in camera {
//!     let input = FrameInput::new(frame.timestamp_us, frame.width, frame.height)
//!         .with_foreground(&frame.mask);
//!     let report = monitor.process_frame(input, &mut flow, &mut alerts);
//!     println!("{}", report.decision.telemetry.status);
//! }
//! ```

pub mod config;
pub mod decision;
pub mod monitor;

pub use config::{ConfigError, MonitorConfig};
pub use decision::{
    AlertEvent, Decision, DecisionConfig, DecisionEngine, MonitorStatus, MotionSignal, PoseSignal,
    Rule, SeizureType, Telemetry,
};
pub use monitor::{
    AlertSink, AnalysisRegion, FrameInput, FrameReport, MotionMeasurement, MotionSource,
    SeizureMonitor,
};

pub use ictal_signals;
