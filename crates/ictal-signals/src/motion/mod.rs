//! Motion module
//!
//! Spectral analysis of the per-frame optical-flow magnitude stream.

mod spectral_analyzer;

pub use spectral_analyzer::{MotionAnalysis, MotionAnalyzerConfig, MotionSpectralAnalyzer};
