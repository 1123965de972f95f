//! Spectral seizure-band confidence from per-frame motion magnitude
//!
//! Buffers frame-size-normalized optical-flow magnitudes, gates idle noise and
//! scores how much of the oscillation energy falls into the seizure band.
//!
//! # Algorithm
//!
//! ```text
//! magnitude ──► normalize ──► noise gate ──► ring buffer (BUFFER_SIZE)
//!                                 │                 │ full
//!                       decay ×0.9│                 ▼
//!                                 │      detrend ─► std gate ─► band-pass
//!                                 │                 │
//!                                 │                 ▼
//!                                 │      Hann ─► FFT @ estimated fs ─► band powers
//!                                 │                 │
//!                                 │                 ▼
//!                                 │      energy gate ─► ratio/energy blend ─► EMA
//!                                 ▼                                            │
//!                              confidence ◄────────────────────────────────────┘
//! ```

use crate::dsp::{
    bandpass_filter, detrend, estimate_sample_rate, std_dev, PowerSpectrum, RingBuffer,
    SpectralBand,
};

/// Motion analyzer configuration
#[derive(Debug, Clone)]
pub struct MotionAnalyzerConfig {
    /// Nominal frame rate, used when timestamps cannot be trusted
    pub fps_assumed: f32,
    /// Number of samples analyzed per spectrum (FPS_ASSUMED x BUFFER_SECONDS)
    pub buffer_size: usize,
    /// Normalized magnitude below which the frame counts as idle
    pub noise_floor: f32,
    /// Minimum absolute seizure-band power for a trustworthy ratio
    pub energy_noise_floor: f32,
    /// EMA weight of the newest raw confidence (0-1]
    pub ema_alpha: f32,
    /// Clonic oscillation band
    pub seizure_band: SpectralBand,
    /// Broad band of relevant body motion; also the band-pass corners
    pub total_band: SpectralBand,
    /// Multiplier applied to the blended confidence before clipping
    pub confidence_scale: f32,
    /// Band-pass the buffer before the FFT
    pub bandpass_enabled: bool,
    /// Pixel count the magnitudes are normalized to (200x150 processing frame)
    pub reference_pixel_count: usize,
    /// Per-frame decay of the smoothed score while idle
    pub idle_decay: f32,
    /// Minimum standard deviation of the detrended buffer
    pub min_std: f32,
}

impl Default for MotionAnalyzerConfig {
    fn default() -> Self {
        Self {
            fps_assumed: 30.0,
            buffer_size: 60,
            noise_floor: 0.15,
            energy_noise_floor: 5.0,
            ema_alpha: 0.3,
            seizure_band: SpectralBand::new(2.0, 7.0),
            total_band: SpectralBand::new(0.5, 10.0),
            confidence_scale: 1.2,
            bandpass_enabled: true,
            reference_pixel_count: 200 * 150,
            idle_decay: 0.9,
            min_std: 0.01,
        }
    }
}

impl MotionAnalyzerConfig {
    /// Buffer capacity for `seconds` of history at `fps`.
    pub fn buffer_size_for(fps: f32, seconds: f32) -> usize {
        (fps * seconds).round().max(1.0) as usize
    }
}

/// Diagnostics of the most recent frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionAnalysis {
    /// Unsmoothed confidence of this frame
    pub raw_confidence: f32,
    /// EMA-smoothed confidence returned to the caller
    pub confidence: f32,
    /// Normalized magnitude pushed into the buffer
    pub normalized_magnitude: f32,
    /// Frame fell below the noise floor
    pub gated: bool,
    /// Seizure-band power / total-band power
    pub seizure_ratio: f32,
    pub seizure_power: f32,
    pub total_power: f32,
    /// Strongest frequency inside the total band
    pub dominant_frequency_hz: Option<f32>,
    /// Sample rate used for the frequency axis
    pub sample_rate_hz: f32,
    /// Band-pass filter was applied
    pub filtered: bool,
}

/// Converts per-frame motion magnitude into a smoothed seizure-band confidence.
#[derive(Debug, Clone)]
pub struct MotionSpectralAnalyzer {
    config: MotionAnalyzerConfig,
    samples: RingBuffer<f32>,
    timestamps: RingBuffer<i64>,
    spectrum: PowerSpectrum,
    smoothed: f32,
    /// Timestamp assigned by `score` to the next sample
    nominal_clock_us: i64,
    last: MotionAnalysis,
}

impl MotionSpectralAnalyzer {
    /// Create with default config
    pub fn new() -> Self {
        Self::with_config(MotionAnalyzerConfig::default())
    }

    /// Create with custom config
    pub fn with_config(config: MotionAnalyzerConfig) -> Self {
        let size = config.buffer_size.max(2);
        Self {
            samples: RingBuffer::new(size),
            timestamps: RingBuffer::new(size),
            spectrum: PowerSpectrum::new(size),
            smoothed: 0.0,
            nominal_clock_us: 0,
            last: MotionAnalysis::default(),
            config,
        }
    }

    /// Score one frame stamped at the nominal `1 / fps_assumed` cadence.
    ///
    /// # Arguments
    /// * `motion_magnitude` - Mean optical-flow magnitude of the analyzed region
    /// * `frame_pixel_count` - Pixel count of the region the flow was computed on
    ///
    /// # Returns
    /// Smoothed seizure-band confidence in [0, 1]
    pub fn score(&mut self, motion_magnitude: f32, frame_pixel_count: usize) -> f32 {
        let ts = self.nominal_clock_us;
        self.score_at(motion_magnitude, frame_pixel_count, ts)
    }

    /// Score one frame captured at `timestamp_us`.
    pub fn score_at(&mut self, motion_magnitude: f32, frame_pixel_count: usize, timestamp_us: i64) -> f32 {
        self.nominal_clock_us = timestamp_us + self.frame_interval_us();

        let normalized = self.normalize(motion_magnitude, frame_pixel_count);
        match normalized {
            Some(value) if value >= self.config.noise_floor => {
                self.push(value, timestamp_us);
                let mut analysis = if self.samples.is_full() {
                    self.analyze()
                } else {
                    MotionAnalysis::default()
                };
                let alpha = self.config.ema_alpha.clamp(0.0, 1.0);
                self.smoothed = (alpha * analysis.raw_confidence + (1.0 - alpha) * self.smoothed).clamp(0.0, 1.0);
                analysis.confidence = self.smoothed;
                analysis.normalized_magnitude = value;
                self.last = analysis;
            }
            _ => {
                // Idle: keep FFT cadence with a zero sample, fade the score out
                self.push(0.0, timestamp_us);
                self.smoothed *= self.config.idle_decay.clamp(0.0, 1.0);
                self.last = MotionAnalysis {
                    confidence: self.smoothed,
                    gated: true,
                    normalized_magnitude: normalized.unwrap_or(0.0),
                    ..MotionAnalysis::default()
                };
            }
        }

        self.smoothed
    }

    fn frame_interval_us(&self) -> i64 {
        (1_000_000.0 / self.config.fps_assumed.max(1.0)).round() as i64
    }

    fn normalize(&self, magnitude: f32, pixel_count: usize) -> Option<f32> {
        if pixel_count == 0 || !magnitude.is_finite() || magnitude < 0.0 {
            return None;
        }
        let scale = (self.config.reference_pixel_count as f32 / pixel_count as f32).sqrt();
        Some(magnitude * scale)
    }

    fn push(&mut self, value: f32, timestamp_us: i64) {
        self.samples.push(value);
        self.timestamps.push(timestamp_us);
    }

    fn analyze(&self) -> MotionAnalysis {
        let mut analysis = MotionAnalysis::default();

        let centered = detrend(&self.samples.to_array());
        if std_dev(&centered) < self.config.min_std {
            return analysis;
        }

        let sample_rate = estimate_sample_rate(&self.timestamps.to_vec()).unwrap_or_else(|| {
            log::trace!("no usable frame intervals, assuming {} fps", self.config.fps_assumed);
            self.config.fps_assumed
        });
        analysis.sample_rate_hz = sample_rate;

        let signal = if self.config.bandpass_enabled {
            match bandpass_filter(&centered, sample_rate, &self.config.total_band) {
                Some(filtered) => {
                    analysis.filtered = true;
                    filtered
                }
                None => centered,
            }
        } else {
            centered
        };

        let spectrum = match self.spectrum.compute(&signal, sample_rate) {
            Some(s) => s,
            None => return analysis,
        };

        let total_power = spectrum.band_power(&self.config.total_band);
        let seizure_power = spectrum.band_power(&self.config.seizure_band);
        analysis.total_power = total_power;
        analysis.seizure_power = seizure_power;
        analysis.dominant_frequency_hz = spectrum.peak_frequency(&self.config.total_band);

        // A high ratio from near-zero absolute energy is noise
        if seizure_power < self.config.energy_noise_floor || total_power < 1e-6 {
            return analysis;
        }

        let ratio = (seizure_power / total_power).min(1.0);
        let energy_confidence = if self.config.energy_noise_floor > 0.0 {
            (seizure_power / (self.config.energy_noise_floor * 3.0)).min(1.0)
        } else {
            1.0
        };

        analysis.seizure_ratio = ratio;
        analysis.raw_confidence =
            ((ratio * 0.7 + energy_confidence * 0.3) * self.config.confidence_scale).clamp(0.0, 1.0);

        log::trace!(
            "spectrum fs={:.1}Hz peak={:?} ratio={:.2} seizure_power={:.2} raw={:.2}",
            sample_rate,
            analysis.dominant_frequency_hz,
            ratio,
            seizure_power,
            analysis.raw_confidence
        );

        analysis
    }

    /// Current smoothed confidence
    pub fn confidence(&self) -> f32 {
        self.smoothed
    }

    /// Diagnostics of the most recent frame
    pub fn last_analysis(&self) -> &MotionAnalysis {
        &self.last
    }

    /// Buffered samples, oldest first
    pub fn samples(&self) -> Vec<f32> {
        self.samples.to_vec()
    }

    /// True once a full spectrum window is buffered
    pub fn is_warm(&self) -> bool {
        self.samples.is_full()
    }

    /// Clear buffers and smoothing state (re-targeting)
    pub fn reset(&mut self) {
        self.samples.clear();
        self.timestamps.clear();
        self.smoothed = 0.0;
        self.nominal_clock_us = 0;
        self.last = MotionAnalysis::default();
    }

    /// Get configuration
    pub fn config(&self) -> &MotionAnalyzerConfig {
        &self.config
    }
}

impl Default for MotionSpectralAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
