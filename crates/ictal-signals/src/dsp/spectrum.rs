//! Spectral analysis primitives
//!
//! Hann-windowed power spectra, band energies, a first-order IIR band-pass and
//! sample-rate estimation from jittery frame timestamps.

use ndarray::Array1;
use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Below this many samples the IIR band-pass is not trusted.
pub const MIN_FILTER_SAMPLES: usize = 8;

/// Closed frequency interval [low, high] in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralBand {
    pub low: f32,
    pub high: f32,
}

impl SpectralBand {
    pub const fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, hz: f32) -> bool {
        hz >= self.low && hz <= self.high
    }

    pub fn is_valid(&self) -> bool {
        self.low.is_finite() && self.high.is_finite() && self.low >= 0.0 && self.low < self.high
    }

    /// True when `other` lies entirely inside this band.
    pub fn encloses(&self, other: &SpectralBand) -> bool {
        other.low >= self.low && other.high <= self.high
    }
}

/// Symmetric Hann window (matches `numpy.hanning`).
pub fn hann_window(size: usize) -> Array1<f32> {
    if size <= 1 {
        return Array1::ones(size);
    }
    let denom = (size - 1) as f32;
    Array1::from_iter((0..size).map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / denom).cos()))
}

/// Remove the mean.
pub fn detrend(signal: &Array1<f32>) -> Array1<f32> {
    let mean = signal.mean().unwrap_or(0.0);
    signal.mapv(|x| x - mean)
}

/// Population standard deviation (0.0 for an empty signal).
pub fn std_dev(signal: &Array1<f32>) -> f32 {
    let mean = signal.mean().unwrap_or(0.0);
    let variance = signal.mapv(|x| (x - mean).powi(2)).mean().unwrap_or(0.0);
    variance.sqrt()
}

/// Population standard deviation of a slice.
pub fn std_dev_slice(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n).sqrt()
}

/// Median of a slice (0.0 when empty).
pub fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Band-pass filter using a first-order IIR high-pass followed by a
/// first-order low-pass.
///
/// Returns `None` when the signal is too short for the filter to settle or
/// the output is not finite; callers fall back to the unfiltered signal.
pub fn bandpass_filter(signal: &Array1<f32>, sample_rate: f32, band: &SpectralBand) -> Option<Array1<f32>> {
    let n = signal.len();
    if n < MIN_FILTER_SAMPLES || !(sample_rate > 0.0) || !band.is_valid() {
        return None;
    }

    let dt = 1.0 / sample_rate;

    // High-pass: y[n] = a * (y[n-1] + x[n] - x[n-1])
    let hp_rc = 1.0 / (2.0 * PI * band.low.max(0.01));
    let hp_alpha = hp_rc / (hp_rc + dt);

    // Low-pass: y[n] = a * x[n] + (1 - a) * y[n-1]
    let lp_rc = 1.0 / (2.0 * PI * band.high.max(0.1));
    let lp_alpha = dt / (lp_rc + dt);

    let mut filtered = signal.to_vec();

    let mut hp_prev_in = filtered[0];
    let mut hp_prev_out = 0.0;
    for value in filtered.iter_mut().skip(1) {
        let hp_out = hp_alpha * (hp_prev_out + *value - hp_prev_in);
        hp_prev_in = *value;
        hp_prev_out = hp_out;
        *value = hp_out;
    }
    filtered[0] = 0.0;

    let mut lp_prev = filtered[0];
    for value in filtered.iter_mut().skip(1) {
        let lp_out = lp_alpha * *value + (1.0 - lp_alpha) * lp_prev;
        lp_prev = lp_out;
        *value = lp_out;
    }

    if filtered.iter().all(|v| v.is_finite()) {
        Some(Array1::from(filtered))
    } else {
        None
    }
}

/// Estimate the actual sampling rate (Hz) from microsecond timestamps.
///
/// Uses the median of the inter-sample intervals after discarding
/// non-positive intervals and intervals longer than 3x the median, so a
/// single late frame does not skew the rate.
/// Returns `None` when no usable interval exists.
pub fn estimate_sample_rate(timestamps_us: &[i64]) -> Option<f32> {
    let deltas: Vec<f32> = timestamps_us
        .windows(2)
        .map(|w| (w[1] - w[0]) as f32)
        .filter(|d| *d > 0.0)
        .collect();
    if deltas.is_empty() {
        return None;
    }

    let med = median(&deltas);
    let kept: Vec<f32> = deltas.into_iter().filter(|d| *d <= med * 3.0).collect();
    if kept.is_empty() {
        return None;
    }

    let interval_us = median(&kept);
    if interval_us > 0.0 {
        Some(1_000_000.0 / interval_us)
    } else {
        None
    }
}

/// One-sided power spectrum (non-negative frequencies only).
#[derive(Debug, Clone)]
pub struct Spectrum {
    /// |X[k]|^2 for k in 0..N/2
    pub power: Vec<f32>,
    /// Frequency resolution in Hz
    pub bin_hz: f32,
}

impl Spectrum {
    pub fn frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.bin_hz
    }

    /// Total power of the bins whose frequency lies inside `band`.
    pub fn band_power(&self, band: &SpectralBand) -> f32 {
        self.power
            .iter()
            .enumerate()
            .filter(|(k, _)| band.contains(self.frequency(*k)))
            .map(|(_, p)| *p)
            .sum()
    }

    /// Frequency of the strongest bin inside `band`.
    pub fn peak_frequency(&self, band: &SpectralBand) -> Option<f32> {
        self.power
            .iter()
            .enumerate()
            .filter(|(k, _)| band.contains(self.frequency(*k)))
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| self.frequency(k))
    }
}

/// Hann-windowed FFT power spectrum of a fixed length, planned once.
#[derive(Clone)]
pub struct PowerSpectrum {
    fft: Arc<dyn Fft<f32>>,
    window: Array1<f32>,
    len: usize,
}

impl PowerSpectrum {
    pub fn new(len: usize) -> Self {
        let len = len.max(2);
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(len),
            window: hann_window(len),
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Compute the spectrum of `signal` sampled at `sample_rate` Hz.
    ///
    /// Returns `None` if the signal length differs from the planned length or
    /// the sample rate is not positive.
    pub fn compute(&self, signal: &Array1<f32>, sample_rate: f32) -> Option<Spectrum> {
        if signal.len() != self.len || !(sample_rate > 0.0) {
            return None;
        }

        let mut buffer: Vec<Complex32> = signal
            .iter()
            .zip(self.window.iter())
            .map(|(s, w)| Complex32::new(s * w, 0.0))
            .collect();
        self.fft.process(&mut buffer);

        let half_n = self.len / 2;
        let power = buffer.iter().take(half_n).map(|c| c.norm_sqr()).collect();

        Some(Spectrum {
            power,
            bin_hz: sample_rate / self.len as f32,
        })
    }
}

impl std::fmt::Debug for PowerSpectrum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerSpectrum").field("len", &self.len).finish()
    }
}
