//! DSP (Digital Signal Processing) module
//!
//! Building blocks shared by the motion, pose and face processors:
//! - `RingBuffer` - fixed-capacity history with O(1) push/evict
//! - `PowerSpectrum` - Hann-windowed FFT power spectrum, planned once per length
//! - `bandpass_filter` - first-order IIR band-pass with a short-signal fallback
//! - `estimate_sample_rate` - robust frame rate from jittery timestamps

mod ring_buffer;
mod spectrum;

pub use ring_buffer::RingBuffer;
pub use spectrum::{
    bandpass_filter, detrend, estimate_sample_rate, hann_window, median, std_dev, std_dev_slice,
    PowerSpectrum, SpectralBand, Spectrum, MIN_FILTER_SAMPLES,
};
