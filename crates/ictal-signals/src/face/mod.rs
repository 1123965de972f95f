//! Face module: head shake, facial distortion and mouth opening

mod extractor;
mod landmarks;

pub use extractor::{eye_aspect_ratio, mouth_aspect_ratio, FaceConfig, FaceSignal, FaceSignalExtractor};
pub use landmarks::{FaceFrame, FaceLandmark};
