//! Pose module: body landmark signals
//!
//! - `PoseSignalExtractor` - tremor, rigidity and symmetry from landmark velocities
//! - `FallDetector` - confirmed downward motion of head and trunk, slumped posture

mod extractor;
pub mod fall;
mod landmarks;

pub use extractor::{symmetry, PoseConfig, PoseScores, PoseSignalExtractor};
pub use fall::{FallConfig, FallDetector, FallStatus};
pub use landmarks::{BodySide, PoseFrame, PoseLandmark};
