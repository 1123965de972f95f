//! Vision module: foreground subject isolation
//!
//! - `ForegroundMask` / `extract_blobs` - connected regions of a binary mask
//! - `ForegroundTracker` - largest-blob selection with IoU stabilization

mod bbox;
mod foreground;
mod tracker;

pub use bbox::BoundingBox;
pub use foreground::{extract_blobs, largest_blob, Blob, ForegroundMask};
pub use tracker::{ForegroundTracker, TrackEvent, TrackerConfig};
