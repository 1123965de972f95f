//! Foreground subject tracker
//!
//! Picks the largest foreground blob each frame and stabilizes it over time so
//! a briefly occluded subject keeps its box and a competing blob (a visitor
//! walking past) cannot steal the region unless the original subject stays
//! gone for longer than `lost_frames_max` frames.

use super::bbox::BoundingBox;
use super::foreground::{largest_blob, ForegroundMask};

/// Tracker configuration
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Minimum blob area as a fraction of the frame area
    pub min_area_ratio: f32,
    /// IoU at or above which a detection continues the current track
    pub stability_threshold: f32,
    /// Frames the old box survives without a consistent detection
    pub lost_frames_max: u32,
    /// Area ratio above which a non-overlapping detection is still accepted
    /// (subject moved quickly)
    pub area_similarity: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_area_ratio: 0.02,
            stability_threshold: 0.3,
            lost_frames_max: 10,
            area_similarity: 0.5,
        }
    }
}

/// What the last `update` did to the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackEvent {
    /// No track and nothing detected
    #[default]
    Idle,
    /// First detection accepted
    Acquired,
    /// Detection consistent with the track
    Updated,
    /// Old box returned while the lost counter runs
    Held,
    /// Track moved to a new, dissimilar subject
    Switched,
    /// Track cleared after too many lost frames
    Lost,
}

impl TrackEvent {
    /// Whether downstream per-subject state should be discarded.
    pub fn is_retarget(&self) -> bool {
        matches!(self, TrackEvent::Switched | TrackEvent::Lost)
    }
}

/// Stabilized foreground subject tracker
#[derive(Debug, Clone)]
pub struct ForegroundTracker {
    config: TrackerConfig,
    prev_box: Option<BoundingBox>,
    stable_box: Option<BoundingBox>,
    lost_frames: u32,
    last_event: TrackEvent,
}

impl ForegroundTracker {
    pub fn new() -> Self {
        Self::with_config(TrackerConfig::default())
    }

    pub fn with_config(config: TrackerConfig) -> Self {
        Self {
            config,
            prev_box: None,
            stable_box: None,
            lost_frames: 0,
            last_event: TrackEvent::Idle,
        }
    }

    /// Track the subject in `mask`, rejecting blobs smaller than
    /// `min_area_ratio` of the frame. An absent or degenerate mask counts as
    /// a frame without detection.
    pub fn update(
        &mut self,
        mask: Option<&ForegroundMask>,
        min_area_ratio: f32,
    ) -> Option<BoundingBox> {
        let detection = mask
            .and_then(|m| largest_blob(m, min_area_ratio))
            .map(|blob| blob.bbox);
        self.stabilize(detection)
    }

    /// `update` with the configured minimum area ratio.
    pub fn update_with_config_ratio(&mut self, mask: Option<&ForegroundMask>) -> Option<BoundingBox> {
        let ratio = self.config.min_area_ratio;
        self.update(mask, ratio)
    }

    /// Apply temporal stabilization to a raw per-frame detection.
    pub fn stabilize(&mut self, detection: Option<BoundingBox>) -> Option<BoundingBox> {
        let detection = detection.filter(BoundingBox::is_valid);

        let Some(current) = detection else {
            return self.miss();
        };

        let Some(prev) = self.prev_box else {
            log::debug!("Tracker acquired subject at {:?}", current.to_array());
            self.accept(current, TrackEvent::Acquired);
            return self.stable_box;
        };

        if current.iou(&prev) >= self.config.stability_threshold
            || current.area_ratio(&prev) > self.config.area_similarity
        {
            self.accept(current, TrackEvent::Updated);
            return self.stable_box;
        }

        // Dissimilar detection: hold the old box until the subject has been
        // gone long enough
        self.lost_frames += 1;
        if self.lost_frames > self.config.lost_frames_max {
            log::debug!(
                "Tracker switched subject {:?} -> {:?}",
                prev.to_array(),
                current.to_array()
            );
            self.accept(current, TrackEvent::Switched);
        } else {
            self.last_event = TrackEvent::Held;
        }
        self.stable_box
    }

    fn miss(&mut self) -> Option<BoundingBox> {
        if self.prev_box.is_none() && self.stable_box.is_none() {
            self.last_event = TrackEvent::Idle;
            return None;
        }

        self.lost_frames += 1;
        if self.lost_frames > self.config.lost_frames_max {
            log::debug!("Tracker lost subject after {} frames", self.lost_frames);
            self.prev_box = None;
            self.stable_box = None;
            self.lost_frames = 0;
            self.last_event = TrackEvent::Lost;
            return None;
        }

        self.last_event = TrackEvent::Held;
        self.stable_box
    }

    fn accept(&mut self, bbox: BoundingBox, event: TrackEvent) {
        self.prev_box = Some(bbox);
        self.stable_box = Some(bbox);
        self.lost_frames = 0;
        self.last_event = event;
    }

    /// Current stabilized box
    pub fn stable_box(&self) -> Option<BoundingBox> {
        self.stable_box
    }

    pub fn lost_frames(&self) -> u32 {
        self.lost_frames
    }

    pub fn last_event(&self) -> TrackEvent {
        self.last_event
    }

    pub fn reset(&mut self) {
        self.prev_box = None;
        self.stable_box = None;
        self.lost_frames = 0;
        self.last_event = TrackEvent::Idle;
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}

impl Default for ForegroundTracker {
    fn default() -> Self {
        Self::new()
    }
}
