//! Landmark points and geometry helpers
//!
//! Landmark collaborators (pose and face mesh inference) hand the core lists of
//! normalized `(x, y, visibility)` points indexed the MediaPipe way.

/// Normalized landmark position with a visibility score in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    pub visibility: f32,
}

impl LandmarkPoint {
    pub const fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self { x, y, visibility }
    }

    /// Fully visible point.
    pub const fn visible(x: f32, y: f32) -> Self {
        Self::new(x, y, 1.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.visibility.is_finite()
    }

    pub fn is_visible(&self, min_visibility: f32) -> bool {
        self.is_finite() && self.visibility >= min_visibility
    }

    pub fn distance(&self, other: &LandmarkPoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Point at `idx`, if present.
pub fn get_point(points: &[LandmarkPoint], idx: usize) -> Option<LandmarkPoint> {
    points.get(idx).copied()
}

/// Count sign changes in the first difference of a series.
///
/// A flat step (zero difference) counts as non-negative, matching the sign-bit
/// convention.
pub fn direction_changes(series: &[f32]) -> usize {
    if series.len() < 3 {
        return 0;
    }
    let signs: Vec<bool> = series.windows(2).map(|w| (w[1] - w[0]) < 0.0).collect();
    signs.windows(2).filter(|w| w[0] != w[1]).count()
}
