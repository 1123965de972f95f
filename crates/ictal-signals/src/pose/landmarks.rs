//! Tracked body landmarks and the per-frame pose input

use crate::landmarks::{get_point, LandmarkPoint};

/// Body side a landmark belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySide {
    Left,
    Right,
    Center,
}

/// Body landmarks used by the pose processors, with their MediaPipe pose
/// indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseLandmark {
    Nose,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl PoseLandmark {
    /// Every tracked landmark, in slot order.
    pub const ALL: [PoseLandmark; 13] = [
        PoseLandmark::Nose,
        PoseLandmark::LeftShoulder,
        PoseLandmark::RightShoulder,
        PoseLandmark::LeftElbow,
        PoseLandmark::RightElbow,
        PoseLandmark::LeftWrist,
        PoseLandmark::RightWrist,
        PoseLandmark::LeftHip,
        PoseLandmark::RightHip,
        PoseLandmark::LeftKnee,
        PoseLandmark::RightKnee,
        PoseLandmark::LeftAnkle,
        PoseLandmark::RightAnkle,
    ];

    /// Index into the 33-point MediaPipe pose list.
    pub const fn index(self) -> usize {
        match self {
            PoseLandmark::Nose => 0,
            PoseLandmark::LeftShoulder => 11,
            PoseLandmark::RightShoulder => 12,
            PoseLandmark::LeftElbow => 13,
            PoseLandmark::RightElbow => 14,
            PoseLandmark::LeftWrist => 15,
            PoseLandmark::RightWrist => 16,
            PoseLandmark::LeftHip => 23,
            PoseLandmark::RightHip => 24,
            PoseLandmark::LeftKnee => 25,
            PoseLandmark::RightKnee => 26,
            PoseLandmark::LeftAnkle => 27,
            PoseLandmark::RightAnkle => 28,
        }
    }

    /// Position in `ALL`, used for per-landmark storage.
    pub const fn slot(self) -> usize {
        self as usize
    }

    pub const fn side(self) -> BodySide {
        match self {
            PoseLandmark::Nose => BodySide::Center,
            PoseLandmark::LeftShoulder
            | PoseLandmark::LeftElbow
            | PoseLandmark::LeftWrist
            | PoseLandmark::LeftHip
            | PoseLandmark::LeftKnee
            | PoseLandmark::LeftAnkle => BodySide::Left,
            _ => BodySide::Right,
        }
    }
}

/// One frame of pose landmarks, indexed the MediaPipe way (33 points).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseFrame {
    pub points: Vec<LandmarkPoint>,
}

impl PoseFrame {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self { points }
    }

    /// Frame with every point hidden; set tracked points with `set`.
    pub fn hidden(len: usize) -> Self {
        Self::new(vec![LandmarkPoint::new(0.0, 0.0, 0.0); len])
    }

    pub fn get(&self, landmark: PoseLandmark) -> Option<LandmarkPoint> {
        get_point(&self.points, landmark.index())
    }

    /// Landmark if present and at least `min_visibility` visible.
    pub fn visible(&self, landmark: PoseLandmark, min_visibility: f32) -> Option<LandmarkPoint> {
        self.get(landmark).filter(|p| p.is_visible(min_visibility))
    }

    /// Set a landmark, growing the list as needed.
    pub fn set(&mut self, landmark: PoseLandmark, point: LandmarkPoint) {
        let idx = landmark.index();
        if self.points.len() <= idx {
            self.points.resize(idx + 1, LandmarkPoint::new(0.0, 0.0, 0.0));
        }
        self.points[idx] = point;
    }
}
