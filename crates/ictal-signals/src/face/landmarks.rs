//! Face mesh points used by the face extractor

use crate::landmarks::{get_point, LandmarkPoint};

/// Face mesh landmarks with their MediaPipe 468-point indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceLandmark {
    NoseTip,
    LeftEyeOuter,
    LeftEyeInner,
    LeftEyeTop,
    LeftEyeBottom,
    RightEyeOuter,
    RightEyeInner,
    RightEyeTop,
    RightEyeBottom,
    UpperLip,
    LowerLip,
    LeftMouth,
    RightMouth,
}

impl FaceLandmark {
    pub const ALL: [FaceLandmark; 13] = [
        FaceLandmark::NoseTip,
        FaceLandmark::LeftEyeOuter,
        FaceLandmark::LeftEyeInner,
        FaceLandmark::LeftEyeTop,
        FaceLandmark::LeftEyeBottom,
        FaceLandmark::RightEyeOuter,
        FaceLandmark::RightEyeInner,
        FaceLandmark::RightEyeTop,
        FaceLandmark::RightEyeBottom,
        FaceLandmark::UpperLip,
        FaceLandmark::LowerLip,
        FaceLandmark::LeftMouth,
        FaceLandmark::RightMouth,
    ];

    pub const fn index(self) -> usize {
        match self {
            FaceLandmark::NoseTip => 1,
            FaceLandmark::LeftEyeOuter => 33,
            FaceLandmark::LeftEyeInner => 133,
            FaceLandmark::LeftEyeTop => 159,
            FaceLandmark::LeftEyeBottom => 145,
            FaceLandmark::RightEyeOuter => 362,
            FaceLandmark::RightEyeInner => 263,
            FaceLandmark::RightEyeTop => 386,
            FaceLandmark::RightEyeBottom => 374,
            FaceLandmark::UpperLip => 13,
            FaceLandmark::LowerLip => 14,
            FaceLandmark::LeftMouth => 61,
            FaceLandmark::RightMouth => 291,
        }
    }

    /// Landmark list length needed to read every point.
    pub fn required_len() -> usize {
        Self::ALL.iter().map(|l| l.index()).max().unwrap_or(0) + 1
    }
}

/// One frame of face mesh landmarks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceFrame {
    pub points: Vec<LandmarkPoint>,
}

impl FaceFrame {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self { points }
    }

    /// A full-length mesh with every point at the origin.
    pub fn blank() -> Self {
        Self::new(vec![LandmarkPoint::visible(0.0, 0.0); 468])
    }

    pub fn get(&self, landmark: FaceLandmark) -> Option<LandmarkPoint> {
        get_point(&self.points, landmark.index())
    }

    pub fn set(&mut self, landmark: FaceLandmark, point: LandmarkPoint) {
        let idx = landmark.index();
        if self.points.len() <= idx {
            self.points.resize(idx + 1, LandmarkPoint::visible(0.0, 0.0));
        }
        self.points[idx] = point;
    }

    /// Every face landmark present and finite.
    pub fn is_complete(&self) -> bool {
        self.points.len() >= FaceLandmark::required_len()
            && FaceLandmark::ALL
                .iter()
                .all(|l| self.get(*l).is_some_and(|p| p.is_finite()))
    }
}
