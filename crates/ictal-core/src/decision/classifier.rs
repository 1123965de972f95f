//! Rule-based seizure classification
//!
//! Rules are evaluated in priority order and the first match wins. The last
//! rule is a false-positive filter: vigorous but non-rhythmic movement
//! (walking, waving) is classified as normal activity and never debounced
//! towards an alert.

use serde::{Deserialize, Serialize};

use super::engine::{MotionSignal, PoseSignal};
use ictal_signals::FaceSignal;

/// Seizure sub-type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeizureType {
    /// Rhythmic jerking
    Clonic,
    /// Sustained stiffening
    Tonic,
    /// Sudden loss of tone (drop attack)
    Atonic,
    /// Fall with residual movement
    Fall,
    /// Weak evidence, needs longer confirmation
    Possible,
}

impl SeizureType {
    pub fn label(&self) -> &'static str {
        match self {
            SeizureType::Clonic => "CLONIC",
            SeizureType::Tonic => "TONIC",
            SeizureType::Atonic => "ATONIC",
            SeizureType::Fall => "FALL",
            SeizureType::Possible => "POSSIBLE",
        }
    }
}

impl std::fmt::Display for SeizureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classification rule, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    ViolentHeadShake,
    TonicGasping,
    DropAttack,
    RhythmicTremor,
    SilentTonic,
    HeadShakeMotion,
    FallWithMotion,
    NonRhythmicActivity,
}

impl Rule {
    pub fn reason(&self) -> &'static str {
        match self {
            Rule::ViolentHeadShake => "violent head shake with facial distortion",
            Rule::TonicGasping => "rigid posture with wide-open mouth",
            Rule::DropAttack => "sudden motion drop after fall",
            Rule::RhythmicTremor => "high rhythmic motion with tremor",
            Rule::SilentTonic => "rigid and fallen with little motion",
            Rule::HeadShakeMotion => "head shake with elevated motion",
            Rule::FallWithMotion => "fall with moderate motion",
            Rule::NonRhythmicActivity => "non-rhythmic activity (normal)",
        }
    }
}

/// Thresholds of the rule table, loaded from `[decision.rules]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuleThresholds {
    pub violent_head_shake: f32,
    pub violent_distortion: f32,
    pub violent_min_motion: f32,
    pub gasping_max_motion: f32,
    /// Mean of the last `drop_recent_frames` motion samples must stay below
    pub drop_recent_max: f32,
    /// Mean of the `drop_prior_frames` before them must exceed
    pub drop_prior_min: f32,
    pub drop_recent_frames: usize,
    pub drop_prior_frames: usize,
    pub tremor_min: f32,
    pub silent_max_motion: f32,
    pub shake_head_min: f32,
    pub shake_min_motion: f32,
    pub fall_min_motion: f32,
    pub normal_max_tremor: f32,
    pub normal_max_head_shake: f32,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            violent_head_shake: 0.6,
            violent_distortion: 0.4,
            violent_min_motion: 0.2,
            gasping_max_motion: 0.3,
            drop_recent_max: 0.1,
            drop_prior_min: 0.35,
            drop_recent_frames: 5,
            drop_prior_frames: 10,
            tremor_min: 0.3,
            silent_max_motion: 0.3,
            shake_head_min: 0.4,
            shake_min_motion: 0.3,
            fall_min_motion: 0.25,
            normal_max_tremor: 0.1,
            normal_max_head_shake: 0.2,
        }
    }
}

impl RuleThresholds {
    /// Score thresholds by name, for validation.
    pub fn scores(&self) -> [(&'static str, f32); 13] {
        [
            ("violent_head_shake", self.violent_head_shake),
            ("violent_distortion", self.violent_distortion),
            ("violent_min_motion", self.violent_min_motion),
            ("gasping_max_motion", self.gasping_max_motion),
            ("drop_recent_max", self.drop_recent_max),
            ("drop_prior_min", self.drop_prior_min),
            ("tremor_min", self.tremor_min),
            ("silent_max_motion", self.silent_max_motion),
            ("shake_head_min", self.shake_head_min),
            ("shake_min_motion", self.shake_min_motion),
            ("fall_min_motion", self.fall_min_motion),
            ("normal_max_tremor", self.normal_max_tremor),
            ("normal_max_head_shake", self.normal_max_head_shake),
        ]
    }

    /// Motion samples the drop-attack rule looks back over.
    pub fn drop_window(&self) -> usize {
        self.drop_recent_frames + self.drop_prior_frames
    }
}

/// Result of one frame's classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub rule: Rule,
    /// `None` for the suppressed normal-activity rule
    pub seizure_type: Option<SeizureType>,
    pub risk: f32,
}

impl Classification {
    fn new(rule: Rule, seizure_type: Option<SeizureType>, risk: f32) -> Self {
        Self {
            rule,
            seizure_type,
            risk,
        }
    }

    /// Whether this frame counts towards an alert.
    pub fn is_seizure(&self) -> bool {
        self.seizure_type.is_some()
    }
}

/// Inputs of one classification
pub struct RuleInputs<'a> {
    pub motion: &'a MotionSignal,
    pub pose: &'a PoseSignal,
    pub face: &'a FaceSignal,
    /// Active motion threshold
    pub threshold: f32,
    /// Recent motion confidences, oldest first, current frame last
    pub motion_history: &'a [f32],
}

/// Evaluate the rule table; first match wins.
pub fn classify(inputs: &RuleInputs<'_>, t: &RuleThresholds) -> Option<Classification> {
    let motion = inputs.motion.confidence;
    let pose = inputs.pose;
    let face = inputs.face;

    if face.head_shake_score >= t.violent_head_shake
        && face.facial_distortion >= t.violent_distortion
        && motion >= t.violent_min_motion
    {
        return Some(Classification::new(Rule::ViolentHeadShake, Some(SeizureType::Clonic), 0.95));
    }

    if pose.is_rigid && face.mouth_open_wide && motion < t.gasping_max_motion {
        return Some(Classification::new(Rule::TonicGasping, Some(SeizureType::Tonic), 0.90));
    }

    if pose.is_fallen && is_drop_attack(inputs.motion_history, t) {
        return Some(Classification::new(Rule::DropAttack, Some(SeizureType::Atonic), 0.95));
    }

    if motion >= inputs.threshold && pose.tremor >= t.tremor_min {
        return Some(Classification::new(Rule::RhythmicTremor, Some(SeizureType::Clonic), 0.85));
    }

    if motion < t.silent_max_motion && pose.is_rigid && (pose.is_fallen || pose.is_slumping) {
        return Some(Classification::new(Rule::SilentTonic, Some(SeizureType::Tonic), 0.85));
    }

    if face.head_shake_score >= t.shake_head_min && motion >= t.shake_min_motion {
        return Some(Classification::new(Rule::HeadShakeMotion, Some(SeizureType::Possible), 0.60));
    }

    if pose.is_fallen && motion >= t.fall_min_motion {
        return Some(Classification::new(Rule::FallWithMotion, Some(SeizureType::Fall), 0.50));
    }

    if motion >= inputs.threshold
        && pose.tremor < t.normal_max_tremor
        && face.head_shake_score < t.normal_max_head_shake
        && !pose.is_rigid
    {
        return Some(Classification::new(Rule::NonRhythmicActivity, None, 0.20));
    }

    None
}

/// Activity collapsed after a burst: recent mean low, prior mean high.
fn is_drop_attack(history: &[f32], t: &RuleThresholds) -> bool {
    if t.drop_recent_frames == 0 || t.drop_prior_frames == 0 || history.len() < t.drop_window() {
        return false;
    }
    let window = &history[history.len() - t.drop_window()..];
    let (prior, recent) = window.split_at(t.drop_prior_frames);
    mean(recent) < t.drop_recent_max && mean(prior) > t.drop_prior_min
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motion(confidence: f32) -> MotionSignal {
        MotionSignal {
            confidence,
            ..Default::default()
        }
    }

    fn run(motion: &MotionSignal, pose: &PoseSignal, face: &FaceSignal, history: &[f32]) -> Option<Classification> {
        let inputs = RuleInputs {
            motion,
            pose,
            face,
            threshold: 0.55,
            motion_history: history,
        };
        classify(&inputs, &RuleThresholds::default())
    }

    #[test]
    fn test_quiet_frame_is_unclassified() {
        assert!(run(&motion(0.05), &PoseSignal::default(), &FaceSignal::default(), &[]).is_none());
    }

    #[test]
    fn test_violent_head_shake_has_priority() {
        let face = FaceSignal {
            head_shake_score: 0.8,
            facial_distortion: 0.5,
            mouth_open_wide: true,
            face_detected: true,
        };
        let pose = PoseSignal {
            tremor: 0.9,
            is_rigid: false,
            ..Default::default()
        };
        let c = run(&motion(0.9), &pose, &face, &[]).unwrap();
        assert_eq!(c.rule, Rule::ViolentHeadShake);
        assert_eq!(c.seizure_type, Some(SeizureType::Clonic));
    }

    #[test]
    fn test_tonic_gasping() {
        let face = FaceSignal {
            mouth_open_wide: true,
            face_detected: true,
            ..Default::default()
        };
        let pose = PoseSignal {
            is_rigid: true,
            ..Default::default()
        };
        let c = run(&motion(0.1), &pose, &face, &[]).unwrap();
        assert_eq!(c.rule, Rule::TonicGasping);
        assert_eq!(c.seizure_type, Some(SeizureType::Tonic));
    }

    #[test]
    fn test_drop_attack_needs_fall_and_history() {
        let mut history = vec![0.6; 10];
        history.extend([0.02; 5]);
        let fallen = PoseSignal {
            is_fallen: true,
            ..Default::default()
        };
        let c = run(&motion(0.02), &fallen, &FaceSignal::default(), &history).unwrap();
        assert_eq!(c.rule, Rule::DropAttack);
        assert_eq!(c.seizure_type, Some(SeizureType::Atonic));

        // Not fallen: nothing
        assert!(run(&motion(0.02), &PoseSignal::default(), &FaceSignal::default(), &history).is_none());
        // Short history
        let c = run(&motion(0.02), &fallen, &FaceSignal::default(), &history[5..]);
        assert!(c.is_none());
    }

    #[test]
    fn test_rhythmic_tremor_vs_normal_activity() {
        let tremor = PoseSignal {
            tremor: 0.5,
            ..Default::default()
        };
        let c = run(&motion(0.7), &tremor, &FaceSignal::default(), &[]).unwrap();
        assert_eq!(c.rule, Rule::RhythmicTremor);

        let c = run(&motion(0.7), &PoseSignal::default(), &FaceSignal::default(), &[]).unwrap();
        assert_eq!(c.rule, Rule::NonRhythmicActivity);
        assert!(!c.is_seizure());
    }

    #[test]
    fn test_silent_tonic_requires_fall_or_slump() {
        let rigid = PoseSignal {
            is_rigid: true,
            ..Default::default()
        };
        assert!(run(&motion(0.1), &rigid, &FaceSignal::default(), &[]).is_none());

        let slumped = PoseSignal {
            is_rigid: true,
            is_slumping: true,
            ..Default::default()
        };
        let c = run(&motion(0.1), &slumped, &FaceSignal::default(), &[]).unwrap();
        assert_eq!(c.rule, Rule::SilentTonic);
    }

    #[test]
    fn test_possible_and_fall_rules() {
        let face = FaceSignal {
            head_shake_score: 0.45,
            face_detected: true,
            ..Default::default()
        };
        let c = run(&motion(0.35), &PoseSignal::default(), &face, &[]).unwrap();
        assert_eq!(c.seizure_type, Some(SeizureType::Possible));

        let fallen = PoseSignal {
            is_fallen: true,
            ..Default::default()
        };
        let c = run(&motion(0.3), &fallen, &FaceSignal::default(), &[]).unwrap();
        assert_eq!(c.rule, Rule::FallWithMotion);
        assert_eq!(c.seizure_type, Some(SeizureType::Fall));
    }
}
