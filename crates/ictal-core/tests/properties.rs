use ictal_core::decision::{DecisionConfig, DecisionEngine, MotionSignal, PoseSignal};
use ictal_signals::{FaceSignal, MotionSpectralAnalyzer};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
struct Frame {
    confidence: f32,
    tremor: f32,
    rigid: bool,
    mouth_open: bool,
    fallen: bool,
}

fn frame() -> impl Strategy<Value = Frame> {
    (0.0f32..=1.0, 0.0f32..=1.0, any::<bool>(), any::<bool>(), prop::bool::weighted(0.1)).prop_map(
        |(confidence, tremor, rigid, mouth_open, fallen)| Frame {
            confidence,
            tremor,
            rigid,
            mouth_open,
            fallen,
        },
    )
}

fn frames(max: usize) -> impl Strategy<Value = Vec<Frame>> {
    prop::collection::vec(frame(), 1..max)
}

fn step(engine: &mut DecisionEngine, f: &Frame) -> bool {
    let motion = MotionSignal {
        confidence: f.confidence,
        ..Default::default()
    };
    let pose = PoseSignal {
        tremor: f.tremor,
        is_rigid: f.rigid,
        is_fallen: f.fallen,
        ..Default::default()
    };
    let face = FaceSignal {
        mouth_open_wide: f.mouth_open,
        face_detected: true,
        ..Default::default()
    };
    engine.process(&motion, &pose, &face).alert
}

fn short_calibration() -> DecisionConfig {
    DecisionConfig {
        calibration_seconds: 1.0,
        ..Default::default()
    }
}

#[test]
fn counter_never_negative_and_clears_on_alert() {
    proptest!(|(seq in frames(400))| {
        let mut engine = DecisionEngine::new();
        for f in &seq {
            let alert = step(&mut engine, f);
            prop_assert!(engine.counter() >= 0.0);
            if alert {
                prop_assert_eq!(engine.counter(), 0.0);
            }
        }
    });
}

#[test]
fn alerts_are_separated_by_suppression() {
    proptest!(|(seq in frames(600))| {
        let config = DecisionConfig::default();
        let suppression = (config.display_frames() + config.cooldown_frames) as usize;
        let mut engine = DecisionEngine::with_config(config);

        let mut last_alert: Option<usize> = None;
        for (i, f) in seq.iter().enumerate() {
            if step(&mut engine, f) {
                if let Some(prev) = last_alert {
                    prop_assert!(i - prev > suppression, "alerts at {} and {}", prev, i);
                }
                last_alert = Some(i);
            }
        }
    });
}

#[test]
fn calibrated_threshold_stays_in_bounds() {
    proptest!(|(seq in frames(200))| {
        let config = short_calibration();
        let base = config.motion_threshold;
        let ceiling = config.threshold_ceiling;
        let mut engine = DecisionEngine::with_config(config);

        for f in &seq {
            step(&mut engine, f);
            if engine.is_calibrated() {
                let threshold = engine.active_threshold(false);
                prop_assert!(threshold >= base && threshold <= ceiling, "threshold {}", threshold);
            }
        }
    });
}

#[test]
fn fallen_threshold_never_exceeds_fall_cap() {
    proptest!(|(seq in frames(200))| {
        let config = short_calibration();
        let cap = config.fall_threshold;
        let mut engine = DecisionEngine::with_config(config);

        for f in &seq {
            step(&mut engine, f);
            prop_assert!(engine.active_threshold(true) <= cap);
        }
    });
}

#[test]
fn gated_frames_never_raise_confidence() {
    proptest!(|(history in prop::collection::vec(0.0f32..5.0, 0..120), quiet in prop::collection::vec(0.0f32..0.14, 1..40))| {
        let mut analyzer = MotionSpectralAnalyzer::new();
        for m in &history {
            analyzer.score(*m, 30_000);
        }

        let mut previous = analyzer.confidence();
        for m in &quiet {
            let current = analyzer.score(*m, 30_000);
            prop_assert!(current <= previous);
            prop_assert!(analyzer.last_analysis().gated);
            previous = current;
        }
    });
}

#[test]
fn confidence_stays_in_unit_range() {
    proptest!(|(magnitudes in prop::collection::vec(0.0f32..20.0, 1..150))| {
        let mut analyzer = MotionSpectralAnalyzer::new();
        for m in &magnitudes {
            let c = analyzer.score(*m, 30_000);
            prop_assert!((0.0..=1.0).contains(&c));
        }
    });
}
