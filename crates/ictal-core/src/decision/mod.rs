//! Decision layer: classification, debouncing and alert state machine

mod classifier;
mod engine;
mod telemetry;

pub use classifier::{classify, Classification, Rule, RuleInputs, RuleThresholds, SeizureType};
pub use engine::{
    Decision, DecisionConfig, DecisionEngine, Durations, MotionSignal, PoseSignal,
};
pub use telemetry::{AlertEvent, MonitorStatus, Telemetry};
