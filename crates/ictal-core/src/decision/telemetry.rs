//! Per-frame telemetry and alert payloads

use serde::{Deserialize, Serialize};

use super::classifier::{Rule, SeizureType};

/// Monitor status reported every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MonitorStatus {
    /// Learning the subject's baseline
    Calibrating,
    /// Subject fallen
    FallWarning,
    /// Detections accumulating
    Analyzing,
    Monitoring,
    /// Alert raised; display countdown running
    Detected { remaining_secs: u32 },
    /// Post-alert suppression
    Cooldown,
}

impl std::fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorStatus::Calibrating => f.write_str("CALIBRATING"),
            MonitorStatus::FallWarning => f.write_str("FALL WARNING"),
            MonitorStatus::Analyzing => f.write_str("ANALYZING"),
            MonitorStatus::Monitoring => f.write_str("MONITORING"),
            MonitorStatus::Detected { remaining_secs } => {
                write!(f, "DETECTED (reset in {}s)", remaining_secs)
            }
            MonitorStatus::Cooldown => f.write_str("COOLDOWN"),
        }
    }
}

/// Fixed-field telemetry record for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub frame_index: u64,
    /// Caller clock, microseconds
    pub timestamp_us: i64,
    pub status: MonitorStatus,
    pub risk: f32,
    /// Debounce counter after this frame
    pub counter: f32,
    /// Active motion threshold
    pub threshold: f32,
    pub calibrated: bool,
    pub baseline: f32,
    pub classification: Option<SeizureType>,
    pub rule: Option<Rule>,
    pub reason: String,
    /// Alert sequence number, set on the triggering frame only
    pub alert_sequence: Option<u32>,
    pub motion_confidence: f32,
    pub dominant_frequency_hz: Option<f32>,
    pub tremor: f32,
    pub head_shake: f32,
    pub is_fallen: bool,
}

/// Alert handed to the external sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub timestamp_us: i64,
    pub risk: f32,
    pub classification: SeizureType,
    pub rule: Rule,
    pub frame_index: u64,
    pub sequence: u32,
    pub telemetry: Telemetry,
}

impl AlertEvent {
    /// Build from a triggering frame's telemetry; `None` if it did not trigger.
    pub fn from_telemetry(telemetry: &Telemetry) -> Option<Self> {
        Some(Self {
            timestamp_us: telemetry.timestamp_us,
            risk: telemetry.risk,
            classification: telemetry.classification?,
            rule: telemetry.rule?,
            frame_index: telemetry.frame_index,
            sequence: telemetry.alert_sequence?,
            telemetry: telemetry.clone(),
        })
    }

    pub fn summary(&self) -> String {
        format!(
            "#{} {} ({}) risk {:.2} at frame {}",
            self.sequence,
            self.classification,
            self.rule.reason(),
            self.risk,
            self.frame_index
        )
    }
}
