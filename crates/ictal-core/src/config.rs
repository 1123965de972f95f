use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use ictal_signals::{
    FaceConfig, FallConfig, MotionAnalyzerConfig, PoseConfig, SpectralBand, TrackerConfig,
};

use crate::decision::{DecisionConfig, Durations, RuleThresholds};

/// Prefix of environment overrides, e.g. `ICTAL_MOTION_THRESHOLD`.
pub const ENV_PREFIX: &str = "ICTAL_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Invalid environment override {key}={value}")]
    EnvOverride { key: String, value: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    pub capture: CaptureSettings,
    pub motion: MotionSettings,
    pub foreground: ForegroundSettings,
    pub pose: PoseSettings,
    pub face: FaceSettings,
    pub decision: DecisionSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptureSettings {
    /// Frame rate assumed by frame-counted timers and the FFT fallback
    pub fps_assumed: f32,
    /// Motion history length in seconds
    pub buffer_seconds: f32,
    /// Pixel count motion magnitudes are normalized to (200x150)
    pub reference_pixel_count: usize,
    /// Below this box/frame area ratio the full frame is analyzed
    pub min_roi_ratio: f32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            fps_assumed: 30.0,
            buffer_seconds: 2.0,
            reference_pixel_count: 30_000,
            min_roi_ratio: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MotionSettings {
    pub noise_floor: f32,
    pub energy_noise_floor: f32,
    pub ema_alpha: f32,
    pub seizure_band_low: f32,
    pub seizure_band_high: f32,
    pub total_band_low: f32,
    pub total_band_high: f32,
    pub confidence_scale: f32,
    pub bandpass_enabled: bool,
    /// Smoothed score decay per gated frame
    pub idle_decay: f32,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            noise_floor: 0.15,
            energy_noise_floor: 5.0,
            ema_alpha: 0.3,
            seizure_band_low: 2.0,
            seizure_band_high: 7.0,
            total_band_low: 0.5,
            total_band_high: 10.0,
            confidence_scale: 1.2,
            bandpass_enabled: true,
            idle_decay: 0.9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForegroundSettings {
    /// Background model history (external subtractor)
    pub history: u32,
    /// Background model variance threshold (external subtractor)
    pub var_threshold: f32,
    pub min_area_ratio: f32,
    pub stability_threshold: f32,
    pub lost_frames_max: u32,
    pub area_similarity: f32,
}

impl Default for ForegroundSettings {
    fn default() -> Self {
        Self {
            history: 500,
            var_threshold: 16.0,
            min_area_ratio: 0.02,
            stability_threshold: 0.3,
            lost_frames_max: 10,
            area_similarity: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoseSettings {
    pub min_visibility: f32,
    pub history_size: usize,
    pub rigidity_threshold: f32,
    pub rigidity_min_samples: usize,
    pub fall_velocity_threshold: f32,
    pub fall_confirmation_frames: u32,
    pub velocity_smooth_frames: usize,
}

impl Default for PoseSettings {
    fn default() -> Self {
        Self {
            min_visibility: 0.5,
            history_size: 30,
            rigidity_threshold: 0.01,
            rigidity_min_samples: 10,
            fall_velocity_threshold: 0.02,
            fall_confirmation_frames: 3,
            velocity_smooth_frames: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FaceSettings {
    pub history_size: usize,
    pub mouth_open_ratio: f32,
}

impl Default for FaceSettings {
    fn default() -> Self {
        Self {
            history_size: 10,
            mouth_open_ratio: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DecisionSettings {
    pub motion_threshold: f32,
    pub fall_threshold: f32,
    pub threshold_ceiling: f32,
    pub baseline_multiplier: f32,
    pub baseline_calibration_seconds: f32,
    /// Clonic duration in frames
    pub duration_threshold: u32,
    pub tonic_duration: u32,
    pub atonic_duration: u32,
    pub fall_duration: u32,
    pub possible_duration: u32,
    pub cooldown_frames: u32,
    pub display_seconds: f32,
    pub counter_decay: f32,
    /// Rule table thresholds
    pub rules: RuleThresholds,
}

impl Default for DecisionSettings {
    fn default() -> Self {
        Self {
            motion_threshold: 0.55,
            fall_threshold: 0.35,
            threshold_ceiling: 0.85,
            baseline_multiplier: 2.5,
            baseline_calibration_seconds: 5.0,
            duration_threshold: 15,
            tonic_duration: 20,
            atonic_duration: 8,
            fall_duration: 30,
            possible_duration: 45,
            cooldown_frames: 90,
            display_seconds: 3.0,
            counter_decay: 2.0,
            rules: RuleThresholds::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document; missing keys take built-in defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: MonitorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    /// Environment variables are prefixed with ICTAL_
    /// Example: ICTAL_MOTION_THRESHOLD=0.6
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. User config file (if exists)
    /// 3. Default config file
    /// 4. Built-in defaults (lowest priority)
    ///
    /// Files are merged key by key, so a user file only needs the keys it
    /// changes.
    pub fn load_layered(default_path: Option<&Path>, user_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut merged = toml::Value::try_from(MonitorConfig::default())?;

        for path in [default_path, user_path].into_iter().flatten() {
            if path.exists() {
                let overlay: toml::Table = fs::read_to_string(path)?.parse()?;
                merge_toml(&mut merged, toml::Value::Table(overlay));
            }
        }

        let mut config: MonitorConfig = merged.try_into()?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ICTAL_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` to resolve full variable names.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut o = Overrides { lookup: &lookup };

        // Capture
        o.apply("FPS_ASSUMED", &mut self.capture.fps_assumed)?;
        o.apply("BUFFER_SECONDS", &mut self.capture.buffer_seconds)?;
        o.apply("MIN_ROI_RATIO", &mut self.capture.min_roi_ratio)?;

        // Motion
        o.apply("MOTION_NOISE_FLOOR", &mut self.motion.noise_floor)?;
        o.apply("ENERGY_NOISE_FLOOR", &mut self.motion.energy_noise_floor)?;
        o.apply("MOTION_EMA_ALPHA", &mut self.motion.ema_alpha)?;
        o.apply("FREQ_SEIZURE_LOW", &mut self.motion.seizure_band_low)?;
        o.apply("FREQ_SEIZURE_HIGH", &mut self.motion.seizure_band_high)?;

        // Foreground
        o.apply("FG_HISTORY", &mut self.foreground.history)?;
        o.apply("FG_VAR_THRESHOLD", &mut self.foreground.var_threshold)?;
        o.apply("FG_MIN_AREA_RATIO", &mut self.foreground.min_area_ratio)?;
        o.apply("FG_STABILITY_THRESHOLD", &mut self.foreground.stability_threshold)?;
        o.apply("FG_LOST_FRAMES_MAX", &mut self.foreground.lost_frames_max)?;

        // Decision
        o.apply("MOTION_THRESHOLD", &mut self.decision.motion_threshold)?;
        o.apply("DURATION_THRESHOLD", &mut self.decision.duration_threshold)?;
        o.apply("COOLDOWN_FRAMES", &mut self.decision.cooldown_frames)?;
        o.apply(
            "BASELINE_CALIBRATION_SECONDS",
            &mut self.decision.baseline_calibration_seconds,
        )?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // Capture validation
        if !(self.capture.fps_assumed > 0.0) {
            return Err(invalid("capture.fps_assumed must be positive"));
        }
        if !(self.capture.buffer_seconds > 0.0) {
            return Err(invalid("capture.buffer_seconds must be positive"));
        }
        if self.buffer_size() < ictal_signals::dsp::MIN_FILTER_SAMPLES {
            return Err(ConfigError::Validation(format!(
                "motion buffer must hold at least {} samples (fps_assumed x buffer_seconds)",
                ictal_signals::dsp::MIN_FILTER_SAMPLES
            )));
        }
        if self.capture.reference_pixel_count == 0 {
            return Err(invalid("capture.reference_pixel_count must be positive"));
        }
        if !(0.0..1.0).contains(&self.capture.min_roi_ratio) {
            return Err(invalid("capture.min_roi_ratio must be in [0, 1)"));
        }

        // Motion validation
        if self.motion.noise_floor < 0.0 || self.motion.energy_noise_floor < 0.0 {
            return Err(invalid("motion noise floors must be non-negative"));
        }
        if !(self.motion.ema_alpha > 0.0 && self.motion.ema_alpha <= 1.0) {
            return Err(invalid("motion.ema_alpha must be in (0, 1]"));
        }
        let seizure = self.seizure_band();
        let total = self.total_band();
        if !seizure.is_valid() || !total.is_valid() {
            return Err(invalid("motion bands must satisfy 0 <= low < high"));
        }
        if !total.encloses(&seizure) {
            return Err(invalid("motion seizure band must lie within the total band"));
        }
        if !(self.motion.confidence_scale > 0.0) {
            return Err(invalid("motion.confidence_scale must be positive"));
        }
        if !(0.0..=1.0).contains(&self.motion.idle_decay) {
            return Err(invalid("motion.idle_decay must be in [0, 1]"));
        }

        // Foreground validation
        if !(0.0..1.0).contains(&self.foreground.min_area_ratio) {
            return Err(invalid("foreground.min_area_ratio must be in [0, 1)"));
        }
        if !(0.0..=1.0).contains(&self.foreground.stability_threshold) {
            return Err(invalid("foreground.stability_threshold must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.foreground.area_similarity) {
            return Err(invalid("foreground.area_similarity must be in [0, 1]"));
        }

        // Pose / face validation
        if self.pose.history_size == 0 || self.face.history_size == 0 {
            return Err(invalid("pose/face history sizes must be positive"));
        }
        if self.pose.rigidity_min_samples == 0 || self.pose.velocity_smooth_frames == 0 {
            return Err(invalid("pose sample counts must be positive"));
        }
        if !(0.0..=1.0).contains(&self.pose.min_visibility) {
            return Err(invalid("pose.min_visibility must be in [0, 1]"));
        }

        // Decision validation
        let d = &self.decision;
        if !(d.threshold_ceiling > 0.0 && d.threshold_ceiling <= 1.0) {
            return Err(invalid("decision.threshold_ceiling must be in (0, 1]"));
        }
        if !(d.motion_threshold > 0.0 && d.motion_threshold <= d.threshold_ceiling) {
            return Err(ConfigError::Validation(format!(
                "decision.motion_threshold must be in (0, {}]",
                d.threshold_ceiling
            )));
        }
        if !(d.fall_threshold > 0.0 && d.fall_threshold <= d.threshold_ceiling) {
            return Err(invalid("decision.fall_threshold must be in (0, threshold_ceiling]"));
        }
        if d.baseline_calibration_seconds < 0.0 || d.display_seconds < 0.0 {
            return Err(invalid("decision durations in seconds must be non-negative"));
        }
        if [
            d.duration_threshold,
            d.tonic_duration,
            d.atonic_duration,
            d.fall_duration,
            d.possible_duration,
        ]
        .contains(&0)
        {
            return Err(invalid("decision durations must be positive"));
        }
        if !(d.counter_decay > 0.0) {
            return Err(invalid("decision.counter_decay must be positive"));
        }
        for (name, value) in d.rules.scores() {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Validation(format!(
                    "decision.rules.{} must be a non-negative number",
                    name
                )));
            }
        }
        if d.rules.drop_recent_frames == 0 || d.rules.drop_prior_frames == 0 {
            return Err(invalid("decision.rules drop frame counts must be positive"));
        }

        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = self.to_toml_string()?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Motion history length: round(fps x buffer_seconds)
    pub fn buffer_size(&self) -> usize {
        MotionAnalyzerConfig::buffer_size_for(self.capture.fps_assumed, self.capture.buffer_seconds)
    }

    pub fn seizure_band(&self) -> SpectralBand {
        SpectralBand::new(self.motion.seizure_band_low, self.motion.seizure_band_high)
    }

    pub fn total_band(&self) -> SpectralBand {
        SpectralBand::new(self.motion.total_band_low, self.motion.total_band_high)
    }

    pub fn motion_config(&self) -> MotionAnalyzerConfig {
        MotionAnalyzerConfig {
            fps_assumed: self.capture.fps_assumed,
            buffer_size: self.buffer_size(),
            noise_floor: self.motion.noise_floor,
            energy_noise_floor: self.motion.energy_noise_floor,
            ema_alpha: self.motion.ema_alpha,
            seizure_band: self.seizure_band(),
            total_band: self.total_band(),
            confidence_scale: self.motion.confidence_scale,
            bandpass_enabled: self.motion.bandpass_enabled,
            reference_pixel_count: self.capture.reference_pixel_count,
            idle_decay: self.motion.idle_decay,
            ..MotionAnalyzerConfig::default()
        }
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            min_area_ratio: self.foreground.min_area_ratio,
            stability_threshold: self.foreground.stability_threshold,
            lost_frames_max: self.foreground.lost_frames_max,
            area_similarity: self.foreground.area_similarity,
        }
    }

    pub fn pose_config(&self) -> PoseConfig {
        PoseConfig {
            min_visibility: self.pose.min_visibility,
            history_size: self.pose.history_size,
            rigidity_threshold: self.pose.rigidity_threshold,
            rigidity_min_samples: self.pose.rigidity_min_samples,
            fps: self.capture.fps_assumed,
            tremor_band: self.seizure_band(),
            ..PoseConfig::default()
        }
    }

    pub fn fall_config(&self) -> FallConfig {
        FallConfig {
            min_visibility: self.pose.min_visibility,
            velocity_smooth_frames: self.pose.velocity_smooth_frames,
            fall_velocity_threshold: self.pose.fall_velocity_threshold,
            fall_confirmation_frames: self.pose.fall_confirmation_frames,
            ..FallConfig::default()
        }
    }

    pub fn face_config(&self) -> FaceConfig {
        FaceConfig {
            history_size: self.face.history_size,
            mouth_open_ratio: self.face.mouth_open_ratio,
            ..FaceConfig::default()
        }
    }

    pub fn decision_config(&self) -> DecisionConfig {
        let d = &self.decision;
        DecisionConfig {
            fps: self.capture.fps_assumed,
            motion_threshold: d.motion_threshold,
            fall_threshold: d.fall_threshold,
            threshold_ceiling: d.threshold_ceiling,
            baseline_multiplier: d.baseline_multiplier,
            calibration_seconds: d.baseline_calibration_seconds,
            counter_decay: d.counter_decay,
            display_seconds: d.display_seconds,
            cooldown_frames: d.cooldown_frames,
            durations: Durations {
                clonic: d.duration_threshold,
                tonic: d.tonic_duration,
                atonic: d.atonic_duration,
                fall: d.fall_duration,
                possible: d.possible_duration,
            },
            rules: d.rules.clone(),
        }
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Validation(message.to_string())
}

struct Overrides<'a, F> {
    lookup: &'a F,
}

impl<F> Overrides<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn apply<T: FromStr>(&mut self, name: &str, target: &mut T) -> Result<(), ConfigError> {
        let key = format!("{}{}", ENV_PREFIX, name);
        let Some(value) = (self.lookup)(&key) else {
            return Ok(());
        };
        match value.trim().parse() {
            Ok(parsed) => {
                *target = parsed;
                Ok(())
            }
            Err(_) => {
                log::warn!("Rejected config override {}={:?}", key, value);
                Err(ConfigError::EnvOverride { key, value })
            }
        }
    }
}

/// Recursively overlay `overlay` onto `base`; tables merge, other values replace.
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = MonitorConfig::default();
        config.validate().unwrap();
        assert_eq!(config.buffer_size(), 60);
        assert_eq!(config.decision_config().calibration_frames(), 150);
        assert_eq!(config.decision_config().display_frames(), 90);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = MonitorConfig::from_toml_str(
            r#"
            [decision]
            motion_threshold = 0.6

            [foreground]
            lost_frames_max = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.decision.motion_threshold, 0.6);
        assert_eq!(config.foreground.lost_frames_max, 5);
        assert_eq!(config.decision.cooldown_frames, 90);
        assert_eq!(config.tracker_config().lost_frames_max, 5);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let cases = [
            "[capture]\nfps_assumed = 0.0",
            "[capture]\nbuffer_seconds = 0.1",
            "[motion]\nema_alpha = 0.0",
            "[motion]\nseizure_band_low = 7.0\nseizure_band_high = 2.0",
            "[motion]\nseizure_band_high = 12.0",
            "[decision]\nmotion_threshold = 0.9",
            "[decision]\nduration_threshold = 0",
            "[decision]\ncounter_decay = 0.0",
            "[foreground]\nmin_area_ratio = 1.0",
            "[capture]\nmin_roi_ratio = -0.1",
            "[decision.rules]\ntremor_min = -0.2",
            "[decision.rules]\ndrop_recent_frames = 0",
        ];
        for case in cases {
            match MonitorConfig::from_toml_str(case) {
                Err(ConfigError::Validation(_)) => {}
                other => panic!("{:?} accepted: {:?}", case, other),
            }
        }
    }

    #[test]
    fn test_rule_thresholds_from_toml() {
        let config = MonitorConfig::from_toml_str(
            r#"
            [decision]
            tonic_duration = 25

            [decision.rules]
            tremor_min = 0.4
            drop_prior_frames = 12
            "#,
        )
        .unwrap();
        let rules = config.decision_config().rules;
        assert_eq!(rules.tremor_min, 0.4);
        assert_eq!(rules.drop_prior_frames, 12);
        assert_eq!(rules.drop_window(), 17);
        assert_eq!(rules.violent_head_shake, RuleThresholds::default().violent_head_shake);
        assert_eq!(config.decision.tonic_duration, 25);
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        assert!(matches!(
            MonitorConfig::from_toml_str("[decision\nmotion_threshold = "),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_overrides_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("ICTAL_MOTION_THRESHOLD", "0.65"),
            ("ICTAL_FG_LOST_FRAMES_MAX", " 20 "),
            ("ICTAL_FREQ_SEIZURE_HIGH", "8.0"),
        ]
        .into_iter()
        .collect();

        let mut config = MonitorConfig::default();
        config
            .apply_overrides_from(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.decision.motion_threshold, 0.65);
        assert_eq!(config.foreground.lost_frames_max, 20);
        assert_eq!(config.motion.seizure_band_high, 8.0);
        config.validate().unwrap();
    }

    #[test]
    fn test_bad_override_value() {
        let mut config = MonitorConfig::default();
        let err = config
            .apply_overrides_from(|k| (k == "ICTAL_COOLDOWN_FRAMES").then(|| "soon".to_string()))
            .unwrap_err();
        match err {
            ConfigError::EnvOverride { key, value } => {
                assert_eq!(key, "ICTAL_COOLDOWN_FRAMES");
                assert_eq!(value, "soon");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(config.decision.cooldown_frames, 90);
    }

    #[test]
    fn test_component_configs_follow_sections() {
        let mut config = MonitorConfig::default();
        config.capture.fps_assumed = 15.0;
        config.motion.seizure_band_low = 3.0;

        let motion = config.motion_config();
        assert_eq!(motion.buffer_size, 30);
        assert_eq!(motion.seizure_band, SpectralBand::new(3.0, 7.0));

        let pose = config.pose_config();
        assert_eq!(pose.fps, 15.0);
        assert_eq!(pose.tremor_band.low, 3.0);

        assert_eq!(config.decision_config().fps, 15.0);
    }

    #[test]
    fn test_merge_toml_overlays_tables() {
        let mut base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n[b]\nz = 3").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 20").unwrap();
        merge_toml(&mut base, overlay);
        assert_eq!(base["a"]["x"].as_integer(), Some(1));
        assert_eq!(base["a"]["y"].as_integer(), Some(20));
        assert_eq!(base["b"]["z"].as_integer(), Some(3));
    }
}
