use std::fs;

use ictal_core::{ConfigError, MonitorConfig, SeizureMonitor};
use tempfile::TempDir;

#[test]
fn test_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ictal.toml");

    let mut config = MonitorConfig::default();
    config.decision.motion_threshold = 0.6;
    config.decision.cooldown_frames = 120;
    config.foreground.lost_frames_max = 15;
    config.save_to_file(&path).unwrap();

    let loaded = MonitorConfig::from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_layered_user_file_overrides_default_file() {
    let dir = TempDir::new().unwrap();
    let default_path = dir.path().join("default.toml");
    let user_path = dir.path().join("user.toml");

    fs::write(
        &default_path,
        "[decision]\nmotion_threshold = 0.6\ncooldown_frames = 60\n\n[pose]\nrigidity_min_samples = 12\n",
    )
    .unwrap();
    fs::write(&user_path, "[decision]\ncooldown_frames = 45\n").unwrap();

    let config = MonitorConfig::load_layered(Some(&default_path), Some(&user_path)).unwrap();
    assert_eq!(config.decision.motion_threshold, 0.6);
    assert_eq!(config.decision.cooldown_frames, 45);
    assert_eq!(config.pose.rigidity_min_samples, 12);
    assert_eq!(config.capture.fps_assumed, 30.0);
}

#[test]
fn test_layered_skips_missing_files() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");

    let config = MonitorConfig::load_layered(Some(&missing), None).unwrap();
    assert_eq!(config.decision.cooldown_frames, MonitorConfig::default().decision.cooldown_frames);
}

#[test]
fn test_layered_rejects_invalid_merge() {
    let dir = TempDir::new().unwrap();
    let user_path = dir.path().join("user.toml");
    fs::write(&user_path, "[decision]\nmotion_threshold = 0.95\n").unwrap();

    match MonitorConfig::load_layered(None, Some(&user_path)) {
        Err(ConfigError::Validation(msg)) => assert!(msg.contains("motion_threshold"), "{}", msg),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        MonitorConfig::from_file(dir.path().join("nope.toml")),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn test_loaded_config_drives_monitor() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ictal.toml");
    fs::write(
        &path,
        "[foreground]\nlost_frames_max = 3\n\n[decision]\ntonic_duration = 12\n\n[decision.rules]\nshake_head_min = 0.5\n",
    )
    .unwrap();

    let config = MonitorConfig::from_file(&path).unwrap();
    let monitor = SeizureMonitor::with_config(config);
    assert_eq!(monitor.tracker().config().lost_frames_max, 3);
    assert_eq!(monitor.engine().config().durations.tonic, 12);
    assert_eq!(monitor.engine().config().rules.shake_head_min, 0.5);
}

#[test]
fn test_file_with_env_loads_file_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ictal.toml");
    fs::write(&path, "[face]\nmouth_open_ratio = 0.7\n").unwrap();

    let config = MonitorConfig::from_file_with_env(&path).unwrap();
    assert_eq!(config.face.mouth_open_ratio, 0.7);
    assert_eq!(config.face_config().mouth_open_ratio, 0.7);
}
