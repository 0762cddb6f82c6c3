use std::sync::Mutex;

use tempfile::NamedTempFile;

use occupancy_sentinel::config::SentinelConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "SENTINEL_CONFIG",
        "SENTINEL_TIMEOUT_SECS",
        "SENTINEL_SENSITIVITY",
        "SENTINEL_MIN_AREA",
        "SENTINEL_SOURCE_URL",
        "SENTINEL_EVENT_LOG",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = SentinelConfig::load().expect("load config");

    assert_eq!(cfg.control.timeout_secs, 60);
    assert_eq!(cfg.detector.min_area, 1000);
    assert!(cfg.detector.detect_shadows);
    assert_eq!(cfg.source.url, "stub://classroom");
    assert_eq!(cfg.source.width, 640);
    assert_eq!(cfg.source.height, 480);
    let names: Vec<&str> = cfg.control.channels.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["lights", "fans"]);
    assert!(cfg.event_log.is_none());

    clear_env();
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "detector": {
            "sensitivity": 16.0,
            "min_area": 500,
            "detect_shadows": false
        },
        "control": {
            "timeout_seconds": 120,
            "channels": [
                { "name": "lights", "timeout_seconds": 180 },
                { "name": "fans" }
            ]
        },
        "source": {
            "url": "stub://lab",
            "target_fps": 15,
            "width": 800,
            "height": 600
        },
        "events": {
            "log_path": "lab_events.jsonl"
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("SENTINEL_CONFIG", file.path());
    std::env::set_var("SENTINEL_TIMEOUT_SECS", "90");
    std::env::set_var("SENTINEL_MIN_AREA", "750");

    let cfg = SentinelConfig::load().expect("load config");

    assert_eq!(cfg.detector.sensitivity, 16.0);
    assert_eq!(cfg.detector.min_area, 750);
    assert!(!cfg.detector.detect_shadows);
    assert_eq!(cfg.control.timeout_secs, 90);
    assert_eq!(cfg.control.channels.len(), 2);
    assert_eq!(cfg.control.channels[0].timeout_seconds, Some(180));
    assert_eq!(cfg.control.channels[1].timeout_seconds, None);
    assert_eq!(cfg.source.url, "stub://lab");
    assert_eq!(cfg.source.target_fps, 15);
    assert_eq!(cfg.source.width, 800);
    assert_eq!(cfg.source.height, 600);
    assert_eq!(
        cfg.event_log.as_deref().map(|p| p.to_str().unwrap()),
        Some("lab_events.jsonl")
    );

    clear_env();
}

#[test]
fn rejects_zero_timeout() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{ "control": { "timeout_seconds": 0 } }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    std::env::set_var("SENTINEL_CONFIG", file.path());

    assert!(SentinelConfig::load().is_err());

    clear_env();
}

#[test]
fn rejects_duplicate_channels() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "control": {
            "channels": [ { "name": "lights" }, { "name": "lights" } ]
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    std::env::set_var("SENTINEL_CONFIG", file.path());

    assert!(SentinelConfig::load().is_err());

    clear_env();
}
