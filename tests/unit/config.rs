use super::*;

use serde_json::json;
use tempfile::tempdir;

#[test]
fn test_settings_defaults() {
    let settings = BridgeSettings::default();
    assert_eq!(settings.log_filter, "scanbridge=info");
    assert_eq!(settings.main_thread_name, "scanbridge-main");
    assert!(settings.worker_threads.is_none());
    assert_eq!(settings.log_dir(), default_log_dir());
}

#[test]
fn test_load_settings_from_partial_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"log_filter":"scanbridge=debug","worker_threads":2}"#).unwrap();

    let settings = load_settings_from(&path).unwrap();
    assert_eq!(settings.log_filter, "scanbridge=debug");
    assert_eq!(settings.worker_threads, Some(2));
    assert_eq!(settings.main_thread_name, "scanbridge-main");
}

#[test]
fn test_load_settings_from_invalid_or_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    assert!(load_settings_from(&path).is_none());

    std::fs::write(&path, "not json").unwrap();
    assert!(load_settings_from(&path).is_none());
}

#[test]
fn test_ensure_log_dir_creates_configured_dir() {
    let dir = tempdir().unwrap();
    let settings = BridgeSettings {
        log_dir: Some(dir.path().join("nested").join("logs")),
        ..BridgeSettings::default()
    };

    let created = ensure_log_dir(&settings).unwrap();
    assert_eq!(created, dir.path().join("nested").join("logs"));
    assert!(created.is_dir());
}

#[test]
fn test_frames_configuration_from_context_json() {
    let json = json!({
        "licenseKey": "key",
        "settings": {
            "frameDataSettings": {
                "sc_frame_isFileSystemCacheEnabled": true,
                "sc_frame_imageQuality": 70,
                "sc_frame_autoRotate": true,
            }
        }
    });

    let configuration = FramesHandlingConfiguration::from_context_json(&json.to_string());
    assert_eq!(
        configuration,
        FramesHandlingConfiguration {
            is_file_system_cache_enabled: true,
            image_quality: 70,
            auto_rotate_images: true,
        }
    );
}

#[test]
fn test_frames_configuration_defaults() {
    let expected = FramesHandlingConfiguration::default();
    assert_eq!(FramesHandlingConfiguration::from_context_json("{"), expected);
    assert_eq!(
        FramesHandlingConfiguration::from_context_json(r#"{"settings":{}}"#),
        expected
    );
    assert_eq!(
        FramesHandlingConfiguration::from_context_json(
            r#"{"settings":{"frameDataSettings":{"sc_frame_imageQuality":"high"}}}"#
        ),
        expected
    );
}
