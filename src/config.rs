//! Bridge configuration.
//!
//! `BridgeSettings` configures the process (logging, main thread, worker
//! pool) and is read once at start-up. `FramesHandlingConfiguration` comes
//! from the context-creation payload and is re-read on every create.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SETTINGS_ENV: &str = "SCANBRIDGE_SETTINGS";
const SETTINGS_DIR: &str = "scanbridge";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    pub log_filter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    pub main_thread_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_threads: Option<usize>,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            log_filter: "scanbridge=info".to_string(),
            log_dir: None,
            main_thread_name: "scanbridge-main".to_string(),
            worker_threads: None,
        }
    }
}

impl BridgeSettings {
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(default_log_dir)
    }
}

pub fn default_log_dir() -> PathBuf {
    std::env::temp_dir().join(SETTINGS_DIR).join("logs")
}

/// Creates the configured log directory, falling back to the temp-dir one.
pub fn ensure_log_dir(settings: &BridgeSettings) -> std::io::Result<PathBuf> {
    let dir = settings.log_dir();
    match std::fs::create_dir_all(&dir) {
        Ok(()) => Ok(dir),
        Err(_) if settings.log_dir.is_some() => {
            let fallback = default_log_dir();
            std::fs::create_dir_all(&fallback)?;
            Ok(fallback)
        }
        Err(error) => Err(error),
    }
}

/// `$SCANBRIDGE_SETTINGS` if set, otherwise `<config dir>/scanbridge/settings.json`.
pub fn settings_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(SETTINGS_ENV).filter(|path| !path.is_empty()) {
        return Some(PathBuf::from(path));
    }
    get_config_dir().map(|dir| dir.join(SETTINGS_DIR).join(SETTINGS_FILE))
}

/// Never fails: a missing or unreadable file yields the defaults.
pub fn load_settings() -> BridgeSettings {
    settings_path()
        .and_then(|path| load_settings_from(&path))
        .unwrap_or_default()
}

pub fn load_settings_from(path: &Path) -> Option<BridgeSettings> {
    let data = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&data) {
        Ok(settings) => Some(settings),
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "ignoring invalid settings file");
            None
        }
    }
}

fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        return std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join("Library/Application Support"));
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg));
        }
        return std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".config"));
    }

    #[cfg(target_os = "windows")]
    {
        return std::env::var("APPDATA").ok().map(PathBuf::from);
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

/// How cached frames should be stored, taken from
/// `settings.frameDataSettings` of the context payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramesHandlingConfiguration {
    pub is_file_system_cache_enabled: bool,
    pub image_quality: u32,
    pub auto_rotate_images: bool,
}

impl Default for FramesHandlingConfiguration {
    fn default() -> Self {
        Self {
            is_file_system_cache_enabled: false,
            image_quality: 100,
            auto_rotate_images: false,
        }
    }
}

impl FramesHandlingConfiguration {
    /// Fields that are missing or of the wrong type keep their defaults.
    pub fn from_context_json(json: &str) -> Self {
        let Ok(root) = serde_json::from_str::<Value>(json) else {
            return Self::default();
        };
        let Some(frame_settings) = root
            .get("settings")
            .and_then(|settings| settings.get("frameDataSettings"))
            .and_then(Value::as_object)
        else {
            return Self::default();
        };

        let defaults = Self::default();
        Self {
            is_file_system_cache_enabled: frame_settings
                .get("sc_frame_isFileSystemCacheEnabled")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.is_file_system_cache_enabled),
            image_quality: frame_settings
                .get("sc_frame_imageQuality")
                .and_then(Value::as_u64)
                .and_then(|quality| u32::try_from(quality).ok())
                .unwrap_or(defaults.image_quality),
            auto_rotate_images: frame_settings
                .get("sc_frame_autoRotate")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.auto_rotate_images),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
