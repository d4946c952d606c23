//! Plain value types exchanged with the capture engine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CameraPosition {
    WorldFacing,
    UserFacing,
    #[default]
    Unspecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FrameSourceState {
    #[default]
    Off,
    On,
    Starting,
    Stopping,
    Standby,
    BootingUp,
    WakingUp,
    GoingToSleep,
    ShuttingDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TorchState {
    #[default]
    Off,
    On,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSourceKind {
    Camera,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quadrilateral {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

/// Parses an enum sent either bare (`worldFacing`) or JSON encoded
/// (`"worldFacing"`), which is how the platform layers pass them.
pub fn parse_enum_arg<T: serde::de::DeserializeOwned>(raw: &str) -> Option<T> {
    let raw = raw.trim();
    serde_json::from_str(raw)
        .or_else(|_| serde_json::from_value(serde_json::Value::String(raw.to_string())))
        .ok()
}

impl CameraPosition {
    /// Unknown positions fall back to `Unspecified`.
    pub fn from_arg(raw: &str) -> Self {
        parse_enum_arg(raw).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WorldFacing => "worldFacing",
            Self::UserFacing => "userFacing",
            Self::Unspecified => "unspecified",
        }
    }
}

impl FrameSourceState {
    /// Unknown states fall back to `Off`.
    pub fn from_arg(raw: &str) -> Self {
        parse_enum_arg(raw).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
            Self::Starting => "starting",
            Self::Stopping => "stopping",
            Self::Standby => "standby",
            Self::BootingUp => "bootingUp",
            Self::WakingUp => "wakingUp",
            Self::GoingToSleep => "goingToSleep",
            Self::ShuttingDown => "shuttingDown",
        }
    }
}

impl TorchState {
    pub fn from_arg(raw: &str) -> Self {
        parse_enum_arg(raw).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
            Self::Auto => "auto",
        }
    }
}
