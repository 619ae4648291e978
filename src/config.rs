use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::frame::CaptureFormat;

const DEFAULT_DEVICE: &str = "0";
const DEFAULT_WIDTH: u32 = 1280;
const DEFAULT_HEIGHT: u32 = 720;
const DEFAULT_FPS: u32 = 30;
const DEFAULT_UDP_ADDR: &str = "127.0.0.1:5052";
const DEFAULT_INPUT_SIZE: u32 = 256;
const DEFAULT_MIN_DETECTION_CONFIDENCE: f32 = 0.7;
const DEFAULT_MIN_TRACKING_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Deserialize, Default)]
struct RelayConfigFile {
    camera: Option<CameraConfigFile>,
    transport: Option<TransportConfigFile>,
    estimator: Option<EstimatorConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct TransportConfigFile {
    udp_addr: Option<String>,
    allow_remote: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct EstimatorConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
    input_width: Option<u32>,
    input_height: Option<u32>,
    min_detection_confidence: Option<f32>,
    min_tracking_confidence: Option<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct RelayConfig {
    pub camera: CameraSettings,
    pub transport: TransportSettings,
    pub estimator: EstimatorSettings,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    /// Device path, camera index, or `stub://name` for synthetic frames.
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl CameraSettings {
    /// The capture format to request from the device.
    pub fn requested(&self) -> CaptureFormat {
        CaptureFormat {
            width: self.width,
            height: self.height,
            fps: self.fps as f64,
        }
    }
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: DEFAULT_FPS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransportSettings {
    /// Destination `host:port` for pose datagrams.
    pub udp_addr: String,
    /// Permit non-loopback destinations.
    pub allow_remote: bool,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            udp_addr: DEFAULT_UDP_ADDR.to_string(),
            allow_remote: false,
        }
    }
}

/// Pose estimator backend selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EstimatorKind {
    /// Animated figure, no model required.
    #[default]
    Synthetic,
    /// ONNX landmark model run with tract. Requires `backend-tract`.
    Tract,
}

impl FromStr for EstimatorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "synthetic" | "stub" => Ok(Self::Synthetic),
            "tract" | "onnx" => Ok(Self::Tract),
            other => Err(anyhow!(
                "unknown estimator backend '{}': expected 'synthetic' or 'tract'",
                other
            )),
        }
    }
}

impl std::fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Synthetic => write!(f, "synthetic"),
            Self::Tract => write!(f, "tract"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EstimatorSettings {
    pub backend: EstimatorKind,
    pub model_path: Option<PathBuf>,
    pub input_width: u32,
    pub input_height: u32,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            backend: EstimatorKind::Synthetic,
            model_path: None,
            input_width: DEFAULT_INPUT_SIZE,
            input_height: DEFAULT_INPUT_SIZE,
            min_detection_confidence: DEFAULT_MIN_DETECTION_CONFIDENCE,
            min_tracking_confidence: DEFAULT_MIN_TRACKING_CONFIDENCE,
        }
    }
}

impl RelayConfig {
    /// Load configuration from the file named by `POSE_RELAY_CONFIG` (if any),
    /// then apply environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("POSE_RELAY_CONFIG").ok().map(PathBuf::from);
        Self::load_from(config_path.as_deref())
    }

    /// Load configuration from an explicit file (if any), then apply
    /// environment overrides.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => read_config_file(path)?,
            None => RelayConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg)?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: RelayConfigFile) -> Result<Self> {
        let camera_file = file.camera.unwrap_or_default();
        let camera_defaults = CameraSettings::default();
        let camera = CameraSettings {
            device: camera_file.device.unwrap_or(camera_defaults.device),
            width: camera_file.width.unwrap_or(camera_defaults.width),
            height: camera_file.height.unwrap_or(camera_defaults.height),
            fps: camera_file.fps.unwrap_or(camera_defaults.fps),
        };

        let transport_file = file.transport.unwrap_or_default();
        let transport = TransportSettings {
            udp_addr: transport_file
                .udp_addr
                .unwrap_or_else(|| DEFAULT_UDP_ADDR.to_string()),
            allow_remote: transport_file.allow_remote.unwrap_or(false),
        };

        let estimator_file = file.estimator.unwrap_or_default();
        let estimator_defaults = EstimatorSettings::default();
        let backend = match estimator_file.backend.as_deref() {
            Some(name) => name.parse()?,
            // A configured model implies the model backend.
            None if estimator_file.model_path.is_some() => EstimatorKind::Tract,
            None => estimator_defaults.backend,
        };
        let estimator = EstimatorSettings {
            backend,
            model_path: estimator_file.model_path,
            input_width: estimator_file
                .input_width
                .unwrap_or(estimator_defaults.input_width),
            input_height: estimator_file
                .input_height
                .unwrap_or(estimator_defaults.input_height),
            min_detection_confidence: estimator_file
                .min_detection_confidence
                .unwrap_or(estimator_defaults.min_detection_confidence),
            min_tracking_confidence: estimator_file
                .min_tracking_confidence
                .unwrap_or(estimator_defaults.min_tracking_confidence),
        };

        Ok(Self {
            camera,
            transport,
            estimator,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(device) = std::env::var("POSE_RELAY_DEVICE") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
        if let Ok(addr) = std::env::var("POSE_RELAY_UDP_ADDR") {
            if !addr.trim().is_empty() {
                self.transport.udp_addr = addr;
            }
        }
        if let Ok(allow) = std::env::var("POSE_RELAY_ALLOW_REMOTE") {
            self.transport.allow_remote = parse_bool(&allow).ok_or_else(|| {
                anyhow!("POSE_RELAY_ALLOW_REMOTE must be true/false, got '{}'", allow)
            })?;
        }
        if let Ok(model) = std::env::var("POSE_RELAY_MODEL") {
            if !model.trim().is_empty() {
                self.estimator.model_path = Some(PathBuf::from(model));
                self.estimator.backend = EstimatorKind::Tract;
            }
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.camera.device.trim().is_empty() {
            return Err(anyhow!("camera.device must not be empty"));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera width and height must be greater than zero"));
        }
        if self.camera.fps == 0 {
            return Err(anyhow!("camera.fps must be greater than zero"));
        }
        if self.transport.udp_addr.trim().is_empty() {
            return Err(anyhow!("transport.udp_addr must not be empty"));
        }
        for (name, value) in [
            (
                "min_detection_confidence",
                self.estimator.min_detection_confidence,
            ),
            (
                "min_tracking_confidence",
                self.estimator.min_tracking_confidence,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow!("estimator.{} must be within 0..=1", name));
            }
        }
        if self.estimator.input_width == 0 || self.estimator.input_height == 0 {
            return Err(anyhow!("estimator input size must be greater than zero"));
        }
        if self.estimator.backend == EstimatorKind::Tract && self.estimator.model_path.is_none() {
            return Err(anyhow!("estimator backend 'tract' requires model_path"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<RelayConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
