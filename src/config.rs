use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::control::ChannelConfig;
use crate::detect::DifferencerConfig;
use crate::pipeline::PipelineConfig;

const DEFAULT_SENSITIVITY: f32 = 25.0;
const DEFAULT_MIN_AREA: u32 = 1000;
const DEFAULT_LEARNING_RATE: f32 = 0.05;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SOURCE_URL: &str = "stub://classroom";
const DEFAULT_SOURCE_FPS: u32 = 10;
const DEFAULT_SOURCE_WIDTH: u32 = 640;
const DEFAULT_SOURCE_HEIGHT: u32 = 480;

#[derive(Debug, Deserialize, Default)]
struct SentinelConfigFile {
    detector: Option<DetectorConfigFile>,
    control: Option<ControlConfigFile>,
    source: Option<SourceConfigFile>,
    events: Option<EventsConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    sensitivity: Option<f32>,
    min_area: Option<u32>,
    detect_shadows: Option<bool>,
    learning_rate: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct ControlConfigFile {
    timeout_seconds: Option<u64>,
    channels: Option<Vec<ChannelConfig>>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct EventsConfigFile {
    log_path: Option<PathBuf>,
}

/// Resolved daemon configuration: file values, then env overrides, then
/// validation. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct SentinelConfig {
    pub detector: DetectorSettings,
    pub control: ControlSettings,
    pub source: SourceSettings,
    /// JSONL event log destination. `None` logs events to stderr only.
    pub event_log: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub sensitivity: f32,
    pub min_area: u32,
    pub detect_shadows: bool,
    pub learning_rate: f32,
}

#[derive(Debug, Clone)]
pub struct ControlSettings {
    pub timeout_secs: u64,
    pub channels: Vec<ChannelConfig>,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub url: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

impl SentinelConfig {
    /// Load from the file named by `SENTINEL_CONFIG` (if set), apply env
    /// overrides, validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SENTINEL_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SentinelConfigFile) -> Self {
        let detector = DetectorSettings {
            sensitivity: file
                .detector
                .as_ref()
                .and_then(|d| d.sensitivity)
                .unwrap_or(DEFAULT_SENSITIVITY),
            min_area: file
                .detector
                .as_ref()
                .and_then(|d| d.min_area)
                .unwrap_or(DEFAULT_MIN_AREA),
            detect_shadows: file
                .detector
                .as_ref()
                .and_then(|d| d.detect_shadows)
                .unwrap_or(true),
            learning_rate: file
                .detector
                .as_ref()
                .and_then(|d| d.learning_rate)
                .unwrap_or(DEFAULT_LEARNING_RATE),
        };
        let control = ControlSettings {
            timeout_secs: file
                .control
                .as_ref()
                .and_then(|c| c.timeout_seconds)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            channels: file
                .control
                .and_then(|c| c.channels)
                .unwrap_or_else(default_channels),
        };
        let source = SourceSettings {
            url: file
                .source
                .as_ref()
                .and_then(|s| s.url.clone())
                .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            target_fps: file
                .source
                .as_ref()
                .and_then(|s| s.target_fps)
                .unwrap_or(DEFAULT_SOURCE_FPS),
            width: file
                .source
                .as_ref()
                .and_then(|s| s.width)
                .unwrap_or(DEFAULT_SOURCE_WIDTH),
            height: file
                .source
                .as_ref()
                .and_then(|s| s.height)
                .unwrap_or(DEFAULT_SOURCE_HEIGHT),
        };
        let event_log = file.events.and_then(|e| e.log_path);
        Self {
            detector,
            control,
            source,
            event_log,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(timeout) = std::env::var("SENTINEL_TIMEOUT_SECS") {
            self.control.timeout_secs = timeout
                .parse()
                .map_err(|_| anyhow!("SENTINEL_TIMEOUT_SECS must be an integer number of seconds"))?;
        }
        if let Ok(sensitivity) = std::env::var("SENTINEL_SENSITIVITY") {
            self.detector.sensitivity = sensitivity
                .parse()
                .map_err(|_| anyhow!("SENTINEL_SENSITIVITY must be a number"))?;
        }
        if let Ok(min_area) = std::env::var("SENTINEL_MIN_AREA") {
            self.detector.min_area = min_area
                .parse()
                .map_err(|_| anyhow!("SENTINEL_MIN_AREA must be an integer pixel count"))?;
        }
        if let Ok(url) = std::env::var("SENTINEL_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        if let Ok(path) = std::env::var("SENTINEL_EVENT_LOG") {
            if !path.trim().is_empty() {
                self.event_log = Some(PathBuf::from(path));
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.control.timeout_secs == 0 {
            return Err(anyhow!("timeout_seconds must be greater than zero"));
        }
        if self.control.channels.is_empty() {
            return Err(anyhow!("at least one appliance channel must be configured"));
        }
        let mut seen = std::collections::BTreeSet::new();
        for channel in &self.control.channels {
            if channel.name.trim().is_empty() {
                return Err(anyhow!("channel names must be non-empty"));
            }
            if !seen.insert(channel.name.as_str()) {
                return Err(anyhow!("duplicate channel name: {}", channel.name));
            }
            if channel.timeout_seconds == Some(0) {
                return Err(anyhow!(
                    "channel {} timeout_seconds must be greater than zero",
                    channel.name
                ));
            }
        }
        if self.detector.sensitivity <= 0.0 {
            return Err(anyhow!("sensitivity must be positive"));
        }
        if self.detector.min_area == 0 {
            return Err(anyhow!("min_area must be at least one pixel"));
        }
        if !(0.0..=1.0).contains(&self.detector.learning_rate) || self.detector.learning_rate == 0.0
        {
            return Err(anyhow!("learning_rate must be in (0, 1]"));
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("source resolution must be non-zero"));
        }
        if self.source.target_fps == 0 {
            return Err(anyhow!("target_fps must be at least 1"));
        }
        Ok(())
    }

    /// Differencer settings bound to the source resolution.
    pub fn differencer_config(&self) -> DifferencerConfig {
        DifferencerConfig {
            width: self.source.width,
            height: self.source.height,
            sensitivity: self.detector.sensitivity,
            min_area: self.detector.min_area,
            detect_shadows: self.detector.detect_shadows,
            learning_rate: self.detector.learning_rate,
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            differencer: self.differencer_config(),
            timeout_secs: self.control.timeout_secs,
            channels: self.control.channels.clone(),
        }
    }
}

fn default_channels() -> Vec<ChannelConfig> {
    vec![
        ChannelConfig {
            name: "lights".to_string(),
            timeout_seconds: None,
        },
        ChannelConfig {
            name: "fans".to_string(),
            timeout_seconds: None,
        },
    ]
}

fn read_config_file(path: &Path) -> Result<SentinelConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
