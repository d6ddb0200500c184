// SPDX-License-Identifier: GPL-3.0-only

//! User configuration, stored as JSON under the platform config directory

use crate::capture::{CaptureKind, PhotoCaptureBuilder, VideoCaptureBuilder};
use crate::constants::{DEFAULT_CLIENT_VERSION, DEFAULT_ENDPOINT, timing};
use crate::errors::{ThetaError, ThetaResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const CONFIG_DIR: &str = "thetalink";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device base URL
    pub endpoint: String,
    /// Interval between status polls of a capture, milliseconds
    pub poll_interval_ms: u64,
    /// Give up on a capture command after this many seconds
    pub capture_timeout_secs: Option<u64>,
    /// API version negotiated on connect
    pub client_version: i64,
    /// Stop the CLI preview after this many frames
    pub preview_frame_limit: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            poll_interval_ms: timing::DEFAULT_POLL_INTERVAL.as_millis() as u64,
            capture_timeout_secs: None,
            client_version: DEFAULT_CLIENT_VERSION,
            preview_frame_limit: None,
        }
    }
}

impl Config {
    /// `<config dir>/thetalink/config.json`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> ThetaResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> ThetaResult<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ThetaError::Configuration(format!(
                    "read {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        serde_json::from_str(&text).map_err(|e| {
            ThetaError::Configuration(format!("parse {}: {}", path.display(), e))
        })
    }

    pub fn save(&self) -> ThetaResult<PathBuf> {
        let path = Self::default_path().ok_or_else(|| {
            ThetaError::Configuration("no config directory on this platform".to_string())
        })?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> ThetaResult<()> {
        let io_error =
            |e: std::io::Error| ThetaError::Configuration(format!("write {}: {}", path.display(), e));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| ThetaError::Configuration(format!("serialize config: {}", e)))?;
        std::fs::write(path, text).map_err(io_error)?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn capture_timeout(&self) -> Option<Duration> {
        self.capture_timeout_secs.map(Duration::from_secs)
    }

    /// Photo builder preloaded with this configuration's cadence and deadline
    pub fn photo_builder(&self) -> PhotoCaptureBuilder {
        let builder = PhotoCaptureBuilder::new().poll_interval(self.poll_interval());
        match self.capture_timeout() {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    pub fn video_builder(&self) -> VideoCaptureBuilder {
        let builder = VideoCaptureBuilder::new().poll_interval(self.poll_interval());
        match self.capture_timeout() {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    /// Check the timing fields for `kind` by building an empty capture config
    pub fn validate(&self, kind: CaptureKind) -> ThetaResult<()> {
        match kind {
            CaptureKind::Photo => self.photo_builder().build().map(|_| ()),
            CaptureKind::Video => self.video_builder().build().map(|_| ()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"poll_interval_ms": 250}"#).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.client_version, 2);
    }

    #[test]
    fn test_validate_rejects_tiny_interval() {
        let config = Config {
            poll_interval_ms: 1,
            ..Config::default()
        };
        assert!(config.validate(CaptureKind::Photo).is_err());
        assert!(Config::default().validate(CaptureKind::Video).is_ok());
    }
}
