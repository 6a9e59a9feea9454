use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use roomcast_core::{Catalog, SessionTiming};
use serde::Deserialize;

use crate::cli::Args;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-3.1-pro-preview";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Host settings. Every field has a default so a partial JSON file works.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub animation_ms: u64,
    pub camera_ms: u64,
    pub frame_ms: u64,
    /// JSON catalog replacing the built-in furniture list.
    pub catalog: Option<PathBuf>,
    /// Directory model references are resolved against.
    pub assets_root: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            temperature: 0.2,
            timeout_secs: 30,
            animation_ms: 500,
            camera_ms: 800,
            frame_ms: 16,
            catalog: None,
            assets_root: PathBuf::from("assets"),
        }
    }
}

impl EngineConfig {
    /// Read the optional config file; a missing path yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Config file, then command-line overrides, then the key from the
    /// environment if neither supplied one.
    pub fn from_args(args: &Args) -> Result<Self> {
        let mut config = Self::load(args.config.as_deref())?;
        config.apply_overrides(args);
        if config.api_key.is_none() {
            config.api_key = env::var(API_KEY_ENV).ok();
        }
        config.api_key = config.api_key.filter(|key| !key.trim().is_empty());
        Ok(config)
    }

    pub fn apply_overrides(&mut self, args: &Args) {
        if let Some(catalog) = &args.catalog {
            self.catalog = Some(catalog.clone());
        }
        if let Some(root) = &args.assets_root {
            self.assets_root = root.clone();
        }
        if let Some(model) = &args.model {
            self.model = model.clone();
        }
        if let Some(ms) = args.animation_ms {
            self.animation_ms = ms;
        }
        if let Some(ms) = args.frame_ms {
            self.frame_ms = ms;
        }
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        let Some(path) = &self.catalog else {
            return Ok(Catalog::builtin());
        };
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading catalog {}", path.display()))?;
        Catalog::from_json_str(&data).with_context(|| format!("loading catalog {}", path.display()))
    }

    pub fn timing(&self) -> SessionTiming {
        SessionTiming {
            animation: Duration::from_millis(self.animation_ms),
            camera: Duration::from_millis(self.camera_ms),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Frame period, never zero.
    pub fn frame_period(&self) -> Duration {
        Duration::from_millis(self.frame_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"model":"gemini-test","frame_ms":33}}"#).expect("write config");
        let config = EngineConfig::load(Some(file.path())).expect("config loads");
        assert_eq!(config.model, "gemini-test");
        assert_eq!(config.frame_ms, 33);
        assert_eq!(config.animation_ms, 500);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"frame_rate":60}}"#).expect("write config");
        assert!(EngineConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn cli_flags_override_file_values() {
        let args = Args::parse_from([
            "roomcast",
            "--model",
            "gemini-cli",
            "--animation-ms",
            "250",
        ]);
        let mut config = EngineConfig::default();
        config.apply_overrides(&args);
        assert_eq!(config.model, "gemini-cli");
        assert_eq!(config.timing().animation, Duration::from_millis(250));
        assert_eq!(config.timing().camera, Duration::from_millis(800));
    }

    #[test]
    fn zero_frame_period_is_clamped() {
        let config = EngineConfig {
            frame_ms: 0,
            ..EngineConfig::default()
        };
        assert_eq!(config.frame_period(), Duration::from_millis(1));
    }

    #[test]
    fn builtin_catalog_is_used_without_a_path() {
        let catalog = EngineConfig::default().load_catalog().expect("builtin");
        assert_eq!(catalog.items.len(), 5);
    }
}
