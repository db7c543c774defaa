// scanline-demo/src/config.rs

use anyhow::{Context, Result};
use scanline_core::{BufferingMode, OpenOptions};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_BUFFERING: &str = "SCANLINE_BUFFERING";
pub const ENV_EXCLUSIVE: &str = "SCANLINE_EXCLUSIVE";
pub const ENV_FPS: &str = "SCANLINE_FPS";
pub const ENV_DURATION_MS: &str = "SCANLINE_DURATION_MS";
pub const ENV_DEVICE: &str = "SCANLINE_DEVICE";

#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    pub buffering: BufferingMode,
    pub exclusive: bool,
    pub fps: u32,
    pub duration: Duration,
    /// Overrides the primary device path; the secondary fallback stays.
    pub device: Option<PathBuf>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            buffering: BufferingMode::Shadow,
            exclusive: true,
            fps: 30,
            duration: Duration::from_millis(5000),
            device: None,
        }
    }
}

impl DemoConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup(ENV_BUFFERING) {
            config.buffering = v.parse().with_context(|| format!("{ENV_BUFFERING}={v}"))?;
        }
        if let Some(v) = lookup(ENV_EXCLUSIVE) {
            config.exclusive = parse_bool(&v).with_context(|| format!("{ENV_EXCLUSIVE}={v}"))?;
        }
        if let Some(v) = lookup(ENV_FPS) {
            let fps: u32 = v.trim().parse().with_context(|| format!("{ENV_FPS}={v}"))?;
            anyhow::ensure!(fps > 0, "{ENV_FPS} must be at least 1");
            config.fps = fps;
        }
        if let Some(v) = lookup(ENV_DURATION_MS) {
            let ms: u64 = v.trim().parse().with_context(|| format!("{ENV_DURATION_MS}={v}"))?;
            config.duration = Duration::from_millis(ms);
        }
        if let Some(v) = lookup(ENV_DEVICE) {
            if !v.trim().is_empty() {
                config.device = Some(PathBuf::from(v.trim()));
            }
        }

        Ok(config)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }

    pub fn open_options(&self) -> OpenOptions {
        let options = OpenOptions::new()
            .buffering(self.buffering)
            .exclusive(self.exclusive);
        match &self.device {
            Some(path) => options.primary_path(path),
            None => options,
        }
    }
}

fn parse_bool(v: &str) -> Result<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got {other:?}"),
    }
}
