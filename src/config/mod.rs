//! Layered settings: built-in defaults, an optional TOML file, then
//! `PLAYDECK_*` environment variables. Command-line flags are applied on top
//! by the binary.
//!
//! ```toml
//! min_transition = "1500ms"
//! fetch_latency = "300ms"
//! catalog = "modules.json"
//! theme = "dark"
//! ```

pub mod duration;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use serde::Deserialize;

use crate::navigation::DEFAULT_BASE_URL;
use self::duration::parse_duration;

/// Prefix for environment overrides, e.g. `PLAYDECK_MIN_TRANSITION=2s`.
pub const ENV_PREFIX: &str = "PLAYDECK";

/// Colour scheme selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeChoice {
    #[default]
    Auto,
    Dark,
    Light,
}

/// Runtime settings. Durations are kept as strings until resolved so the
/// file and environment can use the same `1200ms` / `1.5s` syntax as the CLI.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Minimum loading-indicator duration.
    pub min_transition: String,
    /// Simulated transport delay for every module fetch.
    pub fetch_latency: String,
    /// Event-loop poll interval.
    pub tick_rate: String,
    /// JSON catalog to use instead of the bundled one.
    pub catalog: Option<PathBuf>,
    /// URL of the first history entry.
    pub base_url: String,
    /// Where tracing output goes. No file, no logging.
    pub log_file: Option<PathBuf>,
    pub theme: ThemeChoice,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_transition: "1200ms".to_string(),
            fetch_latency: "0ms".to_string(),
            tick_rate: "100ms".to_string(),
            catalog: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            log_file: None,
            theme: ThemeChoice::Auto,
        }
    }
}

impl Settings {
    /// Load settings from `path` (if given) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::build(path, Environment::with_prefix(ENV_PREFIX))
    }

    /// Load with an explicit set of environment variables instead of the
    /// process environment.
    pub fn load_with_env(path: Option<&Path>, vars: ::config::Map<String, String>) -> Result<Self> {
        Self::build(path, Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn build(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(env)
            .build()
            .context("Failed to read settings")?;
        let settings: Settings = config
            .try_deserialize()
            .context("Invalid settings")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check that every duration parses.
    pub fn validate(&self) -> Result<()> {
        self.min_transition()?;
        self.fetch_latency()?;
        self.tick_rate()?;
        Ok(())
    }

    pub fn min_transition(&self) -> Result<Duration> {
        parse_duration(&self.min_transition).context("min_transition")
    }

    pub fn fetch_latency(&self) -> Result<Duration> {
        parse_duration(&self.fetch_latency).context("fetch_latency")
    }

    pub fn tick_rate(&self) -> Result<Duration> {
        parse_duration(&self.tick_rate).context("tick_rate")
    }
}
