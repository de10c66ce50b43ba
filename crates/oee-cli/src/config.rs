//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use oee_core::{OeeInput, SignalFilter};

const NS_PER_MS: i64 = 1_000_000;

/// Application configuration.
///
/// Durations are configured in milliseconds and converted to the core's
/// nanosecond resolution by [`Config::oee_input`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Event names counted as planned stoppage.
    #[serde(default)]
    pub planned_events: Vec<String>,

    /// Event names counted as unplanned stoppage.
    #[serde(default)]
    pub unplanned_events: Vec<String>,

    /// Event names that increment a named production counter.
    #[serde(default)]
    pub countable_events: Vec<String>,

    /// Nominal time to produce one unit, in milliseconds.
    #[serde(default)]
    pub ideal_cycle_ms: i64,

    /// Inter-signal gaps shorter than this are discarded as noise.
    #[serde(default)]
    pub signal_filter_min_ms: i64,

    /// Inter-signal gaps longer than this are discarded (0 = unbounded).
    #[serde(default)]
    pub signal_filter_max_ms: i64,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("oee.db"),
            planned_events: Vec::new(),
            unplanned_events: Vec::new(),
            countable_events: Vec::new(),
            ideal_cycle_ms: 0,
            signal_filter_min_ms: 0,
            signal_filter_max_ms: 0,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (OEE_*)
        figment = figment.merge(Env::prefixed("OEE_"));

        figment.extract()
    }

    /// Builds the core classification parameters from this configuration.
    #[must_use]
    pub fn oee_input(&self) -> OeeInput {
        OeeInput::new(
            self.planned_events.iter().cloned(),
            self.unplanned_events.iter().cloned(),
            self.countable_events.iter().cloned(),
            self.ideal_cycle_ms * NS_PER_MS,
            SignalFilter {
                min_ns: self.signal_filter_min_ms * NS_PER_MS,
                max_ns: self.signal_filter_max_ms * NS_PER_MS,
            },
        )
    }
}

/// Returns the platform-specific config directory for oee.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("oee"))
}

/// Returns the platform-specific data directory for oee.
///
/// On Linux: `~/.local/share/oee`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("oee"))
}
