use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Matcher timing knobs. Both take effect on the next key event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Idle gap in milliseconds that clears the pending token history.
    pub timeout_ms: u64,

    /// Cooldown in milliseconds after a fired sequence during which key
    /// events are ignored outright.
    pub blocking_delay_ms: u64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 500,
            blocking_delay_ms: 10,
        }
    }
}

impl MatcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn blocking_delay(&self) -> Duration {
        Duration::from_millis(self.blocking_delay_ms)
    }

    /// Merge a patch: `None` fields are left untouched, `Some` values are
    /// assigned as-is. Zero is a valid assignment, not "unset".
    pub fn apply(&mut self, patch: &ConfigPatch) {
        if let Some(timeout_ms) = patch.timeout_ms {
            self.timeout_ms = timeout_ms;
        }
        if let Some(blocking_delay_ms) = patch.blocking_delay_ms {
            self.blocking_delay_ms = blocking_delay_ms;
        }
    }
}

/// Partial configuration update for `set_configuration`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocking_delay_ms: Option<u64>,
}

/// Demo application settings persisted alongside the matcher knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Show the fading key press indicator.
    pub show_key_indicator: bool,

    /// Show the engine log pane.
    pub show_engine_log: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_key_indicator: true,
            show_engine_log: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub matcher: MatcherConfig,
    pub display: DisplayConfig,
}

impl Config {
    /// Load config from the default location, creating it with defaults on
    /// first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save()?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Default config file path.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("keyseq").join("config.toml"))
    }
}
