use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::session::test::TestSettings;
use crate::session::{HandMode, TestMode};
use crate::store::sync::RetryPolicy;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_test_mode")]
    pub test_mode: TestMode,
    #[serde(default = "default_hand_mode")]
    pub hand_mode: HandMode,
    /// Seconds in time mode, word count in words mode.
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default = "default_practice_word_count")]
    pub practice_word_count: usize,
    #[serde(default = "default_practice_mix_ratio")]
    pub practice_mix_ratio: f64,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_sync_retries")]
    pub sync_retries: u32,
    #[serde(default = "default_sync_backoff_ms")]
    pub sync_backoff_ms: u64,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_test_mode() -> TestMode {
    TestMode::Time
}
fn default_hand_mode() -> HandMode {
    HandMode::Both
}
fn default_duration() -> u32 {
    30
}
fn default_practice_word_count() -> usize {
    25
}
fn default_practice_mix_ratio() -> f64 {
    0.7
}
fn default_history_limit() -> usize {
    50
}
fn default_sync_retries() -> u32 {
    3
}
fn default_sync_backoff_ms() -> u64 {
    200
}

impl Default for Config {
    fn default() -> Self {
        Self {
            test_mode: default_test_mode(),
            hand_mode: default_hand_mode(),
            duration: default_duration(),
            practice_word_count: default_practice_word_count(),
            practice_mix_ratio: default_practice_mix_ratio(),
            history_limit: default_history_limit(),
            sync_retries: default_sync_retries(),
            sync_backoff_ms: default_sync_backoff_ms(),
            data_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("handtype")
            .join("config.toml")
    }

    /// Clamp hand-edited values into their usable ranges.
    pub fn validate(&mut self) {
        self.duration = self.duration.clamp(1, 600);
        self.practice_word_count = self.practice_word_count.clamp(1, 500);
        self.practice_mix_ratio = if self.practice_mix_ratio.is_finite() {
            self.practice_mix_ratio.clamp(0.0, 1.0)
        } else {
            default_practice_mix_ratio()
        };
        self.history_limit = self.history_limit.clamp(1, 500);
        self.sync_retries = self.sync_retries.clamp(1, 10);
    }

    pub fn test_settings(&self) -> TestSettings {
        TestSettings {
            test_mode: self.test_mode,
            hand_mode: self.hand_mode,
            duration: self.duration,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.sync_retries,
            base_delay: Duration::from_millis(self.sync_backoff_ms),
        }
    }
}
