use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config read: {0}")]
    Io(#[from] io::Error),
    #[error("config parse: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToneConfig {
    #[serde(default = "ToneConfig::default_sample_rate")]
    pub sample_rate: u32,
    /// Longest bounded tone accepted; longer requests are invalid.
    #[serde(default = "ToneConfig::default_max_duration_ms")]
    pub max_duration_ms: u32,
}

impl ToneConfig {
    /// Divides cleanly for common audible frequencies, and keeps the
    /// half-second loop unit small.
    pub const DEFAULT_SAMPLE_RATE: u32 = 25_000;
    pub const MAX_SAMPLE_RATE: u32 = 192_000;
    pub const DEFAULT_MAX_DURATION_MS: u32 = 60_000;

    fn default_sample_rate() -> u32 {
        Self::DEFAULT_SAMPLE_RATE
    }

    fn default_max_duration_ms() -> u32 {
        Self::DEFAULT_MAX_DURATION_MS
    }
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            sample_rate: Self::default_sample_rate(),
            max_duration_ms: Self::default_max_duration_ms(),
        }
    }
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// Fine-grained duty cycle over a fixed period, level in [0, 1].
    Continuous,
    /// Eleven coarse duty-cycle levels, level in [0, 10].
    Discrete,
    /// Level is a raw signed duration in milliseconds.
    Passthrough,
}

impl Default for PolicyKind {
    fn default() -> Self {
        Self::Continuous
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HapticConfig {
    #[serde(default)]
    pub policy: PolicyKind,
    #[serde(default = "HapticConfig::default_steps")]
    pub steps: usize,
    #[serde(default = "HapticConfig::default_period_ms")]
    pub period_ms: u32,
}

impl HapticConfig {
    fn default_steps() -> usize {
        1000
    }
    fn default_period_ms() -> u32 {
        1000
    }
}

impl Default for HapticConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::default(),
            steps: Self::default_steps(),
            period_ms: Self::default_period_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub tone: ToneConfig,
    #[serde(default)]
    pub haptic: HapticConfig,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// A missing file yields the defaults; anything else unreadable is an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match fs::read_to_string(path.as_ref()) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "pulsetone_config_test_{}_{}_{}",
            std::process::id(),
            name,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn empty_document_is_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.tone.sample_rate, 25_000);
        assert_eq!(config.tone.max_duration_ms, 60_000);
        assert_eq!(config.haptic.policy, PolicyKind::Continuous);
        assert_eq!(config.haptic.steps, 1000);
        assert_eq!(config.haptic.period_ms, 1000);
    }

    #[test]
    fn partial_sections() {
        let config = Config::from_toml_str("[haptic]\npolicy = \"discrete\"\n").unwrap();
        assert_eq!(config.haptic.policy, PolicyKind::Discrete);
        assert_eq!(config.haptic.steps, 1000);
        assert_eq!(config.tone, ToneConfig::default());
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let result = Config::from_toml_str("[haptic]\npolicy = \"louder\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_defaults() {
        let path = unique_path("missing.toml");
        let _ = fs::remove_file(&path);
        assert_eq!(Config::load_or_default(&path).unwrap(), Config::default());
    }

    #[test]
    fn reads_existing_file() {
        let path = unique_path("custom.toml");
        let custom = Config {
            tone: ToneConfig { sample_rate: 8000, max_duration_ms: 5000 },
            haptic: HapticConfig {
                policy: PolicyKind::Passthrough,
                steps: 10,
                period_ms: 500,
            },
        };
        fs::write(&path, toml::to_string_pretty(&custom).unwrap()).unwrap();

        let config = Config::load_or_default(&path).unwrap();
        assert_eq!(config, custom);

        let _ = fs::remove_file(&path);
    }
}
