//! Player configuration — tempo and key timing loaded from ~/.keyroll/player.yaml.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Player configuration loaded from YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Tempo in effect until the script's first `BPM` directive.
    #[serde(default = "default_bpm")]
    pub initial_bpm: u32,
    /// How long each chord is held down, in milliseconds.
    #[serde(default = "default_hold_ms")]
    pub key_hold_ms: u64,
    /// Delay between successive key-downs within one chord, in milliseconds.
    #[serde(default = "default_stagger_ms")]
    pub key_stagger_ms: u64,
}

fn default_bpm() -> u32 {
    120
}

fn default_hold_ms() -> u64 {
    30
}

fn default_stagger_ms() -> u64 {
    2
}

impl PlayerConfig {
    /// Standard config path (~/.keyroll/player.yaml).
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".keyroll").join("player.yaml"))
    }

    /// Load config from the standard path.
    /// Returns None if the file doesn't exist (graceful fallback).
    pub fn load() -> Option<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load config from an explicit path. Returns None if missing or malformed.
    pub fn load_from(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_yaml::from_str(&content).ok()
    }

    /// Starting tempo, never zero.
    pub fn tempo(&self) -> u32 {
        self.initial_bpm.max(1)
    }

    pub fn key_hold(&self) -> Duration {
        Duration::from_millis(self.key_hold_ms)
    }

    pub fn key_stagger(&self) -> Duration {
        Duration::from_millis(self.key_stagger_ms)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            initial_bpm: default_bpm(),
            key_hold_ms: default_hold_ms(),
            key_stagger_ms: default_stagger_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlayerConfig::default();
        assert_eq!(config.initial_bpm, 120);
        assert_eq!(config.key_hold(), Duration::from_millis(30));
        assert_eq!(config.key_stagger(), Duration::from_millis(2));
    }

    #[test]
    fn serialize_deserialize() {
        let config = PlayerConfig {
            initial_bpm: 90,
            key_hold_ms: 45,
            key_stagger_ms: 0,
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: PlayerConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_config_uses_defaults() {
        let yaml = "initial_bpm: 200\n";
        let config: PlayerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.initial_bpm, 200);
        assert_eq!(config.key_hold_ms, 30);
        assert_eq!(config.key_stagger_ms, 2);
    }

    #[test]
    fn zero_tempo_is_clamped() {
        let config = PlayerConfig {
            initial_bpm: 0,
            ..PlayerConfig::default()
        };
        assert_eq!(config.tempo(), 1);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player.yaml");
        std::fs::write(&path, "key_hold_ms: 50\n").unwrap();
        let config = PlayerConfig::load_from(&path).unwrap();
        assert_eq!(config.key_hold_ms, 50);
        assert_eq!(config.initial_bpm, 120);
    }

    #[test]
    fn load_missing_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PlayerConfig::load_from(&dir.path().join("absent.yaml")).is_none());
    }
}
