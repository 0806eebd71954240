use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::error::ConfigError;
use crate::session::{
    Difficulty, ErrorCountPolicy, SessionConfig, DEFAULT_COUNTDOWN_SECS, DEFAULT_DURATION_SECS,
};

/// Saved defaults for new sessions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub difficulty: Difficulty,
    /// `None` means untimed
    pub duration_secs: Option<u64>,
    pub countdown_secs: u32,
    pub error_policy: ErrorCountPolicy,
    pub custom_text: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Intermediate,
            duration_secs: Some(DEFAULT_DURATION_SECS),
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            error_policy: ErrorCountPolicy::default(),
            custom_text: None,
        }
    }
}

impl Config {
    pub fn to_session_config(&self) -> Result<SessionConfig, ConfigError> {
        if self
            .custom_text
            .as_deref()
            .is_some_and(|t| t.trim().is_empty())
        {
            return Err(ConfigError::EmptyCustomText);
        }
        let config = SessionConfig {
            difficulty: self.difficulty,
            duration: self.duration_secs.map(Duration::from_secs),
            countdown_secs: self.countdown_secs,
            error_policy: self.error_policy,
        };
        config.validate()?;
        Ok(config)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("typeheat_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            difficulty: Difficulty::Code,
            duration_secs: None,
            countdown_secs: 0,
            error_policy: ErrorCountPolicy::EveryKeystroke,
            custom_text: Some("fn main() {}".into()),
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn missing_or_corrupt_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"difficulty":"expert"}"#).unwrap();
        let loaded = FileConfigStore::with_path(&path).load();
        assert_eq!(loaded.difficulty, Difficulty::Expert);
        assert_eq!(loaded.duration_secs, Some(DEFAULT_DURATION_SECS));
    }

    #[test]
    fn session_config_validation() {
        let cfg = Config::default();
        let session = cfg.to_session_config().unwrap();
        assert_eq!(session.duration, Some(Duration::from_secs(60)));

        let zero = Config {
            duration_secs: Some(0),
            ..Config::default()
        };
        assert_matches!(zero.to_session_config(), Err(ConfigError::ZeroDuration));

        let blank = Config {
            custom_text: Some("  ".into()),
            ..Config::default()
        };
        assert_matches!(blank.to_session_config(), Err(ConfigError::EmptyCustomText));

        let unknown = Config {
            difficulty: Difficulty::Unrecognized,
            ..Config::default()
        };
        assert_matches!(
            unknown.to_session_config(),
            Err(ConfigError::UnsupportedDifficulty(Difficulty::Unrecognized))
        );
    }
}
