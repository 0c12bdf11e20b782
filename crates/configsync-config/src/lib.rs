use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_STORAGE_PATH: &str = "~/.local/share/configsync";
pub const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Where the templates and the version manifest are fetched from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_template_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords_template_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_manifest_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub storage_path: PathBuf,
    #[serde(default = "default_save_debounce_ms")]
    pub save_debounce_ms: u64,
    #[serde(default)]
    pub remote: RemoteConfig,
}

fn default_save_debounce_ms() -> u64 {
    DEFAULT_SAVE_DEBOUNCE_MS
}

impl Default for Config {
    fn default() -> Self {
        let storage_path = PathBuf::from(DEFAULT_STORAGE_PATH);
        Self {
            storage_path: Self::expand_path(&storage_path).unwrap_or(storage_path),
            save_debounce_ms: DEFAULT_SAVE_DEBOUNCE_MS,
            remote: RemoteConfig::default(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the storage location
        config.storage_path =
            Self::expand_path(&config.storage_path).unwrap_or(config.storage_path);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/configsync");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Quiet period before an edited buffer is written to storage.
    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/configsync/config.toml"));
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: Config = toml::from_str(r#"storage_path = "/srv/configsync""#).unwrap();

        assert_eq!(config.save_debounce_ms, 1000);
        assert_eq!(config.save_debounce(), Duration::from_secs(1));
        assert_eq!(config.remote, RemoteConfig::default());
    }

    #[test]
    fn test_default_storage_is_expanded() {
        let config = Config::default();
        assert!(!config.storage_path.to_string_lossy().starts_with('~'));
        assert!(config.storage_path.ends_with(".local/share/configsync"));
    }

    #[test]
    fn test_remote_table_is_read() {
        let config: Config = toml::from_str(
            r#"
storage_path = "/srv/configsync"
save_debounce_ms = 250

[remote]
config_template_url = "https://example.com/config.yaml"
version_manifest_url = "https://example.com/configs_version.txt"
"#,
        )
        .unwrap();

        assert_eq!(config.save_debounce(), Duration::from_millis(250));
        assert_eq!(
            config.remote.config_template_url.as_deref(),
            Some("https://example.com/config.yaml")
        );
        assert_eq!(config.remote.keywords_template_url, None);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path);

        assert!(expanded.is_some());
        let expanded = expanded.unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("CONFIGSYNC_TEST_VAR", "/test/env/path");
        }

        let path = PathBuf::from("$CONFIGSYNC_TEST_VAR/subdir");
        let expanded = Config::expand_path(&path);

        assert_eq!(expanded, Some(PathBuf::from("/test/env/path/subdir")));

        unsafe {
            env::remove_var("CONFIGSYNC_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_path_with_relative_path() {
        let path = PathBuf::from("relative/path");
        assert_eq!(Config::expand_path(&path), Some(path));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_reports_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "storage_path = [").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
    }

    #[test]
    fn test_save_creates_parent_and_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested/dir/config.toml");
        let test_config = Config {
            storage_path: PathBuf::from("/tmp/configsync-store"),
            save_debounce_ms: 500,
            remote: RemoteConfig {
                keywords_template_url: Some("https://example.com/words.txt".to_string()),
                ..RemoteConfig::default()
            },
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }
}
