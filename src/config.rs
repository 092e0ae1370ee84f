//! Configuration with YAML support.
//!
//! The cache needs exactly one decision from the host: where the database
//! file lives. With no override it resolves the platform application-data
//! directory; hosts that want a fixed location (or tests) set an explicit
//! path, with `~` expansion.

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::store::schema;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Database configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Explicit database file path. `None` resolves the platform
    /// application-data directory at open time.
    #[serde(default)]
    pub path: Option<String>,
}

impl CacheConfig {
    /// Load configuration from a YAML file.
    /// Searches in order:
    /// 1. Provided path
    /// 2. ./chatcache.yaml (current directory)
    /// 3. ~/.config/chatcache/chatcache.yaml
    pub fn load(path: &str) -> Result<Self, CacheError> {
        let search_paths = vec![
            shellexpand::tilde(path).to_string(),
            "chatcache.yaml".to_string(),
            shellexpand::tilde("~/.config/chatcache/chatcache.yaml").to_string(),
        ];

        for search_path in &search_paths {
            if std::path::Path::new(search_path).exists() {
                let content =
                    std::fs::read_to_string(search_path).map_err(CacheError::init)?;
                let config: CacheConfig =
                    serde_yaml::from_str(&content).map_err(CacheError::init)?;
                return Ok(config);
            }
        }

        // No config file found, use defaults
        Ok(CacheConfig::default())
    }

    /// Resolve the database file path, expanding `~` in overrides.
    pub fn database_path(&self) -> Result<PathBuf, CacheError> {
        match &self.database.path {
            Some(path) => Ok(PathBuf::from(shellexpand::tilde(path).to_string())),
            None => {
                let dirs = ProjectDirs::from("", "", "chatcache").ok_or_else(|| {
                    CacheError::Initialization(
                        "no application data directory available".to_string(),
                    )
                })?;
                Ok(dirs.data_dir().join(schema::DB_FILE_NAME))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_ends_with_db_file_name() {
        let config = CacheConfig::default();
        let path = config.database_path().unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            schema::DB_FILE_NAME
        );
    }

    #[test]
    fn override_path_expands_tilde() {
        let config = CacheConfig {
            database: DatabaseConfig {
                path: Some("~/cache/chat.db".to_string()),
            },
        };
        let path = config.database_path().unwrap();
        assert!(!path.to_str().unwrap().contains('~'));
        assert!(path.ends_with("cache/chat.db"));
    }

    #[test]
    fn yaml_parsing() {
        let yaml = r#"
database:
  path: /tmp/chatcache-test/messages.db
"#;
        let config: CacheConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/tmp/chatcache-test/messages.db")
        );
    }

    #[test]
    fn load_reads_an_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("chatcache.yaml");
        std::fs::write(&file, "database:\n  path: /tmp/elsewhere.db\n").unwrap();

        let config = CacheConfig::load(file.to_str().unwrap()).unwrap();
        assert_eq!(config.database.path.as_deref(), Some("/tmp/elsewhere.db"));
    }

    #[test]
    fn empty_yaml_uses_defaults() {
        let config: CacheConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.database.path.is_none());
    }
}
