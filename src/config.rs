use std::path::Path;

use serde::Deserialize;

fn default_bind_address() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_static_dir() -> String { "static".to_string() }
fn default_database_url() -> String { "sqlite://data/solar_calculations.db".to_string() }
fn default_memory_capacity() -> usize { 100 }
fn default_fallback_to_memory() -> bool { true }
fn default_history_limit() -> usize { 10 }

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Entries returned by the history endpoint
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            history_limit: default_history_limit(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served for every path outside `/api`
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Ring size of the in-memory store
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,
    /// Use the in-memory store when SQLite cannot be opened
    #[serde(default = "default_fallback_to_memory")]
    pub fallback_to_memory: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_url: default_database_url(),
            memory_capacity: default_memory_capacity(),
            fallback_to_memory: default_fallback_to_memory(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            tracing::warn!("{} not found, using default configuration", path);
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"server": {"port": 9000}}"#).unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.bind_address, "0.0.0.0");
        assert_eq!(cfg.storage.backend, StorageBackend::Sqlite);
        assert_eq!(cfg.storage.memory_capacity, 100);
        assert!(cfg.storage.fallback_to_memory);
        assert_eq!(cfg.history_limit, 10);
    }

    #[test]
    fn test_memory_backend() {
        let cfg: Config =
            serde_json::from_str(r#"{"storage": {"backend": "memory", "memory_capacity": 5}}"#).unwrap();
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
        assert_eq!(cfg.storage.memory_capacity, 5);
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(serde_json::from_str::<Config>(r#"{"storage": {"backend": "redis"}}"#).is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let cfg = Config::load_or_default("/definitely/not/here/config.json").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.history_limit, 10);
    }
}
