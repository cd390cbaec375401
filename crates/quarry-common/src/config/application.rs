use std::num::NonZeroUsize;
use std::thread::available_parallelism;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

const DEFAULT_CONFIG: &str = include_str!("default.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub ingest: IngestConfig,
    pub naming: NamingConfig,
}

impl AppConfig {
    pub fn load() -> CommonResult<Self> {
        Self::figment()
            .admerge(Env::prefixed("QUARRY__").map(|p| p.as_str().replace("__", ".").into()))
            .extract()
            .map_err(CommonError::from)
    }

    /// Loads the embedded defaults without consulting the environment.
    pub fn load_default() -> CommonResult<Self> {
        Self::figment().extract().map_err(CommonError::from)
    }

    fn figment() -> Figment {
        Figment::from(Toml::string(DEFAULT_CONFIG))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ingest: IngestConfig::default(),
            naming: NamingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub chunk_size: usize,
    pub max_threads: usize,
    pub multi_value_support: bool,
}

impl IngestConfig {
    /// Returns the configured thread count, falling back to the available parallelism
    /// when the configuration value is zero.
    pub fn effective_max_threads(&self) -> usize {
        if self.max_threads > 0 {
            self.max_threads
        } else {
            available_parallelism().map(NonZeroUsize::get).unwrap_or(1)
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: super::DEFAULT_CHUNK_SIZE,
            max_threads: 0,
            multi_value_support: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingConfig {
    pub root_column_name: String,
    pub path_separator: String,
}

impl NamingConfig {
    pub fn column_name(&self, path: &[String]) -> String {
        if path.is_empty() {
            self.root_column_name.clone()
        } else {
            path.join(&self.path_separator)
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            root_column_name: super::DEFAULT_ROOT_COLUMN_NAME.to_string(),
            path_separator: super::DEFAULT_PATH_SEPARATOR.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_config() -> CommonResult<()> {
        let config = AppConfig::load_default()?;
        assert_eq!(config.ingest.chunk_size, 1024);
        assert_eq!(config.ingest.max_threads, 0);
        assert!(!config.ingest.multi_value_support);
        assert_eq!(config.naming, NamingConfig::default());
        Ok(())
    }

    #[test]
    fn test_env_override() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("QUARRY__INGEST__CHUNK_SIZE", "16");
            jail.set_env("QUARRY__NAMING__PATH_SEPARATOR", ".");
            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.ingest.chunk_size, 16);
            assert_eq!(config.naming.path_separator, ".");
            Ok(())
        });
    }

    #[test]
    fn test_column_name() {
        let naming = NamingConfig::default();
        assert_eq!(naming.column_name(&[]), "Value");
        assert_eq!(
            naming.column_name(&["a".to_string(), "b".to_string()]),
            "a_b"
        );
    }

    #[test]
    fn test_effective_max_threads() {
        let config = IngestConfig {
            max_threads: 3,
            ..Default::default()
        };
        assert_eq!(config.effective_max_threads(), 3);
        assert!(IngestConfig::default().effective_max_threads() >= 1);
    }
}
