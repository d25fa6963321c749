//! Application configuration

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_with::serde_as;

use crate::errors::EmissionsError;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

#[serde_as]
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout: Duration,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListingConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Lifetime of cached choice lists
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(default = "default_choices_ttl")]
    pub choices_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            choices_ttl: default_choices_ttl(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ValidationConfig {
    #[serde(default = "default_true")]
    pub require_issue_before_expiry: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            require_issue_before_expiry: default_true(),
        }
    }
}

fn default_page_size() -> u32 {
    20
}

fn default_choices_ttl() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_true() -> bool {
    true
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> Duration {
    Duration::from_secs(5)
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("config/default"))
    }

    /// Load from `path` (extension optional), overridden by `EMISSIONS__*`
    /// environment variables
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("EMISSIONS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), EmissionsError> {
        self.database.validate()?;
        if self.listing.page_size == 0 {
            return Err(EmissionsError::ConfigurationError {
                message: "Page size must be greater than zero".to_string(),
            });
        }
        if self.cache.choices_ttl.is_zero() {
            return Err(EmissionsError::ConfigurationError {
                message: "Choice cache TTL must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), EmissionsError> {
        if self.url.trim().is_empty() {
            return Err(EmissionsError::ConfigurationError {
                message: "Database URL cannot be empty".to_string(),
            });
        }
        if self.max_connections == 0 {
            return Err(EmissionsError::ConfigurationError {
                message: "Database pool needs at least one connection".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn database_config(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_load_config() {
        env::set_var("EMISSIONS__DATABASE__URL", "postgres://localhost/test");
        env::set_var("EMISSIONS__LISTING__PAGE_SIZE", "50");
        env::set_var("EMISSIONS__CACHE__CHOICES_TTL", "60");

        let config = AppConfig::load().unwrap();
        assert_eq!(config.database.url, "postgres://localhost/test");
        assert_eq!(config.listing.page_size, 50);
        assert_eq!(config.cache.choices_ttl, Duration::from_secs(60));
        assert!(config.validation.require_issue_before_expiry);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emissions.toml");
        std::fs::write(
            &path,
            "[database]\nurl = \"postgres://db/emissions\"\nmax_connections = 2\n\n\
             [validation]\nrequire_issue_before_expiry = false\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.database.max_connections, 2);
        assert!(!config.validation.require_issue_before_expiry);
    }

    #[test]
    fn test_partial_listing_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emissions.toml");
        std::fs::write(
            &path,
            "[database]\nurl = \"postgres://db/emissions\"\n\n[listing]\n\n[cache]\n",
        )
        .unwrap();

        let config: AppConfig = Config::builder()
            .add_source(File::from(path.as_path()))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.listing.page_size, 20);
        assert_eq!(config.cache.choices_ttl, Duration::from_secs(86_400));
        assert!(config.validation.require_issue_before_expiry);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(ListingConfig::default().page_size, 20);
        assert_eq!(
            CacheConfig::default().choices_ttl,
            Duration::from_secs(86_400)
        );
    }

    #[test]
    fn test_validate() {
        let config = AppConfig {
            database: database_config("postgres://localhost/test"),
            listing: ListingConfig::default(),
            cache: CacheConfig::default(),
            validation: ValidationConfig::default(),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_url() {
        assert!(database_config("  ").validate().is_err());
    }

    #[test]
    fn test_validate_zero_page_size() {
        let config = AppConfig {
            database: database_config("postgres://localhost/test"),
            listing: ListingConfig { page_size: 0 },
            cache: CacheConfig::default(),
            validation: ValidationConfig::default(),
        };
        assert!(config.validate().is_err());
    }
}
