//! Configuration module
//!
//! Process-level settings for the media store, the upload staging area and the
//! transform pipeline. Field-level options live in [`crate::field::FieldConfig`].

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage_types::StoreBackend;

const STORAGE_PATH: &str = "./storage";
const STAGING_PATH: &str = "./storage/tmp";
const BASE_URL: &str = "http://localhost:3000/media";
const DEFAULT_DISK: &str = "public";
const TEMPORARY_URL_TTL_SECS: u64 = 300;
const JPEG_QUALITY: u8 = 70;

#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub storage_backend: StoreBackend,
    pub storage_path: PathBuf,
    pub staging_path: PathBuf,
    pub base_url: String,
    pub default_disk: String,
    pub temporary_url_ttl_secs: u64,
    pub jpeg_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            storage_backend: StoreBackend::Local,
            storage_path: PathBuf::from(STORAGE_PATH),
            staging_path: PathBuf::from(STAGING_PATH),
            base_url: BASE_URL.to_string(),
            default_disk: DEFAULT_DISK.to_string(),
            temporary_url_ttl_secs: TEMPORARY_URL_TTL_SECS,
            jpeg_quality: JPEG_QUALITY,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("MEDIAFIELD_ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let storage_backend = match env::var("MEDIAFIELD_STORAGE_BACKEND") {
            Ok(value) => value.parse::<StoreBackend>()?,
            Err(_) => StoreBackend::Local,
        };

        let temporary_url_ttl_secs = env::var("MEDIAFIELD_TEMPORARY_URL_TTL_SECS")
            .unwrap_or_else(|_| TEMPORARY_URL_TTL_SECS.to_string())
            .parse::<u64>()
            .unwrap_or(TEMPORARY_URL_TTL_SECS);

        let jpeg_quality = env::var("MEDIAFIELD_JPEG_QUALITY")
            .unwrap_or_else(|_| JPEG_QUALITY.to_string())
            .parse::<u8>()
            .unwrap_or(JPEG_QUALITY);

        let config = Config {
            environment,
            storage_backend,
            storage_path: env::var("MEDIAFIELD_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(STORAGE_PATH)),
            staging_path: env::var("MEDIAFIELD_STAGING_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(STAGING_PATH)),
            base_url: env::var("MEDIAFIELD_BASE_URL").unwrap_or_else(|_| BASE_URL.to_string()),
            default_disk: env::var("MEDIAFIELD_DEFAULT_DISK")
                .unwrap_or_else(|_| DEFAULT_DISK.to_string()),
            temporary_url_ttl_secs,
            jpeg_quality,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.storage_path.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("MEDIAFIELD_STORAGE_PATH must not be empty"));
        }

        if self.staging_path.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("MEDIAFIELD_STAGING_PATH must not be empty"));
        }

        if self.default_disk.trim().is_empty() {
            return Err(anyhow::anyhow!("MEDIAFIELD_DEFAULT_DISK must not be empty"));
        }

        if self.temporary_url_ttl_secs == 0 {
            return Err(anyhow::anyhow!(
                "MEDIAFIELD_TEMPORARY_URL_TTL_SECS must be greater than zero"
            ));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(anyhow::anyhow!(
                "MEDIAFIELD_JPEG_QUALITY must be between 1 and 100"
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn temporary_url_ttl(&self) -> Duration {
        Duration::from_secs(self.temporary_url_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.temporary_url_ttl(), Duration::from_secs(300));
        assert_eq!(config.jpeg_quality, 70);
        assert!(!config.is_production());
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let config = Config {
            temporary_url_ttl_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_quality() {
        let config = Config {
            jpeg_quality: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            jpeg_quality: 101,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_disk() {
        let config = Config {
            default_disk: "  ".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
