// src/config.rs

//! Configuration loading utilities.
//!
//! Locally the configuration is a TOML file plus environment overrides. On
//! Lambda it is fetched from S3 by [`LambdaConfigLoader`].

use std::path::Path;

use crate::error::Result;
use crate::models::Config;

#[cfg(feature = "s3")]
pub use lambda_loader::LambdaConfigLoader;

/// Load configuration from a TOML file, apply environment overrides and
/// validate.
///
/// A missing file falls back to defaults; a malformed one is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        Config::load(path)?
    } else {
        log::warn!(
            "Config file {} not found. Using default configuration.",
            path.display()
        );
        Config::default()
    };
    config.apply_env();
    config.validate()?;
    Ok(config)
}

#[cfg(feature = "s3")]
mod lambda_loader {
    use crate::error::{AppError, Result};
    use crate::models::Config;
    use crate::storage::S3Storage;

    /// Config loader for the Lambda environment.
    pub struct LambdaConfigLoader {
        storage: S3Storage,
        prefix: String,
    }

    impl LambdaConfigLoader {
        pub fn new(storage: S3Storage, config_prefix: &str) -> Self {
            Self {
                storage,
                prefix: config_prefix.trim_end_matches('/').to_string(),
            }
        }

        fn key(&self, file_name: &str) -> String {
            format!("{}/{}", self.prefix, file_name)
        }

        /// Fetch `config.toml` under the prefix; defaults when it is absent.
        pub async fn load_config(&self) -> Result<Config> {
            let key = self.key("config.toml");
            log::info!("Loading config file from S3: {}", key);

            let mut config = match self.storage.read_bytes_optional(&key).await? {
                Some(bytes) => {
                    let text = String::from_utf8(bytes).map_err(|e| {
                        AppError::config(format!("Config file {} is not valid UTF-8: {}", key, e))
                    })?;
                    Config::from_toml(&text)?
                }
                None => {
                    log::warn!("No config at {}, using defaults", key);
                    Config::default()
                }
            };
            config.apply_env();
            config.validate()?;
            Ok(config)
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[sources]\nenabled = [\"acme\"]\n").unwrap();
        assert!(load_config(&path).is_err());
    }
}
