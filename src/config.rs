use thiserror::Error;

use crate::slug::SlugStrategy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub slug_strategy: SlugStrategy,
    /// Maximum upload size in bytes
    pub max_upload_size: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Directory holding the metadata database
    pub data_dir: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Bytes in the metadata database itself
    Embedded,
    Gcs,
    Local,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for local storage backend
    pub local_storage_path: String,
    /// GCS bucket name (required when backend is gcs)
    pub gcs_bucket: Option<String>,
    /// Path to GCS service account JSON (optional, defaults to the metadata server)
    pub gcs_credentials_file: Option<String>,
}

/// Username accepted when `ADMIN_USERNAME` is not set.
pub const DEFAULT_ADMIN_USERNAME: &str = "pradmin";

#[derive(Clone)]
pub struct AuthConfig {
    pub admin_username: String,
    pub admin_password: String,
    /// Mark the session cookie `Secure`. Enable behind HTTPS.
    pub secure_cookies: bool,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("admin_username", &self.admin_username)
            .field("admin_password", &"<redacted>")
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            data_dir: "./data".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            local_storage_path: "./uploads".to_string(),
            gcs_bucket: None,
            gcs_credentials_file: None,
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

/// `SLUG_STRATEGY`: `filename` or `random`, case-insensitive.
pub fn parse_slug_strategy(value: &str) -> Result<SlugStrategy, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "filename" => Ok(SlugStrategy::Filename),
        "random" => Ok(SlugStrategy::Random),
        other => Err(ConfigError::ValidationError(format!(
            "unknown SLUG_STRATEGY '{other}' (expected filename or random)"
        ))),
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let max_upload_size = std::env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(50 * 1024 * 1024); // 50MB

        let backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "local" => StorageBackend::Local,
            "embedded" => StorageBackend::Embedded,
            "gcs" => StorageBackend::Gcs,
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown STORAGE_BACKEND '{other}' (expected local, embedded or gcs)"
                )))
            }
        };

        let slug_strategy = parse_slug_strategy(
            &std::env::var("SLUG_STRATEGY").unwrap_or_else(|_| "filename".to_string()),
        )?;

        let local_storage_path =
            std::env::var("LOCAL_STORAGE_PATH").unwrap_or_else(|_| "./uploads".to_string());

        let config = Config {
            server: ServerConfig {
                bind_address,
                data_dir,
            },
            storage: StorageConfig {
                backend,
                local_storage_path,
                gcs_bucket: std::env::var("GCS_BUCKET").ok(),
                gcs_credentials_file: std::env::var("GCS_CREDENTIALS_FILE").ok(),
            },
            auth: AuthConfig {
                admin_username: std::env::var("ADMIN_USERNAME")
                    .unwrap_or_else(|_| DEFAULT_ADMIN_USERNAME.to_string()),
                admin_password: std::env::var("ADMIN_PASSWORD").unwrap_or_default(),
                secure_cookies: env_flag("SECURE_COOKIES"),
            },
            slug_strategy,
            max_upload_size,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.admin_username.is_empty() {
            return Err(ConfigError::ValidationError(
                "ADMIN_USERNAME must not be empty".to_string(),
            ));
        }

        if self.auth.admin_password.is_empty() {
            return Err(ConfigError::ValidationError(
                "ADMIN_PASSWORD must be set".to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::Gcs && self.storage.gcs_bucket.is_none() {
            return Err(ConfigError::ValidationError(
                "GCS_BUCKET is required when STORAGE_BACKEND=gcs".to_string(),
            ));
        }

        if self.max_upload_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE must be greater than 0".to_string(),
            ));
        }

        if !self.auth.secure_cookies {
            tracing::warn!("SECURE_COOKIES is off; session cookies will be sent over plain HTTP");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            auth: AuthConfig {
                admin_username: DEFAULT_ADMIN_USERNAME.to_string(),
                admin_password: "secret".to_string(),
                secure_cookies: true,
            },
            slug_strategy: SlugStrategy::Filename,
            max_upload_size: 1024,
        }
    }

    #[test]
    fn accepts_complete_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_missing_password() {
        let mut config = valid();
        config.auth.admin_password.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_username() {
        let mut config = valid();
        config.auth.admin_username.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn slug_strategy_names() {
        assert_eq!(parse_slug_strategy("filename").unwrap(), SlugStrategy::Filename);
        assert_eq!(parse_slug_strategy("Random").unwrap(), SlugStrategy::Random);
        assert_eq!(parse_slug_strategy(" RANDOM ").unwrap(), SlugStrategy::Random);
    }

    #[test]
    fn unknown_slug_strategy_is_rejected() {
        for value in ["randm", "uuid", ""] {
            let err = parse_slug_strategy(value).unwrap_err();
            assert!(matches!(err, ConfigError::ValidationError(_)), "{value}");
        }
    }

    #[test]
    fn gcs_requires_bucket() {
        let mut config = valid();
        config.storage.backend = StorageBackend::Gcs;
        assert!(config.validate().is_err());

        config.storage.gcs_bucket = Some("files".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn debug_output_hides_password() {
        let rendered = format!("{:?}", valid());
        assert!(!rendered.contains("secret"));
    }
}
