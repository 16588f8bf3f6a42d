//! Configuration management

use serde::{Deserialize, Serialize};

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://cev.db";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default time a connection waits on a locked database, in seconds.
pub const DEFAULT_DATABASE_BUSY_TIMEOUT_SECS: u64 = 5;

/// Default number of datasets kept after each upload.
pub const DEFAULT_RETENTION_LIMIT: u32 = 5;

/// Default upload body limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub datasets: DatasetConfig,
    pub cors: CorsConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub busy_timeout_secs: u64,
}

/// Dataset ingestion limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Datasets kept system-wide after every upload.
    pub retention_limit: u32,
    pub max_upload_bytes: usize,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Unparseable configuration value, using default");
            default
        }),
        Err(_) => default,
    }
}

/// Like `env_or`, but a value that is set and does not parse is an error.
fn env_required_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{key} must be a positive integer, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: std::env::var("CEV_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: env_or("CEV_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or("CEV_SHUTDOWN_TIMEOUT", DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", DEFAULT_DATABASE_MAX_CONNECTIONS),
                busy_timeout_secs: env_or("DATABASE_BUSY_TIMEOUT", DEFAULT_DATABASE_BUSY_TIMEOUT_SECS),
            },
            datasets: DatasetConfig {
                retention_limit: env_required_parse("CEV_RETENTION_LIMIT", DEFAULT_RETENTION_LIMIT)?,
                max_upload_bytes: env_or("CEV_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", true),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.datasets.retention_limit == 0 {
            anyhow::bail!("CEV_RETENTION_LIMIT must be at least 1");
        }

        if self.datasets.max_upload_bytes == 0 {
            anyhow::bail!("CEV_MAX_UPLOAD_BYTES must be greater than 0");
        }

        let wildcard = self.cors.allowed_origins.iter().any(|o| o == "*");
        if wildcard && self.cors.allow_credentials {
            anyhow::bail!("CORS_ALLOW_CREDENTIALS cannot be combined with a '*' origin");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                busy_timeout_secs: DEFAULT_DATABASE_BUSY_TIMEOUT_SECS,
            },
            datasets: DatasetConfig {
                retention_limit: DEFAULT_RETENTION_LIMIT,
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 6] = [
        "CEV_PORT",
        "CEV_RETENTION_LIMIT",
        "CEV_MAX_UPLOAD_BYTES",
        "DATABASE_URL",
        "CORS_ALLOWED_ORIGINS",
        "CORS_ALLOW_CREDENTIALS",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.datasets.retention_limit, 5);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    #[serial]
    fn test_load_reads_environment() {
        clear_env();
        std::env::set_var("CEV_PORT", "9100");
        std::env::set_var("CEV_RETENTION_LIMIT", "3");
        std::env::set_var("DATABASE_URL", "sqlite://other.db");
        std::env::set_var("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test");

        let config = Config::load().unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.datasets.retention_limit, 3);
        assert_eq!(config.database.url, "sqlite://other.db");
        assert_eq!(config.cors.allowed_origins, vec!["http://a.test", "http://b.test"]);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_unparseable_values_fall_back_to_defaults() {
        clear_env();
        std::env::set_var("CEV_PORT", "not-a-port");
        std::env::set_var("CEV_MAX_UPLOAD_BYTES", "-1");

        let config = Config::load().unwrap();
        assert_eq!(config.server.port, DEFAULT_SERVER_PORT);
        assert_eq!(config.datasets.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_zero_retention_is_rejected() {
        clear_env();
        std::env::set_var("CEV_RETENTION_LIMIT", "0");
        assert!(Config::load().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_unparseable_retention_limit_is_rejected() {
        clear_env();
        for value in ["five", "-1", ""] {
            std::env::set_var("CEV_RETENTION_LIMIT", value);
            let err = Config::load().unwrap_err();
            assert!(err.to_string().contains("CEV_RETENTION_LIMIT"), "{value}: {err}");
        }
        clear_env();
    }

    #[test]
    fn test_wildcard_origin_with_credentials_is_rejected() {
        let mut config = Config::default();
        config.cors.allowed_origins = vec!["*".to_string()];
        assert!(config.validate().is_err());

        config.cors.allow_credentials = false;
        assert!(config.validate().is_ok());
    }
}
