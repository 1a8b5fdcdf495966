use dashmap::DashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATABASE_URL: &str = "mongodb://localhost:27017/mydatabase";
const DEFAULT_BODY_LIMIT_BYTES: usize = 100 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

/// Key/value configuration source
///
/// Seeded from the process environment by [`ConfigService::new`]; tests build
/// an empty one with `default()` and `set` only the keys they need.
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
    env_file: Option<PathBuf>,
}

impl ConfigService {
    pub fn new() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    /// Load `.env` (if any) before snapshotting the environment.
    pub fn from_env() -> Self {
        let env_file = dotenvy::dotenv().ok();
        Self {
            env_file,
            ..Self::new()
        }
    }

    /// The `.env` file that was loaded, if any.
    pub fn env_file(&self) -> Option<&PathBuf> {
        self.env_file.as_ref()
    }

    /// Returns the value for `key`, treating empty strings as unset.
    pub fn get(&self, key: &str) -> Option<String> {
        self.config
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    pub fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::Invalid {
                key: key.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Typed application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
    /// `.env` file read at load time. Kept so it can be logged once tracing
    /// is up.
    pub env_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from `.env` and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_service(&ConfigService::from_env())
    }

    pub fn from_service(config: &ConfigService) -> Result<Self, ConfigError> {
        let server = ServerConfig {
            host: config.get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: config.parse_or("PORT", DEFAULT_PORT)?,
        };

        let database = DatabaseConfig {
            url: config
                .get("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            connect_attempts: config.parse_or("DATABASE_CONNECT_ATTEMPTS", 5u32)?.max(1),
            initial_backoff: Duration::from_millis(
                config.parse_or("DATABASE_RETRY_INITIAL_MS", 500u64)?,
            ),
            max_backoff: Duration::from_millis(config.parse_or("DATABASE_RETRY_MAX_MS", 8_000u64)?),
            connect_timeout: Duration::from_millis(
                config.parse_or("DATABASE_CONNECT_TIMEOUT_MS", 2_000u64)?,
            ),
        };

        let http = HttpConfig {
            body_limit: config.parse_or("BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT_BYTES)?,
        };

        let logging = LoggingConfig {
            level: config.get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            format: config.parse_or("LOG_FORMAT", LogFormat::Text)?,
        };

        Ok(Self {
            server,
            database,
            http,
            logging,
            env_file: config.env_file().cloned(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub connect_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub body_limit: usize,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unsupported log format: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_defaults_to_3000() {
        let config = AppConfig::from_service(&ConfigService::default()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.addr(), "0.0.0.0:3000");
        assert_eq!(config.database.url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn test_port_from_source() {
        let source = ConfigService::default();
        source.set("PORT", "4000");
        let config = AppConfig::from_service(&source).unwrap();
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn test_empty_port_falls_back_to_default() {
        let source = ConfigService::default();
        source.set("PORT", "");
        let config = AppConfig::from_service(&source).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let source = ConfigService::default();
        source.set("PORT", "not-a-port");
        let err = AppConfig::from_service(&source).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_env_file_is_carried_into_config() {
        let config = AppConfig::from_service(&ConfigService::default()).unwrap();
        assert_eq!(config.env_file, None);

        let source = ConfigService {
            env_file: Some(PathBuf::from("/srv/data-api/.env")),
            ..ConfigService::default()
        };
        let config = AppConfig::from_service(&source).unwrap();
        assert_eq!(config.env_file, Some(PathBuf::from("/srv/data-api/.env")));
    }

    #[test]
    fn test_retry_settings() {
        let source = ConfigService::default();
        source.set("DATABASE_CONNECT_ATTEMPTS", "0");
        source.set("DATABASE_RETRY_INITIAL_MS", "10");
        source.set("LOG_FORMAT", "JSON");
        let config = AppConfig::from_service(&source).unwrap();
        assert_eq!(config.database.connect_attempts, 1);
        assert_eq!(config.database.initial_backoff, Duration::from_millis(10));
        assert_eq!(config.logging.format, LogFormat::Json);
    }
}
