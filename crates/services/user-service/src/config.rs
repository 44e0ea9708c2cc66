//! User service configuration.

use std::fmt;
use std::str::FromStr;

use common::{env_or, env_string, ConfigError, DatabaseConfig, ServiceConfig};

/// Deployment environment, from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Self::Development),
            "test" | "testing" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidValue {
                key: "APP_ENV",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        };
        f.write_str(name)
    }
}

/// Log output format, from `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" | "plain" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidValue {
                key: "LOG_FORMAT",
                value: s.to_string(),
            }),
        }
    }
}

/// User service configuration.
#[derive(Debug, Clone, Default)]
pub struct UserServiceConfig {
    pub server: ServiceConfig,
    pub database: DatabaseConfig,
    pub environment: Environment,
    pub log_format: LogFormat,
}

impl UserServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_defaults = ServiceConfig::default();
        let db_defaults = DatabaseConfig::default();

        let server = ServiceConfig {
            service_name: "user-service".to_string(),
            host: env_string("SERVER_HOST", &server_defaults.host),
            port: env_or("SERVER_PORT", server_defaults.port)?,
            log_level: env_string("LOG_LEVEL", &server_defaults.log_level),
            request_timeout_secs: env_or(
                "REQUEST_TIMEOUT_SECS",
                server_defaults.request_timeout_secs,
            )?,
            shutdown_timeout_secs: env_or(
                "SHUTDOWN_TIMEOUT_SECS",
                server_defaults.shutdown_timeout_secs,
            )?,
        };

        let database = DatabaseConfig {
            url: database_url(&db_defaults.url)?,
            max_connections: env_or("DB_MAX_CONNECTIONS", db_defaults.max_connections)?,
            min_connections: env_or("DB_MIN_CONNECTIONS", db_defaults.min_connections)?,
            connect_timeout_secs: env_or(
                "DB_CONNECT_TIMEOUT_SECS",
                db_defaults.connect_timeout_secs,
            )?,
            acquire_timeout_secs: env_or(
                "DB_ACQUIRE_TIMEOUT_SECS",
                db_defaults.acquire_timeout_secs,
            )?,
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", db_defaults.idle_timeout_secs)?,
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", db_defaults.max_lifetime_secs)?,
            sqlx_logging: env_or("DB_SQLX_LOGGING", db_defaults.sqlx_logging)?,
        };

        let config = Self {
            server,
            database,
            environment: env_or("APP_ENV", Environment::default())?,
            log_format: env_or("LOG_FORMAT", LogFormat::default())?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

/// `DATABASE_URL` wins; otherwise assemble one from the `DB_*` parts.
fn database_url(default: &str) -> Result<String, ConfigError> {
    if let Ok(url) = std::env::var("DATABASE_URL") {
        if !url.trim().is_empty() {
            return Ok(url);
        }
    }

    let Ok(host) = std::env::var("DB_HOST") else {
        return Ok(default.to_string());
    };

    let port: u16 = env_or("DB_PORT", 5432)?;
    let user = env_string("DB_USER", "postgres");
    let password = env_string("DB_PASSWORD", "");
    let name = env_string("DB_NAME", "user_db");
    let sslmode = env_string("DB_SSLMODE", "disable");

    Ok(compose_url(&host, port, &user, &password, &name, &sslmode))
}

fn compose_url(host: &str, port: u16, user: &str, password: &str, name: &str, sslmode: &str) -> String {
    let credentials = if password.is_empty() {
        user.to_string()
    } else {
        format!("{}:{}", user, password)
    };
    format!(
        "postgres://{}@{}:{}/{}?sslmode={}",
        credentials, host, port, name, sslmode
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!("PROD".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("dev".parse::<Environment>(), Ok(Environment::Development));
        assert_eq!("test".parse::<Environment>(), Ok(Environment::Test));
        assert!("staging-ish".parse::<Environment>().is_err());
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("Pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_compose_url() {
        assert_eq!(
            compose_url("db", 5433, "app", "s3cret", "users", "require"),
            "postgres://app:s3cret@db:5433/users?sslmode=require"
        );
        assert_eq!(
            compose_url("localhost", 5432, "postgres", "", "user_db", "disable"),
            "postgres://postgres@localhost:5432/user_db?sslmode=disable"
        );
    }

    #[test]
    fn test_validate_rejects_inverted_pool_bounds() {
        let mut config = UserServiceConfig::default();
        assert!(config.validate().is_ok());

        config.database.min_connections = config.database.max_connections + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_does_not_leak_password() {
        let mut config = UserServiceConfig::default();
        config.database.url = "postgres://app:hunter2@db:5432/users".to_string();

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
    }
}
