use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while assembling configuration from the environment
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout)
    }
}

impl SecurityConfig {
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.jwt_expiry_hours as i64)
    }
}

/// Preset values that do not come from required variables
struct Preset {
    max_connections: u32,
    connection_timeout: u64,
    bcrypt_cost: u32,
    cors_origins: Vec<String>,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup. `from_env` is the
    /// process-environment flavour; tests pass a map instead.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let preset = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        };

        let required = |key: &'static str| -> Result<String, ConfigError> {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => Ok(value),
                _ => Err(ConfigError::Missing(key)),
            }
        };

        let db_port = required("DB_PORT")?;
        let database = DatabaseConfig {
            host: required("DB_HOST")?,
            port: parse_value("DB_PORT", &db_port)?,
            user: required("DB_USER")?,
            password: required("DB_PASSWORD")?,
            name: required("DB_NAME")?,
            max_connections: preset.max_connections,
            connection_timeout: preset.connection_timeout,
        };

        let security = SecurityConfig {
            jwt_secret: required("SECRET")?,
            jwt_expiry_hours: 24,
            bcrypt_cost: preset.bcrypt_cost,
            cors_origins: preset.cors_origins,
        };

        let server = ServerConfig { port: 5000 };

        Self {
            environment,
            server,
            database,
            security,
        }
        .with_overrides(&lookup)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PORT") {
            self.server.port = parse_value("PORT", &v)?;
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_value("DATABASE_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = parse_value("DATABASE_CONNECTION_TIMEOUT", &v)?;
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_JWT_EXPIRY_HOURS") {
            let hours: u64 = parse_value("SECURITY_JWT_EXPIRY_HOURS", &v)?;
            // One hour up to one year
            if !(1..=8760).contains(&hours) {
                return Err(ConfigError::Invalid {
                    key: "SECURITY_JWT_EXPIRY_HOURS",
                    value: v,
                });
            }
            self.security.jwt_expiry_hours = hours;
        }
        if let Some(v) = lookup("SECURITY_BCRYPT_COST") {
            let cost: u32 = parse_value("SECURITY_BCRYPT_COST", &v)?;
            if !(4..=31).contains(&cost) {
                return Err(ConfigError::Invalid {
                    key: "SECURITY_BCRYPT_COST",
                    value: v,
                });
            }
            self.security.bcrypt_cost = cost;
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        Ok(self)
    }

    fn development() -> Preset {
        Preset {
            max_connections: 10,
            connection_timeout: 30,
            bcrypt_cost: 10,
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }

    fn staging() -> Preset {
        Preset {
            max_connections: 20,
            connection_timeout: 10,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }

    fn production() -> Preset {
        Preset {
            max_connections: 50,
            connection_timeout: 5,
            bcrypt_cost: 14,
            cors_origins: vec!["https://accountability-project-frontend.vercel.app".to_string()],
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("DB_HOST", "localhost".to_string()),
            ("DB_PORT", "5432".to_string()),
            ("DB_USER", "app".to_string()),
            ("DB_PASSWORD", "secret".to_string()),
            ("DB_NAME", "accountability".to_string()),
            ("SECRET", "signing-key".to_string()),
        ])
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_development_config() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.security.jwt_expiry_hours, 24);
    }

    #[test]
    fn test_production_preset() {
        let mut vars = base_env();
        vars.insert("APP_ENV", "production".to_string());
        let config = load(&vars).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.database.max_connections, 50);
        assert_eq!(config.security.bcrypt_cost, 14);
    }

    #[test]
    fn test_missing_database_variable_is_fatal() {
        let mut vars = base_env();
        vars.remove("DB_PASSWORD");
        assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing("DB_PASSWORD"));

        let mut vars = base_env();
        vars.insert("DB_HOST", "   ".to_string());
        assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing("DB_HOST"));
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        let mut vars = base_env();
        vars.remove("SECRET");
        assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing("SECRET"));
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let mut vars = base_env();
        vars.insert("DB_PORT", "postgres".to_string());
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { key: "DB_PORT", .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let mut vars = base_env();
        vars.insert("PORT", "8080".to_string());
        vars.insert("SECURITY_BCRYPT_COST", "4".to_string());
        vars.insert("SECURITY_CORS_ORIGINS", "http://a.test, http://b.test,".to_string());
        let config = load(&vars).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.security.bcrypt_cost, 4);
        assert_eq!(config.security.cors_origins, vec!["http://a.test", "http://b.test"]);

        vars.insert("SECURITY_BCRYPT_COST", "2".to_string());
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_token_expiry_is_range_checked() {
        let mut vars = base_env();
        vars.insert("SECURITY_JWT_EXPIRY_HOURS", "48".to_string());
        let config = load(&vars).unwrap();
        assert_eq!(config.security.token_ttl(), chrono::Duration::hours(48));

        for value in ["0", "8761", "18446744073709551615"] {
            vars.insert("SECURITY_JWT_EXPIRY_HOURS", value.to_string());
            assert!(matches!(
                load(&vars),
                Err(ConfigError::Invalid { key: "SECURITY_JWT_EXPIRY_HOURS", .. })
            ));
        }
    }
}
