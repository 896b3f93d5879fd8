use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub gym: GymConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64,  // seconds
    pub refresh_token_expires_in: i64, // seconds
}

/// Business rules of the floor: capacity, plan lengths and prices, booking limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GymConfig {
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
    /// A valid membership with this many days left (or fewer) is reported as expiring.
    #[serde(default = "default_expiring_within_days")]
    pub expiring_within_days: i64,
    #[serde(default)]
    pub booking_limits: BookingLimits,
    #[serde(default)]
    pub prices: PlanPrices,
    #[serde(default = "default_auto_close_interval_secs")]
    pub auto_close_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingLimits {
    pub weekly: u64,
    pub monthly: u64,
    pub walk_in: u64,
}

/// Plan prices in centavos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanPrices {
    pub weekly: i64,
    pub monthly: i64,
    pub walk_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub admin_username: Option<String>,
    #[serde(default)]
    pub admin_password: Option<String>,
}

fn default_max_capacity() -> u64 {
    50
}

fn default_expiring_within_days() -> i64 {
    3
}

fn default_auto_close_interval_secs() -> u64 {
    900
}

impl Default for GymConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
            expiring_within_days: default_expiring_within_days(),
            booking_limits: BookingLimits::default(),
            prices: PlanPrices::default(),
            auto_close_interval_secs: default_auto_close_interval_secs(),
        }
    }
}

impl Default for BookingLimits {
    fn default() -> Self {
        Self {
            weekly: 3,
            monthly: 12,
            walk_in: 1,
        }
    }
}

impl Default for PlanPrices {
    fn default() -> Self {
        Self {
            weekly: 30_000,
            monthly: 100_000,
            walk_in: 8_000,
        }
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_toml() -> AppResult<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => toml::from_str(&config_str)
                .map_err(|e| AppError::ConfigError(format!("failed to parse {config_path}: {e}")))?,
            // no file: build from environment and defaults
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let database_url = get_env("DATABASE_URL").ok_or_else(|| {
                    AppError::ConfigError(
                        "DATABASE_URL is not set and config.toml was not found".to_string(),
                    )
                })?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                        refresh_token_expires_in: get_env_parse(
                            "JWT_REFRESH_EXPIRES_IN",
                            2_592_000i64,
                        ),
                    },
                    gym: GymConfig::default(),
                    bootstrap: BootstrapConfig::default(),
                }
            }
            Err(e) => {
                return Err(AppError::ConfigError(format!(
                    "cannot read config file {config_path}: {e}"
                )));
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment variables win over the file, even when the file exists.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("JWT_REFRESH_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.refresh_token_expires_in = n;
        }

        // Gym rules
        if let Ok(v) = env::var("GYM_MAX_CAPACITY")
            && let Ok(n) = v.parse()
        {
            self.gym.max_capacity = n;
        }
        if let Ok(v) = env::var("GYM_EXPIRING_WITHIN_DAYS")
            && let Ok(n) = v.parse()
        {
            self.gym.expiring_within_days = n;
        }
        if let Ok(v) = env::var("GYM_AUTO_CLOSE_INTERVAL_SECS")
            && let Ok(n) = v.parse()
        {
            self.gym.auto_close_interval_secs = n;
        }

        if let Ok(v) = env::var("BOOTSTRAP_ADMIN_USERNAME") {
            self.bootstrap.admin_username = Some(v);
        }
        if let Ok(v) = env::var("BOOTSTRAP_ADMIN_PASSWORD") {
            self.bootstrap.admin_password = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_toml_uses_gym_defaults() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            url = "postgres://localhost/gym"
            max_connections = 5

            [jwt]
            secret = "s3cret"
            access_token_expires_in = 600
            refresh_token_expires_in = 3600
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.gym.max_capacity, 50);
        assert_eq!(config.gym.booking_limits.monthly, 12);
        assert_eq!(config.gym.prices.walk_in, 8_000);
        assert!(config.bootstrap.admin_username.is_none());
    }

    #[test]
    fn test_parse_gym_section() {
        let raw = r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [database]
            url = "sqlite::memory:"
            max_connections = 1

            [jwt]
            secret = "x"
            access_token_expires_in = 1
            refresh_token_expires_in = 2

            [gym]
            max_capacity = 20
            expiring_within_days = 5

            [gym.booking_limits]
            weekly = 2
            monthly = 8
            walk_in = 1
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.gym.max_capacity, 20);
        assert_eq!(config.gym.expiring_within_days, 5);
        assert_eq!(config.gym.booking_limits.weekly, 2);
        assert_eq!(config.gym.prices.monthly, 100_000);
        assert_eq!(config.gym.auto_close_interval_secs, 900);
    }

    #[test]
    fn test_env_overrides_gym_rules() {
        let raw = r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [database]
            url = "sqlite::memory:"
            max_connections = 1

            [jwt]
            secret = "x"
            access_token_expires_in = 1
            refresh_token_expires_in = 2
        "#;
        let mut config: Config = toml::from_str(raw).unwrap();
        // only this test touches these variables
        unsafe {
            env::set_var("GYM_AUTO_CLOSE_INTERVAL_SECS", "60");
            env::set_var("GYM_EXPIRING_WITHIN_DAYS", "not-a-number");
        }
        config.apply_env_overrides();
        unsafe {
            env::remove_var("GYM_AUTO_CLOSE_INTERVAL_SECS");
            env::remove_var("GYM_EXPIRING_WITHIN_DAYS");
        }
        assert_eq!(config.gym.auto_close_interval_secs, 60);
        assert_eq!(config.gym.expiring_within_days, 3);
    }
}
