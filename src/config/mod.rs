use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use std::env;
use std::str::FromStr;
use thiserror::Error;

// Top-level configuration, one section per concern
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub sales: SalesConfig,
}

// HTTP listener and logging
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
}

// Database connection. `url` wins over the individual parts when present.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub user: String,
    pub password: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub pool_size: u32,
    pub acquire_timeout_secs: u64,
    pub time_zone: String,
}

// Fallback customer used when a sale names none
#[derive(Debug, Clone, Deserialize)]
pub struct SalesConfig {
    pub generic_customer_id: i64,
    pub generic_customer_name: String,
    pub generic_customer_surname: String,
    pub generic_customer_email: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("either DATABASE_URL or DB_PASSWORD must be set")]
    MissingDatabaseCredentials,

    #[error("DATABASE_URL is not a valid postgres url: {0}")]
    BadUrl(#[source] sqlx::Error),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database = DatabaseConfig {
            url: lookup("DATABASE_URL"),
            user: text("DB_USER", "cine"),
            password: lookup("DB_PASSWORD"),
            host: text("DB_HOST", "localhost"),
            port: parse(&lookup, "DB_PORT", 5432)?,
            name: text("DB_NAME", "cine"),
            pool_size: parse(&lookup, "DB_POOL_SIZE", 1)?,
            acquire_timeout_secs: parse(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 5)?,
            time_zone: text("DB_TIME_ZONE", "America/Mexico_City"),
        };
        if database.url.is_none() && database.password.is_none() {
            return Err(ConfigError::MissingDatabaseCredentials);
        }
        if database.pool_size == 0 {
            return Err(ConfigError::Invalid {
                key: "DB_POOL_SIZE",
                value: "0".to_string(),
            });
        }

        // Positive ids belong to the customers identity column.
        let generic_customer_id: i64 = parse(&lookup, "GENERIC_CUSTOMER_ID", 0)?;
        if generic_customer_id > 0 {
            return Err(ConfigError::Invalid {
                key: "GENERIC_CUSTOMER_ID",
                value: generic_customer_id.to_string(),
            });
        }

        Ok(Config {
            app: AppConfig {
                host: text("HOST", "0.0.0.0"),
                port: parse(&lookup, "PORT", 8000)?,
                rust_log: text("RUST_LOG", "cinema_pos=debug,tower_http=debug"),
            },
            database,
            sales: SalesConfig {
                generic_customer_id,
                generic_customer_name: text("GENERIC_CUSTOMER_NAME", "Generic"),
                generic_customer_surname: text("GENERIC_CUSTOMER_SURNAME", "Customer"),
                generic_customer_email: text("GENERIC_CUSTOMER_EMAIL", "generic@cinema.local"),
            },
        })
    }
}

impl DatabaseConfig {
    /// Connection options for the single session the gateway keeps open.
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        let options = match &self.url {
            Some(url) => PgConnectOptions::from_str(url).map_err(ConfigError::BadUrl)?,
            None => {
                let mut options = PgConnectOptions::new()
                    .host(&self.host)
                    .port(self.port)
                    .username(&self.user)
                    .database(&self.name);
                if let Some(password) = &self.password {
                    options = options.password(password);
                }
                options
            }
        };

        Ok(options.options([("timezone", self.time_zone.as_str())]))
    }
}

fn parse<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
