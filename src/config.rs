use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use sqlx::mysql::MySqlConnectOptions;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database: MySqlConnectOptions,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub jwt_secret: String,
    pub image_base_url: String,
    pub images_dir: PathBuf,
    pub body_limit_bytes: usize,
    pub skip_db_sync: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            port: try_load("PORT", "7502")?,
            database: database()?,
            db_max_connections: try_load("DB_MAX_CONNECTIONS", "10")?,
            db_acquire_timeout: Duration::from_secs(try_load("DB_ACQUIRE_TIMEOUT_SECS", "30")?),
            jwt_secret: var("JWT_SECRET").filter(|s| !s.is_empty()).ok_or(ConfigError::Missing("JWT_SECRET"))?,
            image_base_url: try_load("IMAGE_BASE_URL", "https://backend.vimaljewellers.com")?,
            images_dir: try_load("IMAGES_DIR", "images")?,
            body_limit_bytes: try_load("BODY_LIMIT_BYTES", "10240")?,
            skip_db_sync: try_load("SKIP_DB_SYNC", "false")?,
        })
    }
}

/// `DATABASE_URL` wins; otherwise the connection is assembled from its parts,
/// which are passed through untouched so credentials need no URL escaping.
fn database() -> Result<MySqlConnectOptions, ConfigError> {
    if let Some(url) = var("DATABASE_URL") {
        return url
            .parse()
            .map_err(|e: sqlx::Error| ConfigError::Invalid { key: "DATABASE_URL", reason: e.to_string() });
    }
    let host: String = try_load("DATABASE_HOST", "127.0.0.1")?;
    let port: u16 = try_load("DATABASE_PORT", "3306")?;
    let user: String = try_load("DATABASE_USER", "vimal")?;
    let password = var("DATABASE_PASSWORD").unwrap_or_default();
    let name: String = try_load("DATABASE_NAME", "vimaljewellers")?;
    Ok(connect_options(&host, port, &user, &password, &name))
}

fn connect_options(host: &str, port: u16, user: &str, password: &str, name: &str) -> MySqlConnectOptions {
    let options = MySqlConnectOptions::new().host(host).port(port).username(user).database(name);
    if password.is_empty() { options } else { options.password(password) }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid { key, reason: e.to_string() }
        })
}

#[cfg(test)]
impl Config {
    pub(crate) fn for_tests() -> Self {
        Self {
            port: 0,
            database: MySqlConnectOptions::new(),
            db_max_connections: 1,
            db_acquire_timeout: Duration::from_secs(1),
            jwt_secret: "test-secret".into(),
            image_base_url: "https://cdn.test".into(),
            images_dir: PathBuf::from("images"),
            body_limit_bytes: 10240,
            skip_db_sync: true,
        }
    }
}
