//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// Signing key used outside production when `JWT_SECRET` is not set.
const DEV_JWT_SECRET: &str = "default_fallback_secret_for_local_dev";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where habits are persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageConfig {
    Memory,
    File {
        path: PathBuf,
    },
    S3 {
        bucket: String,
        key: String,
        region: String,
        endpoint: Option<String>,
    },
}

/// The single account allowed to log in.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub username: String,
    /// Argon2 PHC string, if one was configured directly.
    pub password_hash: Option<String>,
    /// Plain password, hashed at startup when no hash is configured.
    pub password: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration_secs: i64,
}

impl AuthConfig {
    /// True when tokens are signed with the well-known development key.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub production: bool,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub web_version: String,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        // --- Load Server Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let app_env = var_or("APP_ENV", "dev");
        let production = matches!(app_env.as_str(), "prod" | "production");

        // --- Load Storage Settings ---
        let storage = load_storage(&var, &app_env)?;

        // --- Load Auth Settings ---
        let jwt_secret = match var("JWT_SECRET") {
            Some(secret) => secret,
            None if production => return Err(ConfigError::MissingVar("JWT_SECRET".to_string())),
            None => DEV_JWT_SECRET.to_string(),
        };

        let expiration_str = var_or("JWT_EXPIRATION_TIME", "3600");
        let jwt_expiration_secs = expiration_str
            .parse::<i64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "JWT_EXPIRATION_TIME".to_string(),
                    format!("'{}' is not a positive number of seconds", expiration_str),
                )
            })?;

        let auth = AuthConfig {
            username: var_or("AUTH_USERNAME", "testuser"),
            password_hash: var("AUTH_PASSWORD_HASH"),
            password: var("AUTH_PASSWORD"),
            jwt_secret,
            jwt_expiration_secs,
        };

        Ok(Self {
            bind_address,
            log_level,
            production,
            storage,
            auth,
            web_version: var_or("WEB_VERSION", "1.0.0"),
            cors_origin: var_or("CORS_ORIGIN", "http://localhost:3000"),
        })
    }
}

fn load_storage<F>(var: &F, app_env: &str) -> Result<StorageConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let kind = match var("HABITS_STORAGE") {
        Some(kind) => kind.to_lowercase(),
        None if var("USE_FILE_STORAGE").as_deref() == Some("true") => "file".to_string(),
        None => "memory".to_string(),
    };

    match kind.as_str() {
        "memory" => Ok(StorageConfig::Memory),
        "file" => {
            let path = var("HABITS_FILE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./habits.json"));
            Ok(StorageConfig::File { path })
        }
        "s3" => {
            let bucket = var("HABITS_S3_BUCKET").unwrap_or_else(|| {
                format!(
                    "habits-tracker-storage-{}-{}",
                    app_env,
                    var("AWS_ACCOUNT_ID").unwrap_or_else(|| "default".to_string())
                )
            });
            Ok(StorageConfig::S3 {
                bucket,
                key: var("HABITS_S3_KEY").unwrap_or_else(|| "habits.json".to_string()),
                region: var("AWS_REGION").unwrap_or_else(|| "eu-central-1".to_string()),
                endpoint: var("S3_ENDPOINT_URL"),
            })
        }
        other => Err(ConfigError::InvalidValue(
            "HABITS_STORAGE".to_string(),
            format!("'{}' is not one of memory, file, s3", other),
        )),
    }
}
