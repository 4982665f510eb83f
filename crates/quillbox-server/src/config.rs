use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub auth_secret: Vec<u8>,
    pub token_ttl_secs: i64,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("QUILLBOX_PORT", "4000"),
            database_url: var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://quillbox.db?mode=rwc".to_string()),
            auth_secret: load_secret("AUTH_SECRET"),
            token_ttl_secs: try_load("TOKEN_TTL_SECS", "86400"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

/// The signing secret has no default value. Startup fails when it is unset
/// or blank.
fn load_secret(key: &str) -> Vec<u8> {
    let raw = env::var(key).unwrap_or_default();
    let trimmed = raw.trim();
    assert!(!trimmed.is_empty(), "{key} must be set to a non-empty value");
    trimmed.as_bytes().to_vec()
}
