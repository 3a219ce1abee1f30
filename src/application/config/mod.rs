pub mod crypto;
pub mod database;
pub mod identity;
pub mod server;

use once_cell::sync::Lazy;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server: server::ServerConfig,
    pub database: database::DatabaseConfig,
    pub identity: identity::IdentityConfig,
    pub crypto: crypto::CryptoConfig,

    // Logging
    pub log_level: String,

    /// When true, a bootstrap run that completes with failures aborts startup.
    /// The lenient default keeps the service available even when reference
    /// data is incomplete.
    pub strict_bootstrap: bool,

    pub version: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server: server::ServerConfig::from_env(),
            database: database::DatabaseConfig::from_env(),
            identity: identity::IdentityConfig::from_env(),
            crypto: crypto::CryptoConfig::from_env(),

            log_level: env::var("PAYADMIN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            strict_bootstrap: env::var("PAYADMIN_STRICT_BOOTSTRAP")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false),

            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
