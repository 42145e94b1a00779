//! Environment configuration. Gateway settings fall back to the gateway's
//! public sandbox credentials when unset.

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::gateway::CheckMacCodec;

const SANDBOX_MERCHANT_ID: &str = "3002607";
const SANDBOX_HASH_KEY: &str = "pwFHCqoQZGmho4w6";
const SANDBOX_HASH_IV: &str = "EkRm7iFT261dpevs";
const SANDBOX_API_URL: &str = "https://payment-stage.ecpay.com.tw/Cashier/AioCheckOut/V5";
const DEFAULT_FRONTEND_URL: &str = "https://www.sdccardshop.com";
const DEFAULT_STORE_NAME: &str = "Prepaid Card Shop";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub gateway: GatewayConfig,
    pub polling: PollingConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Clone)]
pub struct GatewayConfig {
    pub merchant_id: String,
    pub hash_key: String,
    pub hash_iv: String,
    pub api_url: String,
    pub frontend_url: String,
    pub callback_url: String,
    pub store_name: String,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("merchant_id", &self.merchant_id)
            .field("api_url", &self.api_url)
            .field("frontend_url", &self.frontend_url)
            .field("callback_url", &self.callback_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PollingConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_attempts: 10,
        }
    }
}

impl AppConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let server = ServerConfig {
            host: var_or("HOST", "0.0.0.0"),
            port: parse_var("PORT", 8080)?,
        };
        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
        };
        let public_api_url = var_or(
            "PUBLIC_API_URL",
            &format!("http://localhost:{}", server.port),
        );
        let gateway = GatewayConfig {
            merchant_id: var_or("ECPAY_MERCHANT_ID", SANDBOX_MERCHANT_ID),
            hash_key: var_or("ECPAY_HASH_KEY", SANDBOX_HASH_KEY),
            hash_iv: var_or("ECPAY_HASH_IV", SANDBOX_HASH_IV),
            api_url: var_or("ECPAY_API_URL", SANDBOX_API_URL),
            frontend_url: var_or("FRONTEND_URL", DEFAULT_FRONTEND_URL),
            callback_url: format!("{}/payments/callback", public_api_url.trim_end_matches('/')),
            store_name: var_or("STORE_NAME", DEFAULT_STORE_NAME),
        };
        let polling = PollingConfig {
            interval: Duration::from_millis(parse_var("POLL_INTERVAL_MS", 3000)?),
            max_attempts: parse_var("POLL_MAX_ATTEMPTS", 10)?,
        };

        Ok(AppConfig {
            server,
            database,
            gateway,
            polling,
        })
    }
}

impl GatewayConfig {
    /// Sandbox merchant settings with the given callback URL.
    pub fn sandbox(callback_url: &str) -> Self {
        Self {
            merchant_id: SANDBOX_MERCHANT_ID.to_string(),
            hash_key: SANDBOX_HASH_KEY.to_string(),
            hash_iv: SANDBOX_HASH_IV.to_string(),
            api_url: SANDBOX_API_URL.to_string(),
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            callback_url: callback_url.to_string(),
            store_name: DEFAULT_STORE_NAME.to_string(),
        }
    }

    pub fn codec(&self) -> CheckMacCodec {
        CheckMacCodec::new(&self.hash_key, &self.hash_iv)
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        _ => Ok(default),
    }
}
