use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::workflows::bonus::scoring::BonusPools;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub bonus: BonusSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            bonus: BonusSettings::load()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Settings for the bonus computation core: pool sizes, cache behavior, and
/// the OrangeHRM tenant used to store approved totals.
#[derive(Debug, Clone)]
pub struct BonusSettings {
    pub pools: BonusPools,
    pub cache_ttl: Duration,
    pub shared_cache_url: Option<String>,
    pub orangehrm: OrangeHrmConfig,
}

impl BonusSettings {
    fn load() -> Result<Self, ConfigError> {
        let social_pool_eur = parse_f64_var("SOCIAL_BONUS_POOL_EUR", 2000.0)?;
        let orders_pool_eur = parse_f64_var("ORDERS_BONUS_POOL_EUR", 1500.0)?;
        let cache_ttl_seconds = parse_u64_var("BONUS_CACHE_TTL_SECONDS", 60)?;

        let shared_cache_url = env::var("SHARED_CACHE_URL")
            .ok()
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty());

        Ok(Self {
            pools: BonusPools {
                social_pool_eur,
                orders_pool_eur,
            },
            cache_ttl: Duration::from_secs(cache_ttl_seconds),
            shared_cache_url,
            orangehrm: OrangeHrmConfig::load()?,
        })
    }
}

/// OrangeHRM tenants differ between deployments, so the base URL, bearer
/// token, and endpoint template stay configurable.
#[derive(Debug, Clone)]
pub struct OrangeHrmConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub store_bonus_endpoint: String,
    pub timeout: Duration,
}

impl OrangeHrmConfig {
    fn load() -> Result<Self, ConfigError> {
        let base_url = env::var("ORANGEHRM_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8081".to_string())
            .trim_end_matches('/')
            .to_string();

        let api_token = env::var("ORANGEHRM_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        let store_bonus_endpoint = env::var("ORANGEHRM_STORE_BONUS_ENDPOINT")
            .unwrap_or_else(|_| "/api/v1/employees/{employeeId}/bonus".to_string());

        let timeout_ms = parse_u64_var("ORANGEHRM_TIMEOUT_MS", 5000)?;

        Ok(Self {
            base_url,
            api_token,
            store_bonus_endpoint,
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

fn parse_f64_var(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| ConfigError::InvalidNumber { name }),
        Err(_) => Ok(default),
    }
}

fn parse_u64_var(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { name }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { name: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name } => {
                write!(f, "{name} must be a non-negative number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
