use crate::analytics::market::DEFAULT_TOTAL_ADDRESSABLE_MARKET;
use crate::analytics::summary::AnalyticsSettings;
use crate::territory::{DEFAULT_TREND_DAYS, MAX_TREND_DAYS};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

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
    pub analytics: AnalyticsConfig,
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

        let total_addressable_market = numeric_var(
            "ANALYTICS_TOTAL_ADDRESSABLE_MARKET",
            DEFAULT_TOTAL_ADDRESSABLE_MARKET,
        )?;
        let trend_days = numeric_var("ANALYTICS_TREND_DAYS", DEFAULT_TREND_DAYS)?;
        let max_trend_days = numeric_var("ANALYTICS_MAX_TREND_DAYS", DEFAULT_MAX_TREND_DAYS)?;
        if max_trend_days > MAX_TREND_DAYS {
            return Err(ConfigError::TrendWindow {
                key: "ANALYTICS_MAX_TREND_DAYS",
                days: max_trend_days,
                limit: MAX_TREND_DAYS,
            });
        }
        if trend_days > max_trend_days {
            return Err(ConfigError::TrendWindow {
                key: "ANALYTICS_TREND_DAYS",
                days: trend_days,
                limit: max_trend_days,
            });
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            analytics: AnalyticsConfig {
                total_addressable_market,
                trend_days,
                max_trend_days,
            },
        })
    }
}

fn numeric_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        Err(_) => Ok(default),
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

/// Default upper bound on requested trend series lengths.
pub const DEFAULT_MAX_TREND_DAYS: u32 = 366;

/// Engine tunables exposed through the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsConfig {
    pub total_addressable_market: u64,
    /// Default length of territory trend series when a request does not specify one.
    pub trend_days: u32,
    /// Longest trend series a caller may request.
    pub max_trend_days: u32,
}

impl AnalyticsConfig {
    pub fn settings(&self) -> AnalyticsSettings {
        AnalyticsSettings {
            total_addressable_market: self.total_addressable_market,
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            total_addressable_market: DEFAULT_TOTAL_ADDRESSABLE_MARKET,
            trend_days: DEFAULT_TREND_DAYS,
            max_trend_days: DEFAULT_MAX_TREND_DAYS,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
    TrendWindow { key: &'static str, days: u32, limit: u32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a non-negative integer (got '{value}')")
            }
            ConfigError::TrendWindow { key, days, limit } => {
                write!(f, "{key} must be at most {limit} days (got {days})")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::TrendWindow { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("ANALYTICS_TOTAL_ADDRESSABLE_MARKET");
        env::remove_var("ANALYTICS_TREND_DAYS");
        env::remove_var("ANALYTICS_MAX_TREND_DAYS");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.analytics, AnalyticsConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_analytics_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ANALYTICS_TOTAL_ADDRESSABLE_MARKET", "2500");
        env::set_var("ANALYTICS_TREND_DAYS", "14");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.analytics.total_addressable_market, 2500);
        assert_eq!(config.analytics.trend_days, 14);
        assert_eq!(config.analytics.max_trend_days, DEFAULT_MAX_TREND_DAYS);
        assert_eq!(config.analytics.settings().total_addressable_market, 2500);
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_analytics_values() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ANALYTICS_TREND_DAYS", "a month");
        let err = AppConfig::load().expect_err("invalid trend days rejected");
        assert!(err.to_string().contains("ANALYTICS_TREND_DAYS"));
        reset_env();
    }

    #[test]
    fn default_trend_length_cannot_exceed_maximum() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ANALYTICS_TREND_DAYS", "90");
        env::set_var("ANALYTICS_MAX_TREND_DAYS", "60");
        let err = AppConfig::load().expect_err("default above maximum rejected");
        assert!(err.to_string().contains("ANALYTICS_TREND_DAYS"));

        env::set_var("ANALYTICS_TREND_DAYS", "30");
        env::set_var("ANALYTICS_MAX_TREND_DAYS", "100000");
        let err = AppConfig::load().expect_err("maximum above engine limit rejected");
        assert!(err.to_string().contains("ANALYTICS_MAX_TREND_DAYS"));
        reset_env();
    }
}
