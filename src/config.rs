//! Runtime configuration from environment variables

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_EXPRESS_URL: &str = "https://stream-processing.onrender.com";
pub const DEFAULT_WINDOW_SIZE: usize = 10;
pub const DEFAULT_RECONNECT_DELAY_SECS: u64 = 5;
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Base URL of the upstream event source, without the `/stream` suffix
    pub express_url: String,
    pub window_size: usize,
    pub reconnect_delay: Duration,
    pub read_timeout: Duration,
    pub connect_timeout: Duration,
    pub bind_addr: SocketAddr,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl RuntimeConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `EXPRESS_URL` (default: https://stream-processing.onrender.com)
    /// - `WINDOW_SIZE` (default: 10)
    /// - `RECONNECT_DELAY_SECS` (default: 5)
    /// - `STREAM_READ_TIMEOUT_SECS` (default: 60)
    /// - `CONNECT_TIMEOUT_SECS` (default: 10)
    /// - `BIND_ADDR` (default: 0.0.0.0:8000)
    ///
    /// Invalid numbers fall back to their default with a warning, so the
    /// logger must be initialised first.
    pub fn from_env() -> Result<Self, ConfigError> {
        let express_url = env::var("EXPRESS_URL")
            .unwrap_or_else(|_| DEFAULT_EXPRESS_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();

        if !express_url.starts_with("http://") && !express_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "EXPRESS_URL must start with http:// or https://".to_string(),
            ));
        }

        let window_size = parse_or_default("WINDOW_SIZE", DEFAULT_WINDOW_SIZE);
        if window_size == 0 {
            return Err(ConfigError::InvalidValue(
                "WINDOW_SIZE must be at least 1".to_string(),
            ));
        }

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue(format!("BIND_ADDR '{}': {}", bind_addr, e)))?;

        Ok(Self {
            express_url,
            window_size,
            reconnect_delay: Duration::from_secs(parse_or_default(
                "RECONNECT_DELAY_SECS",
                DEFAULT_RECONNECT_DELAY_SECS,
            )),
            read_timeout: Duration::from_secs(parse_or_default(
                "STREAM_READ_TIMEOUT_SECS",
                DEFAULT_READ_TIMEOUT_SECS,
            )),
            connect_timeout: Duration::from_secs(parse_or_default(
                "CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )),
            bind_addr,
        })
    }

    /// Full URL of the server-push endpoint
    pub fn stream_url(&self) -> String {
        format!("{}/stream", self.express_url)
    }
}

fn parse_or_default<T>(var: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    match env::var(var) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("Invalid {} '{}', defaulting to {}", var, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests in this module mutate process-wide environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 6] = [
        "EXPRESS_URL",
        "WINDOW_SIZE",
        "RECONNECT_DELAY_SECS",
        "STREAM_READ_TIMEOUT_SECS",
        "CONNECT_TIMEOUT_SECS",
        "BIND_ADDR",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let config = RuntimeConfig::from_env().unwrap();

        assert_eq!(config.express_url, DEFAULT_EXPRESS_URL);
        assert_eq!(
            config.stream_url(),
            "https://stream-processing.onrender.com/stream"
        );
        assert_eq!(config.window_size, 10);
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
        assert_eq!(config.read_timeout, Duration::from_secs(60));
        assert_eq!(config.bind_addr.port(), 8000);
    }

    #[test]
    fn test_custom_config() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        env::set_var("EXPRESS_URL", "http://localhost:3000/");
        env::set_var("WINDOW_SIZE", "25");
        env::set_var("RECONNECT_DELAY_SECS", "1");
        env::set_var("BIND_ADDR", "127.0.0.1:9000");

        let config = RuntimeConfig::from_env().unwrap();

        assert_eq!(config.stream_url(), "http://localhost:3000/stream");
        assert_eq!(config.window_size, 25);
        assert_eq!(config.reconnect_delay, Duration::from_secs(1));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9000");

        clear_env();
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        env::set_var("RECONNECT_DELAY_SECS", "soon");

        let config = RuntimeConfig::from_env().unwrap();
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));

        clear_env();
    }

    #[test]
    fn test_rejects_bad_scheme_and_empty_window() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        env::set_var("EXPRESS_URL", "ftp://example.com");
        assert!(matches!(
            RuntimeConfig::from_env(),
            Err(ConfigError::InvalidValue(_))
        ));

        env::remove_var("EXPRESS_URL");
        env::set_var("WINDOW_SIZE", "0");
        assert!(matches!(
            RuntimeConfig::from_env(),
            Err(ConfigError::InvalidValue(_))
        ));

        clear_env();
    }
}
