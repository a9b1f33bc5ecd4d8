//! Configuration module
//!
//! Configuration is read from the process environment (after loading an optional
//! `.env` file). Missing remote credentials are not errors: they switch off the
//! remote upload or the notification path.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// Common constants
const FTP_PORT: u16 = 21;
const FTP_PASSIVE_PORTS: &str = "50000-50100";
const FTP_IDLE_TIMEOUT_SECS: u64 = 600;
const UPLOAD_ROOT: &str = "uploads";
const UPLOAD_RATE_LIMIT: usize = 5;
const UPLOAD_RATE_WINDOW_SECS: u64 = 3600;
const RATE_LIMITER_SHARD_COUNT: usize = 16;
const HTTP_TIMEOUT_SECS: u64 = 30;
const UPLOADTHING_API_URL: &str = "https://api.uploadthing.com/v6/uploadFiles";
const UPLOADTHING_VERSION: &str = "6.4.0";
const UPLOAD_CONTENT_DISPOSITION: &str = "inline";
const RESEND_API_URL: &str = "https://api.resend.com/emails";
const SMTP_PORT: u16 = 587;

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid LOG_FORMAT: {}", s)),
        }
    }
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Listener and process-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub environment: String,
    pub bind_address: String,
    pub ftp_port: u16,
    pub passive_ports: RangeInclusive<u16>,
    pub idle_timeout_secs: u64,
    pub log_format: LogFormat,
}

/// Remote blob-storage settings
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub api_version: String,
    pub content_disposition: String,
}

/// Upload notification settings
#[derive(Clone, Debug)]
pub struct NotificationConfig {
    pub resend_api_key: Option<String>,
    pub resend_api_url: String,
    pub from: Option<String>,
    pub recipient: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_tls: bool,
}

/// Intake relay configuration
#[derive(Clone, Debug)]
pub struct IntakeConfig {
    pub base: BaseConfig,
    pub upload_root: PathBuf,
    pub upload_rate_limit: usize,
    pub upload_rate_window_secs: u64,
    pub rate_limiter_shard_count: usize,
    pub http_timeout_secs: u64,
    pub storage: StorageConfig,
    pub notification: NotificationConfig,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<IntakeConfig>);

impl Config {
    fn as_intake(&self) -> &IntakeConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.as_intake().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = IntakeConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_intake().validate()
    }

    pub fn environment(&self) -> &str {
        &self.as_intake().base.environment
    }

    pub fn bind_address(&self) -> &str {
        &self.as_intake().base.bind_address
    }

    pub fn ftp_port(&self) -> u16 {
        self.as_intake().base.ftp_port
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address(), self.ftp_port())
    }

    pub fn passive_ports(&self) -> RangeInclusive<u16> {
        self.as_intake().base.passive_ports.clone()
    }

    pub fn idle_timeout_secs(&self) -> u64 {
        self.as_intake().base.idle_timeout_secs
    }

    pub fn log_format(&self) -> LogFormat {
        self.as_intake().base.log_format
    }

    pub fn upload_root(&self) -> &std::path::Path {
        &self.as_intake().upload_root
    }

    pub fn upload_rate_limit(&self) -> usize {
        self.as_intake().upload_rate_limit
    }

    pub fn upload_rate_window(&self) -> Duration {
        Duration::from_secs(self.as_intake().upload_rate_window_secs)
    }

    pub fn rate_limiter_shard_count(&self) -> usize {
        self.as_intake().rate_limiter_shard_count
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.as_intake().http_timeout_secs)
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.as_intake().storage
    }

    pub fn notification(&self) -> &NotificationConfig {
        &self.as_intake().notification
    }

    pub fn uploadthing_api_key(&self) -> Option<&str> {
        self.as_intake().storage.api_key.as_deref()
    }

    pub fn resend_api_key(&self) -> Option<&str> {
        self.as_intake().notification.resend_api_key.as_deref()
    }
}

/// Parse a `start-end` port range.
fn parse_port_range(value: &str) -> Result<RangeInclusive<u16>, anyhow::Error> {
    let (start, end) = value
        .split_once('-')
        .ok_or_else(|| anyhow::anyhow!("FTP_PASSIVE_PORTS must look like 50000-50100"))?;
    let start: u16 = start
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("FTP_PASSIVE_PORTS start must be a valid port"))?;
    let end: u16 = end
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("FTP_PASSIVE_PORTS end must be a valid port"))?;
    Ok(start..=end)
}

impl IntakeConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the configuration from a variable lookup. Empty values count as unset.
    pub fn from_vars<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| var(key).filter(|s| !s.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let base = BaseConfig {
            environment,
            bind_address: var("FTP_BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_string()),
            ftp_port: var("FTP_PORT")
                .unwrap_or_else(|| FTP_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("FTP_PORT must be a valid number"))?,
            passive_ports: parse_port_range(
                &var("FTP_PASSIVE_PORTS").unwrap_or_else(|| FTP_PASSIVE_PORTS.to_string()),
            )?,
            idle_timeout_secs: var("FTP_IDLE_TIMEOUT_SECS")
                .unwrap_or_else(|| FTP_IDLE_TIMEOUT_SECS.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("FTP_IDLE_TIMEOUT_SECS must be a valid number"))?,
            log_format: var("LOG_FORMAT")
                .unwrap_or_else(|| "pretty".to_string())
                .parse()?,
        };

        let storage = StorageConfig {
            api_key: var("UPLOADTHING_API_KEY"),
            api_url: var("UPLOADTHING_API_URL").unwrap_or_else(|| UPLOADTHING_API_URL.to_string()),
            api_version: var("UPLOADTHING_VERSION")
                .unwrap_or_else(|| UPLOADTHING_VERSION.to_string()),
            content_disposition: var("UPLOAD_CONTENT_DISPOSITION")
                .unwrap_or_else(|| UPLOAD_CONTENT_DISPOSITION.to_string()),
        };

        let notification = NotificationConfig {
            resend_api_key: var("RESEND_API_KEY"),
            resend_api_url: var("RESEND_API_URL").unwrap_or_else(|| RESEND_API_URL.to_string()),
            from: var("NOTIFICATION_FROM"),
            recipient: var("NOTIFICATION_EMAIL"),
            smtp_host: var("SMTP_HOST"),
            smtp_port: var("SMTP_PORT")
                .and_then(|s| s.parse().ok())
                .filter(|&p| p > 0)
                .unwrap_or(SMTP_PORT),
            smtp_user: var("SMTP_USER"),
            smtp_password: var("SMTP_PASSWORD"),
            smtp_tls: var("SMTP_TLS")
                .unwrap_or_else(|| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
        };

        let config = IntakeConfig {
            base,
            upload_root: PathBuf::from(var("UPLOAD_ROOT").unwrap_or_else(|| UPLOAD_ROOT.to_string())),
            upload_rate_limit: var("UPLOAD_RATE_LIMIT")
                .unwrap_or_else(|| UPLOAD_RATE_LIMIT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("UPLOAD_RATE_LIMIT must be a valid number"))?,
            upload_rate_window_secs: var("UPLOAD_RATE_WINDOW_SECS")
                .unwrap_or_else(|| UPLOAD_RATE_WINDOW_SECS.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("UPLOAD_RATE_WINDOW_SECS must be a valid number"))?,
            rate_limiter_shard_count: var("RATE_LIMITER_SHARD_COUNT")
                .unwrap_or_else(|| RATE_LIMITER_SHARD_COUNT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RATE_LIMITER_SHARD_COUNT must be a valid number"))?,
            http_timeout_secs: var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|| HTTP_TIMEOUT_SECS.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("HTTP_TIMEOUT_SECS must be a valid number"))?,
            storage,
            notification,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.ftp_port == 0 {
            return Err(anyhow::anyhow!("FTP_PORT must be greater than 0"));
        }

        if self.base.passive_ports.start() > self.base.passive_ports.end() {
            return Err(anyhow::anyhow!(
                "FTP_PASSIVE_PORTS start must not be greater than its end"
            ));
        }

        if *self.base.passive_ports.start() == u16::MAX {
            return Err(anyhow::anyhow!(
                "FTP_PASSIVE_PORTS must include a port below 65535"
            ));
        }

        if self.base.idle_timeout_secs == 0 {
            return Err(anyhow::anyhow!("FTP_IDLE_TIMEOUT_SECS must be at least 1"));
        }

        if self.upload_rate_limit == 0 {
            return Err(anyhow::anyhow!("UPLOAD_RATE_LIMIT must be at least 1"));
        }

        if self.upload_rate_window_secs == 0 {
            return Err(anyhow::anyhow!("UPLOAD_RATE_WINDOW_SECS must be at least 1"));
        }

        if self.rate_limiter_shard_count == 0 {
            return Err(anyhow::anyhow!("RATE_LIMITER_SHARD_COUNT must be at least 1"));
        }

        if self.http_timeout_secs == 0 {
            return Err(anyhow::anyhow!("HTTP_TIMEOUT_SECS must be at least 1"));
        }

        if !self.storage.api_url.starts_with("http://") && !self.storage.api_url.starts_with("https://")
        {
            return Err(anyhow::anyhow!("UPLOADTHING_API_URL must be an http(s) URL"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<IntakeConfig, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        IntakeConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = Config(Box::new(config_from(&[]).expect("defaults are valid")));
        assert_eq!(config.ftp_port(), 21);
        assert_eq!(config.listen_addr(), "0.0.0.0:21");
        assert_eq!(config.passive_ports(), 50000..=50100);
        assert_eq!(config.upload_root(), std::path::Path::new("uploads"));
        assert_eq!(config.upload_rate_limit(), 5);
        assert_eq!(config.upload_rate_window(), Duration::from_secs(3600));
        assert_eq!(config.http_timeout(), Duration::from_secs(30));
        assert_eq!(config.log_format(), LogFormat::Pretty);
        assert!(config.uploadthing_api_key().is_none());
        assert!(config.resend_api_key().is_none());
        assert_eq!(
            config.storage().api_url,
            "https://api.uploadthing.com/v6/uploadFiles"
        );
        assert_eq!(config.storage().api_version, "6.4.0");
        assert_eq!(config.storage().content_disposition, "inline");
        assert_eq!(config.notification().smtp_port, 587);
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("ENVIRONMENT", "production"),
            ("FTP_PORT", "2121"),
            ("FTP_PASSIVE_PORTS", "40000 - 40010"),
            ("UPLOAD_ROOT", "/srv/intake"),
            ("UPLOAD_RATE_LIMIT", "10"),
            ("UPLOAD_RATE_WINDOW_SECS", "60"),
            ("UPLOADTHING_API_KEY", "sk_live_123"),
            ("RESEND_API_KEY", "re_123"),
            ("NOTIFICATION_EMAIL", "ops@example.com"),
            ("LOG_FORMAT", "JSON"),
        ])
        .expect("valid overrides");
        let config = Config(Box::new(config));

        assert!(config.is_production());
        assert_eq!(config.ftp_port(), 2121);
        assert_eq!(config.passive_ports(), 40000..=40010);
        assert_eq!(config.upload_root(), std::path::Path::new("/srv/intake"));
        assert_eq!(config.upload_rate_limit(), 10);
        assert_eq!(config.upload_rate_window(), Duration::from_secs(60));
        assert_eq!(config.uploadthing_api_key(), Some("sk_live_123"));
        assert_eq!(config.resend_api_key(), Some("re_123"));
        assert_eq!(
            config.notification().recipient.as_deref(),
            Some("ops@example.com")
        );
        assert_eq!(config.log_format(), LogFormat::Json);
    }

    #[test]
    fn test_empty_api_key_counts_as_unset() {
        let config = config_from(&[("UPLOADTHING_API_KEY", "  ")]).expect("valid");
        assert!(config.storage.api_key.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config_from(&[("FTP_PORT", "not-a-port")]).is_err());
        assert!(config_from(&[("FTP_PORT", "0")]).is_err());
        assert!(config_from(&[("UPLOAD_RATE_LIMIT", "0")]).is_err());
        assert!(config_from(&[("UPLOAD_RATE_WINDOW_SECS", "0")]).is_err());
        assert!(config_from(&[("FTP_PASSIVE_PORTS", "50100-50000")]).is_err());
        assert!(config_from(&[("FTP_PASSIVE_PORTS", "50000")]).is_err());
        assert!(config_from(&[("LOG_FORMAT", "xml")]).is_err());
        assert!(config_from(&[("UPLOADTHING_API_URL", "ftp://example.com")]).is_err());
    }

    #[test]
    fn test_garbage_numbers_are_rejected() {
        for key in [
            "FTP_IDLE_TIMEOUT_SECS",
            "RATE_LIMITER_SHARD_COUNT",
            "HTTP_TIMEOUT_SECS",
        ] {
            let err = config_from(&[(key, "ten")]).unwrap_err();
            assert!(err.to_string().contains(key), "{key}: {err}");
            assert!(config_from(&[(key, "-1")]).is_err(), "{key}");
            assert!(config_from(&[(key, "0")]).is_err(), "{key}");
        }
    }

    #[test]
    fn test_passive_range_needs_a_usable_port() {
        assert!(config_from(&[("FTP_PASSIVE_PORTS", "65535-65535")]).is_err());
        let config = config_from(&[("FTP_PASSIVE_PORTS", "65500-65535")]).unwrap();
        assert_eq!(config.base.passive_ports, 65500..=65535);
    }
}
