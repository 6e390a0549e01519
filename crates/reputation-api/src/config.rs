//! Configuration for the reputation API.

use anyhow::{bail, Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Flat variable names from older deployments and the config keys they feed.
///
/// They act as defaults: the nested `SECTION__KEY` form wins when both are set.
const LEGACY_VARS: &[(&str, &str)] = &[
    ("PORT", "server.port"),
    ("MONGO_URI", "database.uri"),
    ("JWT_SECRET", "auth.secret"),
    ("STARKNET_PROVIDER", "chain.provider_url"),
    ("CONTRACT_ADDRESS", "chain.contract_address"),
];

/// Service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Record store configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Secret material
    #[serde(default)]
    pub auth: AuthConfig,

    /// Chain parameters, reported but never dialed
    #[serde(default)]
    pub chain: ChainConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// Store location: unset or `memory://` for in-memory, `file://<path>`
    /// or a bare path for the encrypted file store
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Secret used to derive the at-rest encryption key
    pub secret: Option<SecretString>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainConfig {
    pub provider_url: Option<String>,

    /// Default contract for NFT records that do not name one
    pub contract_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per client within one window
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length, e.g. "15m"
    #[serde(default = "default_window", with = "humantime_serde")]
    pub window: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

/// Where records are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    EncryptedFile(PathBuf),
}

impl DatabaseConfig {
    /// Resolve the configured URI to a store location.
    pub fn location(&self) -> Result<StoreLocation> {
        let uri = match self.uri.as_deref().map(str::trim) {
            None | Some("") => return Ok(StoreLocation::Memory),
            Some(uri) => uri,
        };

        match uri.split_once("://") {
            Some(("memory", _)) => Ok(StoreLocation::Memory),
            Some(("file", path)) if !path.is_empty() => {
                Ok(StoreLocation::EncryptedFile(PathBuf::from(path)))
            }
            Some(("file", _)) => bail!("Database URI {:?} has no path", uri),
            Some((scheme, _)) => bail!("Unsupported database URI scheme: {}", scheme),
            None => Ok(StoreLocation::EncryptedFile(PathBuf::from(uri))),
        }
    }
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window: default_window(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3000
}

fn default_max_requests() -> u32 {
    100
}

fn default_window() -> Duration {
    Duration::from_secs(15 * 60)
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_vars(std::env::vars())
    }

    /// Build configuration from an explicit set of variables.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self> {
        let vars: config::Map<String, String> = vars.into_iter().collect();

        let mut builder = config::Config::builder().add_source(
            config::Environment::default()
                .separator("__")
                .try_parsing(false)
                .source(Some(vars.clone())),
        );

        for (name, key) in LEGACY_VARS {
            if let Some(value) = vars.get(*name) {
                builder = builder
                    .set_default(*key, value.clone())
                    .with_context(|| format!("Invalid value for {}", name))?;
            }
        }

        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(Vec::new()).unwrap();

        assert_eq!(config.server.listen_addr, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert!(config.database.uri.is_none());
        assert!(config.auth.secret.is_none());
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.rate_limit.window, Duration::from_secs(900));
        assert_eq!(config.log.level, "info");
        assert!(!config.log.json);
    }

    #[test]
    fn test_nested_variables() {
        let config = Config::from_vars(vars(&[
            ("SERVER__PORT", "8080"),
            ("DATABASE__URI", "file:///data/records.enc"),
            ("AUTH__SECRET", "hunter2"),
            ("RATE_LIMIT__MAX_REQUESTS", "5"),
            ("RATE_LIMIT__WINDOW", "1m"),
            ("LOG__JSON", "true"),
        ]))
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.database.location().unwrap(),
            StoreLocation::EncryptedFile(PathBuf::from("/data/records.enc"))
        );
        assert_eq!(
            config.auth.secret.as_ref().unwrap().expose_secret(),
            "hunter2"
        );
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.window, Duration::from_secs(60));
        assert!(config.log.json);
    }

    #[test]
    fn test_legacy_variables() {
        let config = Config::from_vars(vars(&[
            ("PORT", "4000"),
            ("JWT_SECRET", "legacy"),
            ("STARKNET_PROVIDER", "https://starknet.example"),
            ("CONTRACT_ADDRESS", "0xc0ffee"),
        ]))
        .unwrap();

        assert_eq!(config.server.port, 4000);
        assert!(config.auth.secret.is_some());
        assert_eq!(
            config.chain.provider_url.as_deref(),
            Some("https://starknet.example")
        );
        assert_eq!(config.chain.contract_address.as_deref(), Some("0xc0ffee"));
    }

    #[test]
    fn test_nested_wins_over_legacy() {
        let config =
            Config::from_vars(vars(&[("PORT", "4000"), ("SERVER__PORT", "5000")])).unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let config = Config::from_vars(vars(&[("AUTH__SECRET", "hunter2")])).unwrap();
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn test_store_location() {
        let location = |uri: Option<&str>| {
            DatabaseConfig {
                uri: uri.map(String::from),
            }
            .location()
        };

        assert_eq!(location(None).unwrap(), StoreLocation::Memory);
        assert_eq!(location(Some("  ")).unwrap(), StoreLocation::Memory);
        assert_eq!(location(Some("memory://")).unwrap(), StoreLocation::Memory);
        assert_eq!(
            location(Some("./records.enc")).unwrap(),
            StoreLocation::EncryptedFile(PathBuf::from("./records.enc"))
        );
        assert!(location(Some("file://")).is_err());

        let err = location(Some("mongodb://localhost:27017/app")).unwrap_err();
        assert!(err.to_string().contains("mongodb"));
    }
}
