//! # Configuration Management
//!
//! Everything the bootstrap needs is read from the process environment (after
//! an optional `.env` file has been loaded). Only [`Config::from_env`] touches
//! the environment; backends and the issuance workflow take their values
//! through constructors.
//!
//! | Variable | Default |
//! |---|---|
//! | `VAULT_ADDR` | `https://vault:8200` |
//! | `VAULT_TOKEN` | empty |
//! | `VAULT_CACERT` | `/etc/ssl/certs/puppet-discovery/shared.ca` |
//! | `VAULT_SKIP_VERIFY` | `false` |
//! | `VAULT_CLIENT_TIMEOUT_SECS` | unset (no timeout) |
//! | `SERVICE_NAME` | empty |
//! | `TENANT_ID` | empty |
//! | `VAULT_CLIENT_CERT_DIR` | `/etc/ssl/certs/puppet-discovery` |
//! | `VAULT_CLIENT_SERVE_ADDR` | `0.0.0.0:9443` |
//! | `VAULT_CLIENT_LOG_LEVEL` | `info` |
//! | `VAULT_CLIENT_LOG_FORMAT` | `text` (`json` for structured output) |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::backend::http::{HttpBackendConfig, DEFAULT_ADDRESS};
use crate::errors::{Error, Result};
use crate::pki::ServiceIdentity;
use crate::server::DEFAULT_SERVE_ADDR;
use crate::storage::DEFAULT_CERT_DIR;
use crate::types::SecretString;

/// Trust anchor used to verify the Vault server.
pub const DEFAULT_CA_CERT_PATH: &str = "/etc/ssl/certs/puppet-discovery/shared.ca";

/// Connection settings for the Vault server.
#[derive(Debug, Clone)]
pub struct VaultSettings {
    pub address: String,
    pub token: SecretString,
    pub ca_cert_path: PathBuf,
    pub tls_skip_verify: bool,
    pub timeout: Option<Duration>,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            token: SecretString::default(),
            ca_cert_path: PathBuf::from(DEFAULT_CA_CERT_PATH),
            tls_skip_verify: false,
            timeout: None,
        }
    }
}

impl VaultSettings {
    /// Read the CA file and build the HTTP backend configuration.
    pub fn backend_config(&self) -> Result<HttpBackendConfig> {
        let mut config = HttpBackendConfig::from_ca_file(&self.ca_cert_path, self.token.clone())?
            .with_address(self.address.clone())
            .with_tls_skip_verify(self.tls_skip_verify);
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        Ok(config)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,

    /// Emit JSON lines instead of human-readable text
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logging: false }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub vault: VaultSettings,
    pub identity: ServiceIdentity,
    pub cert_dir: PathBuf,
    pub serve_addr: SocketAddr,
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let token = lookup("VAULT_TOKEN").unwrap_or_default();

        let timeout = match non_empty("VAULT_CLIENT_TIMEOUT_SECS") {
            Some(value) => Some(Duration::from_secs(value.parse().map_err(|e| {
                Error::config(format!("Invalid VAULT_CLIENT_TIMEOUT_SECS '{}': {}", value, e))
            })?)),
            None => None,
        };

        let vault = VaultSettings {
            address: non_empty("VAULT_ADDR").unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            token: SecretString::new(token),
            ca_cert_path: non_empty("VAULT_CACERT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CA_CERT_PATH)),
            tls_skip_verify: parse_bool("VAULT_SKIP_VERIFY", non_empty("VAULT_SKIP_VERIFY"))?,
            timeout,
        };

        let service_name = lookup("SERVICE_NAME").unwrap_or_default();
        let tenant_id = lookup("TENANT_ID").unwrap_or_default();

        let serve_addr = non_empty("VAULT_CLIENT_SERVE_ADDR")
            .unwrap_or_else(|| DEFAULT_SERVE_ADDR.to_string());
        let serve_addr = serve_addr.parse().map_err(|e| {
            Error::config(format!("Invalid VAULT_CLIENT_SERVE_ADDR '{}': {}", serve_addr, e))
        })?;

        let json_logging = match non_empty("VAULT_CLIENT_LOG_FORMAT").as_deref() {
            None | Some("text") => false,
            Some("json") => true,
            Some(other) => {
                return Err(Error::config(format!(
                    "Invalid VAULT_CLIENT_LOG_FORMAT '{}': expected 'text' or 'json'",
                    other
                )))
            }
        };

        Ok(Self {
            vault,
            identity: ServiceIdentity::new(service_name, tenant_id),
            cert_dir: non_empty("VAULT_CLIENT_CERT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CERT_DIR)),
            serve_addr,
            observability: ObservabilityConfig {
                log_level: non_empty("VAULT_CLIENT_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                json_logging,
            },
        })
    }
}

fn parse_bool(key: &str, value: Option<String>) -> Result<bool> {
    match value.map(|v| v.to_lowercase()).as_deref() {
        None => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(Error::config(format!("Invalid {} '{}': expected a boolean", key, other))),
    }
}
