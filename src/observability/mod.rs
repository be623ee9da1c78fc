//! # Observability
//!
//! Structured logging through `tracing`. `RUST_LOG` takes precedence over the
//! configured level; JSON output is opt-in.
//!
//! Request counters are emitted through the `metrics` facade by the HTTP
//! backend. No recorder is installed here, so they are no-ops unless the
//! embedding application installs one.

use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, ObservabilityConfig};
use crate::errors::{Error, Result};

/// Build the env filter: `RUST_LOG` if set, otherwise `config.log_level`.
pub fn env_filter(config: &ObservabilityConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| {
            Error::config(format!("Invalid log level '{}': {}", config.log_level, e))
        }),
    }
}

/// Install the global tracing subscriber.
///
/// A subscriber that is already installed (e.g. by a test harness) is left
/// in place.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = env_filter(config)?;

    let installed = if config.json_logging {
        fmt().json().with_env_filter(filter).with_current_span(true).try_init()
    } else {
        fmt().with_env_filter(filter).with_target(false).try_init()
    };

    if let Err(e) = installed {
        debug!(error = %e, "Tracing subscriber already installed; keeping it");
    }
    Ok(())
}

/// Log configuration at startup. The token is never logged.
pub fn log_config_info(config: &Config) {
    info!(
        vault_address = %config.vault.address,
        ca_cert = %config.vault.ca_cert_path.display(),
        tls_skip_verify = config.vault.tls_skip_verify,
        timeout_secs = ?config.vault.timeout.map(|t| t.as_secs()),
        service_name = %config.identity.service_name,
        tenant_id = %config.identity.tenant_id,
        cert_dir = %config.cert_dir.display(),
        "Vault client configuration"
    );

    if config.vault.token.is_empty() {
        warn!("VAULT_TOKEN is not set; requests will be sent without a usable token");
    }
    if config.identity.service_name.is_empty() || config.identity.tenant_id.is_empty() {
        warn!("SERVICE_NAME or TENANT_ID is empty; the certificate will not carry the expected name");
    }
}
