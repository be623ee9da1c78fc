//! # Vault Client
//!
//! Obtains a shared TLS certificate from a HashiCorp Vault PKI secrets engine
//! and writes it to disk for co-located services.
//!
//! ## Architecture
//!
//! ```text
//! issue_certificate → VaultBackend → HttpBackend   (HTTPS, Vault HTTP API)
//!                                  → MemoryBackend (in-memory, for tests)
//!        ↓
//! CertificateFiles (shared.ca / shared.crt / shared.key)
//! ```
//!
//! Every request is a single round trip: no retries, no token renewal and no
//! background tasks.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use vault_client::backend::{HttpBackend, HttpBackendConfig};
//! use vault_client::pki::{issue_certificate, ServiceIdentity};
//! use vault_client::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = HttpBackendConfig::from_ca_file("/etc/ssl/certs/puppet-discovery/shared.ca", "s.token")?;
//!     let backend = HttpBackend::new(config)?;
//!
//!     let identity = ServiceIdentity::new("ingest", "tenant-1");
//!     let cert = issue_certificate(&backend, &identity).await?;
//!     println!("{}", cert.cert);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cli;
pub mod config;
pub mod errors;
pub mod observability;
pub mod pki;
pub mod server;
pub mod storage;
pub mod tls;
pub mod types;

// Re-export commonly used types and traits
pub use backend::{HttpBackend, HttpBackendConfig, MemoryBackend, Method, VaultBackend, VaultResponse};
pub use config::Config;
pub use errors::{Error, Result};
pub use pki::{issue_certificate, Cert, CertificateIssuer, ServiceIdentity};
pub use types::SecretString;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
