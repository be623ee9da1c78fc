//! HTTPS adapter for a real Vault server.
//!
//! Each protocol call becomes one authenticated request against
//! `<address>/<api_version>/<path>`. Non-2xx responses are mapped to
//! [`Error::HttpStatus`] carrying the caller's path.

use async_trait::async_trait;
use rustls::pki_types::{pem::PemObject, CertificateDer};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, trace, warn};

use super::{parse_request_body, Method, VaultBackend};
use crate::errors::{Error, Result, TlsError};
use crate::types::SecretString;

/// Default Vault address inside the deployment network.
pub const DEFAULT_ADDRESS: &str = "https://vault:8200";

/// API version segment prefixed to every request path.
pub const DEFAULT_API_VERSION: &str = "v1";

/// Connection settings for [`HttpBackend`].
#[derive(Clone)]
pub struct HttpBackendConfig {
    /// Base address, e.g. `https://vault:8200`
    pub address: String,

    /// Version segment placed before every path
    pub api_version: String,

    /// Token sent with every request
    pub token: SecretString,

    /// PEM bundle of CA certificates trusted for the Vault server
    pub ca_cert_pem: Vec<u8>,

    /// Skip server certificate verification. Off unless explicitly enabled.
    pub tls_skip_verify: bool,

    /// Per-request timeout. `None` leaves reqwest's default (no timeout).
    pub timeout: Option<Duration>,
}

impl HttpBackendConfig {
    pub fn new(ca_cert_pem: impl Into<Vec<u8>>, token: impl Into<SecretString>) -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            token: token.into(),
            ca_cert_pem: ca_cert_pem.into(),
            tls_skip_verify: false,
            timeout: None,
        }
    }

    /// Read the CA bundle from `ca_path`. An unreadable file is an I/O error.
    pub fn from_ca_file(ca_path: impl AsRef<Path>, token: impl Into<SecretString>) -> Result<Self> {
        let ca_cert_pem = std::fs::read(ca_path.as_ref())?;
        Ok(Self::new(ca_cert_pem, token))
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Disable server certificate verification.
    ///
    /// Only for environments whose Vault certificate cannot be validated
    /// against the supplied CA; a warning is logged when the client is built.
    pub fn with_tls_skip_verify(mut self, skip: bool) -> Self {
        self.tls_skip_verify = skip;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for HttpBackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBackendConfig")
            .field("address", &self.address)
            .field("api_version", &self.api_version)
            .field("token", &self.token)
            .field("ca_cert_pem", &format!("[{} bytes PEM]", self.ca_cert_pem.len()))
            .field("tls_skip_verify", &self.tls_skip_verify)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// [`VaultBackend`] backed by HTTPS requests to a Vault server.
///
/// Cheap to clone; clones share the underlying connection pool and may be
/// used concurrently. No request is retried.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    address: String,
    api_version: String,
    token: SecretString,
}

impl fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBackend")
            .field("address", &self.address)
            .field("api_version", &self.api_version)
            .field("token", &self.token)
            .field("client", &"[reqwest::Client]")
            .finish()
    }
}

impl HttpBackend {
    /// Build a client that trusts the certificates in `config.ca_cert_pem`.
    pub fn new(config: HttpBackendConfig) -> Result<Self> {
        let roots = parse_ca_bundle(&config.ca_cert_pem)?;

        let mut builder =
            reqwest::Client::builder().use_rustls_tls().tls_built_in_root_certs(false);

        for der in &roots {
            let certificate = reqwest::Certificate::from_der(der.as_ref())
                .map_err(|e| TlsError::InvalidCaPem { reason: e.to_string() })?;
            builder = builder.add_root_certificate(certificate);
        }

        if config.tls_skip_verify {
            warn!(
                address = %config.address,
                "Vault server certificate verification is DISABLED (VAULT_SKIP_VERIFY)"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| Error::internal(format!("Failed to build Vault HTTP client: {}", e)))?;

        debug!(
            address = %config.address,
            api_version = %config.api_version,
            trusted_roots = roots.len(),
            "Built Vault HTTP client"
        );

        Ok(Self {
            client,
            address: config.address.trim_end_matches('/').to_string(),
            api_version: config.api_version,
            token: config.token,
        })
    }

    /// Read the CA bundle at `ca_path` and build a client with default settings.
    pub fn from_ca_file(ca_path: impl AsRef<Path>, token: impl Into<SecretString>) -> Result<Self> {
        Self::new(HttpBackendConfig::from_ca_file(ca_path, token)?)
    }

    /// Full URL for a logical Vault path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}/{}", self.address, self.api_version, path)
    }

    async fn request(&self, method: Method, path: &str, body: Option<&[u8]>) -> Result<Vec<u8>> {
        // Parsed up front so a malformed body never reaches the network.
        let json_body = if method.has_body() { parse_request_body(body)? } else { None };

        let http_method = reqwest::Method::from_bytes(method.as_str().as_bytes())
            .map_err(|e| Error::internal(format!("Invalid HTTP method {}: {}", method, e)))?;
        let url = self.url_for(path);
        debug!(method = %method, path = %path, "Sending Vault request");

        let mut request = self
            .client
            .request(http_method, &url)
            .bearer_auth(self.token.expose_secret())
            .header("X-Vault-Token", self.token.expose_secret());
        if let Some(json) = &json_body {
            request = request.json(json);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                record_request(method, "transport_error");
                warn!(method = %method, path = %path, error = %e, "Vault request failed");
                return Err(Error::Transport(e));
            }
        };

        let status = response.status();
        // The body is drained on every path so the connection can be reused.
        let payload = response.bytes().await;

        if !status.is_success() {
            record_request(method, "status_error");
            if let Ok(bytes) = &payload {
                trace!(body = %String::from_utf8_lossy(bytes), "Vault error response");
            }
            debug!(method = %method, path = %path, status = status.as_u16(), "Vault returned error status");
            return Err(Error::http_status(path, status.as_u16()));
        }

        let payload = payload?;
        record_request(method, "success");
        debug!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            bytes = payload.len(),
            "Vault request completed"
        );
        Ok(payload.to_vec())
    }
}

fn record_request(method: Method, outcome: &'static str) {
    metrics::counter!(
        "vault_client_requests_total",
        "method" => method.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Decode every certificate in a PEM bundle.
fn parse_ca_bundle(pem: &[u8]) -> std::result::Result<Vec<CertificateDer<'static>>, TlsError> {
    let roots: Vec<CertificateDer<'static>> = CertificateDer::pem_slice_iter(pem)
        .map(|result| result.map_err(|e| TlsError::InvalidCaPem { reason: e.to_string() }))
        .collect::<std::result::Result<_, _>>()?;

    if roots.is_empty() {
        return Err(TlsError::EmptyCaBundle);
    }
    Ok(roots)
}

#[async_trait]
impl VaultBackend for HttpBackend {
    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        self.request(Method::Get, path, None).await
    }

    async fn list(&self, path: &str) -> Result<Vec<u8>> {
        self.request(Method::List, path, None).await
    }

    async fn delete(&self, path: &str) -> Result<Vec<u8>> {
        self.request(Method::Delete, path, None).await
    }

    async fn post(&self, path: &str, body: Option<&[u8]>) -> Result<Vec<u8>> {
        self.request(Method::Post, path, body).await
    }

    async fn put(&self, path: &str, body: Option<&[u8]>) -> Result<Vec<u8>> {
        self.request(Method::Put, path, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_ca_pem() -> String {
        rcgen::generate_simple_self_signed(vec!["vault".to_string()]).unwrap().cert.pem()
    }

    #[test]
    fn test_config_defaults() {
        let config = HttpBackendConfig::new(test_ca_pem(), "token");
        assert_eq!(config.address, DEFAULT_ADDRESS);
        assert_eq!(config.api_version, "v1");
        assert!(!config.tls_skip_verify);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_config_debug_redacts_token() {
        let config = HttpBackendConfig::new(test_ca_pem(), "s.super-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("bytes PEM"));
    }

    #[test]
    fn test_url_for_uses_version_segment() {
        let config = HttpBackendConfig::new(test_ca_pem(), "token")
            .with_address("https://vault:8200/")
            .with_api_version("v1");
        let backend = HttpBackend::new(config).unwrap();

        assert_eq!(backend.url_for("pki/issue/vault-t1"), "https://vault:8200/v1/pki/issue/vault-t1");
    }

    #[test]
    fn test_missing_ca_file_is_io_error() {
        let err = HttpBackend::from_ca_file("/nonexistent/shared.ca", "token").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_empty_ca_bundle_rejected() {
        let err = HttpBackend::new(HttpBackendConfig::new(b"not a pem".to_vec(), "t")).unwrap_err();
        assert!(matches!(err, Error::Tls(TlsError::EmptyCaBundle)));
    }

    #[tokio::test]
    async fn test_malformed_body_fails_before_network() {
        // Nothing listens on this address; a decode error proves no request was attempted.
        let config = HttpBackendConfig::new(test_ca_pem(), "token").with_address("https://127.0.0.1:1");
        let backend = HttpBackend::new(config).unwrap();

        let err = backend.put("secret/app", Some(b"blah")).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
