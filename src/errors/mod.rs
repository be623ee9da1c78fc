//! # Error Handling
//!
//! Error types for the Vault client, defined with `thiserror`.
//!
//! Transport failures, non-2xx statuses, JSON decode failures and the
//! issuance-specific "missing certificate and key" condition are kept as
//! distinct variants so callers can branch on them.

pub mod tls;

pub use tls::TlsError;

/// Custom result type for Vault client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Vault client
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Connection, TLS handshake or timeout failure while talking to Vault
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A completed response with a status outside `[200, 300)`
    #[error("request to {path} resulted in status: {status}")]
    HttpStatus { path: String, status: u16 },

    /// Malformed JSON in a request body or response body, or a shape mismatch
    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Vault answered successfully but returned no certificate data
    #[error("unable to request a cert from Vault: response carried no certificate and key")]
    MissingCertAndKey,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Certificate material problems
    #[error(transparent)]
    Tls(#[from] TlsError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an HTTP status error for the given request path
    pub fn http_status(path: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus { path: path.into(), status }
    }

    /// Shorthand for a 404 on `path`
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::http_status(path, 404)
    }

    /// Shorthand for a 400 on `path`
    pub fn bad_request(path: impl Into<String>) -> Self {
        Self::http_status(path, 400)
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status carried by this error, if it is a status error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error is a 404 from the backend
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}
