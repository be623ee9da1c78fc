use std::path::PathBuf;

use thiserror::Error;

/// TLS-specific error variants surfaced while loading CA and server certificate material.
#[derive(Debug, Error)]
pub enum TlsError {
    /// The CA bundle handed to the Vault client contained no certificates.
    #[error("CA certificate bundle does not contain any certificates")]
    EmptyCaBundle,

    /// A certificate inside the CA bundle could not be decoded.
    #[error("CA certificate bundle is not a valid PEM: {reason}")]
    InvalidCaPem { reason: String },

    /// The certificate file could not be read.
    #[error("Failed to read certificate at {path}: {source}")]
    CertificateReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The private key file could not be read.
    #[error("Failed to read private key at {path}: {source}")]
    PrivateKeyReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No certificates were found in the supplied PEM file.
    #[error("Certificate file {path} does not contain any certificates")]
    EmptyCertificateChain { path: PathBuf },

    /// The certificate PEM contents were invalid or unreadable.
    #[error("Certificate file {path} is not a valid PEM: {reason}")]
    InvalidCertificatePem { path: PathBuf, reason: String },

    /// The private key PEM contents were invalid or unsupported.
    #[error("Private key file {path} does not contain a supported private key: {reason}")]
    InvalidPrivateKey { path: PathBuf, reason: String },

    /// The certificate DER could not be parsed for metadata.
    #[error("Failed to extract certificate metadata: {reason}")]
    CertificateMetadata { reason: String },

    /// rustls rejected the certificate/key pair or protocol configuration.
    #[error("TLS configuration rejected: {0}")]
    Rustls(#[from] rustls::Error),
}
