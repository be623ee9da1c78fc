use std::{fs, path::Path};

use chrono::{DateTime, Utc};
use rustls::pki_types::{pem::PemObject, CertificateDer, PrivateKeyDer};

use crate::errors::TlsError;

/// Metadata extracted from a leaf certificate for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    pub subject: String,
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl CertificateInfo {
    pub fn from_der(der: &[u8]) -> Result<Self, TlsError> {
        let (_, cert) = x509_parser::parse_x509_certificate(der)
            .map_err(|e| TlsError::CertificateMetadata { reason: e.to_string() })?;

        let validity = cert.validity();
        Ok(Self {
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            not_before: timestamp(validity.not_before.timestamp())?,
            not_after: timestamp(validity.not_after.timestamp())?,
        })
    }

    /// Parse the first certificate of a PEM string.
    pub fn from_pem(pem: &str) -> Result<Self, TlsError> {
        let der = CertificateDer::from_pem_slice(pem.as_bytes())
            .map_err(|e| TlsError::CertificateMetadata { reason: e.to_string() })?;
        Self::from_der(der.as_ref())
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, TlsError> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| TlsError::CertificateMetadata {
        reason: format!("certificate timestamp out of range: {}", secs),
    })
}

/// Build a rustls server configuration from certificate and key files on disk.
pub fn load_server_config(
    cert_path: &Path,
    key_path: &Path,
) -> Result<(rustls::ServerConfig, CertificateInfo), TlsError> {
    let cert_bytes = fs::read(cert_path)
        .map_err(|e| TlsError::CertificateReadError { path: cert_path.to_path_buf(), source: e })?;

    let chain: Vec<CertificateDer<'static>> = CertificateDer::pem_slice_iter(&cert_bytes)
        .map(|result| {
            result.map_err(|err| TlsError::InvalidCertificatePem {
                path: cert_path.to_path_buf(),
                reason: err.to_string(),
            })
        })
        .collect::<Result<_, _>>()?;

    let leaf = chain
        .first()
        .ok_or_else(|| TlsError::EmptyCertificateChain { path: cert_path.to_path_buf() })?;
    let info = CertificateInfo::from_der(leaf.as_ref())?;

    let key_bytes = fs::read(key_path)
        .map_err(|e| TlsError::PrivateKeyReadError { path: key_path.to_path_buf(), source: e })?;
    let private_key = PrivateKeyDer::from_pem_slice(&key_bytes).map_err(|err| {
        TlsError::InvalidPrivateKey { path: key_path.to_path_buf(), reason: err.to_string() }
    })?;

    let provider = rustls::crypto::ring::default_provider();
    let server_config = rustls::ServerConfig::builder_with_provider(provider.into())
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(chain, private_key)?;

    Ok((server_config, info))
}
