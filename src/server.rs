//! Demo HTTPS endpoint served with the freshly written shared certificate.
//!
//! Every path answers with the same plaintext body; the point is only to show
//! the Vault-issued key material terminating TLS.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{http::header, response::IntoResponse, serve::Listener, Router};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Duration;
use tokio_rustls::{server::TlsStream, TlsAcceptor};
use tracing::{error, info, warn};

use crate::errors::{Error, Result};
use crate::storage::CertificateFiles;
use crate::tls::{load_server_config, CertificateInfo};

/// Address the demo endpoint listens on by default.
pub const DEFAULT_SERVE_ADDR: &str = "0.0.0.0:9443";

pub const EXAMPLE_BODY: &str = "This is an example served up with a vault-backed shared cert which was written to /etc/ssl/certs/puppet-discovery.\n";

/// Router answering every path with [`EXAMPLE_BODY`].
pub fn router() -> Router {
    Router::new().fallback(example)
}

async fn example() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], EXAMPLE_BODY)
}

/// A bound, TLS-configured demo server that has not started accepting yet.
pub struct ExampleServer {
    listener: TcpListener,
    acceptor: TlsAcceptor,
    certificate: CertificateInfo,
}

impl ExampleServer {
    /// Bind `addr` and load the certificate and key from `files`.
    pub async fn bind(addr: SocketAddr, files: &CertificateFiles) -> Result<Self> {
        let (server_config, certificate) =
            load_server_config(&files.cert_path, &files.key_path)?;

        let listener = TcpListener::bind(addr).await.inspect_err(|e| {
            error!(address = %addr, error = %e, "Failed to bind example server");
        })?;

        Ok(Self { listener, acceptor: TlsAcceptor::from(Arc::new(server_config)), certificate })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn certificate(&self) -> &CertificateInfo {
        &self.certificate
    }

    /// Serve until Ctrl+C.
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Example server shutdown listener failed");
            }
        })
        .await
    }

    /// Serve until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        info!(
            address = %addr,
            subject = %self.certificate.subject,
            expires_at = %self.certificate.not_after,
            "Serving an example app with the vault-backed shared cert"
        );

        let tls_listener = TlsListener { listener: self.listener, acceptor: self.acceptor };
        axum::serve(tls_listener, router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| Error::internal(format!("Example server error: {}", e)))?;

        info!("Example server shutdown completed");
        Ok(())
    }
}

struct TlsListener {
    listener: TcpListener,
    acceptor: TlsAcceptor,
}

impl Listener for TlsListener {
    type Io = TlsStream<TcpStream>;
    type Addr = SocketAddr;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => match self.acceptor.accept(stream).await {
                    Ok(tls_stream) => return (tls_stream, addr),
                    Err(err) => {
                        warn!(error = %err, %addr, "TLS handshake failed");
                        continue;
                    }
                },
                Err(err) => {
                    if is_connection_error(&err) {
                        continue;
                    }
                    error!("HTTPS accept error: {err}");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    fn local_addr(&self) -> std::io::Result<Self::Addr> {
        self.listener.local_addr()
    }
}

fn is_connection_error(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::ConnectionReset
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_without_cert_files_fails() {
        let dir = tempfile::tempdir().unwrap();
        let files = CertificateFiles::new(dir.path());

        let result = ExampleServer::bind("127.0.0.1:0".parse().unwrap(), &files).await;
        assert!(matches!(result, Err(Error::Tls(_))));
    }

    #[tokio::test]
    async fn test_bind_on_taken_port_is_io_error() {
        let generated = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let files = CertificateFiles::new(dir.path());
        files
            .write(&crate::pki::Cert {
                ca: generated.cert.pem(),
                cert: generated.cert.pem(),
                private_key: crate::types::SecretString::new(generated.key_pair.serialize_pem()),
            })
            .unwrap();

        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let result = ExampleServer::bind(addr, &files).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_example_body_mentions_cert_dir() {
        assert!(EXAMPLE_BODY.contains(crate::storage::DEFAULT_CERT_DIR));
        assert!(EXAMPLE_BODY.ends_with('\n'));
    }
}
