//! End-to-end TLS: the HTTP backend against the demo HTTPS server.

mod common;

use std::net::SocketAddr;

use tokio::sync::oneshot;
use vault_client::backend::{HttpBackend, HttpBackendConfig, VaultBackend};
use vault_client::server::{ExampleServer, EXAMPLE_BODY};
use vault_client::storage::CertificateFiles;
use vault_client::Error;

use common::TestPki;

struct RunningServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    _dir: tempfile::TempDir,
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn start_server(pki: &TestPki) -> RunningServer {
    common::install_crypto_provider();

    let dir = tempfile::tempdir().unwrap();
    let files = CertificateFiles::new(dir.path().join("puppet-discovery"));
    files.write(&pki.as_cert()).unwrap();

    let server = ExampleServer::bind("127.0.0.1:0".parse().unwrap(), &files).await.unwrap();
    let addr = server.local_addr().unwrap();
    assert!(server.certificate().issuer.contains("Vault Test Root"));

    let (tx, rx) = oneshot::channel();
    tokio::spawn(server.run_until(async move {
        let _ = rx.await;
    }));

    RunningServer { addr, shutdown: Some(tx), _dir: dir }
}

#[tokio::test]
async fn trusted_ca_completes_request() {
    let pki = TestPki::generate().unwrap();
    let server = start_server(&pki).await;

    let config = HttpBackendConfig::new(pki.ca_pem.clone(), "s.token")
        .with_address(format!("https://127.0.0.1:{}", server.addr.port()));
    let backend = HttpBackend::new(config).unwrap();

    let body = backend.get("anything/at/all").await.unwrap();
    assert_eq!(body, EXAMPLE_BODY.as_bytes());

    let body = backend.list("pki/roles").await.unwrap();
    assert_eq!(body, EXAMPLE_BODY.as_bytes());
}

#[tokio::test]
async fn untrusted_server_certificate_is_transport_error() {
    let pki = TestPki::generate().unwrap();
    let server = start_server(&pki).await;

    let config = HttpBackendConfig::new(TestPki::unrelated_ca_pem().unwrap(), "s.token")
        .with_address(format!("https://127.0.0.1:{}", server.addr.port()));
    let backend = HttpBackend::new(config).unwrap();

    let err = backend.get("secret/app").await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "unexpected error: {:?}", err);
}

#[tokio::test]
async fn skip_verify_accepts_untrusted_certificate() {
    let pki = TestPki::generate().unwrap();
    let server = start_server(&pki).await;

    let config = HttpBackendConfig::new(TestPki::unrelated_ca_pem().unwrap(), "s.token")
        .with_address(format!("https://127.0.0.1:{}", server.addr.port()))
        .with_tls_skip_verify(true);
    let backend = HttpBackend::new(config).unwrap();

    assert_eq!(backend.get("secret/app").await.unwrap(), EXAMPLE_BODY.as_bytes());
}

#[test]
fn empty_ca_bundle_is_rejected() {
    common::install_crypto_provider();
    let err = HttpBackend::new(HttpBackendConfig::new(Vec::new(), "s.token")).unwrap_err();
    assert!(matches!(err, Error::Tls(_)));
}
