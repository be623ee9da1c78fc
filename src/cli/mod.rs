//! # Command Line Interface
//!
//! `vault-client` fetches the shared certificate from Vault and writes it to
//! the certificate directory. `vault-client serve` additionally starts the
//! demo HTTPS endpoint with the freshly written files.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::backend::{HttpBackend, VaultBackend};
use crate::config::Config;
use crate::observability::{init_logging, log_config_info};
use crate::pki::{issue_certificate, Cert, ServiceIdentity};
use crate::server::ExampleServer;
use crate::storage::CertificateFiles;
use crate::tls::CertificateInfo;

#[derive(Parser, Debug)]
#[command(name = "vault-client")]
#[command(about = "Fetch the shared certificate from Vault and write it to disk")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory the certificate files are written to
    #[arg(long, global = true)]
    pub cert_dir: Option<PathBuf>,

    /// Vault server address override
    #[arg(long, global = true)]
    pub vault_addr: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Fetch the certificate, then serve an example HTTPS app with it
    Serve {
        /// Listen address override
        #[arg(long)]
        addr: Option<SocketAddr>,
    },
}

impl Cli {
    /// Fold command-line overrides into the environment configuration.
    pub fn apply(&self, config: &mut Config) {
        if self.verbose {
            config.observability.log_level = "debug".to_string();
        }
        if let Some(dir) = &self.cert_dir {
            config.cert_dir = dir.clone();
        }
        if let Some(address) = &self.vault_addr {
            config.vault.address = address.clone();
        }
        if let Some(Commands::Serve { addr: Some(addr) }) = &self.command {
            config.serve_addr = *addr;
        }
    }

    pub fn serve(&self) -> bool {
        matches!(self.command, Some(Commands::Serve { .. }))
    }
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    cli.apply(&mut config);

    init_logging(&config.observability)?;
    log_config_info(&config);

    run(&config, cli.serve()).await
}

/// Issue, persist and optionally serve.
pub async fn run(config: &Config, serve: bool) -> anyhow::Result<()> {
    info!("Grabbing shared cert from vault");
    let backend_config =
        config.vault.backend_config().context("Failed to read the Vault CA certificate")?;
    let backend = HttpBackend::new(backend_config).context("Failed to build the Vault client")?;

    let files = CertificateFiles::new(&config.cert_dir);
    fetch_shared_cert(&backend, &config.identity, &files)
        .await
        .context("Failed to obtain the shared certificate")?;

    if serve {
        let server = ExampleServer::bind(config.serve_addr, &files)
            .await
            .context("Failed to start the example server")?;
        server.run().await?;
    }

    Ok(())
}

/// Issue a certificate for `identity` and write it to `files`.
pub async fn fetch_shared_cert<B>(
    backend: &B,
    identity: &ServiceIdentity,
    files: &CertificateFiles,
) -> crate::Result<Cert>
where
    B: VaultBackend + ?Sized,
{
    let cert = issue_certificate(backend, identity).await?;

    match CertificateInfo::from_pem(&cert.cert) {
        Ok(certificate) => info!(
            subject = %certificate.subject,
            issuer = %certificate.issuer,
            expires_at = %certificate.not_after,
            "Issued certificate details"
        ),
        Err(e) => warn!(error = %e, "Could not parse issued certificate for logging"),
    }

    files.write(&cert)?;
    Ok(cert)
}
