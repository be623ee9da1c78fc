//! On-disk layout of the issued shared certificate.
//!
//! ```text
//! <dir>/shared.ca    issuing CA
//! <dir>/shared.crt   leaf certificate
//! <dir>/shared.key   private key
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::Result;
use crate::pki::Cert;

/// Default directory the shared certificate is written to.
pub const DEFAULT_CERT_DIR: &str = "/etc/ssl/certs/puppet-discovery";

pub const CA_FILE_NAME: &str = "shared.ca";
pub const CERT_FILE_NAME: &str = "shared.crt";
pub const KEY_FILE_NAME: &str = "shared.key";

/// Files are world-readable so co-located services can pick them up.
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// Paths of the three certificate files inside one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateFiles {
    pub dir: PathBuf,
    pub ca_path: PathBuf,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl CertificateFiles {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        Self {
            ca_path: dir.join(CA_FILE_NAME),
            cert_path: dir.join(CERT_FILE_NAME),
            key_path: dir.join(KEY_FILE_NAME),
            dir,
        }
    }

    /// Write `cert` as raw PEM, creating the directory (and parents) if needed.
    /// Existing files are replaced.
    pub fn write(&self, cert: &Cert) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        info!(dir = %self.dir.display(), "Writing cert files");

        write_pem(&self.ca_path, cert.ca.as_bytes())?;
        write_pem(&self.cert_path, cert.cert.as_bytes())?;
        write_pem(&self.key_path, cert.private_key.expose_secret().as_bytes())?;
        Ok(())
    }
}

impl Default for CertificateFiles {
    fn default() -> Self {
        Self::new(DEFAULT_CERT_DIR)
    }
}

fn write_pem(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(FILE_MODE))?;
    }

    debug!(path = %path.display(), bytes = contents.len(), "Wrote PEM file");
    Ok(())
}
