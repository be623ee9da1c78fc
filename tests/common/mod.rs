#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr};

use anyhow::Context;
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, IsCa, KeyPair, KeyUsagePurpose,
    SanType,
};
use vault_client::pki::Cert;
use vault_client::SecretString;

pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// A throwaway CA with one localhost leaf signed by it.
pub struct TestPki {
    pub ca_pem: String,
    pub leaf_pem: String,
    pub leaf_key_pem: String,
}

impl TestPki {
    pub fn generate() -> anyhow::Result<Self> {
        let (ca, ca_key) = generate_ca("Vault Test Root")?;

        let mut params = CertificateParams::new(vec!["localhost".to_string()])
            .context("build leaf params")?;
        params.distinguished_name.push(DnType::CommonName, "vault.test");
        params.subject_alt_names.push(SanType::IpAddress(IpAddr::V4(Ipv4Addr::LOCALHOST)));

        let leaf_key = KeyPair::generate().context("generate leaf key")?;
        let leaf = params.signed_by(&leaf_key, &ca, &ca_key).context("sign leaf")?;

        Ok(Self { ca_pem: ca.pem(), leaf_pem: leaf.pem(), leaf_key_pem: leaf_key.serialize_pem() })
    }

    /// PEM of an unrelated CA that did not sign the leaf.
    pub fn unrelated_ca_pem() -> anyhow::Result<String> {
        let (ca, _) = generate_ca("Unrelated Root")?;
        Ok(ca.pem())
    }

    /// The leaf as an issuance result.
    pub fn as_cert(&self) -> Cert {
        Cert {
            ca: self.ca_pem.clone(),
            cert: self.leaf_pem.clone(),
            private_key: SecretString::new(self.leaf_key_pem.clone()),
        }
    }
}

fn generate_ca(common_name: &str) -> anyhow::Result<(Certificate, KeyPair)> {
    let mut params = CertificateParams::new(Vec::<String>::new()).context("build CA params")?;
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.distinguished_name.push(DnType::CommonName, common_name);
    params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];

    let key = KeyPair::generate().context("generate CA key")?;
    let cert = params.self_signed(&key).context("self-sign CA")?;
    Ok((cert, key))
}
