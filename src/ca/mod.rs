//! Boundary to the external certificate authority service.
//!
//! The CA service performs the actual cryptographic operations (key
//! generation, signing, DH parameter generation); this crate only
//! orchestrates when certificates are issued and destroyed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A certificate authority record as exposed by the CA service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ca {
    pub id: Uuid,
    pub name: String,
    pub key_length: u32,
    /// Digest algorithm, e.g. "sha256"
    pub digest: String,
    pub country_code: String,
    pub state: String,
    pub city: String,
    pub organization_name: String,
    pub email: String,
    /// CA certificate in PEM format
    pub certificate: String,
}

/// An issued x509 certificate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cert {
    pub id: Uuid,
    /// Issuing certificate authority
    pub ca: Uuid,
    pub name: String,
    pub common_name: String,
    /// Certificate in PEM format
    pub certificate: String,
    /// Private key in PEM format
    pub private_key: String,
}

/// Subject parameters for certificate issuance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectParams {
    pub name: String,
    pub common_name: String,
    pub key_length: u32,
    pub digest: String,
    pub country_code: String,
    pub state: String,
    pub city: String,
    pub organization_name: String,
    pub email: String,
}

impl SubjectParams {
    /// Build subject parameters by copying issuance fields from a CA
    pub fn from_ca(ca: &Ca, name: &str, common_name: &str) -> Self {
        Self {
            name: name.to_string(),
            common_name: common_name.to_string(),
            key_length: ca.key_length,
            digest: ca.digest.clone(),
            country_code: ca.country_code.clone(),
            state: ca.state.clone(),
            city: ca.city.clone(),
            organization_name: ca.organization_name.clone(),
            email: ca.email.clone(),
        }
    }
}

/// x509 extension attached to an issued certificate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertExtension {
    pub name: String,
    pub value: String,
    pub critical: bool,
}

impl CertExtension {
    fn ns_cert_type(value: &str) -> Self {
        Self {
            name: "nsCertType".to_string(),
            value: value.to_string(),
            critical: false,
        }
    }

    /// Extensions marking a VPN server certificate
    pub fn server_set() -> Vec<CertExtension> {
        vec![Self::ns_cert_type("server")]
    }

    /// Extensions marking a VPN client certificate
    pub fn client_set() -> Vec<CertExtension> {
        vec![Self::ns_cert_type("client")]
    }
}

/// Typed error for certificate or DH parameter generation failures.
/// Aborts the triggering save; never retried automatically.
#[derive(Debug)]
pub struct IssuanceError {
    pub reason: String,
}

impl IssuanceError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for IssuanceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "certificate issuance failed: {}", self.reason)
    }
}

impl std::error::Error for IssuanceError {}

/// Contract with the external certificate authority service.
///
/// Issuance and DH generation are potentially slow blocking operations on
/// the service side; callers run them inline within the triggering save.
#[async_trait]
pub trait CertificateAuthority: Send + Sync {
    async fn get_ca(&self, id: Uuid) -> anyhow::Result<Option<Ca>>;

    async fn get_cert(&self, id: Uuid) -> anyhow::Result<Option<Cert>>;

    /// Issue and persist a certificate signed by the given CA.
    /// Fails with an [`IssuanceError`] inside the anyhow chain.
    async fn issue(
        &self,
        ca: Uuid,
        subject: SubjectParams,
        extensions: Vec<CertExtension>,
    ) -> anyhow::Result<Cert>;

    /// Destroy an issued certificate
    async fn delete_cert(&self, id: Uuid) -> anyhow::Result<()>;

    /// Generate Diffie-Hellman parameters of the given key length in PEM format
    async fn dhparam(&self, length: u32) -> anyhow::Result<String>;
}
