use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};

use crate::ca::{CertExtension, CertificateAuthority, SubjectParams};
use crate::config::Settings;
use crate::models::Vpn;
use crate::store::Store;
use crate::utils;

use super::{Propagator, ValidationError};

/// Lifecycle orchestration for VPN server definitions: validation,
/// certificate and DH parameter auto-creation, change propagation.
#[derive(Clone)]
pub struct VpnService {
    store: Arc<dyn Store>,
    authority: Arc<dyn CertificateAuthority>,
    settings: Settings,
    propagator: Propagator,
}

impl VpnService {
    pub fn new(
        store: Arc<dyn Store>,
        authority: Arc<dyn CertificateAuthority>,
        settings: Settings,
        propagator: Propagator,
    ) -> Self {
        Self {
            store,
            authority,
            settings,
            propagator,
        }
    }

    /// Validate a VPN definition: the CA must exist and a set certificate
    /// must have been issued by that CA.
    pub async fn validate(&self, vpn: &Vpn) -> anyhow::Result<()> {
        let mut errors = ValidationError::new();
        if self.authority.get_ca(vpn.ca).await?.is_none() {
            errors.push("ca", "the selected CA does not exist");
        }
        if let Some(cert_id) = vpn.cert {
            match self.authority.get_cert(cert_id).await? {
                None => errors.push("cert", "the selected certificate does not exist"),
                Some(cert) if cert.ca != vpn.ca => {
                    errors.push("cert", "the selected certificate must match the selected CA");
                }
                Some(_) => {}
            }
        }
        errors.into_result()
    }

    /// Validate and persist a VPN definition.
    ///
    /// On first save a missing server certificate and missing DH parameters
    /// are created through the CA service; any creation failure aborts the
    /// save before the row is persisted. When the backend or configuration
    /// tree changed against the persisted row, the change is propagated to
    /// every linked device configuration.
    pub async fn save(&self, vpn: &mut Vpn) -> anyhow::Result<()> {
        self.validate(vpn).await?;
        if vpn.cert.is_none() {
            let cert = self.auto_create_cert(vpn).await?;
            tracing::info!(
                "issued server certificate \"{}\" for vpn {}",
                cert.common_name,
                vpn.name
            );
            vpn.cert = Some(cert.id);
        }
        if vpn.dh.is_empty() {
            vpn.dh = self.authority.dhparam(self.settings.dh_key_length).await?;
            tracing::info!(
                "generated {}-bit dh parameters for vpn {}",
                self.settings.dh_key_length,
                vpn.name
            );
        }
        let changed = match self.store.get_vpn(vpn.id).await? {
            Some(current) => current.backend != vpn.backend || current.config != vpn.config,
            None => false,
        };
        vpn.updated_at = Utc::now();
        self.store.save_vpn(vpn).await?;
        if changed {
            self.propagator.vpn_modified(vpn.id).await?;
        }
        Ok(())
    }

    /// Issue the server certificate: subject copied from the CA, common
    /// name slugified from the VPN name, marked as a server certificate.
    async fn auto_create_cert(&self, vpn: &Vpn) -> anyhow::Result<crate::ca::Cert> {
        let ca = self
            .authority
            .get_ca(vpn.ca)
            .await?
            .ok_or_else(|| ValidationError::single("ca", "the selected CA does not exist"))?;
        let subject = SubjectParams::from_ca(&ca, &vpn.name, &utils::slugify(&vpn.name));
        self.authority
            .issue(ca.id, subject, CertExtension::server_set())
            .await
    }

    /// Concrete values for the context variables a VPN exposes: CA
    /// certificate, server certificate and key, DH parameters. Entries
    /// whose material cannot be resolved are omitted.
    pub async fn render_context(&self, vpn: &Vpn) -> anyhow::Result<Map<String, Value>> {
        let mut context = Map::new();
        if let Some(ca) = self.authority.get_ca(vpn.ca).await? {
            context.insert("ca".to_string(), Value::String(ca.certificate));
        }
        if let Some(cert_id) = vpn.cert {
            if let Some(cert) = self.authority.get_cert(cert_id).await? {
                context.insert("cert".to_string(), Value::String(cert.certificate));
                context.insert("key".to_string(), Value::String(cert.private_key));
            }
        }
        if !vpn.dh.is_empty() {
            context.insert("dh".to_string(), Value::String(vpn.dh.clone()));
        }
        Ok(context)
    }
}
