use std::sync::Arc;

use uuid::Uuid;

use crate::ca::{CertExtension, CertificateAuthority, SubjectParams};
use crate::config::Settings;
use crate::models::VpnClient;
use crate::store::{NotFoundError, Store};
use crate::utils;

use super::ValidationError;

/// Lifecycle orchestration for VPN client links. The link owns its client
/// certificate: issuance on save, destruction on delete.
#[derive(Clone)]
pub struct VpnClientService {
    store: Arc<dyn Store>,
    authority: Arc<dyn CertificateAuthority>,
    settings: Settings,
}

impl VpnClientService {
    pub fn new(
        store: Arc<dyn Store>,
        authority: Arc<dyn CertificateAuthority>,
        settings: Settings,
    ) -> Self {
        Self {
            store,
            authority,
            settings,
        }
    }

    /// Persist a client link, issuing the client certificate first when
    /// auto_cert is set. Issuance failure fails the save; the store
    /// enforces uniqueness per (config, vpn) pair.
    pub async fn save(&self, client: &mut VpnClient) -> anyhow::Result<()> {
        if client.auto_cert && client.cert.is_none() {
            let cert = self.auto_create_cert(client).await?;
            tracing::info!(
                "issued client certificate \"{}\" for config {}",
                cert.common_name,
                client.config
            );
            client.cert = Some(cert.id);
        }
        self.store.save_vpn_client(client).await
    }

    /// Deletion hook: destroys the owned certificate before removing the
    /// link when auto_cert is set. The certificate belongs to the link,
    /// not to the database relation.
    pub async fn delete(&self, id: Uuid) -> anyhow::Result<()> {
        let client = self
            .store
            .get_vpn_client(id)
            .await?
            .ok_or_else(|| NotFoundError::new("vpn client", id))?;
        if client.auto_cert {
            if let Some(cert) = client.cert {
                self.authority.delete_cert(cert).await?;
                tracing::info!("deleted client certificate for vpn client {}", id);
            }
        }
        self.store.delete_vpn_client(id).await
    }

    /// Issue the client certificate: common name derived from the owning
    /// device, subject copied from the VPN's CA, marked as a client
    /// certificate.
    async fn auto_create_cert(&self, client: &VpnClient) -> anyhow::Result<crate::ca::Cert> {
        let config = self
            .store
            .get_device_config(client.config)
            .await?
            .ok_or_else(|| NotFoundError::new("device config", client.config))?;
        let device = self
            .store
            .get_device(config.device)
            .await?
            .ok_or_else(|| NotFoundError::new("device", config.device))?;
        let vpn = self
            .store
            .get_vpn(client.vpn)
            .await?
            .ok_or_else(|| ValidationError::single("vpn", "the selected VPN does not exist"))?;
        let ca = self
            .authority
            .get_ca(vpn.ca)
            .await?
            .ok_or_else(|| ValidationError::single("ca", "the VPN's CA does not exist"))?;
        let common_name = utils::format_common_name(&self.settings.common_name_format, &device);
        let subject = SubjectParams::from_ca(&ca, &device.name, &common_name);
        self.authority
            .issue(ca.id, subject, CertExtension::client_set())
            .await
    }
}
