use std::collections::HashMap;

use anyhow::bail;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{ConfigStatus, Device, DeviceConfig, Template, Vpn, VpnClient};

use super::{NotFoundError, Store};

/// In-memory entity store.
///
/// Reference implementation of [`Store`] backed by tokio RwLock maps.
/// Suitable for embedding and tests; offers per-operation atomicity only.
#[derive(Default)]
pub struct MemoryStore {
    templates: RwLock<HashMap<Uuid, Template>>,
    vpns: RwLock<HashMap<Uuid, Vpn>>,
    vpn_clients: RwLock<HashMap<Uuid, VpnClient>>,
    devices: RwLock<HashMap<Uuid, Device>>,
    device_configs: RwLock<HashMap<Uuid, DeviceConfig>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_template(&self, id: Uuid) -> anyhow::Result<Option<Template>> {
        Ok(self.templates.read().await.get(&id).cloned())
    }

    async fn get_template_by_key(&self, key: &str) -> anyhow::Result<Option<Template>> {
        Ok(self
            .templates
            .read()
            .await
            .values()
            .find(|t| t.key == key)
            .cloned())
    }

    async fn list_templates(&self) -> anyhow::Result<Vec<Template>> {
        let mut templates: Vec<Template> = self.templates.read().await.values().cloned().collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }

    async fn save_template(&self, template: &Template) -> anyhow::Result<()> {
        let mut templates = self.templates.write().await;
        if templates
            .values()
            .any(|t| t.key == template.key && t.id != template.id)
        {
            bail!("template with key {} already exists", template.key);
        }
        templates.insert(template.id, template.clone());
        Ok(())
    }

    async fn delete_template(&self, id: Uuid) -> anyhow::Result<()> {
        if self.templates.write().await.remove(&id).is_none() {
            return Err(NotFoundError::new("template", id).into());
        }
        Ok(())
    }

    async fn get_vpn(&self, id: Uuid) -> anyhow::Result<Option<Vpn>> {
        Ok(self.vpns.read().await.get(&id).cloned())
    }

    async fn list_vpns(&self) -> anyhow::Result<Vec<Vpn>> {
        let mut vpns: Vec<Vpn> = self.vpns.read().await.values().cloned().collect();
        vpns.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(vpns)
    }

    async fn save_vpn(&self, vpn: &Vpn) -> anyhow::Result<()> {
        self.vpns.write().await.insert(vpn.id, vpn.clone());
        Ok(())
    }

    async fn delete_vpn(&self, id: Uuid) -> anyhow::Result<()> {
        if self.vpns.write().await.remove(&id).is_none() {
            return Err(NotFoundError::new("vpn", id).into());
        }
        Ok(())
    }

    async fn get_vpn_client(&self, id: Uuid) -> anyhow::Result<Option<VpnClient>> {
        Ok(self.vpn_clients.read().await.get(&id).cloned())
    }

    async fn find_vpn_client(&self, config: Uuid, vpn: Uuid) -> anyhow::Result<Option<VpnClient>> {
        Ok(self
            .vpn_clients
            .read()
            .await
            .values()
            .find(|c| c.config == config && c.vpn == vpn)
            .cloned())
    }

    async fn save_vpn_client(&self, client: &VpnClient) -> anyhow::Result<()> {
        let mut clients = self.vpn_clients.write().await;
        if clients
            .values()
            .any(|c| c.config == client.config && c.vpn == client.vpn && c.id != client.id)
        {
            bail!(
                "vpn client already exists for config {} and vpn {}",
                client.config,
                client.vpn
            );
        }
        clients.insert(client.id, client.clone());
        Ok(())
    }

    async fn delete_vpn_client(&self, id: Uuid) -> anyhow::Result<()> {
        if self.vpn_clients.write().await.remove(&id).is_none() {
            return Err(NotFoundError::new("vpn client", id).into());
        }
        Ok(())
    }

    async fn get_device(&self, id: Uuid) -> anyhow::Result<Option<Device>> {
        Ok(self.devices.read().await.get(&id).cloned())
    }

    async fn save_device(&self, device: &Device) -> anyhow::Result<()> {
        self.devices.write().await.insert(device.id, device.clone());
        Ok(())
    }

    async fn get_device_config(&self, id: Uuid) -> anyhow::Result<Option<DeviceConfig>> {
        Ok(self.device_configs.read().await.get(&id).cloned())
    }

    async fn save_device_config(&self, config: &DeviceConfig) -> anyhow::Result<()> {
        self.device_configs
            .write()
            .await
            .insert(config.id, config.clone());
        Ok(())
    }

    async fn configs_using_template(&self, template: Uuid) -> anyhow::Result<Vec<Uuid>> {
        Ok(self
            .device_configs
            .read()
            .await
            .values()
            .filter(|c| c.templates.contains(&template))
            .map(|c| c.id)
            .collect())
    }

    async fn configs_using_vpn(&self, vpn: Uuid) -> anyhow::Result<Vec<Uuid>> {
        Ok(self
            .vpn_clients
            .read()
            .await
            .values()
            .filter(|c| c.vpn == vpn)
            .map(|c| c.config)
            .collect())
    }

    async fn set_config_status(&self, ids: &[Uuid], status: ConfigStatus) -> anyhow::Result<u64> {
        let mut configs = self.device_configs.write().await;
        let mut touched = 0;
        for id in ids {
            if let Some(config) = configs.get_mut(id) {
                config.status = status;
                config.updated_at = chrono::Utc::now();
                touched += 1;
            }
        }
        Ok(touched)
    }
}
