//! Entity store boundary.
//!
//! Persistence and query execution are external concerns; services talk
//! to the store only through the [`Store`] trait. [`MemoryStore`] is the
//! in-process reference implementation used by embedders and tests.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{ConfigStatus, Device, DeviceConfig, Template, Vpn, VpnClient};

/// Typed error for "entity not found" — enables reliable downcast
/// in callers instead of fragile string matching.
#[derive(Debug)]
pub struct NotFoundError {
    pub entity: String,
    pub id: String,
}

impl NotFoundError {
    pub fn new(entity: &str, id: impl ToString) -> Self {
        Self {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} not found: {}", self.entity, self.id)
    }
}

impl std::error::Error for NotFoundError {}

/// Entity store contract.
///
/// `save_*` operations upsert; the caller owns change detection. Row-level
/// atomicity and transaction isolation are the implementation's concern —
/// this subsystem does not serialize concurrent edits itself.
#[async_trait]
pub trait Store: Send + Sync {
    // ---- templates ----

    async fn get_template(&self, id: Uuid) -> anyhow::Result<Option<Template>>;

    async fn get_template_by_key(&self, key: &str) -> anyhow::Result<Option<Template>>;

    async fn list_templates(&self) -> anyhow::Result<Vec<Template>>;

    async fn save_template(&self, template: &Template) -> anyhow::Result<()>;

    async fn delete_template(&self, id: Uuid) -> anyhow::Result<()>;

    // ---- VPN servers ----

    async fn get_vpn(&self, id: Uuid) -> anyhow::Result<Option<Vpn>>;

    async fn list_vpns(&self) -> anyhow::Result<Vec<Vpn>>;

    async fn save_vpn(&self, vpn: &Vpn) -> anyhow::Result<()>;

    async fn delete_vpn(&self, id: Uuid) -> anyhow::Result<()>;

    // ---- VPN client links ----

    async fn get_vpn_client(&self, id: Uuid) -> anyhow::Result<Option<VpnClient>>;

    /// Look up the link for a (device configuration, VPN) pair
    async fn find_vpn_client(&self, config: Uuid, vpn: Uuid) -> anyhow::Result<Option<VpnClient>>;

    /// Upsert a link; fails when another link exists for the same
    /// (config, vpn) pair
    async fn save_vpn_client(&self, client: &VpnClient) -> anyhow::Result<()>;

    async fn delete_vpn_client(&self, id: Uuid) -> anyhow::Result<()>;

    // ---- devices and their configurations ----

    async fn get_device(&self, id: Uuid) -> anyhow::Result<Option<Device>>;

    async fn save_device(&self, device: &Device) -> anyhow::Result<()>;

    async fn get_device_config(&self, id: Uuid) -> anyhow::Result<Option<DeviceConfig>>;

    async fn save_device_config(&self, config: &DeviceConfig) -> anyhow::Result<()>;

    /// Device configurations that composite the given template
    async fn configs_using_template(&self, template: Uuid) -> anyhow::Result<Vec<Uuid>>;

    /// Device configurations linked to the given VPN through client links
    async fn configs_using_vpn(&self, vpn: Uuid) -> anyhow::Result<Vec<Uuid>>;

    /// Bulk status update; returns the number of configurations touched
    async fn set_config_status(&self, ids: &[Uuid], status: ConfigStatus) -> anyhow::Result<u64>;
}
