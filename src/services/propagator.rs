use std::sync::Arc;

use uuid::Uuid;

use crate::models::ConfigStatus;
use crate::store::Store;

/// Hook through which affected device configurations are told that their
/// composited configuration changed. Fire-and-forget: the propagator never
/// waits for acknowledgment, device agents pick the status up on their own.
pub trait ConfigNotifier: Send + Sync {
    fn config_modified(&self, config: Uuid);
}

/// Notifier that only records the event in the log
pub struct LogNotifier;

impl ConfigNotifier for LogNotifier {
    fn config_modified(&self, config: Uuid) {
        tracing::debug!("config {} modified", config);
    }
}

/// Marks every device configuration referencing a changed template or VPN
/// as modified and signals each one. Invoked synchronously from the entity
/// save paths. Idempotent: re-marking an already modified configuration is
/// harmless.
#[derive(Clone)]
pub struct Propagator {
    store: Arc<dyn Store>,
    notifier: Arc<dyn ConfigNotifier>,
}

impl Propagator {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn ConfigNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Propagate a template change to every configuration using it
    pub async fn template_modified(&self, template: Uuid) -> anyhow::Result<()> {
        let configs = self.store.configs_using_template(template).await?;
        tracing::info!(
            "template {} changed, marking {} config(s) modified",
            template,
            configs.len()
        );
        self.mark_modified(&configs).await
    }

    /// Propagate a VPN change to every configuration linked to it
    pub async fn vpn_modified(&self, vpn: Uuid) -> anyhow::Result<()> {
        let configs = self.store.configs_using_vpn(vpn).await?;
        tracing::info!(
            "vpn {} changed, marking {} config(s) modified",
            vpn,
            configs.len()
        );
        self.mark_modified(&configs).await
    }

    async fn mark_modified(&self, configs: &[Uuid]) -> anyhow::Result<()> {
        if configs.is_empty() {
            return Ok(());
        }
        self.store
            .set_config_status(configs, ConfigStatus::Modified)
            .await?;
        for config in configs {
            self.notifier.config_modified(*config);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::models::{DeviceConfig, Template};
    use crate::store::MemoryStore;
    use crate::testing::RecordingNotifier;

    async fn seed(store: &MemoryStore, template: Uuid, count: usize) -> Vec<Uuid> {
        let mut ids = Vec::new();
        for _ in 0..count {
            let mut config = DeviceConfig::new(Uuid::new_v4());
            config.status = crate::models::ConfigStatus::Applied;
            config.templates.push(template);
            store.save_device_config(&config).await.unwrap();
            ids.push(config.id);
        }
        ids
    }

    #[tokio::test]
    async fn test_marks_configs_modified_and_notifies() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let propagator = Propagator::new(store.clone(), notifier.clone());

        let template = Template::new("t", "openvpn", &Settings::default());
        store.save_template(&template).await.unwrap();
        let affected = seed(&store, template.id, 2).await;

        propagator.template_modified(template.id).await.unwrap();

        for id in &affected {
            let config = store.get_device_config(*id).await.unwrap().unwrap();
            assert_eq!(config.status, ConfigStatus::Modified);
        }
        assert_eq!(notifier.seen().len(), 2);
    }

    #[tokio::test]
    async fn test_propagation_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let propagator = Propagator::new(store.clone(), notifier.clone());

        let template = Template::new("t", "openvpn", &Settings::default());
        store.save_template(&template).await.unwrap();
        let affected = seed(&store, template.id, 3).await;

        propagator.template_modified(template.id).await.unwrap();
        propagator.template_modified(template.id).await.unwrap();

        for id in &affected {
            let config = store.get_device_config(*id).await.unwrap().unwrap();
            assert_eq!(config.status, ConfigStatus::Modified);
        }
        // the notification itself is sent once per propagation and must be
        // safe to receive twice
        assert_eq!(notifier.seen().len(), 6);
    }

    #[tokio::test]
    async fn test_no_affected_configs_is_a_noop() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let propagator = Propagator::new(store.clone(), notifier.clone());
        propagator.template_modified(Uuid::new_v4()).await.unwrap();
        assert!(notifier.seen().is_empty());
    }
}
