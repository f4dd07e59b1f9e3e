use std::sync::Arc;

use chrono::Utc;

use crate::backend::BackendRegistry;
use crate::config::Settings;
use crate::models::{RemoteTemplate, SharingFlag, Template, TemplateType};
use crate::store::{NotFoundError, Store};
use crate::utils;

use super::{Propagator, ValidationError};

/// Lifecycle orchestration for configuration templates: invariant
/// enforcement, VPN auto-derivation, remote import, change propagation.
#[derive(Clone)]
pub struct TemplateService {
    store: Arc<dyn Store>,
    registry: Arc<BackendRegistry>,
    settings: Settings,
    propagator: Propagator,
    http: reqwest::Client,
}

impl TemplateService {
    pub fn new(
        store: Arc<dyn Store>,
        registry: Arc<BackendRegistry>,
        settings: Settings,
        propagator: Propagator,
    ) -> Self {
        Self {
            store,
            registry,
            settings,
            propagator,
            http: reqwest::Client::new(),
        }
    }

    /// Default auto_cert value for new templates, from settings
    pub fn default_auto_cert(&self) -> bool {
        self.settings.auto_cert
    }

    /// Validate and normalize a template in place.
    ///
    /// Enforces the type/flag invariants, auto-derives the configuration
    /// tree from the referenced VPN when necessary, and runs the import
    /// flow for import-flagged templates. Violations are collected per
    /// field and returned together.
    pub async fn clean(&self, template: &mut Template) -> anyhow::Result<()> {
        let mut errors = ValidationError::new();
        if template.template_type == TemplateType::Vpn {
            if template.vpn.is_none() {
                errors.push("vpn", "a VPN must be selected when template type is \"vpn\"");
            }
        } else {
            // VPN specific fields are forced off rather than rejected
            template.vpn = None;
            template.auto_cert = false;
        }
        if template.template_type == TemplateType::Vpn && !template.has_config() {
            if let Some(vpn_id) = template.vpn {
                match self.store.get_vpn(vpn_id).await? {
                    Some(vpn) => {
                        template.config = vpn.auto_client(template.auto_cert, &self.registry);
                    }
                    None => errors.push("vpn", "the selected VPN does not exist"),
                }
            }
        }
        if !utils::is_valid_key(&template.key) {
            errors.push("key", "key must contain up to 64 alphanumeric characters");
        }
        if matches!(template.flag, SharingFlag::Public | SharingFlag::SharedSecret) {
            if template.description.as_deref().unwrap_or("").is_empty() {
                errors.push("description", "please enter a public description of the shared template");
            }
            if template.notes.as_deref().unwrap_or("").is_empty() {
                errors.push("notes", "please enter administrator notes for the shared template");
            }
            if template.variable.is_empty() {
                errors.push("variable", "please enter default values for the template variables");
            }
        }
        if template.flag == SharingFlag::Import {
            match template.url.clone() {
                None => errors.push("url", "please enter the URL to import the template from"),
                Some(url) => match self.fetch_remote(&url).await {
                    Ok(remote) => apply_remote(template, remote),
                    Err(e) => {
                        tracing::warn!("template import from {} failed: {}", url, e);
                        errors.push("url", "the URL does not resolve to a valid template document");
                    }
                },
            }
        }
        errors.into_result()
    }

    /// Validate and persist a template.
    ///
    /// When the backend or configuration tree differs from the persisted
    /// row, every device configuration using this template is marked
    /// modified through the propagator. Creation never counts as a change.
    pub async fn save(&self, template: &mut Template) -> anyhow::Result<()> {
        self.clean(template).await?;
        let changed = match self.store.get_template(template.id).await? {
            Some(current) => {
                current.backend != template.backend || current.config != template.config
            }
            None => false,
        };
        template.updated_at = Utc::now();
        self.store.save_template(template).await?;
        if changed {
            self.propagator.template_modified(template.id).await?;
        }
        Ok(())
    }

    /// Delete a template
    pub async fn delete(&self, id: uuid::Uuid) -> anyhow::Result<()> {
        if self.store.get_template(id).await?.is_none() {
            return Err(NotFoundError::new("template", id).into());
        }
        self.store.delete_template(id).await
    }

    /// Fetch a remote template document as plain structured JSON
    async fn fetch_remote(&self, url: &str) -> anyhow::Result<RemoteTemplate> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.json::<RemoteTemplate>().await?)
    }
}

/// Overwrite shareable fields from a remote document. The local identifier
/// and share key are preserved: adopting the remote identity would let a
/// remote document collide with existing local entities.
fn apply_remote(template: &mut Template, remote: RemoteTemplate) {
    template.template_type = remote.template_type;
    template.config = remote.config;
    template.variable = remote.variable;
    template.vpn = remote.vpn;
    template.auto_cert = remote.auto_cert;
    template.backend = remote.backend;
    if let Some(url) = remote.url {
        template.url = Some(url);
    }
}
