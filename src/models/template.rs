use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::Settings;
use crate::utils;

/// Template type, determines which features are available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    Generic,
    Vpn,
}

/// Sharing flag, controls whether a template is kept private, published
/// for import by other installations, or itself imported from a remote URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharingFlag {
    Private,
    Public,
    SharedSecret,
    Import,
}

/// Template represents a reusable configuration fragment that is
/// composited onto device configurations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    /// Share key, a stable identifier for cross-installation import
    pub key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub template_type: TemplateType,
    pub flag: SharingFlag,
    /// Whether new device configurations enable this template by default
    pub default: bool,
    /// Whether x509 client certificates are automatically managed for each
    /// configuration using this template (VPN type only)
    pub auto_cert: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Internal notes for administrators
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Default values for the variables used by this template, in
    /// administrator-defined order
    #[serde(default)]
    pub variable: Map<String, Value>,
    /// Configuration tree; an empty object or null means unset
    #[serde(default)]
    pub config: Value,
    /// Name of the configuration rendering backend
    pub backend: String,
    /// Referenced VPN server (required when type is vpn)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpn: Option<Uuid>,
    /// Source URL (required when flag is import)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Template {
    /// Create a generic private template with defaults taken from settings
    pub fn new(name: impl Into<String>, backend: impl Into<String>, settings: &Settings) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            key: utils::random_key(),
            name: name.into(),
            template_type: TemplateType::Generic,
            flag: SharingFlag::Private,
            default: false,
            auto_cert: settings.auto_cert,
            description: None,
            notes: None,
            variable: Map::new(),
            config: Value::Null,
            backend: backend.into(),
            vpn: None,
            url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether a configuration tree has been set
    pub fn has_config(&self) -> bool {
        match &self.config {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            _ => true,
        }
    }

    /// Produce the shareable document consumed by a peer's import flow.
    /// The local identifier is advisory for the importer and never adopted.
    pub fn export(&self) -> RemoteTemplate {
        RemoteTemplate {
            id: Some(self.id),
            template_type: self.template_type,
            config: self.config.clone(),
            url: self.url.clone(),
            variable: self.variable.clone(),
            vpn: self.vpn,
            auto_cert: self.auto_cert,
            backend: self.backend.clone(),
        }
    }
}

/// Remote template document, fetched over HTTP when flag is import.
/// Parsed strictly as structured data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteTemplate {
    /// Remote identifier, advisory only; the local id and key are preserved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(rename = "type")]
    pub template_type: TemplateType,
    #[serde(default)]
    pub config: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub variable: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpn: Option<Uuid>,
    #[serde(default)]
    pub auto_cert: bool,
    pub backend: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_template_defaults() {
        let settings = Settings::default();
        let t = Template::new("base wifi", "openvpn", &settings);
        assert_eq!(t.template_type, TemplateType::Generic);
        assert_eq!(t.flag, SharingFlag::Private);
        assert!(t.auto_cert);
        assert!(!t.has_config());
        assert!(utils::is_valid_key(&t.key));
    }

    #[test]
    fn test_has_config() {
        let settings = Settings::default();
        let mut t = Template::new("t", "openvpn", &settings);
        assert!(!t.has_config());
        t.config = serde_json::json!({});
        assert!(!t.has_config());
        t.config = serde_json::json!({"general": {"hostname": "x"}});
        assert!(t.has_config());
    }

    #[test]
    fn test_export_round_trips_through_import_document() {
        let settings = Settings::default();
        let mut t = Template::new("shared", "openvpn", &settings);
        t.config = serde_json::json!({"general": {"hostname": "x"}});
        let doc = serde_json::to_string(&t.export()).unwrap();
        let parsed: RemoteTemplate = serde_json::from_str(&doc).unwrap();
        assert_eq!(parsed.id, Some(t.id));
        assert_eq!(parsed.config, t.config);
        assert_eq!(parsed.backend, t.backend);
    }
}
