use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::backend::BackendRegistry;

/// Names of the context variables a VPN exposes to dependent templates
const AUTO_CONTEXT_KEYS: [&str; 6] = [
    "ca_path",
    "ca_contents",
    "cert_path",
    "cert_contents",
    "key_path",
    "key_contents",
];

/// Context variables that carry certificate and key material; omitted
/// from the auto-client context when auto_cert is disabled
const CERT_CONTEXT_KEYS: [&str; 4] = ["cert_path", "cert_contents", "key_path", "key_contents"];

/// Vpn represents a VPN server definition owning CA, certificate
/// and Diffie-Hellman material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vpn {
    pub id: Uuid,
    pub name: String,
    /// VPN server hostname or IP address
    pub host: String,
    /// Issuing certificate authority
    pub ca: Uuid,
    /// Server x509 certificate; created automatically on first save when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert: Option<Uuid>,
    /// Name of the VPN configuration backend
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Diffie-Hellman parameters in PEM format; generated automatically
    /// on first save when empty
    #[serde(default)]
    pub dh: String,
    /// Server configuration tree
    #[serde(default)]
    pub config: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vpn {
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        ca: Uuid,
        backend: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            host: host.into(),
            ca,
            cert: None,
            backend: backend.into(),
            notes: None,
            dh: String::new(),
            config: Value::Null,
            created_at: now,
            updated_at: now,
        }
    }

    /// Names of the configuration variables dependent templates use to
    /// reference this VPN's CA, certificate and key material, scoped by
    /// this entity's identifier (e.g. `ca_contents_<id>`)
    pub fn auto_context_keys(&self) -> Map<String, Value> {
        let pk = self.id.simple().to_string();
        AUTO_CONTEXT_KEYS
            .iter()
            .map(|name| (name.to_string(), Value::String(format!("{}_{}", name, pk))))
            .collect()
    }

    /// Derive a client configuration fragment suitable for use as a
    /// template configuration tree.
    ///
    /// Delegates to the backend's auto-client capability with the host,
    /// the first server stanza of this VPN's own configuration and a
    /// placeholder context. When `auto_cert` is false the resulting
    /// context carries no certificate or key placeholders. Returns an
    /// empty object when the backend is unknown or has no such capability.
    pub fn auto_client(&self, auto_cert: bool, registry: &BackendRegistry) -> Value {
        let mut config = Map::new();
        if let Some(backend) = registry.get(&self.backend) {
            if let Some(auto) = backend.auto_client() {
                // wrap in curly brackets for context evaluation by the backend
                let mut context: Map<String, Value> = self
                    .auto_context_keys()
                    .into_iter()
                    .map(|(k, v)| match v {
                        Value::String(s) => (k, Value::String(format!("{{{{{}}}}}", s))),
                        other => (k, other),
                    })
                    .collect();
                if !auto_cert {
                    for key in CERT_CONTEXT_KEYS {
                        context.remove(key);
                    }
                }
                let stanza_key = backend.name().to_ascii_lowercase();
                let server = self
                    .config
                    .get(&stanza_key)
                    .and_then(|v| v.get(0))
                    .cloned()
                    .unwrap_or_else(|| Value::Object(Map::new()));
                if let Value::Object(fragment) = auto.auto_client(&self.host, &server, &context) {
                    config.extend(fragment);
                }
            }
        }
        Value::Object(config)
    }
}

/// VpnClient links a device configuration to a VPN server and owns the
/// lifecycle of an automatically managed client certificate.
/// Unique per (config, vpn) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpnClient {
    pub id: Uuid,
    /// Device configuration this client belongs to
    pub config: Uuid,
    pub vpn: Uuid,
    /// One-to-one client certificate, created on save when auto_cert is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert: Option<Uuid>,
    /// Whether the client certificate is automatically managed
    pub auto_cert: bool,
    pub created_at: DateTime<Utc>,
}

impl VpnClient {
    pub fn new(config: Uuid, vpn: Uuid, auto_cert: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            vpn,
            cert: None,
            auto_cert,
            created_at: Utc::now(),
        }
    }
}
