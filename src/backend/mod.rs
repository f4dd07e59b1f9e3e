//! Pluggable configuration rendering backends.
//!
//! A backend turns a structured configuration tree into device-native
//! config text. Backends that know how to derive a client configuration
//! from a VPN server definition additionally expose the [`AutoClient`]
//! capability, discovered through [`ConfigBackend::auto_client`] rather
//! than reflection.

mod openvpn;

pub use openvpn::OpenVpn;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use serde_json::{Map, Value};

/// A configuration rendering backend, identified by name
pub trait ConfigBackend: Send + Sync {
    /// Canonical lowercase backend name (e.g. "openvpn")
    fn name(&self) -> &'static str;

    /// Render a configuration tree into native configuration text
    fn render(&self, config: &Value) -> Result<String>;

    /// Optional capability: derive a client configuration fragment from a
    /// VPN server definition. Backends without the capability return None.
    fn auto_client(&self) -> Option<&dyn AutoClient> {
        None
    }
}

/// Capability of deriving client-side configuration from server parameters
pub trait AutoClient: Send + Sync {
    /// Build a client configuration fragment for the given server host,
    /// the server's own configuration stanza, and a context of
    /// certificate/key placeholder variables.
    fn auto_client(&self, host: &str, server: &Value, context: &Map<String, Value>) -> Value;
}

/// Registry mapping backend names to rendering capabilities
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn ConfigBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// Registry with the built-in backends registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(OpenVpn));
        registry
    }

    pub fn register(&mut self, backend: Arc<dyn ConfigBackend>) {
        self.backends
            .insert(backend.name().to_ascii_lowercase(), backend);
    }

    /// Look up a backend by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<Arc<dyn ConfigBackend>> {
        self.backends.get(&name.to_ascii_lowercase()).cloned()
    }
}
