use anyhow::{bail, Result};
use serde_json::{Map, Value};

use super::{AutoClient, ConfigBackend};

/// OpenVPN configuration backend.
///
/// Renders `openvpn` stanzas from the configuration tree into native
/// OpenVPN config file syntax and derives client configurations from
/// server definitions.
pub struct OpenVpn;

/// Server options carried over into a derived client configuration
const CLIENT_INHERITED_OPTIONS: [&str; 7] = [
    "port", "dev", "dev_type", "cipher", "auth", "comp_lzo", "fragment",
];

impl OpenVpn {
    fn render_stanza(&self, stanza: &Map<String, Value>, out: &mut String) {
        if let Some(name) = stanza.get("name").and_then(|v| v.as_str()) {
            out.push_str(&format!("# openvpn config: {}\n", name));
        }
        for (key, value) in stanza {
            if key == "name" {
                continue;
            }
            let option = key.replace('_', "-");
            match value {
                Value::Bool(true) => out.push_str(&format!("{}\n", option)),
                Value::Bool(false) | Value::Null => {}
                Value::String(s) => out.push_str(&format!("{} {}\n", option, s)),
                Value::Number(n) => out.push_str(&format!("{} {}\n", option, n)),
                Value::Array(items) => {
                    for item in items {
                        match item {
                            Value::String(s) => out.push_str(&format!("{} {}\n", option, s)),
                            other => out.push_str(&format!("{} {}\n", option, other)),
                        }
                    }
                }
                // nested objects have no native OpenVPN syntax
                Value::Object(_) => {}
            }
        }
    }
}

impl ConfigBackend for OpenVpn {
    fn name(&self) -> &'static str {
        "openvpn"
    }

    fn render(&self, config: &Value) -> Result<String> {
        let stanzas = match config.get("openvpn").and_then(|v| v.as_array()) {
            Some(stanzas) => stanzas,
            None => bail!("configuration has no \"openvpn\" section"),
        };
        let mut out = String::new();
        for stanza in stanzas {
            if let Value::Object(map) = stanza {
                if !out.is_empty() {
                    out.push('\n');
                }
                self.render_stanza(map, &mut out);
            }
        }
        Ok(out)
    }

    fn auto_client(&self) -> Option<&dyn AutoClient> {
        Some(self)
    }
}

impl AutoClient for OpenVpn {
    fn auto_client(&self, host: &str, server: &Value, context: &Map<String, Value>) -> Value {
        let mut client = Map::new();
        let server_name = server
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("openvpn");
        client.insert(
            "name".to_string(),
            Value::String(format!("{}-client", server_name)),
        );
        client.insert("nobind".to_string(), Value::Bool(true));
        client.insert("persist_key".to_string(), Value::Bool(true));
        client.insert("persist_tun".to_string(), Value::Bool(true));
        // a server-mode proto maps to its client counterpart
        if let Some(proto) = server.get("proto").and_then(|v| v.as_str()) {
            let proto = match proto {
                "tcp-server" => "tcp-client",
                other => other,
            };
            client.insert("proto".to_string(), Value::String(proto.to_string()));
        }
        for option in CLIENT_INHERITED_OPTIONS {
            if let Some(value) = server.get(option) {
                client.insert(option.to_string(), value.clone());
            }
        }
        let port = server.get("port").and_then(|v| v.as_u64()).unwrap_or(1194);
        client.insert(
            "remote".to_string(),
            Value::Array(vec![Value::String(format!("{} {}", host, port))]),
        );
        for (config_key, context_key) in [("ca", "ca_path"), ("cert", "cert_path"), ("key", "key_path")] {
            if let Some(value) = context.get(context_key) {
                client.insert(config_key.to_string(), value.clone());
            }
        }
        let mut config = Map::new();
        config.insert("openvpn".to_string(), Value::Array(vec![Value::Object(client)]));
        Value::Object(config)
    }
}
