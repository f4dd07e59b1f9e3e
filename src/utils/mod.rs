use rand::Rng;
use regex_lite::Regex;
use serde_json::{Map, Value};

use crate::models::Device;

/// Alphabet used for template share keys
const KEY_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of generated template share keys
pub const KEY_LENGTH: usize = 32;

/// Generate a random share key for a template
pub fn random_key() -> String {
    let mut rng = rand::thread_rng();
    (0..KEY_LENGTH)
        .map(|_| KEY_CHARS[rng.gen_range(0..KEY_CHARS.len())] as char)
        .collect()
}

/// Validate a template share key.
/// Allows alphanumeric characters only, up to 64 characters.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.len() <= 64 && key.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Slugify a name for use as a certificate common name,
/// e.g. "Main VPN Server" -> "main-vpn-server"
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Substitute `{{variable}}` placeholders in a string using the given context.
/// Unknown variables are left untouched.
pub fn substitute_vars(text: &str, context: &Map<String, Value>) -> String {
    let re = Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("valid placeholder regex");
    re.replace_all(text, |caps: &regex_lite::Captures| {
        let name = &caps[1];
        match context.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(v) => v.to_string(),
            None => caps[0].to_string(),
        }
    })
    .into_owned()
}

/// Walk a configuration tree and substitute `{{variable}}` placeholders
/// in every string value.
pub fn evaluate(config: &Value, context: &Map<String, Value>) -> Value {
    match config {
        Value::String(s) => Value::String(substitute_vars(s, context)),
        Value::Array(items) => Value::Array(items.iter().map(|v| evaluate(v, context)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), evaluate(v, context)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Derive a certificate common name from a device using a format string.
///
/// When the format is `{mac_address}-{name}` and the device name equals its
/// MAC address, the format collapses to `{mac_address}` so the common name
/// does not repeat the address twice.
pub fn format_common_name(format: &str, device: &Device) -> String {
    let mut format = format;
    if format == "{mac_address}-{name}" && device.name == device.mac_address {
        format = "{mac_address}";
    }
    format
        .replace("{name}", &device.name)
        .replace("{mac_address}", &device.mac_address)
        .replace("{id}", &device.id.simple().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn device(name: &str, mac: &str) -> Device {
        Device {
            id: Uuid::new_v4(),
            name: name.to_string(),
            mac_address: mac.to_string(),
            key: random_key(),
        }
    }

    #[test]
    fn test_random_key() {
        let key = random_key();
        assert_eq!(key.len(), KEY_LENGTH);
        assert!(is_valid_key(&key));
        assert_ne!(random_key(), random_key());
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abcDEF123"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("has space"));
        assert!(!is_valid_key("dash-key"));
        assert!(!is_valid_key(&"x".repeat(65)));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Main VPN Server"), "main-vpn-server");
        assert_eq!(slugify("  öffice VPN!  "), "ffice-vpn");
        assert_eq!(slugify("already-slugged"), "already-slugged");
    }

    #[test]
    fn test_substitute_vars() {
        let mut ctx = Map::new();
        ctx.insert("ca".to_string(), json!("PEM DATA"));
        assert_eq!(substitute_vars("ca: {{ca}}", &ctx), "ca: PEM DATA");
        assert_eq!(substitute_vars("ca: {{ ca }}", &ctx), "ca: PEM DATA");
        assert_eq!(substitute_vars("{{missing}}", &ctx), "{{missing}}");
    }

    #[test]
    fn test_evaluate_walks_tree() {
        let mut ctx = Map::new();
        ctx.insert("host".to_string(), json!("vpn.example.com"));
        let config = json!({"openvpn": [{"remote": ["{{host}} 1194"], "port": 1194}]});
        let out = evaluate(&config, &ctx);
        assert_eq!(out["openvpn"][0]["remote"][0], "vpn.example.com 1194");
        assert_eq!(out["openvpn"][0]["port"], 1194);
    }

    #[test]
    fn test_common_name_collapses_duplicate_mac() {
        let d = device("AA:BB:CC:DD:EE:FF", "AA:BB:CC:DD:EE:FF");
        assert_eq!(
            format_common_name("{mac_address}-{name}", &d),
            "AA:BB:CC:DD:EE:FF"
        );
    }

    #[test]
    fn test_common_name_format() {
        let d = device("edge-router", "AA:BB:CC:DD:EE:FF");
        assert_eq!(
            format_common_name("{mac_address}-{name}", &d),
            "AA:BB:CC:DD:EE:FF-edge-router"
        );
        assert_eq!(format_common_name("{name}", &d), "edge-router");
    }
}
