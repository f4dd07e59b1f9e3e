use std::env;

/// Settings holds process-wide defaults for the template/VPN subsystem.
///
/// Injected explicitly into services at construction time instead of being
/// read from global state inside entity defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Default value for the `auto_cert` flag on new templates and VPN client links
    pub auto_cert: bool,
    /// Format string used to derive client certificate common names
    /// from device attributes (supports {name}, {mac_address}, {id})
    pub common_name_format: String,
    /// Key length for auto-generated Diffie-Hellman parameters
    pub dh_key_length: u32,
}

impl Settings {
    /// Load settings from environment variables with defaults
    pub fn load() -> Self {
        Self {
            auto_cert: get_env("FLEET_AUTO_CERT", "true").parse().unwrap_or(true),
            common_name_format: get_env("FLEET_COMMON_NAME_FORMAT", "{mac_address}-{name}"),
            dh_key_length: get_env("FLEET_DH_KEY_LENGTH", "2048").parse().unwrap_or(2048),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_cert: true,
            common_name_format: "{mac_address}-{name}".to_string(),
            dh_key_length: 2048,
        }
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
