use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a device configuration with respect to the device itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigStatus {
    /// The configuration changed and has not been applied to the device yet
    Modified,
    /// The device runs the current configuration
    Applied,
    /// Applying the configuration failed
    Error,
}

impl ConfigStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigStatus::Modified => "modified",
            ConfigStatus::Applied => "applied",
            ConfigStatus::Error => "error",
        }
    }
}

/// A managed network device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: Uuid,
    pub name: String,
    pub mac_address: String,
    /// Device enrollment key
    pub key: String,
}

/// A device configuration, composed from templates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub id: Uuid,
    pub device: Uuid,
    pub status: ConfigStatus,
    /// Templates composited onto this configuration, in application order
    #[serde(default)]
    pub templates: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeviceConfig {
    pub fn new(device: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            device,
            status: ConfigStatus::Modified,
            templates: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
