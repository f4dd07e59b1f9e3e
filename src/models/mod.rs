mod device;
mod template;
mod vpn;

pub use device::{ConfigStatus, Device, DeviceConfig};
pub use template::{RemoteTemplate, SharingFlag, Template, TemplateType};
pub use vpn::{Vpn, VpnClient};
