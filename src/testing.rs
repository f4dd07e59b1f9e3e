//! Shared fakes for the service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::ca::{Ca, Cert, CertExtension, CertificateAuthority, IssuanceError, SubjectParams};
use crate::models::{Device, DeviceConfig};
use crate::services::ConfigNotifier;
use crate::store::Store;
use crate::utils;

/// Initialize log capture for a test; repeated calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Fabricate PEM-looking material for assertions
pub fn fake_pem(kind: &str, label: &str) -> String {
    format!(
        "-----BEGIN {kind}-----\n{label}\n-----END {kind}-----\n",
        kind = kind,
        label = label
    )
}

/// Notifier that records every signalled configuration id
#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Uuid>>,
}

impl RecordingNotifier {
    pub fn seen(&self) -> Vec<Uuid> {
        self.seen.lock().unwrap().clone()
    }
}

impl ConfigNotifier for RecordingNotifier {
    fn config_modified(&self, config: Uuid) {
        self.seen.lock().unwrap().push(config);
    }
}

/// In-memory stand-in for the external certificate authority service
#[derive(Default)]
pub struct FakeAuthority {
    cas: Mutex<HashMap<Uuid, Ca>>,
    certs: Mutex<HashMap<Uuid, Cert>>,
    fail_issuance: AtomicBool,
}

impl FakeAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a CA with canned subject fields and return it
    pub fn add_ca(&self, name: &str) -> Ca {
        let ca = Ca {
            id: Uuid::new_v4(),
            name: name.to_string(),
            key_length: 2048,
            digest: "sha256".to_string(),
            country_code: "US".to_string(),
            state: "CA".to_string(),
            city: "San Francisco".to_string(),
            organization_name: "Fleet".to_string(),
            email: "ops@fleet.example".to_string(),
            certificate: fake_pem("CERTIFICATE", &format!("ca:{}", name)),
        };
        self.cas.lock().unwrap().insert(ca.id, ca.clone());
        ca
    }

    /// Make every subsequent issuance fail
    pub fn fail_issuance(&self) {
        self.fail_issuance.store(true, Ordering::SeqCst);
    }

    pub fn cert_count(&self) -> usize {
        self.certs.lock().unwrap().len()
    }
}

#[async_trait]
impl CertificateAuthority for FakeAuthority {
    async fn get_ca(&self, id: Uuid) -> anyhow::Result<Option<Ca>> {
        Ok(self.cas.lock().unwrap().get(&id).cloned())
    }

    async fn get_cert(&self, id: Uuid) -> anyhow::Result<Option<Cert>> {
        Ok(self.certs.lock().unwrap().get(&id).cloned())
    }

    async fn issue(
        &self,
        ca: Uuid,
        subject: SubjectParams,
        _extensions: Vec<CertExtension>,
    ) -> anyhow::Result<Cert> {
        if self.fail_issuance.load(Ordering::SeqCst) {
            return Err(IssuanceError::new("issuance disabled by test").into());
        }
        if !self.cas.lock().unwrap().contains_key(&ca) {
            return Err(IssuanceError::new(format!("unknown ca {}", ca)).into());
        }
        let cert = Cert {
            id: Uuid::new_v4(),
            ca,
            name: subject.name.clone(),
            common_name: subject.common_name.clone(),
            certificate: fake_pem("CERTIFICATE", &format!("cn:{}", subject.common_name)),
            private_key: fake_pem("PRIVATE KEY", &format!("cn:{}", subject.common_name)),
        };
        self.certs.lock().unwrap().insert(cert.id, cert.clone());
        Ok(cert)
    }

    async fn delete_cert(&self, id: Uuid) -> anyhow::Result<()> {
        self.certs.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn dhparam(&self, length: u32) -> anyhow::Result<String> {
        if self.fail_issuance.load(Ordering::SeqCst) {
            return Err(IssuanceError::new("dh generation disabled by test").into());
        }
        Ok(fake_pem("DH PARAMETERS", &format!("length:{}", length)))
    }
}

/// Seed a device and an applied configuration for it
pub async fn seed_device(store: &dyn Store, name: &str, mac: &str) -> (Device, DeviceConfig) {
    let device = Device {
        id: Uuid::new_v4(),
        name: name.to_string(),
        mac_address: mac.to_string(),
        key: utils::random_key(),
    };
    store.save_device(&device).await.unwrap();
    let mut config = DeviceConfig::new(device.id);
    config.status = crate::models::ConfigStatus::Applied;
    store.save_device_config(&config).await.unwrap();
    (device, config)
}
