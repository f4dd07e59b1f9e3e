//! FleetConfig - configuration templates for fleets of network devices,
//! with VPN client provisioning and x509 certificate automation.
//!
//! The crate is the orchestration core of a fleet management system:
//! templates describe reusable configuration fragments, VPN servers hand
//! out auto-generated client configurations backed by certificates, and
//! every change to a shared object marks the device configurations that
//! reference it as outdated. Persistence and cryptography live behind
//! the [`store::Store`] and [`ca::CertificateAuthority`] traits so the
//! embedding application supplies its own database and PKI.

pub mod backend;
pub mod ca;
pub mod config;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
