//! Orchestration services for the template/VPN lifecycle.
//!
//! Services own the validate/save sequences: invariant enforcement,
//! certificate and DH auto-creation, change detection and modification
//! propagation. Each sequence runs to completion within the triggering
//! request; there is no background scheduler here.

mod propagator;
mod templates;
mod vpn_clients;
mod vpns;

pub use propagator::{ConfigNotifier, LogNotifier, Propagator};
pub use templates::TemplateService;
pub use vpn_clients::VpnClientService;
pub use vpns::VpnService;

/// A single field-keyed validation failure
#[derive(Debug, Clone)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Typed error for invariant violations, cross-reference mismatches and
/// import failures. Field-keyed and collected — callers get every failing
/// field in one round trip, not just the first.
#[derive(Debug, Default)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut e = Self::new();
        e.push(field, message);
        e
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The messages recorded for a field, if any
    pub fn field(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    /// Ok when no errors were collected, Err(self) otherwise
    pub fn into_result(self) -> anyhow::Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.into())
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed")?;
        for e in &self.errors {
            write!(f, "; {}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
