//! Descriptor registry
//!
//! Every configurable object (robots, user properties) exposes a `Descriptor`
//! that can describe itself and validate its fields one at a time. The
//! registry is built once at startup and torn down explicitly at shutdown.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tracing::{debug, info};

use crate::executor::WXWorkUserProperty;
use crate::robot::config::{check_id, check_name, check_webhook};

/// Outcome of validating one form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormValidation {
    pub kind: ValidationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationKind {
    Ok,
    Error,
}

impl FormValidation {
    pub fn ok() -> Self {
        Self {
            kind: ValidationKind::Ok,
            message: None,
        }
    }

    pub fn ok_with(message: impl Into<String>) -> Self {
        Self {
            kind: ValidationKind::Ok,
            message: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ValidationKind::Error,
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.kind == ValidationKind::Ok
    }

    /// Message text, empty for a bare ok
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }
}

/// Static description of a configurable kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptorInfo {
    pub kind: &'static str,
    pub display_name: &'static str,
    pub fields: &'static [&'static str],
}

/// Capability interface for configurable objects
pub trait Descriptor: Send + Sync {
    fn describe(&self) -> DescriptorInfo;

    /// Validate a single field value
    fn validate(&self, field: &str, value: &str) -> FormValidation;
}

/// Descriptor for robot configurations
pub struct RobotDescriptor;

impl Descriptor for RobotDescriptor {
    fn describe(&self) -> DescriptorInfo {
        DescriptorInfo {
            kind: "robot",
            display_name: "WXWork Robot",
            fields: &["id", "name", "webhook"],
        }
    }

    fn validate(&self, field: &str, value: &str) -> FormValidation {
        match field {
            "id" => check_id(value),
            "name" => check_name(value),
            "webhook" => check_webhook(value),
            other => FormValidation::error(format!("Unknown robot field: {}", other)),
        }
    }
}

/// Descriptor for the per-user WXWork property
pub struct UserPropertyDescriptor;

impl Descriptor for UserPropertyDescriptor {
    fn describe(&self) -> DescriptorInfo {
        DescriptorInfo {
            kind: "user-property",
            display_name: "WXWork User Settings",
            fields: &["mobile"],
        }
    }

    fn validate(&self, field: &str, value: &str) -> FormValidation {
        match field {
            "mobile" => WXWorkUserProperty::check_mobile(value),
            other => FormValidation::error(format!("Unknown user property field: {}", other)),
        }
    }
}

/// Registry of descriptors keyed by kind
///
/// Shared with the web handlers, so teardown goes through `&self`; after
/// `shutdown` every lookup misses.
pub struct DescriptorRegistry {
    descriptors: RwLock<BTreeMap<&'static str, Arc<dyn Descriptor>>>,
}

impl DescriptorRegistry {
    /// Create a registry with all built-in descriptors registered
    pub fn init() -> Self {
        let mut registry = Self {
            descriptors: RwLock::new(BTreeMap::new()),
        };
        registry.register(Arc::new(RobotDescriptor));
        registry.register(Arc::new(UserPropertyDescriptor));
        info!(kinds = ?registry.kinds(), "descriptor registry initialized");
        registry
    }

    /// Register a descriptor, replacing any previous one of the same kind
    pub fn register(&mut self, descriptor: Arc<dyn Descriptor>) {
        let kind = descriptor.describe().kind;
        debug!(kind, "registering descriptor");
        self.descriptors
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, descriptor);
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<&'static str, Arc<dyn Descriptor>>> {
        self.descriptors.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn Descriptor>> {
        self.read().get(kind).cloned()
    }

    /// List all registered kinds
    pub fn kinds(&self) -> Vec<&'static str> {
        self.read().keys().copied().collect()
    }

    pub fn describe_all(&self) -> Vec<DescriptorInfo> {
        self.read().values().map(|d| d.describe()).collect()
    }

    /// Validate `field` of `kind`, reporting unknown kinds as errors
    pub fn validate(&self, kind: &str, field: &str, value: &str) -> FormValidation {
        match self.get(kind) {
            Some(descriptor) => descriptor.validate(field, value),
            None => FormValidation::error(format!("Unknown descriptor kind: {}", kind)),
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.read().is_empty()
    }

    /// Tear the registry down; later calls do nothing
    pub fn shutdown(&self) {
        let mut descriptors = self.descriptors.write().unwrap_or_else(PoisonError::into_inner);
        if descriptors.is_empty() {
            return;
        }
        let count = descriptors.len();
        descriptors.clear();
        info!(count, "descriptor registry shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry() {
        let registry = DescriptorRegistry::init();
        assert_eq!(registry.kinds(), vec!["robot", "user-property"]);
        assert!(registry.get("robot").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.describe_all().len(), 2);
        assert!(!registry.is_shut_down());
    }

    #[test]
    fn test_shutdown_clears_registry() {
        let registry = DescriptorRegistry::init();
        registry.shutdown();
        assert!(registry.is_shut_down());
        assert!(registry.kinds().is_empty());
        assert!(!registry.validate("robot", "id", "ops").is_ok());
        registry.shutdown();
    }

    #[test]
    fn test_validate_robot_fields() {
        let registry = DescriptorRegistry::init();
        assert!(registry.validate("robot", "id", "ops").is_ok());
        let verdict = registry.validate("robot", "name", "   ");
        assert!(!verdict.is_ok());
        assert!(verdict.message().contains("name"));
        assert!(!registry.validate("robot", "color", "red").is_ok());
        assert!(!registry.validate("pipeline", "id", "x").is_ok());
    }

    #[test]
    fn test_validate_mobile() {
        let registry = DescriptorRegistry::init();
        assert!(registry.validate("user-property", "mobile", "13800000000").is_ok());
        assert!(!registry.validate("user-property", "mobile", "12ab").is_ok());
    }

    #[test]
    fn test_form_validation_json() {
        let json = serde_json::to_value(FormValidation::error("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "error", "message": "boom"}));
        let json = serde_json::to_value(FormValidation::ok()).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "ok"}));
    }
}
