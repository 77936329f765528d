//! Appspread Core - Fundamental types for the Appspread placement policy engine
//!
//! This crate provides:
//! - Node snapshots with their bound pods
//! - Resource quantity parsing and accounting
//! - Error types with miette diagnostics
//! - Serialization helpers

pub mod error;
pub mod resources;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use resources::{ResourceKind, ResourceQuantities};
pub use types::{NodeInfo, APPLICATION_NAME_LABEL};

// Re-export k8s-openapi types for convenience
pub use k8s_openapi;
pub use k8s_openapi::api::core::v1::{Node, Pod};
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use std::path::Path;

/// Serialize a value to pretty JSON
pub fn to_json_pretty<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        CoreError::serialization_error(
            format!("Failed to serialize to JSON: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Deserialize a value from JSON
pub fn from_json<T: for<'de> serde::Deserialize<'de>>(data: &str) -> Result<T> {
    serde_json::from_str(data).map_err(|e| {
        CoreError::serialization_error(
            format!("Failed to deserialize from JSON: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Deserialize a value from YAML
pub fn from_yaml<T: for<'de> serde::Deserialize<'de>>(data: &str) -> Result<T> {
    serde_yaml::from_str(data).map_err(|e| {
        CoreError::serialization_error(
            format!("Failed to deserialize from YAML: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Read a file and deserialize it, as JSON for `.json` files and YAML otherwise
pub fn from_file<T: for<'de> serde::Deserialize<'de>>(path: &Path) -> Result<T> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| CoreError::io_error(path.display().to_string(), e))?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => from_json(&data),
        _ => from_yaml(&data),
    }
}
