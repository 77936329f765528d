// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Core error type for Appspread operations
#[derive(Error, Debug, Diagnostic)]
pub enum CoreError {
    /// A resource quantity could not be parsed or was negative
    #[error("Invalid {resource} quantity '{value}': {reason}")]
    #[diagnostic(
        code(appspread::invalid_quantity),
        help("Use a non-negative Kubernetes quantity such as '500m', '2', '1.5Gi' or '1e9'")
    )]
    InvalidQuantity {
        #[allow(unused)]
        resource: String,
        #[allow(unused)]
        value: String,
        #[allow(unused)]
        reason: String,
    },

    /// Node does not report a capacity for a resource
    #[error("Node {node_name} does not report a {resource} capacity")]
    #[diagnostic(
        code(appspread::missing_capacity),
        help("Ensure status.capacity contains both 'cpu' and 'memory' for every node")
    )]
    MissingCapacity {
        #[allow(unused)]
        node_name: String,
        #[allow(unused)]
        resource: String,
    },

    /// Pod declares no containers
    #[error("Pod {pod_name} has no containers")]
    #[diagnostic(
        code(appspread::no_containers),
        help("A pod must have a spec with at least one container")
    )]
    NoContainers {
        #[allow(unused)]
        pod_name: String,
    },

    /// Serialization error
    #[error("Serialization error: {message}")]
    #[diagnostic(
        code(appspread::serialization_error),
        help("Ensure the input format is valid JSON or YAML")
    )]
    SerializationError {
        #[allow(unused)]
        message: String,
        #[source]
        #[allow(unused)]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O error while reading input
    #[error("Failed to read {path}: {source}")]
    #[diagnostic(
        code(appspread::io_error),
        help("Check that the file exists and is readable")
    )]
    IoError {
        #[allow(unused)]
        path: String,
        #[source]
        #[allow(unused)]
        source: std::io::Error,
    },
}

/// Result type alias for Appspread core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create an InvalidQuantity error
    pub fn invalid_quantity(
        resource: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidQuantity {
            resource: resource.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingCapacity error
    pub fn missing_capacity(node_name: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::MissingCapacity {
            node_name: node_name.into(),
            resource: resource.into(),
        }
    }

    /// Create a NoContainers error
    pub fn no_containers(pod_name: impl Into<String>) -> Self {
        Self::NoContainers {
            pod_name: pod_name.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization_error(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::SerializationError {
            message: message.into(),
            source,
        }
    }

    /// Create an IoError
    pub fn io_error(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CoreError::invalid_quantity("cpu", "-1", "quantity must not be negative");
        assert!(matches!(err, CoreError::InvalidQuantity { .. }));
        assert_eq!(
            err.to_string(),
            "Invalid cpu quantity '-1': quantity must not be negative"
        );

        let err = CoreError::missing_capacity("node1", "memory");
        assert!(matches!(err, CoreError::MissingCapacity { .. }));
        assert!(err.to_string().contains("node1"));
    }
}
