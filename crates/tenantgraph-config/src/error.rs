//! Configuration error types.

use thiserror::Error;

/// Errors raised while validating configuration data.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required key is missing or a value is unusable
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A template configuration carried a property it may not contain
    #[error("template configurations may not contain the \"{key}\" property")]
    InvalidTemplateMutation { key: String },
}

impl ConfigError {
    /// Create an InvalidConfig error with a free-form message.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an InvalidConfig error for a missing required key.
    pub fn missing_key(key: &str) -> Self {
        Self::InvalidConfig {
            message: format!("the \"{key}\" property is required"),
        }
    }

    /// Create an InvalidConfig error for a name that disagrees with the
    /// graph-name property on the supplied configuration.
    pub fn name_mismatch(expected: &str, found: &str) -> Self {
        Self::InvalidConfig {
            message: format!(
                "supplied graph name '{expected}' does not match the configured name '{found}'"
            ),
        }
    }

    /// Create an InvalidTemplateMutation error for `key`.
    pub fn template_mutation(key: &str) -> Self {
        Self::InvalidTemplateMutation {
            key: key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PROPERTY_GRAPH_NAME;

    #[test]
    fn test_error_display() {
        let err = ConfigError::missing_key(PROPERTY_GRAPH_NAME);
        assert!(err.to_string().contains("graph.name"));
        assert!(err.to_string().contains("required"));

        let err = ConfigError::name_mismatch("graph1", "graph2");
        assert!(err.to_string().contains("graph1"));
        assert!(err.to_string().contains("graph2"));
    }

    #[test]
    fn test_template_mutation_display() {
        let err = ConfigError::template_mutation(PROPERTY_GRAPH_NAME);
        assert!(err.to_string().contains("template"));
        assert!(err.to_string().contains("graph.name"));
    }
}
