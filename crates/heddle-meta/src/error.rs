//! Metadata runtime error types

use thiserror::Error;

/// Result type for metadata operations
pub type Result<T> = std::result::Result<T, MetaError>;

/// Metadata runtime errors
#[derive(Debug, Error)]
pub enum MetaError {
    // ==================== Registry Errors ====================
    #[error("unknown database: {0}")]
    UnknownDatabase(String),

    #[error("no sharding rule configuration for database: {0}")]
    ConfigurationNotFound(String),

    // ==================== Dispatch Errors ====================
    #[error("no subscriber registered for domain: {0}")]
    SubscriberMissing(String),

    #[error("operation {kind} does not belong to the {domain} domain")]
    DomainMismatch { domain: String, kind: String },
}

impl MetaError {
    /// Check if this error reports missing state rather than bad wiring
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MetaError::UnknownDatabase(_) | MetaError::ConfigurationNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(MetaError::UnknownDatabase("db".into()).is_not_found());
        assert!(MetaError::ConfigurationNotFound("db".into()).is_not_found());
        assert!(!MetaError::SubscriberMissing("tables".into()).is_not_found());
        assert!(!MetaError::DomainMismatch {
            domain: "tables".into(),
            kind: "add_broadcast_tables".into(),
        }
        .is_not_found());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            MetaError::UnknownDatabase("sharding_db".into()).to_string(),
            "unknown database: sharding_db"
        );
        assert_eq!(
            MetaError::ConfigurationNotFound("sharding_db".into()).to_string(),
            "no sharding rule configuration for database: sharding_db"
        );
    }
}
