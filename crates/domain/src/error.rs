//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`NexusError`]
//! via `#[from]` (or an `into_domain()` helper for adapter errors).

/// Base error shared by every port and use-case.
#[derive(Debug, thiserror::Error)]
pub enum NexusError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The external store (or another IO boundary) failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A device identifier was empty.
    #[error("identifier must not be empty")]
    EmptyId,

    /// A device name was empty.
    #[error("name must not be empty")]
    EmptyName,

    /// A subsystem name did not match `rack`, `access` or `energy`.
    #[error("unknown subsystem {0:?}")]
    UnknownSubsystem(String),

    /// A sector name did not match `sala` or `cocina`.
    #[error("unknown sector {0:?}")]
    UnknownSector(String),
}

/// A lookup for a record returned nothing.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    /// Kind of record (e.g. `"Device"`).
    pub entity: &'static str,
    /// Identifier that was looked up.
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_not_found_with_entity_and_id() {
        let err = NotFoundError {
            entity: "Device",
            id: "7".to_string(),
        };
        assert_eq!(err.to_string(), "Device 7 not found");
    }

    #[test]
    fn should_convert_validation_error_into_nexus_error() {
        let err: NexusError = ValidationError::EmptyId.into();
        assert!(matches!(
            err,
            NexusError::Validation(ValidationError::EmptyId)
        ));
    }

    #[test]
    fn should_convert_not_found_error_into_nexus_error() {
        let err: NexusError = NotFoundError {
            entity: "Device",
            id: "1".to_string(),
        }
        .into();
        assert!(matches!(err, NexusError::NotFound(_)));
    }

    #[test]
    fn should_display_unknown_subsystem_with_value() {
        let err = ValidationError::UnknownSubsystem("garage".to_string());
        assert_eq!(err.to_string(), "unknown subsystem \"garage\"");
    }
}
