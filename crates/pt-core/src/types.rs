//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Pulse timestamps are positive epoch milliseconds.
    #[error("timestamp must be positive, got {value}")]
    NonPositiveTimestamp { value: i64 },

    /// The timestamp has no UTC calendar day.
    #[error("timestamp out of range, got {value}")]
    TimestampOutOfRange { value: i64 },

    /// A batch must carry at least one pulse.
    #[error("pulse batch cannot be empty")]
    EmptyBatch,

    /// Invalid activity type value.
    #[error("unknown activity type: {value}")]
    UnknownActivityType { value: String },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated user identifier.
    ///
    /// Every stored pulse belongs to exactly one user; session IDs are derived
    /// from it.
    UserId, "user ID"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_rejects_empty() {
        assert!(UserId::new("").is_err());
        assert!(UserId::new("   ").is_err());
        assert!(UserId::new("dev-user").is_ok());
    }

    #[test]
    fn user_id_serde_roundtrip() {
        let id = UserId::new("user-1").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"user-1\"");
        let parsed: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn user_id_serde_rejects_empty() {
        let result: Result<UserId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn user_id_as_ref() {
        let id = UserId::new("user-2").unwrap();
        let s: &str = id.as_ref();
        assert_eq!(s, "user-2");
    }

    #[test]
    fn validation_error_messages() {
        assert_eq!(
            ValidationError::Empty { field: "tool" }.to_string(),
            "tool cannot be empty"
        );
        assert_eq!(
            ValidationError::NonPositiveTimestamp { value: -1 }.to_string(),
            "timestamp must be positive, got -1"
        );
    }
}
