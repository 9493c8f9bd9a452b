//! Activity type enum as the single source of truth for activity strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::ValidationError;

/// What the user was doing when a pulse was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActivityType {
    Coding,
    Debugging,
    Prompting,
    Browsing,
    Idle,
}

impl ActivityType {
    /// String representation for storage and wire output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Coding => "coding",
            Self::Debugging => "debugging",
            Self::Prompting => "prompting",
            Self::Browsing => "browsing",
            Self::Idle => "idle",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coding" => Ok(Self::Coding),
            "debugging" => Ok(Self::Debugging),
            "prompting" => Ok(Self::Prompting),
            "browsing" => Ok(Self::Browsing),
            "idle" => Ok(Self::Idle),
            _ => Err(ValidationError::UnknownActivityType {
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for ActivityType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActivityType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_all_variants() {
        let variants = [
            ActivityType::Coding,
            ActivityType::Debugging,
            ActivityType::Prompting,
            ActivityType::Browsing,
            ActivityType::Idle,
        ];

        for variant in &variants {
            let s = variant.to_string();
            let parsed: ActivityType = s.parse().expect("should parse");
            assert_eq!(parsed, *variant, "roundtrip failed for {variant:?}");
        }
    }

    #[test]
    fn unknown_type_errors() {
        let result: Result<ActivityType, _> = "invalid".parse();
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "unknown activity type: invalid");
    }

    #[test]
    fn deserialize_rejects_unknown() {
        let result: Result<ActivityType, _> = serde_json::from_str("\"sleeping\"");
        assert!(result.is_err());
    }
}
