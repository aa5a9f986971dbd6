//! Identifier newtypes.
//!
//! Devices carry the opaque string identifier assigned by the backing store.
//! Records created by the engine itself (alerts) get random UUIDs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! define_uuid_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Access the inner UUID.
            #[must_use]
            pub fn as_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

define_uuid_id!(
    /// Unique identifier for an [`Alert`](crate::alert::Alert).
    AlertId
);

/// Store-assigned identifier of a [`Device`](crate::device::Device).
///
/// The store hands out short numeric strings (`"1"`, `"12"`), but the value
/// is treated as opaque. Numeric JSON identifiers are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Wrap a raw identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyId`] when `raw` is blank.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        Ok(Self(raw))
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for DeviceId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        let raw = match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text,
            Raw::Number(n) => n.to_string(),
        };
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_generate_unique_alert_ids_when_called_twice() {
        let a = AlertId::new();
        let b = AlertId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn should_reject_blank_device_id() {
        assert_eq!(DeviceId::new("  "), Err(ValidationError::EmptyId));
    }

    #[test]
    fn should_accept_numeric_json_device_id() {
        let id: DeviceId = serde_json::from_str("12").unwrap();
        assert_eq!(id.as_str(), "12");
    }

    #[test]
    fn should_serialize_device_id_as_plain_string() {
        let id = DeviceId::new("7").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"7\"");
    }
}
