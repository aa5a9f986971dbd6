//! Device: a simulated sensor or actuator as the backing store exposes it.
//!
//! The store is a generic record collection, so every field is parsed
//! leniently: missing fields take defaults, numeric `value`s are turned into
//! strings, and an unreadable `lastPing` is treated as absent. The field
//! names (`type`, `lastPing`, …) are the store's wire contract.

use serde::{Deserialize, Serialize};

use crate::error::{NexusError, ValidationError};
use crate::id::DeviceId;
use crate::time::Timestamp;

/// Kind of device. Serialized with the store's (Spanish) vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeviceKind {
    #[serde(rename = "sensor")]
    Sensor,
    #[serde(rename = "actuador", alias = "actuator")]
    Actuator,
    #[serde(rename = "camara", alias = "camera")]
    Camera,
    #[serde(rename = "controlador", alias = "controller")]
    Controller,
    #[serde(rename = "gateway")]
    Gateway,
    /// Anything the store holds that is not one of the known kinds.
    #[default]
    #[serde(other, rename = "otro")]
    Other,
}

/// Reachability reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    #[default]
    #[serde(other)]
    Offline,
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => f.write_str("online"),
            Self::Offline => f.write_str("offline"),
        }
    }
}

/// A sensor or actuator record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: DeviceId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: DeviceKind,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub status: DeviceStatus,
    /// Free-form reading or state label. See [`crate::reading`].
    #[serde(default, deserialize_with = "crate::lenient::value")]
    pub value: Option<String>,
    /// Actuator energized flag. Meaning is actuator-specific, see [`crate::actuator`].
    #[serde(default, deserialize_with = "crate::lenient::flag")]
    pub powered: bool,
    #[serde(
        default,
        deserialize_with = "crate::lenient::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_ping: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Apply a patch in place and stamp `last_ping`.
    ///
    /// Only the fields present in the patch change.
    pub fn apply_patch(&mut self, patch: &DevicePatch, at: Timestamp) {
        if let Some(value) = &patch.value {
            self.value = Some(value.clone());
        }
        if let Some(powered) = patch.powered {
            self.powered = powered;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.last_ping = Some(at);
    }

    /// Whether the store reports this device as reachable.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.status == DeviceStatus::Online
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<String>,
    name: Option<String>,
    kind: DeviceKind,
    location: String,
    ip: String,
    protocol: String,
    status: DeviceStatus,
    value: Option<String>,
    powered: bool,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: DeviceKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    #[must_use]
    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = ip.into();
        self
    }

    #[must_use]
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    #[must_use]
    pub fn status(mut self, status: DeviceStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    pub fn powered(mut self, powered: bool) -> Self {
        self.powered = powered;
        self
    }

    /// Consume the builder and return a [`Device`].
    ///
    /// # Errors
    ///
    /// Returns [`NexusError::Validation`] when the id or the name is missing.
    pub fn build(self) -> Result<Device, NexusError> {
        let id = DeviceId::new(self.id.unwrap_or_default())?;
        let name = self.name.unwrap_or_default();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(Device {
            id,
            name,
            kind: self.kind,
            location: self.location,
            ip: self.ip,
            protocol: self.protocol,
            status: self.status,
            value: self.value,
            powered: self.powered,
            last_ping: None,
            icon: None,
        })
    }
}

/// Partial device update written back to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub powered: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeviceStatus>,
}

impl DevicePatch {
    /// Patch that sets both the energized flag and the value label.
    #[must_use]
    pub fn powered_with_label(powered: bool, label: impl Into<String>) -> Self {
        Self {
            value: Some(label.into()),
            powered: Some(powered),
            status: None,
        }
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.powered.is_none() && self.status.is_none()
    }
}

/// Outbound write-back of a [`DevicePatch`], stamped by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceWriteBack {
    pub device_id: DeviceId,
    pub patch: DevicePatch,
    pub timestamp: Timestamp,
}

impl DeviceWriteBack {
    /// JSON body for the store's update call: the patch fields plus `lastPing`.
    #[must_use]
    pub fn body(&self) -> serde_json::Value {
        let mut body = serde_json::to_value(&self.patch).unwrap_or_default();
        if let serde_json::Value::Object(map) = &mut body {
            map.insert(
                "lastPing".to_string(),
                serde_json::Value::String(self.timestamp.to_rfc3339()),
            );
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fan() -> Device {
        Device::builder()
            .id("3")
            .name("Extractor Rack")
            .kind(DeviceKind::Actuator)
            .location("Rack Servidor")
            .value("65")
            .powered(true)
            .build()
            .unwrap()
    }

    #[test]
    fn should_parse_store_record_with_spanish_type() {
        let json = serde_json::json!({
            "id": "3",
            "name": "Extractor Rack",
            "type": "actuador",
            "location": "Rack Servidor",
            "ip": "192.168.1.13",
            "protocol": "MQTT",
            "status": "online",
            "value": "65",
            "powered": true,
            "lastPing": "2026-02-09T10:00:00.000Z"
        });
        let device: Device = serde_json::from_value(json).unwrap();
        assert_eq!(device.kind, DeviceKind::Actuator);
        assert_eq!(device.status, DeviceStatus::Online);
        assert_eq!(device.value.as_deref(), Some("65"));
        assert!(device.powered);
        assert!(device.last_ping.is_some());
    }

    #[test]
    fn should_fall_back_to_defaults_when_fields_missing_or_malformed() {
        let json = serde_json::json!({
            "id": 9,
            "name": "Sensor raro",
            "type": "holograma",
            "status": "maintenance",
            "value": 42.5,
            "powered": null,
            "lastPing": "yesterday"
        });
        let device: Device = serde_json::from_value(json).unwrap();
        assert_eq!(device.id.as_str(), "9");
        assert_eq!(device.kind, DeviceKind::Other);
        assert_eq!(device.status, DeviceStatus::Offline);
        assert_eq!(device.value.as_deref(), Some("42.5"));
        assert!(!device.powered);
        assert!(device.last_ping.is_none());
        assert!(device.location.is_empty());
    }

    #[test]
    fn should_change_only_patched_fields_when_applying_patch() {
        let mut device = fan();
        let before = device.clone();
        let at = crate::time::now();
        device.apply_patch(
            &DevicePatch {
                value: Some("100".to_string()),
                powered: None,
                status: None,
            },
            at,
        );
        assert_eq!(device.value.as_deref(), Some("100"));
        assert_eq!(device.powered, before.powered);
        assert_eq!(device.name, before.name);
        assert_eq!(device.location, before.location);
        assert_eq!(device.last_ping, Some(at));
    }

    #[test]
    fn should_omit_absent_fields_from_write_back_body() {
        let write = DeviceWriteBack {
            device_id: DeviceId::new("3").unwrap(),
            patch: DevicePatch::powered_with_label(true, "100"),
            timestamp: crate::time::now(),
        };
        let body = write.body();
        assert_eq!(body["value"], "100");
        assert_eq!(body["powered"], true);
        assert!(body.get("status").is_none());
        assert!(body["lastPing"].is_string());
    }

    #[test]
    fn should_reject_device_without_name() {
        let result = Device::builder().id("1").build();
        assert!(matches!(
            result,
            Err(NexusError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_report_empty_patch() {
        assert!(DevicePatch::default().is_empty());
        assert!(!DevicePatch::powered_with_label(false, "CERRADA").is_empty());
    }
}
