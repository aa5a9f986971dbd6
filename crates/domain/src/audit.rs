//! Audit entries: append-only records of automatic and manual actions.
//!
//! Three record shapes, one per subsystem, each matching the store
//! collection it is persisted to. Entries created by the engine always carry
//! a timestamp; entries read back from the store may not, so every field is
//! parsed leniently.

use serde::{Deserialize, Serialize};

use crate::category::{Sector, Subsystem};
use crate::id::DeviceId;
use crate::time::Timestamp;

/// Outcome of a thermal evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThermalStatus {
    Warning,
    Critical,
    #[default]
    #[serde(other)]
    Normal,
}

/// Action recorded in a [`ThermalEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThermalAction {
    FansMax,
    SshShutdown,
    SshNotice,
    ShutdownCancelled,
    RelayCut,
    Rearmed,
    #[default]
    #[serde(other)]
    None,
}

/// A rack thermal record (`thermalEvents` collection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermalEvent {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "crate::lenient::value")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<DeviceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airflow: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan_speed: Option<u32>,
    #[serde(default)]
    pub status: ThermalStatus,
    #[serde(default)]
    pub action: ThermalAction,
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "crate::lenient::timestamp")]
    pub timestamp: Option<Timestamp>,
}

impl ThermalEvent {
    #[must_use]
    pub fn new(
        status: ThermalStatus,
        action: ThermalAction,
        message: impl Into<String>,
        at: Timestamp,
    ) -> Self {
        Self {
            id: None,
            device_id: None,
            temperature: None,
            airflow: None,
            fan_speed: None,
            status,
            action,
            message: message.into(),
            timestamp: Some(at),
        }
    }

    #[must_use]
    pub fn with_device(mut self, device_id: Option<DeviceId>) -> Self {
        self.device_id = device_id;
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, celsius: f64) -> Self {
        self.temperature = Some(celsius);
        self
    }

    #[must_use]
    pub fn with_airflow(mut self, metres_per_second: f64) -> Self {
        self.airflow = Some(metres_per_second);
        self
    }

    #[must_use]
    pub fn with_fan_speed(mut self, percent: u8) -> Self {
        self.fan_speed = Some(u32::from(percent));
        self
    }
}

/// Kind of access event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessEventType {
    Doorbell,
    Pressure,
    Lock,
    Alarm,
    AutoClose,
    #[default]
    #[serde(other)]
    Other,
}

/// A parcel box / entrance record (`accessLog` collection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "crate::lenient::value")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<DeviceId>,
    #[serde(default)]
    pub event_type: AccessEventType,
    #[serde(default, deserialize_with = "crate::lenient::flag")]
    pub has_photo: bool,
    #[serde(default, deserialize_with = "crate::lenient::flag")]
    pub box_opened: bool,
    #[serde(default, deserialize_with = "crate::lenient::flag")]
    pub package_detected: bool,
    /// Seconds the box had been open when the entry was written.
    #[serde(default)]
    pub box_open_duration: u32,
    #[serde(default = "pending")]
    pub status: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, deserialize_with = "crate::lenient::timestamp")]
    pub timestamp: Option<Timestamp>,
}

fn pending() -> String {
    "pending".to_string()
}

impl AccessLogEntry {
    #[must_use]
    pub fn new(event_type: AccessEventType, notes: impl Into<String>, at: Timestamp) -> Self {
        Self {
            id: None,
            device_id: None,
            event_type,
            has_photo: false,
            box_opened: false,
            package_detected: false,
            box_open_duration: 0,
            status: pending(),
            notes: notes.into(),
            timestamp: Some(at),
        }
    }

    #[must_use]
    pub fn with_device(mut self, device_id: Option<DeviceId>) -> Self {
        self.device_id = device_id;
        self
    }

    #[must_use]
    pub fn with_photo(mut self) -> Self {
        self.has_photo = true;
        self
    }

    #[must_use]
    pub fn opened(mut self, open: bool, open_for_secs: u32) -> Self {
        self.box_opened = open;
        self.box_open_duration = open_for_secs;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }
}

/// Action recorded in an [`EnergyEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyAction {
    GasValveClose,
    GasValveOpen,
    Alert,
    RelayOn,
    RelayCut,
    TravelModeOn,
    TravelModeOff,
    #[default]
    #[serde(other)]
    None,
}

/// A gas / power record (`energyEvents` collection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyEvent {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "crate::lenient::value")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<DeviceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<Sector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_level: Option<i64>,
    #[serde(default, deserialize_with = "crate::lenient::flag")]
    pub gas_alert: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_watts: Option<f64>,
    #[serde(default, deserialize_with = "crate::lenient::flag")]
    pub travel_mode: bool,
    #[serde(default)]
    pub action: EnergyAction,
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "crate::lenient::timestamp")]
    pub timestamp: Option<Timestamp>,
}

impl EnergyEvent {
    #[must_use]
    pub fn new(action: EnergyAction, message: impl Into<String>, at: Timestamp) -> Self {
        Self {
            id: None,
            device_id: None,
            sector: None,
            gas_level: None,
            gas_alert: false,
            power_watts: None,
            travel_mode: false,
            action,
            message: message.into(),
            timestamp: Some(at),
        }
    }

    #[must_use]
    pub fn with_device(mut self, device_id: Option<DeviceId>) -> Self {
        self.device_id = device_id;
        self
    }

    #[must_use]
    pub fn in_sector(mut self, sector: Sector) -> Self {
        self.sector = Some(sector);
        self
    }

    #[must_use]
    pub fn with_gas(mut self, ppm: i64, alert: bool) -> Self {
        self.gas_level = Some(ppm);
        self.gas_alert = alert;
        self
    }

    #[must_use]
    pub fn with_power(mut self, watts: f64) -> Self {
        self.power_watts = Some(watts);
        self
    }

    #[must_use]
    pub fn travel_mode(mut self, on: bool) -> Self {
        self.travel_mode = on;
        self
    }
}

/// Any audit record, tagged with its subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subsystem", rename_all = "lowercase")]
pub enum AuditEntry {
    #[serde(rename = "rack")]
    Thermal(ThermalEvent),
    Access(AccessLogEntry),
    Energy(EnergyEvent),
}

impl AuditEntry {
    #[must_use]
    pub fn subsystem(&self) -> Subsystem {
        match self {
            Self::Thermal(_) => Subsystem::Rack,
            Self::Access(_) => Subsystem::Access,
            Self::Energy(_) => Subsystem::Energy,
        }
    }

    #[must_use]
    pub fn timestamp(&self) -> Option<Timestamp> {
        match self {
            Self::Thermal(e) => e.timestamp,
            Self::Access(e) => e.timestamp,
            Self::Energy(e) => e.timestamp,
        }
    }

    /// Human-readable text. Access entries keep theirs in `notes`.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Thermal(e) => &e.message,
            Self::Access(e) => &e.notes,
            Self::Energy(e) => &e.message,
        }
    }

    /// The record as the store expects it, without the subsystem tag.
    #[must_use]
    pub fn record(&self) -> serde_json::Value {
        let value = match self {
            Self::Thermal(e) => serde_json::to_value(e),
            Self::Access(e) => serde_json::to_value(e),
            Self::Energy(e) => serde_json::to_value(e),
        };
        value.unwrap_or_default()
    }
}

impl From<ThermalEvent> for AuditEntry {
    fn from(value: ThermalEvent) -> Self {
        Self::Thermal(value)
    }
}

impl From<AccessLogEntry> for AuditEntry {
    fn from(value: AccessLogEntry) -> Self {
        Self::Access(value)
    }
}

impl From<EnergyEvent> for AuditEntry {
    fn from(value: EnergyEvent) -> Self {
        Self::Energy(value)
    }
}
