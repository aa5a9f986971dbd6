//! Logical roles devices play for the safety machines.
//!
//! The store has no schema for "which device is the rack thermometer"; a role
//! is bound to a device by a case-insensitive name keyword.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::category::Subsystem;

/// A logical device role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    RackTemperature,
    RackFan,
    RackAirflow,
    RackRelay,
    EntranceCamera,
    BoxLock,
    DoormatScale,
    BoxScale,
    BoxAlarm,
    PowerMeter,
    GasSensor,
    LivingRoomRelay,
    KitchenRelay,
    GasValve,
}

impl Role {
    pub const ALL: [Self; 14] = [
        Self::RackTemperature,
        Self::RackFan,
        Self::RackAirflow,
        Self::RackRelay,
        Self::EntranceCamera,
        Self::BoxLock,
        Self::DoormatScale,
        Self::BoxScale,
        Self::BoxAlarm,
        Self::PowerMeter,
        Self::GasSensor,
        Self::LivingRoomRelay,
        Self::KitchenRelay,
        Self::GasValve,
    ];

    /// Name keyword matched against the reference device catalogue.
    #[must_use]
    pub fn default_keyword(self) -> &'static str {
        match self {
            Self::RackTemperature => "DHT22",
            Self::RackFan => "Extractor",
            Self::RackAirflow => "Anemómetro",
            Self::RackRelay => "Relevador Corte",
            Self::EntranceCamera => "ESP32",
            Self::BoxLock => "Cerradura",
            Self::DoormatScale => "Tapete",
            Self::BoxScale => "Presión Caja",
            Self::BoxAlarm => "Alarma",
            Self::PowerMeter => "ACS712",
            Self::GasSensor => "MQ-2",
            Self::LivingRoomRelay => "Sala",
            Self::KitchenRelay => "Cocina",
            Self::GasValve => "Válvula",
        }
    }

    /// Subsystem whose machine consumes this role.
    #[must_use]
    pub fn subsystem(self) -> Subsystem {
        match self {
            Self::RackTemperature | Self::RackFan | Self::RackAirflow | Self::RackRelay => {
                Subsystem::Rack
            }
            Self::EntranceCamera
            | Self::BoxLock
            | Self::DoormatScale
            | Self::BoxScale
            | Self::BoxAlarm => Subsystem::Access,
            Self::PowerMeter
            | Self::GasSensor
            | Self::LivingRoomRelay
            | Self::KitchenRelay
            | Self::GasValve => Subsystem::Energy,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RackTemperature => "rack_temperature",
            Self::RackFan => "rack_fan",
            Self::RackAirflow => "rack_airflow",
            Self::RackRelay => "rack_relay",
            Self::EntranceCamera => "entrance_camera",
            Self::BoxLock => "box_lock",
            Self::DoormatScale => "doormat_scale",
            Self::BoxScale => "box_scale",
            Self::BoxAlarm => "box_alarm",
            Self::PowerMeter => "power_meter",
            Self::GasSensor => "gas_sensor",
            Self::LivingRoomRelay => "living_room_relay",
            Self::KitchenRelay => "kitchen_relay",
            Self::GasValve => "gas_valve",
        };
        f.write_str(name)
    }
}
