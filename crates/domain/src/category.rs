//! System categories and subsystems.
//!
//! A device's category is derived, never stored: it is a pure function of its
//! `location` (and, as a last resort, its kind).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::device::Device;
use crate::error::ValidationError;

/// Coarse grouping of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemCategory {
    Rack,
    Access,
    Energy,
    Hub,
}

const RACK_KEYWORDS: &[&str] = &["rack", "servidor", "server"];
const ACCESS_KEYWORDS: &[&str] = &["entrada", "caja", "puerta", "entrance", "door"];
const ENERGY_KEYWORDS: &[&str] = &["tablero", "sala", "cocina", "kitchen", "living"];

impl SystemCategory {
    /// Classify a device. Total: anything unmatched is [`SystemCategory::Hub`].
    #[must_use]
    pub fn of(device: &Device) -> Self {
        let location = device.location.to_lowercase();
        let matches = |keywords: &[&str]| keywords.iter().any(|kw| location.contains(kw));

        if matches(RACK_KEYWORDS) {
            Self::Rack
        } else if matches(ACCESS_KEYWORDS) {
            Self::Access
        } else if matches(ENERGY_KEYWORDS) {
            Self::Energy
        } else {
            Self::Hub
        }
    }

    /// The automation subsystem this category feeds, if any.
    #[must_use]
    pub fn subsystem(self) -> Option<Subsystem> {
        match self {
            Self::Rack => Some(Subsystem::Rack),
            Self::Access => Some(Subsystem::Access),
            Self::Energy => Some(Subsystem::Energy),
            Self::Hub => None,
        }
    }
}

impl fmt::Display for SystemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rack => f.write_str("rack"),
            Self::Access => f.write_str("access"),
            Self::Energy => f.write_str("energy"),
            Self::Hub => f.write_str("hub"),
        }
    }
}

/// A logically independent automation domain with its own audit stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subsystem {
    Rack,
    Access,
    Energy,
}

impl Subsystem {
    pub const ALL: [Self; 3] = [Self::Rack, Self::Access, Self::Energy];
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rack => f.write_str("rack"),
            Self::Access => f.write_str("access"),
            Self::Energy => f.write_str("energy"),
        }
    }
}

impl FromStr for Subsystem {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rack" => Ok(Self::Rack),
            "access" => Ok(Self::Access),
            "energy" => Ok(Self::Energy),
            _ => Err(ValidationError::UnknownSubsystem(s.to_string())),
        }
    }
}

/// House sector with its own switchable power relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sector {
    #[serde(alias = "living")]
    Sala,
    #[serde(alias = "kitchen")]
    Cocina,
}

impl Sector {
    pub const ALL: [Self; 2] = [Self::Sala, Self::Cocina];

    /// Share of the metered total attributed to this sector while its relay is on.
    #[must_use]
    pub fn load_share(self) -> f64 {
        match self {
            Self::Sala => 0.6,
            Self::Cocina => 0.4,
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sala => f.write_str("sala"),
            Self::Cocina => f.write_str("cocina"),
        }
    }
}

impl FromStr for Sector {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sala" | "living" => Ok(Self::Sala),
            "cocina" | "kitchen" => Ok(Self::Cocina),
            _ => Err(ValidationError::UnknownSector(s.to_string())),
        }
    }
}
