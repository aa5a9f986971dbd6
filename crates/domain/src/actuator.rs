//! Explicit actuator states.
//!
//! The store encodes every actuator with a single `powered` boolean plus a
//! display label in `value`. The polarity differs per actuator (the gas valve
//! is fail-safe: unpowered means open), so the engine only works with these
//! enums and converts at the boundary.

use serde::{Deserialize, Serialize};

use crate::device::{Device, DevicePatch};

/// Fail-safe gas valve. De-energized is the open state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValveState {
    Open,
    Closed,
}

impl ValveState {
    #[must_use]
    pub fn from_powered(powered: bool) -> Self {
        if powered { Self::Closed } else { Self::Open }
    }

    #[must_use]
    pub fn of(device: &Device) -> Self {
        Self::from_powered(device.powered)
    }

    #[must_use]
    pub fn powered(self) -> bool {
        matches!(self, Self::Closed)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "ABIERTA",
            Self::Closed => "CERRADA",
        }
    }

    #[must_use]
    pub fn patch(self) -> DevicePatch {
        DevicePatch::powered_with_label(self.powered(), self.label())
    }
}

/// Parcel box lock. Energized releases the latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockState {
    Locked,
    Unlocked,
}

impl LockState {
    #[must_use]
    pub fn from_powered(powered: bool) -> Self {
        if powered { Self::Unlocked } else { Self::Locked }
    }

    #[must_use]
    pub fn of(device: &Device) -> Self {
        Self::from_powered(device.powered)
    }

    #[must_use]
    pub fn powered(self) -> bool {
        matches!(self, Self::Unlocked)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Locked => "CERRADA",
            Self::Unlocked => "ABIERTA",
        }
    }

    #[must_use]
    pub fn patch(self) -> DevicePatch {
        DevicePatch::powered_with_label(self.powered(), self.label())
    }
}

/// Parcel box siren.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmState {
    Silent,
    Sounding,
}

impl AlarmState {
    #[must_use]
    pub fn from_powered(powered: bool) -> Self {
        if powered { Self::Sounding } else { Self::Silent }
    }

    #[must_use]
    pub fn of(device: &Device) -> Self {
        Self::from_powered(device.powered)
    }

    #[must_use]
    pub fn powered(self) -> bool {
        matches!(self, Self::Sounding)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Silent => "SILENCIO",
            Self::Sounding => "ALARMA ACTIVA",
        }
    }

    #[must_use]
    pub fn patch(self) -> DevicePatch {
        DevicePatch::powered_with_label(self.powered(), self.label())
    }
}

/// Power relay (rack supply or a house sector).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayState {
    On,
    Cut,
}

impl RelayState {
    #[must_use]
    pub fn from_powered(powered: bool) -> Self {
        if powered { Self::On } else { Self::Cut }
    }

    #[must_use]
    pub fn of(device: &Device) -> Self {
        Self::from_powered(device.powered)
    }

    #[must_use]
    pub fn powered(self) -> bool {
        matches!(self, Self::On)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::On => "ENCENDIDO",
            Self::Cut => "CORTADO",
        }
    }

    #[must_use]
    pub fn patch(self) -> DevicePatch {
        DevicePatch::powered_with_label(self.powered(), self.label())
    }
}

/// Extractor fan duty cycle, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FanDuty(u8);

impl FanDuty {
    pub const MAX: Self = Self(100);

    /// Clamp any integer reading into `0..=100`.
    #[must_use]
    pub fn saturating(percent: i64) -> Self {
        Self(u8::try_from(percent.clamp(0, 100)).unwrap_or(100))
    }

    #[must_use]
    pub fn percent(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_max(self) -> bool {
        self.0 >= 100
    }

    /// Patch that sets the duty and energizes the fan.
    #[must_use]
    pub fn patch(self) -> DevicePatch {
        DevicePatch::powered_with_label(self.0 > 0, self.0.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_treat_unpowered_valve_as_open() {
        assert_eq!(ValveState::from_powered(false), ValveState::Open);
        assert_eq!(ValveState::from_powered(true), ValveState::Closed);
    }

    #[test]
    fn should_energize_valve_to_close_it() {
        let patch = ValveState::Closed.patch();
        assert_eq!(patch.powered, Some(true));
        assert_eq!(patch.value.as_deref(), Some("CERRADA"));
    }

    #[test]
    fn should_energize_lock_to_open_it() {
        let patch = LockState::Unlocked.patch();
        assert_eq!(patch.powered, Some(true));
        assert_eq!(patch.value.as_deref(), Some("ABIERTA"));
        assert_eq!(LockState::from_powered(false), LockState::Locked);
    }

    #[test]
    fn should_label_alarm_and_relay_states() {
        assert_eq!(AlarmState::Sounding.patch().value.as_deref(), Some("ALARMA ACTIVA"));
        assert_eq!(RelayState::Cut.patch().powered, Some(false));
        assert_eq!(RelayState::Cut.label(), "CORTADO");
    }

    #[test]
    fn should_clamp_fan_duty() {
        assert_eq!(FanDuty::saturating(250).percent(), 100);
        assert_eq!(FanDuty::saturating(-5).percent(), 0);
        assert!(FanDuty::saturating(100).is_max());
        assert!(!FanDuty::saturating(65).is_max());
    }

    #[test]
    fn should_write_fan_max_as_energized_100() {
        let patch = FanDuty::MAX.patch();
        assert_eq!(patch.value.as_deref(), Some("100"));
        assert_eq!(patch.powered, Some(true));
    }
}
