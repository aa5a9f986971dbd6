//! Read-only overview fed by the slower poll.
//!
//! The board keeps its own copy of the collections and never touches the
//! registry, so a slow overview fetch cannot delay a safety decision.
//! Unreadable values count as 0 here; the safety machines keep their own
//! defaults.

use std::collections::VecDeque;

use serde::Serialize;

use nexushub_domain::actuator::LockState;
use nexushub_domain::audit::{AccessLogEntry, EnergyEvent, ThermalEvent, ThermalStatus};
use nexushub_domain::device::Device;
use nexushub_domain::reading;
use nexushub_domain::role::Role;

use crate::poll::PollBatch;
use crate::registry::find_by_keyword;
use crate::roles::RoleBindings;

/// Samples kept per sparkline.
pub const SPARKLINE_LEN: usize = 10;
/// Newest events kept per collection.
pub const EVENT_WINDOW: usize = 10;

const RACK_CRITICAL_ABOVE_C: f64 = 55.0;
const RACK_WARNING_ABOVE_C: f64 = 40.0;
const GAS_CRITICAL_ABOVE_PPM: i64 = 50;
const POWER_WARNING_ABOVE_W: f64 = 800.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Normal,
    Pending,
    Warning,
    Critical,
}

/// Fixed-length sample history, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Sparkline(VecDeque<f64>);

impl Sparkline {
    pub fn push(&mut self, sample: f64) {
        self.0.push_back(sample);
        while self.0.len() > SPARKLINE_LEN {
            self.0.pop_front();
        }
    }

    #[must_use]
    pub fn samples(&self) -> Vec<f64> {
        self.0.iter().copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Sparklines {
    pub rack_temperature: Sparkline,
    pub access_visits: Sparkline,
    pub power_watts: Sparkline,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub devices_online: usize,
    pub devices_total: usize,
    pub rack_temperature_c: f64,
    pub critical_events: usize,
    pub packages_received: usize,
    pub gas_alerts: usize,
    pub current_watts: f64,
    pub refresh_cycles: u64,
    pub relays_on: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubsystemHealth {
    pub rack: Health,
    pub access: Health,
    pub energy: Health,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewSnapshot {
    pub kpis: Kpis,
    pub health: SubsystemHealth,
    pub sparklines: Sparklines,
    pub thermal_events: Vec<ThermalEvent>,
    pub access_log: Vec<AccessLogEntry>,
    pub energy_events: Vec<EnergyEvent>,
}

#[derive(Debug, Default)]
pub struct OverviewBoard {
    bindings: RoleBindings,
    devices: Vec<Device>,
    thermal: Vec<ThermalEvent>,
    access: Vec<AccessLogEntry>,
    energy: Vec<EnergyEvent>,
    refresh_cycles: u64,
    sparklines: Sparklines,
}

fn newest_first<T>(mut events: Vec<T>, at: impl Fn(&T) -> Option<nexushub_domain::time::Timestamp>) -> Vec<T> {
    events.sort_by(|a, b| at(b).cmp(&at(a)));
    events.truncate(EVENT_WINDOW);
    events
}

impl OverviewBoard {
    #[must_use]
    pub fn new(bindings: RoleBindings) -> Self {
        Self {
            bindings,
            ..Self::default()
        }
    }

    /// Merge one overview cycle. The cycle counter advances even when every
    /// fetch failed; collections that failed keep their previous contents.
    pub fn refresh(&mut self, batch: PollBatch) {
        self.refresh_cycles += 1;
        if let Some(devices) = batch.devices {
            self.devices = devices;
        }
        if let Some(events) = batch.thermal {
            self.thermal = newest_first(events, |e| e.timestamp);
        }
        if let Some(events) = batch.access {
            self.access = newest_first(events, |e| e.timestamp);
        }
        if let Some(events) = batch.energy {
            self.energy = newest_first(events, |e| e.timestamp);
        }

        let temperature = self.rack_temperature();
        let watts = self.current_watts();
        self.sparklines.rack_temperature.push(temperature);
        self.sparklines.access_visits.push(self.access.len() as f64);
        self.sparklines.power_watts.push(watts);
        tracing::debug!(
            cycle = self.refresh_cycles,
            devices = self.devices.len(),
            "overview refreshed"
        );
    }

    #[must_use]
    pub fn refresh_cycles(&self) -> u64 {
        self.refresh_cycles
    }

    fn device(&self, role: Role) -> Option<&Device> {
        find_by_keyword(&self.devices, self.bindings.keyword(role))
    }

    fn value(&self, role: Role) -> Option<&str> {
        self.device(role).and_then(|d| d.value.as_deref())
    }

    fn rack_temperature(&self) -> f64 {
        reading::float_or(self.value(Role::RackTemperature), 0.0).get()
    }

    fn current_watts(&self) -> f64 {
        reading::float_segment_or(self.value(Role::PowerMeter), 1, 0.0).get()
    }

    fn gas_ppm(&self) -> i64 {
        reading::int_or(self.value(Role::GasSensor), 0).get()
    }

    #[must_use]
    pub fn kpis(&self) -> Kpis {
        Kpis {
            devices_online: self.devices.iter().filter(|d| d.is_online()).count(),
            devices_total: self.devices.len(),
            rack_temperature_c: self.rack_temperature(),
            critical_events: self
                .thermal
                .iter()
                .filter(|e| e.status == ThermalStatus::Critical)
                .count(),
            packages_received: self.access.iter().filter(|e| e.package_detected).count(),
            gas_alerts: self.energy.iter().filter(|e| e.gas_alert).count(),
            current_watts: self.current_watts(),
            refresh_cycles: self.refresh_cycles,
            relays_on: [Role::LivingRoomRelay, Role::KitchenRelay]
                .into_iter()
                .filter(|role| self.device(*role).is_some_and(|d| d.powered))
                .count(),
        }
    }

    #[must_use]
    pub fn health(&self) -> SubsystemHealth {
        let temperature = self.rack_temperature();
        let rack = if temperature > RACK_CRITICAL_ABOVE_C {
            Health::Critical
        } else if temperature > RACK_WARNING_ABOVE_C {
            Health::Warning
        } else {
            Health::Normal
        };

        let locked = self
            .device(Role::BoxLock)
            .is_some_and(|d| LockState::of(d) == LockState::Locked);
        let package = reading::float_or(self.value(Role::BoxScale), 0.0).get() > 0.0;
        let access = if locked || package {
            Health::Normal
        } else {
            Health::Pending
        };

        let energy = if self.gas_ppm() > GAS_CRITICAL_ABOVE_PPM {
            Health::Critical
        } else if self.current_watts() > POWER_WARNING_ABOVE_W {
            Health::Warning
        } else {
            Health::Normal
        };

        SubsystemHealth {
            rack,
            access,
            energy,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> OverviewSnapshot {
        OverviewSnapshot {
            kpis: self.kpis(),
            health: self.health(),
            sparklines: self.sparklines.clone(),
            thermal_events: self.thermal.clone(),
            access_log: self.access.clone(),
            energy_events: self.energy.clone(),
        }
    }
}
