//! Energy safety rules: gas leak shut-off and travel-mode overconsumption.
//!
//! Not a state machine: each poll evaluates the current snapshot. The only
//! mode is the operator-toggled travel flag.

use serde::Serialize;

use nexushub_domain::actuator::{RelayState, ValveState};
use nexushub_domain::alert::{Alert, AlertCue, Severity};
use nexushub_domain::audit::{EnergyAction, EnergyEvent};
use nexushub_domain::category::{Sector, Subsystem};
use nexushub_domain::reading::{self, Sample};
use nexushub_domain::role::Role;

use crate::config::RetriggerPolicy;
use crate::context::Context;
use crate::registry::DeviceRegistry;

pub const GAS_ALERT_ABOVE_PPM: i64 = 50;
pub const TRAVEL_OVERLOAD_ABOVE_W: f64 = 800.0;

const DEFAULT_GAS_PPM: i64 = 12;
const DEFAULT_POWER_W: f64 = 253.0;

fn relay_role(sector: Sector) -> Role {
    match sector {
        Sector::Sala => Role::LivingRoomRelay,
        Sector::Cocina => Role::KitchenRelay,
    }
}

/// Point-in-time copy of the energy inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyReadings {
    pub gas_ppm: Sample<i64>,
    pub power_w: Sample<f64>,
    pub valve: Option<ValveState>,
    pub sala: Option<RelayState>,
    pub cocina: Option<RelayState>,
}

impl EnergyReadings {
    #[must_use]
    pub fn read(registry: &DeviceRegistry) -> Self {
        let value = |role| registry.device(role).and_then(|d| d.value.as_deref());
        Self {
            gas_ppm: reading::int_or(value(Role::GasSensor), DEFAULT_GAS_PPM),
            // "1.1A / 253W": the second segment is the draw.
            power_w: reading::float_segment_or(value(Role::PowerMeter), 1, DEFAULT_POWER_W),
            valve: registry.device(Role::GasValve).map(ValveState::of),
            sala: registry.device(Role::LivingRoomRelay).map(RelayState::of),
            cocina: registry.device(Role::KitchenRelay).map(RelayState::of),
        }
    }

    /// Draw attributed to a sector. An unknown relay counts as on.
    #[must_use]
    pub fn sector_watts(&self, sector: Sector) -> f64 {
        let relay = match sector {
            Sector::Sala => self.sala,
            Sector::Cocina => self.cocina,
        };
        if relay == Some(RelayState::Cut) {
            0.0
        } else {
            (self.power_w.get() * sector.load_share()).floor()
        }
    }
}

/// Which rules fired in one evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnergyVerdict {
    pub gas_leak: bool,
    pub overconsumption: bool,
}

/// Read-only energy snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyStatus {
    pub total_watts: f64,
    pub sala_watts: f64,
    pub cocina_watts: f64,
    pub gas_ppm: i64,
    pub gas_alert: bool,
    pub valve: Option<ValveState>,
    pub sala_relay: Option<RelayState>,
    pub cocina_relay: Option<RelayState>,
    pub travel_mode: bool,
}

#[derive(Debug)]
pub struct EnergySafetyRules {
    travel_mode: bool,
    policy: RetriggerPolicy,
    confirm_minutes: u32,
    gas_latch: bool,
    travel_latch: bool,
}

impl Default for EnergySafetyRules {
    fn default() -> Self {
        Self::new(RetriggerPolicy::default(), 15)
    }
}

impl EnergySafetyRules {
    #[must_use]
    pub fn new(policy: RetriggerPolicy, confirm_minutes: u32) -> Self {
        Self {
            travel_mode: false,
            policy,
            confirm_minutes,
            gas_latch: false,
            travel_latch: false,
        }
    }

    #[must_use]
    pub fn travel_mode(&self) -> bool {
        self.travel_mode
    }

    pub fn evaluate(&mut self, ctx: &mut Context<'_>) -> EnergyVerdict {
        let readings = EnergyReadings::read(ctx.registry);
        let gas = readings.gas_ppm.get();
        let watts = readings.power_w.get();
        let mut verdict = EnergyVerdict::default();

        if self
            .policy
            .should_fire(&mut self.gas_latch, gas > GAS_ALERT_ABOVE_PPM)
        {
            verdict.gas_leak = true;
            tracing::warn!(gas_ppm = gas, "gas detected, closing valve");
            ctx.actuate(Role::GasValve, ValveState::Closed.patch());
            ctx.record(
                EnergyEvent::new(
                    EnergyAction::GasValveClose,
                    format!("GAS {gas} ppm. Válvula cerrada"),
                    ctx.now,
                )
                .with_device(ctx.role_id(Role::GasSensor))
                .in_sector(Sector::Cocina)
                .with_gas(gas, true),
            );
            ctx.raise(
                Alert::new(
                    Severity::Critical,
                    Subsystem::Energy,
                    format!("ALERTA GAS: {gas} ppm detectados. Válvula cerrada automáticamente"),
                    ctx.now,
                )
                .with_cue(AlertCue::Gas),
            );
        }

        let overload = self.travel_mode && watts > TRAVEL_OVERLOAD_ABOVE_W;
        if self.policy.should_fire(&mut self.travel_latch, overload) {
            verdict.overconsumption = true;
            tracing::warn!(watts, "high consumption while in travel mode");
            ctx.record(
                EnergyEvent::new(
                    EnergyAction::Alert,
                    format!("Modo viaje: {watts} W en sala"),
                    ctx.now,
                )
                .in_sector(Sector::Sala)
                .with_power(watts)
                .travel_mode(true),
            );
            ctx.raise(Alert::new(
                Severity::Warn,
                Subsystem::Energy,
                format!(
                    "Modo viaje: consumo alto ({watts} W). Confirma en {} min",
                    self.confirm_minutes
                ),
                ctx.now,
            ));
        }

        verdict
    }

    /// Manual command: switch a sector relay.
    #[tracing::instrument(skip(self, ctx))]
    pub fn set_relay(&self, ctx: &mut Context<'_>, sector: Sector, on: bool) {
        let role = relay_role(sector);
        let state = RelayState::from_powered(on);
        ctx.actuate(role, state.patch());
        let action = if on {
            EnergyAction::RelayOn
        } else {
            EnergyAction::RelayCut
        };
        ctx.record(
            EnergyEvent::new(
                action,
                format!("Relevador {sector} {}", state.label()),
                ctx.now,
            )
            .with_device(ctx.role_id(role))
            .in_sector(sector),
        );
        let severity = if on { Severity::Info } else { Severity::Warn };
        ctx.raise(
            Alert::new(
                severity,
                Subsystem::Energy,
                format!("Relevador {sector} {}", if on { "encendido" } else { "cortado" }),
                ctx.now,
            )
            .silent(),
        );
    }

    /// Manual command: open or close the gas valve.
    #[tracing::instrument(skip(self, ctx))]
    pub fn set_gas_valve(&self, ctx: &mut Context<'_>, open: bool) {
        let state = if open {
            ValveState::Open
        } else {
            ValveState::Closed
        };
        ctx.actuate(Role::GasValve, state.patch());
        let action = if open {
            EnergyAction::GasValveOpen
        } else {
            EnergyAction::GasValveClose
        };
        ctx.record(
            EnergyEvent::new(action, format!("Válvula de gas {}", state.label()), ctx.now)
                .with_device(ctx.role_id(Role::GasValve))
                .in_sector(Sector::Cocina),
        );
        let alert = if open {
            Alert::new(
                Severity::Info,
                Subsystem::Energy,
                "Válvula de gas abierta",
                ctx.now,
            )
        } else {
            Alert::new(
                Severity::Critical,
                Subsystem::Energy,
                "Válvula de gas cerrada, emergencia",
                ctx.now,
            )
            .with_cue(AlertCue::Gas)
        };
        ctx.raise(alert);
    }

    /// Manual command: flip travel mode. Returns the new value.
    #[tracing::instrument(skip_all)]
    pub fn toggle_travel_mode(&mut self, ctx: &mut Context<'_>) -> bool {
        self.travel_mode = !self.travel_mode;
        if !self.travel_mode {
            self.travel_latch = false;
        }
        let (action, message) = if self.travel_mode {
            (EnergyAction::TravelModeOn, "Modo viaje activado, monitoreando consumo")
        } else {
            (EnergyAction::TravelModeOff, "Modo normal restaurado")
        };
        tracing::info!(travel_mode = self.travel_mode, "travel mode toggled");
        ctx.record(EnergyEvent::new(action, message, ctx.now).travel_mode(self.travel_mode));
        ctx.raise(Alert::new(Severity::Info, Subsystem::Energy, message, ctx.now));
        self.travel_mode
    }

    #[must_use]
    pub fn status(&self, registry: &DeviceRegistry) -> EnergyStatus {
        let readings = EnergyReadings::read(registry);
        EnergyStatus {
            total_watts: readings.power_w.get(),
            sala_watts: readings.sector_watts(Sector::Sala),
            cocina_watts: readings.sector_watts(Sector::Cocina),
            gas_ppm: readings.gas_ppm.get(),
            gas_alert: readings.gas_ppm.get() > GAS_ALERT_ABOVE_PPM,
            valve: readings.valve,
            sala_relay: readings.sala,
            cocina_relay: readings.cocina,
            travel_mode: self.travel_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::{catalogue, with_value};
    use crate::testing::Harness;
    use nexushub_domain::audit::AuditEntry;

    fn energy_entries(h: &Harness) -> Vec<EnergyEvent> {
        h.audit
            .ring(Subsystem::Energy)
            .iter()
            .filter_map(|e| match e {
                AuditEntry::Energy(ev) => Some(ev.clone()),
                _ => None,
            })
            .collect()
    }

    fn with_gas(ppm: &str) -> Vec<nexushub_domain::device::Device> {
        with_value(catalogue(), "12", ppm)
    }

    #[test]
    fn should_close_valve_and_record_event_when_gas_above_threshold() {
        let mut h = Harness::new(with_gas("65"));
        let mut rules = EnergySafetyRules::default();

        let verdict = rules.evaluate(&mut h.ctx());

        assert!(verdict.gas_leak);
        let valve = h.device("15");
        assert_eq!(ValveState::of(valve), ValveState::Closed);
        assert!(valve.powered);
        assert_eq!(valve.value.as_deref(), Some("CERRADA"));
        let events = energy_entries(&h);
        assert_eq!(events.len(), 1);
        assert!(events[0].gas_alert);
        assert_eq!(events[0].action, EnergyAction::GasValveClose);
        assert_eq!(events[0].gas_level, Some(65));
        assert_eq!(events[0].sector, Some(Sector::Cocina));
        assert_eq!(events[0].device_id.as_ref().unwrap().as_str(), "12");
        assert_eq!(h.alerts[0].cue, Some(AlertCue::Gas));
    }

    #[test]
    fn should_not_fire_at_exactly_fifty_ppm() {
        let mut h = Harness::new(with_gas("50"));
        let verdict = EnergySafetyRules::default().evaluate(&mut h.ctx());
        assert!(!verdict.gas_leak);
        assert!(energy_entries(&h).is_empty());
    }

    #[test]
    fn should_refire_gas_rule_every_poll_by_default() {
        let mut h = Harness::new(with_gas("65"));
        let mut rules = EnergySafetyRules::default();
        for _ in 0..3 {
            rules.evaluate(&mut h.ctx());
        }
        assert_eq!(energy_entries(&h).len(), 3);
    }

    #[test]
    fn should_fire_gas_rule_once_per_leak_when_on_transition() {
        let mut h = Harness::new(with_gas("65"));
        let mut rules = EnergySafetyRules::new(RetriggerPolicy::OnTransition, 15);
        for _ in 0..3 {
            rules.evaluate(&mut h.ctx());
        }
        assert_eq!(energy_entries(&h).len(), 1);
    }

    #[test]
    fn should_ignore_overconsumption_outside_travel_mode() {
        let mut h = Harness::new(with_value(catalogue(), "11", "4.2A / 950W"));
        let verdict = EnergySafetyRules::default().evaluate(&mut h.ctx());
        assert!(!verdict.overconsumption);
        assert!(energy_entries(&h).is_empty());
    }

    #[test]
    fn should_alert_on_overconsumption_in_travel_mode() {
        let mut h = Harness::new(with_value(catalogue(), "11", "4.2A / 950W"));
        let mut rules = EnergySafetyRules::new(RetriggerPolicy::EveryPoll, 15);
        assert!(rules.toggle_travel_mode(&mut h.ctx()));
        h.alerts.clear();

        let verdict = rules.evaluate(&mut h.ctx());

        assert!(verdict.overconsumption);
        let event = &energy_entries(&h)[0];
        assert_eq!(event.action, EnergyAction::Alert);
        assert_eq!(event.power_watts, Some(950.0));
        assert!(event.travel_mode);
        assert_eq!(event.sector, Some(Sector::Sala));
        assert!(h.alerts[0].message.contains("15 min"));
        assert_eq!(h.alerts[0].severity, Severity::Warn);
    }

    #[test]
    fn should_use_defaults_when_meters_unreadable() {
        let devices = with_value(with_value(catalogue(), "11", "sin datos"), "12", "??");
        let h = Harness::new(devices);
        let status = EnergySafetyRules::default().status(&h.registry);
        assert_eq!(status.total_watts, 253.0);
        assert_eq!(status.gas_ppm, 12);
        assert!(!status.gas_alert);
    }

    #[test]
    fn should_split_draw_between_sectors_with_relay_on() {
        let mut h = Harness::new(with_value(catalogue(), "11", "4.0A / 1000W"));
        let rules = EnergySafetyRules::default();
        let status = rules.status(&h.registry);
        assert_eq!(status.sala_watts, 600.0);
        assert_eq!(status.cocina_watts, 400.0);

        rules.set_relay(&mut h.ctx(), Sector::Cocina, false);
        let status = rules.status(&h.registry);
        assert_eq!(status.cocina_watts, 0.0);
        assert_eq!(status.cocina_relay, Some(RelayState::Cut));
    }

    #[test]
    fn should_write_relay_labels_and_record_actions() {
        let mut h = Harness::new(catalogue());
        let rules = EnergySafetyRules::default();

        rules.set_relay(&mut h.ctx(), Sector::Sala, false);
        assert!(!h.device("13").powered);
        assert_eq!(h.device("13").value.as_deref(), Some("CORTADO"));

        rules.set_relay(&mut h.ctx(), Sector::Sala, true);
        assert!(h.device("13").powered);
        assert_eq!(h.device("13").value.as_deref(), Some("ENCENDIDO"));

        assert_eq!(h.alerts.len(), 2);
        assert_eq!(h.alerts[0].severity, Severity::Warn);
        assert!(h.alerts.iter().all(|a| a.cue.is_none()));

        let actions: Vec<_> = energy_entries(&h).iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![EnergyAction::RelayOn, EnergyAction::RelayCut]);
    }

    #[test]
    fn should_encode_valve_with_fail_safe_polarity() {
        let mut h = Harness::new(catalogue());
        let rules = EnergySafetyRules::default();

        rules.set_gas_valve(&mut h.ctx(), false);
        assert!(h.device("15").powered);

        rules.set_gas_valve(&mut h.ctx(), true);
        assert!(!h.device("15").powered);
        assert_eq!(h.device("15").value.as_deref(), Some("ABIERTA"));
        assert_eq!(energy_entries(&h)[0].action, EnergyAction::GasValveOpen);
    }

    #[test]
    fn should_record_travel_mode_toggles() {
        let mut h = Harness::new(catalogue());
        let mut rules = EnergySafetyRules::default();
        assert!(rules.toggle_travel_mode(&mut h.ctx()));
        assert!(!rules.toggle_travel_mode(&mut h.ctx()));
        let actions: Vec<_> = energy_entries(&h).iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![EnergyAction::TravelModeOff, EnergyAction::TravelModeOn]
        );
        assert!(h.device_writes().is_empty());
    }
}
