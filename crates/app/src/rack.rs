//! Rack safety machine: thermal runaway protection for the server rack.
//!
//! ```text
//! Normal ─▶ Warning ─▶ Critical ─▶ ShutdownCountdown ─▶ Shutdown
//!                                        │                  │
//!                                  cancel_shutdown        rearm
//!                                        ▼                  ▼
//!                                    Cancelled ─────────▶ Normal
//! ```
//!
//! The warning band (above 40 °C, below 55 °C) forces the extractor fan to
//! 100 %. From 55 °C with airflow below 0.5 m/s a 60 second countdown
//! starts; if nobody cancels it the rack relay is cut. `Shutdown` is
//! terminal until an operator re-arms the rack.

use serde::Serialize;

use nexushub_domain::actuator::{FanDuty, RelayState};
use nexushub_domain::alert::{Alert, Severity};
use nexushub_domain::audit::{ThermalAction, ThermalEvent, ThermalStatus};
use nexushub_domain::category::Subsystem;
use nexushub_domain::reading::{self, Sample};
use nexushub_domain::role::Role;

use crate::config::RetriggerPolicy;
use crate::context::Context;
use crate::registry::DeviceRegistry;

pub const WARNING_ABOVE_C: f64 = 40.0;
pub const CRITICAL_FROM_C: f64 = 55.0;
pub const MIN_AIRFLOW_MS: f64 = 0.5;
pub const SHUTDOWN_COUNTDOWN_SECS: u32 = 60;

const DEFAULT_TEMPERATURE_C: f64 = 35.0;
const DEFAULT_HUMIDITY_PCT: f64 = 45.0;
const DEFAULT_AIRFLOW_MS: f64 = 1.5;
const DEFAULT_FAN_PCT: i64 = 65;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RackState {
    #[default]
    Normal,
    Warning,
    Critical,
    ShutdownCountdown,
    Shutdown,
    Cancelled,
}

/// Shutdown countdown timer. Starting a running countdown is a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Countdown {
    running: bool,
    remaining_secs: u32,
}

impl Countdown {
    /// Start from `secs`. Returns `false` if already running.
    pub fn start(&mut self, secs: u32) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.remaining_secs = secs;
        true
    }

    /// Advance one second. Returns `true` on the tick that reaches zero.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.running = false;
            return true;
        }
        false
    }

    /// Stop the countdown. Returns whether it was running.
    pub fn cancel(&mut self) -> bool {
        let was_running = self.running;
        self.running = false;
        self.remaining_secs = 0;
        was_running
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }
}

/// Point-in-time copy of the rack inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RackReadings {
    pub temperature_c: Sample<f64>,
    pub humidity_pct: Sample<f64>,
    pub airflow_ms: Sample<f64>,
    pub fan: Sample<i64>,
    pub relay: Option<RelayState>,
}

impl RackReadings {
    #[must_use]
    pub fn read(registry: &DeviceRegistry) -> Self {
        let value = |role| registry.device(role).and_then(|d| d.value.as_deref());
        let climate = value(Role::RackTemperature);
        let readings = Self {
            temperature_c: reading::float_or(climate, DEFAULT_TEMPERATURE_C),
            humidity_pct: reading::float_segment_or(climate, 1, DEFAULT_HUMIDITY_PCT),
            airflow_ms: reading::float_or(value(Role::RackAirflow), DEFAULT_AIRFLOW_MS),
            fan: reading::int_or(value(Role::RackFan), DEFAULT_FAN_PCT),
            relay: registry.device(Role::RackRelay).map(RelayState::of),
        };
        if climate.is_some() && readings.temperature_c.is_defaulted() {
            tracing::debug!(value = ?climate, "unreadable rack temperature, using default");
        }
        readings
    }

    #[must_use]
    pub fn fan_duty(&self) -> FanDuty {
        FanDuty::saturating(self.fan.get())
    }
}

/// Read-only rack snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RackStatus {
    pub state: RackState,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub airflow_ms: f64,
    pub fan_percent: u8,
    pub relay: Option<RelayState>,
    pub countdown_remaining_secs: Option<u32>,
}

#[derive(Debug, Default)]
pub struct RackSafetyMachine {
    state: RackState,
    countdown: Countdown,
    policy: RetriggerPolicy,
    warning_latch: bool,
}

impl RackSafetyMachine {
    #[must_use]
    pub fn new(policy: RetriggerPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn state(&self) -> RackState {
        self.state
    }

    #[must_use]
    pub fn countdown(&self) -> Countdown {
        self.countdown
    }

    /// Evaluate the rules against the current registry snapshot.
    pub fn evaluate(&mut self, ctx: &mut Context<'_>) -> RackState {
        let readings = RackReadings::read(ctx.registry);
        if self.state == RackState::Shutdown {
            return self.state;
        }
        let temp = readings.temperature_c.get();
        let airflow = readings.airflow_ms.get();

        let warning = temp > WARNING_ABOVE_C
            && temp < CRITICAL_FROM_C
            && !readings.fan_duty().is_max()
            && ctx.registry.role_id(Role::RackFan).is_some();
        if self.policy.should_fire(&mut self.warning_latch, warning) {
            force_fans(ctx, temp);
        }

        if temp >= CRITICAL_FROM_C && airflow < MIN_AIRFLOW_MS && !self.countdown.is_running() {
            self.begin_shutdown(ctx, temp, airflow);
        }

        self.state = if self.countdown.is_running() {
            RackState::ShutdownCountdown
        } else if temp >= CRITICAL_FROM_C {
            RackState::Critical
        } else if temp > WARNING_ABOVE_C {
            RackState::Warning
        } else {
            RackState::Normal
        };
        self.state
    }

    fn begin_shutdown(&mut self, ctx: &mut Context<'_>, temp: f64, airflow: f64) {
        if !self.countdown.start(SHUTDOWN_COUNTDOWN_SECS) {
            return;
        }
        tracing::warn!(
            temperature = temp,
            airflow,
            secs = SHUTDOWN_COUNTDOWN_SECS,
            "rack ventilation failure, shutdown countdown started"
        );
        ctx.record(
            ThermalEvent::new(
                ThermalStatus::Critical,
                ThermalAction::SshShutdown,
                format!("{temp:.1} °C sin flujo de aire. SSH shutdown iniciado"),
                ctx.now,
            )
            .with_device(ctx.role_id(Role::RackTemperature))
            .with_temperature(temp)
            .with_airflow(airflow)
            .with_fan_speed(FanDuty::MAX.percent()),
        );
        ctx.raise(Alert::new(
            Severity::Critical,
            Subsystem::Rack,
            format!(
                "CRÍTICO: fallo de ventilación. Servidor apagando en {SHUTDOWN_COUNTDOWN_SECS} s"
            ),
            ctx.now,
        ));
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self, ctx: &mut Context<'_>) -> RackState {
        if !self.countdown.tick() {
            return self.state;
        }
        self.state = RackState::Shutdown;
        tracing::warn!("shutdown countdown elapsed, cutting rack relay");
        ctx.actuate(Role::RackRelay, RelayState::Cut.patch());
        ctx.record(
            ThermalEvent::new(
                ThermalStatus::Critical,
                ThermalAction::RelayCut,
                "Cuenta regresiva agotada. Relevador cortado, servidor apagado",
                ctx.now,
            )
            .with_device(ctx.role_id(Role::RackRelay)),
        );
        ctx.raise(Alert::new(
            Severity::Critical,
            Subsystem::Rack,
            "Relevador de energía cortado. Servidor apagado",
            ctx.now,
        ));
        self.state
    }

    /// Abort a running countdown. Returns `false` when none was running.
    #[tracing::instrument(skip_all)]
    pub fn cancel_shutdown(&mut self, ctx: &mut Context<'_>) -> bool {
        if !self.countdown.cancel() {
            return false;
        }
        self.state = RackState::Cancelled;
        tracing::info!("shutdown cancelled by operator");
        ctx.record(ThermalEvent::new(
            ThermalStatus::Normal,
            ThermalAction::ShutdownCancelled,
            "Apagado cancelado, intervenido manualmente",
            ctx.now,
        ));
        ctx.raise(Alert::new(
            Severity::Info,
            Subsystem::Rack,
            "Apagado de emergencia cancelado",
            ctx.now,
        ));
        true
    }

    /// Leave `Shutdown`, re-energize the rack relay. Returns `false` in any other state.
    #[tracing::instrument(skip_all)]
    pub fn rearm(&mut self, ctx: &mut Context<'_>) -> bool {
        if self.state != RackState::Shutdown {
            return false;
        }
        self.state = RackState::Normal;
        self.warning_latch = false;
        tracing::info!("rack re-armed by operator");
        ctx.actuate(Role::RackRelay, RelayState::On.patch());
        ctx.record(
            ThermalEvent::new(
                ThermalStatus::Normal,
                ThermalAction::Rearmed,
                "Rack rearmado, relevador energizado",
                ctx.now,
            )
            .with_device(ctx.role_id(Role::RackRelay)),
        );
        ctx.raise(Alert::new(Severity::Info, Subsystem::Rack, "Rack rearmado", ctx.now));
        true
    }

    /// Manual command: extractor fan to 100 %.
    #[tracing::instrument(skip_all)]
    pub fn fan_max(&self, ctx: &mut Context<'_>) {
        ctx.actuate(Role::RackFan, FanDuty::MAX.patch());
        ctx.record(
            ThermalEvent::new(
                ThermalStatus::Normal,
                ThermalAction::FansMax,
                "Fans al 100%, activado manualmente",
                ctx.now,
            )
            .with_device(ctx.role_id(Role::RackFan))
            .with_fan_speed(FanDuty::MAX.percent()),
        );
        ctx.raise(Alert::new(
            Severity::Info,
            Subsystem::Rack,
            "Extractores al 100% activados",
            ctx.now,
        ));
    }

    /// Manual command: notify the server of an SSH shutdown. No actuator changes.
    #[tracing::instrument(skip_all)]
    pub fn trigger_ssh_shutdown_notice(&self, ctx: &mut Context<'_>) {
        ctx.record(ThermalEvent::new(
            ThermalStatus::Warning,
            ThermalAction::SshNotice,
            "Comando SSH shutdown enviado al servidor",
            ctx.now,
        ));
        ctx.raise(Alert::new(
            Severity::Warn,
            Subsystem::Rack,
            "Comando SSH shutdown enviado al servidor",
            ctx.now,
        ));
    }

    /// Manual command: cut the rack relay.
    #[tracing::instrument(skip_all)]
    pub fn cut_relay(&self, ctx: &mut Context<'_>) {
        ctx.actuate(Role::RackRelay, RelayState::Cut.patch());
        ctx.record(
            ThermalEvent::new(
                ThermalStatus::Critical,
                ThermalAction::RelayCut,
                "Relevador cortado, energía del rack desconectada",
                ctx.now,
            )
            .with_device(ctx.role_id(Role::RackRelay)),
        );
        ctx.raise(Alert::new(
            Severity::Critical,
            Subsystem::Rack,
            "Relevador de energía cortado",
            ctx.now,
        ));
    }

    #[must_use]
    pub fn status(&self, registry: &DeviceRegistry) -> RackStatus {
        let readings = RackReadings::read(registry);
        RackStatus {
            state: self.state,
            temperature_c: readings.temperature_c.get(),
            humidity_pct: readings.humidity_pct.get(),
            airflow_ms: readings.airflow_ms.get(),
            fan_percent: readings.fan_duty().percent(),
            relay: readings.relay,
            countdown_remaining_secs: self
                .countdown
                .is_running()
                .then_some(self.countdown.remaining_secs()),
        }
    }
}

fn force_fans(ctx: &mut Context<'_>, temp: f64) {
    tracing::info!(temperature = temp, "rack temperature high, fans forced to max");
    ctx.actuate(Role::RackFan, FanDuty::MAX.patch());
    ctx.record(
        ThermalEvent::new(
            ThermalStatus::Warning,
            ThermalAction::FansMax,
            format!("{temp:.1} °C. Fans al 100%"),
            ctx.now,
        )
        .with_device(ctx.role_id(Role::RackFan))
        .with_temperature(temp)
        .with_fan_speed(FanDuty::MAX.percent()),
    );
    ctx.raise(Alert::new(
        Severity::Warn,
        Subsystem::Rack,
        format!("Temperatura alta: {temp:.1} °C. Ventiladores al máximo"),
        ctx.now,
    ));
}
