//! Secure parcel box machine.
//!
//! ```text
//! Closed ─unlock─▶ Open ─120 s─▶ OpenWarning ─150 s─▶ AutoClosing ─▶ Closed
//!    ▲                │                │
//!    └──────lock──────┴──────lock──────┘
//! ```
//!
//! Unlocking starts a one-second box timer. After 120 s the alarm sounds,
//! after 150 s the box locks itself. `lock()` is valid from any state.

use serde::Serialize;

use nexushub_domain::actuator::{AlarmState, LockState};
use nexushub_domain::alert::{Alert, AlertCue, Severity};
use nexushub_domain::audit::{AccessEventType, AccessLogEntry};
use nexushub_domain::category::Subsystem;
use nexushub_domain::reading;
use nexushub_domain::role::Role;

use crate::context::Context;
use crate::registry::DeviceRegistry;

pub const ALARM_AFTER_SECS: u32 = 120;
pub const AUTO_LOCK_AFTER_SECS: u32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxState {
    #[default]
    Closed,
    Open,
    OpenWarning,
    AutoClosing,
}

impl BoxState {
    fn is_open(self) -> bool {
        matches!(self, Self::Open | Self::OpenWarning)
    }
}

/// Seconds the box has been open. Starting a running timer is a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BoxTimer {
    running: bool,
    elapsed_secs: u32,
}

impl BoxTimer {
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.elapsed_secs = 0;
        true
    }

    /// Stop and reset. Returns the elapsed seconds at the time of the stop.
    pub fn stop(&mut self) -> u32 {
        let elapsed = self.elapsed_secs;
        self.running = false;
        self.elapsed_secs = 0;
        elapsed
    }

    fn advance(&mut self) -> u32 {
        self.elapsed_secs += 1;
        self.elapsed_secs
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }
}

/// Read-only parcel box snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessStatus {
    pub state: BoxState,
    pub lock: Option<LockState>,
    pub alarm: Option<AlarmState>,
    pub elapsed_secs: u32,
    pub doormat_kg: f64,
    pub presence: bool,
    pub box_kg: f64,
    pub package: bool,
    pub camera_online: bool,
}

#[derive(Debug, Default)]
pub struct BoxSafetyMachine {
    state: BoxState,
    timer: BoxTimer,
}

impl BoxSafetyMachine {
    #[must_use]
    pub fn state(&self) -> BoxState {
        self.state
    }

    #[must_use]
    pub fn timer(&self) -> BoxTimer {
        self.timer
    }

    /// Release the lock and start the box timer.
    ///
    /// Unlocking an open box re-sends the lock write and the audit entry
    /// but keeps the timer running from where it was.
    #[tracing::instrument(skip_all)]
    pub fn unlock(&mut self, ctx: &mut Context<'_>) -> BoxState {
        ctx.actuate(Role::BoxLock, LockState::Unlocked.patch());
        if !self.state.is_open() {
            self.state = BoxState::Open;
        }
        if !self.timer.start() {
            tracing::debug!(elapsed = self.timer.elapsed_secs(), "box already open, timer kept");
        }
        tracing::info!("parcel box unlocked");
        ctx.record(
            AccessLogEntry::new(AccessEventType::Doorbell, "Apertura manual desde control", ctx.now)
                .with_device(ctx.role_id(Role::BoxLock))
                .opened(true, 0),
        );
        ctx.raise(
            Alert::new(
                Severity::Info,
                Subsystem::Access,
                "Caja de seguridad abierta",
                ctx.now,
            )
            .with_cue(AlertCue::Access),
        );
        self.state
    }

    /// Lock the box and silence the alarm, from any state.
    #[tracing::instrument(skip_all)]
    pub fn lock(&mut self, ctx: &mut Context<'_>) -> BoxState {
        ctx.actuate(Role::BoxLock, LockState::Locked.patch());
        ctx.actuate(Role::BoxAlarm, AlarmState::Silent.patch());
        let open_for = self.timer.stop();
        self.state = BoxState::Closed;
        tracing::info!(open_for, "parcel box locked");
        ctx.record(
            AccessLogEntry::new(AccessEventType::Lock, "Caja cerrada y asegurada", ctx.now)
                .with_device(ctx.role_id(Role::BoxLock))
                .opened(false, open_for)
                .with_status("closed"),
        );
        ctx.raise(Alert::new(
            Severity::Info,
            Subsystem::Access,
            "Caja de seguridad cerrada y asegurada",
            ctx.now,
        ));
        self.state
    }

    /// Advance the box timer by one second.
    pub fn tick(&mut self, ctx: &mut Context<'_>) -> BoxState {
        if !self.state.is_open() || !self.timer.is_running() {
            return self.state;
        }
        match self.timer.advance() {
            ALARM_AFTER_SECS => self.sound_alarm(ctx),
            AUTO_LOCK_AFTER_SECS => self.auto_lock(ctx),
            _ => {}
        }
        self.state
    }

    fn sound_alarm(&mut self, ctx: &mut Context<'_>) {
        self.state = BoxState::OpenWarning;
        tracing::warn!(secs = ALARM_AFTER_SECS, "parcel box left open, alarm on");
        ctx.actuate(Role::BoxAlarm, AlarmState::Sounding.patch());
        ctx.record(
            AccessLogEntry::new(
                AccessEventType::Alarm,
                "Tiempo excedido: caja abierta 120 s, alarma activada",
                ctx.now,
            )
            .with_device(ctx.role_id(Role::BoxAlarm))
            .opened(true, ALARM_AFTER_SECS)
            .with_status("alert"),
        );
        ctx.raise(
            Alert::new(
                Severity::Critical,
                Subsystem::Access,
                "Caja abierta +2 minutos. Alarma activada, cerrando en 30 s",
                ctx.now,
            )
            .with_cue(AlertCue::Warn),
        );
    }

    fn auto_lock(&mut self, ctx: &mut Context<'_>) {
        self.state = BoxState::AutoClosing;
        tracing::warn!(secs = AUTO_LOCK_AFTER_SECS, "parcel box auto-closing");
        ctx.record(
            AccessLogEntry::new(
                AccessEventType::AutoClose,
                "Cierre automático: caja cerrada tras 150 s",
                ctx.now,
            )
            .with_device(ctx.role_id(Role::BoxLock))
            .opened(true, AUTO_LOCK_AFTER_SECS),
        );
        self.lock(ctx);
    }

    /// Manual command: take a photo at the entrance. Leaves the lock alone.
    #[tracing::instrument(skip_all)]
    pub fn trigger_camera(&self, ctx: &mut Context<'_>) {
        ctx.record(
            AccessLogEntry::new(
                AccessEventType::Pressure,
                "Foto tomada por trigger manual",
                ctx.now,
            )
            .with_device(ctx.role_id(Role::EntranceCamera))
            .with_photo(),
        );
        ctx.raise(
            Alert::new(
                Severity::Info,
                Subsystem::Access,
                "Foto capturada y enviada, presencia detectada en entrada",
                ctx.now,
            )
            .with_cue(AlertCue::Access),
        );
    }

    #[must_use]
    pub fn status(&self, registry: &DeviceRegistry) -> AccessStatus {
        let weight = |role| {
            reading::float_or(registry.device(role).and_then(|d| d.value.as_deref()), 0.0).get()
        };
        let doormat_kg = weight(Role::DoormatScale);
        let box_kg = weight(Role::BoxScale);
        AccessStatus {
            state: self.state,
            lock: registry.device(Role::BoxLock).map(LockState::of),
            alarm: registry.device(Role::BoxAlarm).map(AlarmState::of),
            elapsed_secs: self.timer.elapsed_secs(),
            doormat_kg,
            presence: doormat_kg > 0.0,
            box_kg,
            package: box_kg > 0.0,
            camera_online: registry
                .device(Role::EntranceCamera)
                .is_some_and(nexushub_domain::device::Device::is_online),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::{catalogue, with_value};
    use crate::testing::Harness;
    use nexushub_domain::audit::AuditEntry;

    fn access_entries(h: &Harness) -> Vec<AccessLogEntry> {
        h.audit
            .ring(Subsystem::Access)
            .iter()
            .filter_map(|e| match e {
                AuditEntry::Access(a) => Some(a.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn should_open_box_and_record_doorbell_entry_when_unlocked() {
        let mut h = Harness::new(catalogue());
        let mut machine = BoxSafetyMachine::default();

        assert_eq!(machine.unlock(&mut h.ctx()), BoxState::Open);

        assert!(machine.timer().is_running());
        assert!(h.device("7").powered);
        assert_eq!(h.device("7").value.as_deref(), Some("ABIERTA"));
        let entry = &access_entries(&h)[0];
        assert_eq!(entry.event_type, AccessEventType::Doorbell);
        assert!(entry.box_opened);
        assert_eq!(entry.status, "pending");
        assert_eq!(entry.device_id.as_ref().unwrap().as_str(), "7");
    }

    #[test]
    fn should_count_one_second_per_tick_while_open() {
        let mut h = Harness::new(catalogue());
        let mut machine = BoxSafetyMachine::default();
        machine.unlock(&mut h.ctx());
        for expected in 1..=30 {
            machine.tick(&mut h.ctx());
            assert_eq!(machine.timer().elapsed_secs(), expected);
        }
    }

    #[test]
    fn should_not_tick_while_closed() {
        let mut h = Harness::new(catalogue());
        let mut machine = BoxSafetyMachine::default();
        for _ in 0..5 {
            assert_eq!(machine.tick(&mut h.ctx()), BoxState::Closed);
        }
        assert_eq!(machine.timer().elapsed_secs(), 0);
    }

    #[test]
    fn should_alarm_at_120_and_auto_lock_at_150() {
        let mut h = Harness::new(catalogue());
        let mut machine = BoxSafetyMachine::default();
        machine.unlock(&mut h.ctx());

        for _ in 0..119 {
            assert_eq!(machine.tick(&mut h.ctx()), BoxState::Open);
        }
        assert!(!h.device("10").powered);

        assert_eq!(machine.tick(&mut h.ctx()), BoxState::OpenWarning);
        assert!(h.device("10").powered);
        assert_eq!(h.device("10").value.as_deref(), Some("ALARMA ACTIVA"));

        for _ in 121..150 {
            assert_eq!(machine.tick(&mut h.ctx()), BoxState::OpenWarning);
        }
        assert_eq!(machine.tick(&mut h.ctx()), BoxState::Closed);
        assert_eq!(machine.timer().elapsed_secs(), 0);
        assert!(!machine.timer().is_running());
        assert!(!h.device("7").powered);
        assert!(!h.device("10").powered);

        let kinds: Vec<_> = access_entries(&h).iter().map(|e| e.event_type).collect();
        assert_eq!(
            kinds,
            vec![
                AccessEventType::Lock,
                AccessEventType::AutoClose,
                AccessEventType::Alarm,
                AccessEventType::Doorbell
            ]
        );
        assert_eq!(access_entries(&h)[0].box_open_duration, 150);
        assert!(h
            .alerts
            .iter()
            .any(|a| a.severity == Severity::Critical && a.subsystem == Subsystem::Access));
    }

    #[test]
    fn should_reset_elapsed_when_locked_from_any_state() {
        let mut h = Harness::new(catalogue());
        let mut machine = BoxSafetyMachine::default();

        assert_eq!(machine.lock(&mut h.ctx()), BoxState::Closed);
        assert_eq!(machine.timer().elapsed_secs(), 0);

        machine.unlock(&mut h.ctx());
        for _ in 0..10 {
            machine.tick(&mut h.ctx());
        }
        machine.lock(&mut h.ctx());
        assert_eq!(machine.timer().elapsed_secs(), 0);
        assert_eq!(access_entries(&h)[0].box_open_duration, 10);

        machine.unlock(&mut h.ctx());
        for _ in 0..125 {
            machine.tick(&mut h.ctx());
        }
        assert_eq!(machine.state(), BoxState::OpenWarning);
        assert_eq!(machine.lock(&mut h.ctx()), BoxState::Closed);
        assert_eq!(machine.timer().elapsed_secs(), 0);
        assert!(!h.device("10").powered);

        machine.tick(&mut h.ctx());
        assert_eq!(machine.timer().elapsed_secs(), 0);
    }

    #[test]
    fn should_keep_timer_when_unlocking_open_box() {
        let mut h = Harness::new(catalogue());
        let mut machine = BoxSafetyMachine::default();
        machine.unlock(&mut h.ctx());
        for _ in 0..40 {
            machine.tick(&mut h.ctx());
        }
        machine.unlock(&mut h.ctx());
        assert_eq!(machine.timer().elapsed_secs(), 40);
        assert_eq!(access_entries(&h).len(), 2);
    }

    #[test]
    fn should_record_photo_without_touching_lock() {
        let mut h = Harness::new(catalogue());
        let machine = BoxSafetyMachine::default();
        machine.trigger_camera(&mut h.ctx());

        assert_eq!(machine.state(), BoxState::Closed);
        assert!(h.device_writes().is_empty());
        let entry = &access_entries(&h)[0];
        assert_eq!(entry.event_type, AccessEventType::Pressure);
        assert!(entry.has_photo);
        assert!(!entry.box_opened);
        assert_eq!(entry.notes, "Foto tomada por trigger manual");
        assert_eq!(entry.device_id.as_ref().unwrap().as_str(), "6");
    }

    #[test]
    fn should_report_presence_and_package_from_scales() {
        let devices = with_value(with_value(catalogue(), "8", "63.5 kg"), "9", "1.2");
        let h = Harness::new(devices);
        let status = BoxSafetyMachine::default().status(&h.registry);
        assert!(status.presence);
        assert!(status.package);
        assert_eq!(status.box_kg, 1.2);
        assert_eq!(status.lock, Some(LockState::Locked));
        assert_eq!(status.alarm, Some(AlarmState::Silent));
        assert!(status.camera_online);
    }

    #[test]
    fn should_default_scales_to_empty_when_unreadable() {
        let h = Harness::new(with_value(catalogue(), "9", "sin lectura"));
        let status = BoxSafetyMachine::default().status(&h.registry);
        assert!(!status.package);
        assert_eq!(status.box_kg, 0.0);
    }
}
