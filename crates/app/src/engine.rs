//! Engine: owns the shared state and drives every cadence.
//!
//! All mutable state (registry, audit log, the three machines) sits behind
//! one async mutex. Fetches run before the lock is taken and alerts are
//! published after it is released, so a cycle holds the lock only while
//! it merges and evaluates.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use nexushub_domain::audit::{
    AccessEventType, AccessLogEntry, AuditEntry, EnergyAction, EnergyEvent, ThermalAction,
    ThermalEvent, ThermalStatus,
};
use nexushub_domain::category::{Sector, Subsystem, SystemCategory};
use nexushub_domain::device::Device;
use nexushub_domain::error::{NexusError, NotFoundError};
use nexushub_domain::id::DeviceId;
use nexushub_domain::role::Role;

use crate::audit_log::AuditLog;
use crate::config::EngineConfig;
use crate::context::Context;
use crate::dispatcher::{ActionDispatcher, Outbound, run_write_back};
use crate::energy::{EnergySafetyRules, EnergyStatus};
use crate::overview::{OverviewBoard, OverviewSnapshot};
use crate::parcel_box::{AccessStatus, BoxSafetyMachine, BoxState};
use crate::poll::{PollScheduler, fetch_all};
use crate::ports::{AlertPublisher, Clock, DeviceStore, SystemClock};
use crate::rack::{RackSafetyMachine, RackStatus};
use crate::registry::{DeviceRegistry, ReconcileReport};
use crate::roles::RoleMap;

struct Machines {
    rack: RackSafetyMachine,
    parcel_box: BoxSafetyMachine,
    energy: EnergySafetyRules,
}

struct Plant {
    registry: DeviceRegistry,
    audit: AuditLog,
    machines: Machines,
}

/// A device together with the system it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorizedDevice {
    #[serde(flatten)]
    pub device: Device,
    pub category: SystemCategory,
}

/// Role resolution as of the last device poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RolesView {
    pub resolved: RoleMap,
    pub unresolved: Vec<Role>,
}

/// Background tasks of a started engine.
#[derive(Debug)]
pub struct EngineHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl EngineHandle {
    /// Abort every background task.
    pub fn stop(self) {
        for task in &self.tasks {
            task.abort();
        }
        tracing::info!(tasks = self.tasks.len(), "engine stopped");
    }
}

pub struct Engine<S, P> {
    store: Arc<S>,
    publisher: P,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    dispatcher: ActionDispatcher,
    outbound: std::sync::Mutex<Option<mpsc::UnboundedReceiver<Outbound>>>,
    plant: Mutex<Plant>,
    overview: Mutex<OverviewBoard>,
}

impl<S, P> Engine<S, P>
where
    S: DeviceStore + Send + Sync + 'static,
    P: AlertPublisher + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(store: S, publisher: P, config: EngineConfig) -> Self {
        let (dispatcher, outbound) = ActionDispatcher::new();
        let plant = Plant {
            registry: DeviceRegistry::new(config.roles.clone()),
            audit: AuditLog::default(),
            machines: Machines {
                rack: RackSafetyMachine::new(config.retrigger),
                parcel_box: BoxSafetyMachine::default(),
                energy: EnergySafetyRules::new(config.retrigger, config.travel_confirm_minutes),
            },
        };
        Self {
            store: Arc::new(store),
            publisher,
            clock: Arc::new(SystemClock),
            overview: Mutex::new(OverviewBoard::new(config.roles.clone())),
            config,
            dispatcher,
            outbound: std::sync::Mutex::new(Some(outbound)),
            plant: Mutex::new(plant),
        }
    }

    /// Replace the clock used to stamp records.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Log the startup entries, then spawn the poll tasks, the timer task
    /// and the write-back worker.
    ///
    /// The write-back worker is spawned by the first call only.
    pub async fn start(self: &Arc<Self>) -> EngineHandle {
        self.log_startup().await;

        let mut tasks = Vec::with_capacity(4);

        let receiver = self.outbound.lock().ok().and_then(|mut slot| slot.take());
        match receiver {
            Some(rx) => tasks.push(tokio::spawn(run_write_back(Arc::clone(&self.store), rx))),
            None => tracing::warn!("engine already started, write-back worker not respawned"),
        }

        let engine = Arc::clone(self);
        tasks.push(
            PollScheduler::new("safety", self.config.safety_poll).spawn(move || {
                let engine = Arc::clone(&engine);
                async move {
                    engine.run_safety_cycle().await;
                }
            }),
        );

        let engine = Arc::clone(self);
        tasks.push(
            PollScheduler::new("overview", self.config.overview_poll).spawn(move || {
                let engine = Arc::clone(&engine);
                async move {
                    engine.run_overview_cycle().await;
                }
            }),
        );

        let engine = Arc::clone(self);
        tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(engine.config.timer_tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // the first tick completes immediately and is not a whole second
            interval.tick().await;
            loop {
                interval.tick().await;
                engine.tick_timers().await;
            }
        }));

        tracing::info!(
            safety_poll_ms = self.config.safety_poll.as_millis(),
            overview_poll_ms = self.config.overview_poll.as_millis(),
            retrigger = ?self.config.retrigger,
            "engine started"
        );
        EngineHandle { tasks }
    }

    async fn log_startup(&self) {
        let now = self.clock.now();
        let mut plant = self.plant.lock().await;
        plant.audit.append(
            ThermalEvent::new(
                ThermalStatus::Normal,
                ThermalAction::None,
                "Sistema Smart Rack iniciado",
                now,
            )
            .into(),
        );
        plant.audit.append(
            AccessLogEntry::new(AccessEventType::Other, "Sistema Paquetería iniciado", now)
                .with_status("info")
                .into(),
        );
        plant.audit.append(
            EnergyEvent::new(EnergyAction::None, "Sistema Energía iniciado", now).into(),
        );
    }

    /// Run `f` against the machines with a fresh context, then publish
    /// whatever alerts it raised.
    async fn act<R>(&self, f: impl FnOnce(&mut Machines, &mut Context<'_>) -> R) -> R {
        let mut alerts = Vec::new();
        let result = {
            let mut guard = self.plant.lock().await;
            let Plant {
                registry,
                audit,
                machines,
            } = &mut *guard;
            let mut ctx = Context {
                registry,
                audit,
                dispatcher: &self.dispatcher,
                alerts: &mut alerts,
                now: self.clock.now(),
            };
            f(machines, &mut ctx)
        };
        for alert in alerts {
            tracing::info!(
                severity = ?alert.severity,
                subsystem = %alert.subsystem,
                message = %alert.message,
                "alert raised"
            );
            if let Err(err) = self.publisher.publish(alert).await {
                tracing::warn!(%err, "alert publish failed");
            }
        }
        result
    }

    /// One safety cycle: fetch everything, merge it, then evaluate.
    ///
    /// Returns the reconciliation report when the device fetch succeeded.
    /// On a failed fetch the machines still run against the last snapshot.
    pub async fn run_safety_cycle(&self) -> Option<ReconcileReport> {
        let batch = fetch_all(self.store.as_ref()).await;
        let histories = batch.histories();
        self.act(move |machines, ctx| {
            let report = batch.devices.map(|devices| ctx.registry.upsert_all(devices));
            for (subsystem, entries) in histories {
                ctx.audit.mirror(subsystem, entries);
            }
            machines.rack.evaluate(ctx);
            machines.energy.evaluate(ctx);
            report
        })
        .await
    }

    /// One overview cycle. Never touches the registry.
    pub async fn run_overview_cycle(&self) {
        let batch = fetch_all(self.store.as_ref()).await;
        self.overview.lock().await.refresh(batch);
    }

    /// Advance the shutdown countdown and the box timer by one second.
    pub async fn tick_timers(&self) {
        self.act(|machines, ctx| {
            machines.rack.tick(ctx);
            machines.parcel_box.tick(ctx);
        })
        .await;
    }

    pub async fn fan_max(&self) {
        self.act(|m, ctx| m.rack.fan_max(ctx)).await;
    }

    /// Returns `false` when no countdown was running.
    pub async fn cancel_shutdown(&self) -> bool {
        self.act(|m, ctx| m.rack.cancel_shutdown(ctx)).await
    }

    pub async fn trigger_ssh_shutdown(&self) {
        self.act(|m, ctx| m.rack.trigger_ssh_shutdown_notice(ctx)).await;
    }

    pub async fn cut_rack_relay(&self) {
        self.act(|m, ctx| m.rack.cut_relay(ctx)).await;
    }

    /// Returns `false` unless the rack was shut down.
    pub async fn rearm_rack(&self) -> bool {
        self.act(|m, ctx| m.rack.rearm(ctx)).await
    }

    pub async fn unlock_box(&self) -> BoxState {
        self.act(|m, ctx| m.parcel_box.unlock(ctx)).await
    }

    pub async fn lock_box(&self) -> BoxState {
        self.act(|m, ctx| m.parcel_box.lock(ctx)).await
    }

    pub async fn trigger_camera(&self) {
        self.act(|m, ctx| m.parcel_box.trigger_camera(ctx)).await;
    }

    pub async fn set_relay(&self, sector: Sector, on: bool) {
        self.act(|m, ctx| m.energy.set_relay(ctx, sector, on)).await;
    }

    pub async fn set_gas_valve(&self, open: bool) {
        self.act(|m, ctx| m.energy.set_gas_valve(ctx, open)).await;
    }

    /// Returns the new travel-mode flag.
    pub async fn toggle_travel_mode(&self) -> bool {
        self.act(|m, ctx| m.energy.toggle_travel_mode(ctx)).await
    }

    pub async fn rack_status(&self) -> RackStatus {
        let plant = self.plant.lock().await;
        plant.machines.rack.status(&plant.registry)
    }

    pub async fn access_status(&self) -> AccessStatus {
        let plant = self.plant.lock().await;
        plant.machines.parcel_box.status(&plant.registry)
    }

    pub async fn energy_status(&self) -> EnergyStatus {
        let plant = self.plant.lock().await;
        plant.machines.energy.status(&plant.registry)
    }

    pub async fn overview(&self) -> OverviewSnapshot {
        self.overview.lock().await.snapshot()
    }

    pub async fn devices(&self) -> Vec<CategorizedDevice> {
        let plant = self.plant.lock().await;
        plant
            .registry
            .all()
            .iter()
            .map(|device| CategorizedDevice {
                category: plant.registry.category_of(device),
                device: device.clone(),
            })
            .collect()
    }

    /// # Errors
    ///
    /// Returns [`NexusError::NotFound`] if no device has this id.
    pub async fn device(&self, id: &DeviceId) -> Result<CategorizedDevice, NexusError> {
        let plant = self.plant.lock().await;
        let device = plant.registry.get(id).ok_or_else(|| NotFoundError {
            entity: "Device",
            id: id.to_string(),
        })?;
        Ok(CategorizedDevice {
            category: plant.registry.category_of(device),
            device: device.clone(),
        })
    }

    pub async fn roles(&self) -> RolesView {
        let plant = self.plant.lock().await;
        RolesView {
            resolved: plant.registry.roles().clone(),
            unresolved: plant.registry.unresolved_roles(),
        }
    }

    /// Display window of the local audit ring, newest first.
    pub async fn recent_log(&self, subsystem: Subsystem) -> Vec<AuditEntry> {
        self.plant.lock().await.audit.recent(subsystem)
    }

    /// Mirrored store history, newest first.
    pub async fn history(&self, subsystem: Subsystem) -> Vec<AuditEntry> {
        self.plant.lock().await.audit.history(subsystem).to_vec()
    }
}
