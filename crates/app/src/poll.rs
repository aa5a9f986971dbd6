//! Poll scheduling and the fetch-and-merge step.
//!
//! A [`PollScheduler`] runs one cycle per period on its own task, so two
//! schedulers never block each other. [`fetch_all`] issues the four
//! collection fetches concurrently and keeps whatever succeeded; a failed
//! collection is `None` and its consumer keeps the previous data.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use nexushub_domain::audit::{AccessLogEntry, AuditEntry, EnergyEvent, ThermalEvent};
use nexushub_domain::category::Subsystem;
use nexushub_domain::device::Device;
use nexushub_domain::error::NexusError;

use crate::ports::DeviceStore;

/// One cycle's fetch results. `None` marks a collection whose fetch failed.
#[derive(Debug, Clone, Default)]
pub struct PollBatch {
    pub devices: Option<Vec<Device>>,
    pub thermal: Option<Vec<ThermalEvent>>,
    pub access: Option<Vec<AccessLogEntry>>,
    pub energy: Option<Vec<EnergyEvent>>,
}

impl PollBatch {
    /// Number of collections that could not be fetched.
    #[must_use]
    pub fn failures(&self) -> usize {
        [
            self.devices.is_none(),
            self.thermal.is_none(),
            self.access.is_none(),
            self.energy.is_none(),
        ]
        .into_iter()
        .filter(|failed| *failed)
        .count()
    }

    /// Event collections that were fetched, as tagged audit entries.
    #[must_use]
    pub fn histories(&self) -> Vec<(Subsystem, Vec<AuditEntry>)> {
        let mut out = Vec::with_capacity(3);
        if let Some(events) = &self.thermal {
            out.push((Subsystem::Rack, events.iter().cloned().map(AuditEntry::from).collect()));
        }
        if let Some(events) = &self.access {
            out.push((Subsystem::Access, events.iter().cloned().map(AuditEntry::from).collect()));
        }
        if let Some(events) = &self.energy {
            out.push((Subsystem::Energy, events.iter().cloned().map(AuditEntry::from).collect()));
        }
        out
    }
}

/// Fetch every collection concurrently and wait for all of them.
pub async fn fetch_all<S: DeviceStore>(store: &S) -> PollBatch {
    let (devices, thermal, access, energy) = tokio::join!(
        store.fetch_devices(),
        store.fetch_thermal_events(),
        store.fetch_access_log(),
        store.fetch_energy_events(),
    );
    PollBatch {
        devices: keep("devices", devices),
        thermal: keep("thermalEvents", thermal),
        access: keep("accessLog", access),
        energy: keep("energyEvents", energy),
    }
}

fn keep<T>(collection: &'static str, result: Result<T, NexusError>) -> Option<T> {
    match result {
        Ok(items) => Some(items),
        Err(err) => {
            tracing::warn!(%err, collection, "fetch failed, keeping previous data");
            None
        }
    }
}

/// Runs a cycle at a fixed cadence on its own task.
#[derive(Debug, Clone, Copy)]
pub struct PollScheduler {
    name: &'static str,
    period: Duration,
}

impl PollScheduler {
    #[must_use]
    pub fn new(name: &'static str, period: Duration) -> Self {
        Self { name, period }
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Spawn the loop. The first cycle runs immediately; a slow cycle
    /// delays the next one instead of bunching ticks up.
    pub fn spawn<F, Fut>(self, mut cycle: F) -> JoinHandle<()>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        tracing::info!(name = self.name, period_ms = self.period.as_millis(), "poll task started");
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                cycle().await;
            }
        })
    }
}
