//! Test doubles shared by the engine's unit tests.

use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use nexushub_domain::alert::Alert;
use nexushub_domain::audit::{AccessLogEntry, AuditEntry, EnergyEvent, ThermalEvent};
use nexushub_domain::device::{Device, DeviceWriteBack};
use nexushub_domain::error::NexusError;
use nexushub_domain::id::DeviceId;
use nexushub_domain::time::Timestamp;

use crate::audit_log::AuditLog;
use crate::context::Context;
use crate::dispatcher::{ActionDispatcher, Outbound};
use crate::ports::DeviceStore;
use crate::registry::DeviceRegistry;
use crate::roles::RoleBindings;

#[derive(Default)]
struct State {
    devices: Vec<Device>,
    thermal: Vec<ThermalEvent>,
    access: Vec<AccessLogEntry>,
    energy: Vec<EnergyEvent>,
    device_writes: Vec<DeviceWriteBack>,
}

/// In-memory store that applies writes to its own device copy.
#[derive(Default)]
pub(crate) struct MemoryStore {
    state: Mutex<State>,
    fail_fetch: AtomicBool,
    fail_event_fetch: AtomicBool,
    fail_writes: AtomicBool,
}

fn offline() -> NexusError {
    NexusError::Storage("store offline".into())
}

impl MemoryStore {
    pub(crate) fn with_devices(devices: Vec<Device>) -> Self {
        let store = Self::default();
        store.state.lock().unwrap().devices = devices;
        store
    }

    pub(crate) fn set_devices(&self, devices: Vec<Device>) {
        self.state.lock().unwrap().devices = devices;
    }

    pub(crate) fn set_value(&self, id: &str, value: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(d) = state.devices.iter_mut().find(|d| d.id.as_str() == id) {
            d.value = Some(value.to_string());
        }
    }

    pub(crate) fn fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_event_fetch(&self, fail: bool) {
        self.fail_event_fetch.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn device(&self, id: &DeviceId) -> Option<Device> {
        self.state.lock().unwrap().devices.iter().find(|d| &d.id == id).cloned()
    }

    pub(crate) fn device_writes(&self) -> Vec<DeviceWriteBack> {
        self.state.lock().unwrap().device_writes.clone()
    }

    pub(crate) fn thermal(&self) -> Vec<ThermalEvent> {
        self.state.lock().unwrap().thermal.clone()
    }

    pub(crate) fn energy(&self) -> Vec<EnergyEvent> {
        self.state.lock().unwrap().energy.clone()
    }

    fn events<T: Clone>(
        &self,
        pick: impl Fn(&State) -> &Vec<T>,
    ) -> Result<Vec<T>, NexusError> {
        if self.fail_fetch.load(Ordering::SeqCst) || self.fail_event_fetch.load(Ordering::SeqCst) {
            return Err(offline());
        }
        Ok(pick(&self.state.lock().unwrap()).clone())
    }
}

impl DeviceStore for MemoryStore {
    fn fetch_devices(&self) -> impl Future<Output = Result<Vec<Device>, NexusError>> + Send {
        let result = if self.fail_fetch.load(Ordering::SeqCst) {
            Err(offline())
        } else {
            Ok(self.state.lock().unwrap().devices.clone())
        };
        async move { result }
    }

    fn fetch_thermal_events(
        &self,
    ) -> impl Future<Output = Result<Vec<ThermalEvent>, NexusError>> + Send {
        let result = self.events(|s| &s.thermal);
        async move { result }
    }

    fn fetch_access_log(
        &self,
    ) -> impl Future<Output = Result<Vec<AccessLogEntry>, NexusError>> + Send {
        let result = self.events(|s| &s.access);
        async move { result }
    }

    fn fetch_energy_events(
        &self,
    ) -> impl Future<Output = Result<Vec<EnergyEvent>, NexusError>> + Send {
        let result = self.events(|s| &s.energy);
        async move { result }
    }

    fn update_device(
        &self,
        write: &DeviceWriteBack,
    ) -> impl Future<Output = Result<(), NexusError>> + Send {
        let result = if self.fail_writes.load(Ordering::SeqCst) {
            Err(offline())
        } else {
            let mut state = self.state.lock().unwrap();
            if let Some(d) = state.devices.iter_mut().find(|d| d.id == write.device_id) {
                d.apply_patch(&write.patch, write.timestamp);
            }
            state.device_writes.push(write.clone());
            Ok(())
        };
        async move { result }
    }

    fn append_entry(
        &self,
        entry: &AuditEntry,
    ) -> impl Future<Output = Result<(), NexusError>> + Send {
        let result = if self.fail_writes.load(Ordering::SeqCst) {
            Err(offline())
        } else {
            let mut state = self.state.lock().unwrap();
            match entry.clone() {
                AuditEntry::Thermal(e) => state.thermal.push(e),
                AuditEntry::Access(e) => state.access.push(e),
                AuditEntry::Energy(e) => state.energy.push(e),
            }
            Ok(())
        };
        async move { result }
    }
}

/// Registry, audit log and dispatcher wired together for machine tests.
pub(crate) struct Harness {
    pub(crate) registry: DeviceRegistry,
    pub(crate) audit: AuditLog,
    pub(crate) dispatcher: ActionDispatcher,
    pub(crate) outbound: mpsc::UnboundedReceiver<Outbound>,
    pub(crate) alerts: Vec<Alert>,
    pub(crate) now: Timestamp,
}

impl Harness {
    pub(crate) fn new(devices: Vec<Device>) -> Self {
        let mut registry = DeviceRegistry::new(RoleBindings::default());
        registry.upsert_all(devices);
        let (dispatcher, outbound) = ActionDispatcher::new();
        Self {
            registry,
            audit: AuditLog::default(),
            dispatcher,
            outbound,
            alerts: Vec::new(),
            now: nexushub_domain::time::now(),
        }
    }

    /// Simulate a poll delivering `devices`.
    pub(crate) fn load(&mut self, devices: Vec<Device>) {
        self.registry.upsert_all(devices);
    }

    pub(crate) fn ctx(&mut self) -> Context<'_> {
        Context {
            registry: &mut self.registry,
            audit: &mut self.audit,
            dispatcher: &self.dispatcher,
            alerts: &mut self.alerts,
            now: self.now,
        }
    }

    pub(crate) fn device(&self, id: &str) -> &Device {
        self.registry.get(&DeviceId::new(id).unwrap()).unwrap()
    }

    /// Everything queued for the store so far.
    pub(crate) fn drain(&mut self) -> Vec<Outbound> {
        let mut out = Vec::new();
        while let Ok(message) = self.outbound.try_recv() {
            out.push(message);
        }
        out
    }

    pub(crate) fn device_writes(&mut self) -> Vec<DeviceWriteBack> {
        self.drain()
            .into_iter()
            .filter_map(|m| match m {
                Outbound::Device(w) => Some(w),
                Outbound::Entry(_) => None,
            })
            .collect()
    }
}
