//! # nexushub-adapter-virtual
//!
//! In-memory [`DeviceStore`] seeded with the reference device catalogue.
//!
//! It behaves like the REST store as far as the engine can tell: writes
//! to devices patch the stored record, audit appends get a store-assigned
//! id, and writes to an unknown device fail. Demo and test code can move
//! sensor values and take the store offline to exercise the safety rules.
//!
//! ## Dependency rule
//!
//! Depends on `nexushub-app` (port traits) and `nexushub-domain` only.

mod catalogue;

use std::future::Future;

use tokio::sync::RwLock;

use nexushub_app::ports::DeviceStore;
use nexushub_domain::audit::{AccessLogEntry, AuditEntry, EnergyEvent, ThermalEvent};
use nexushub_domain::device::{Device, DeviceStatus, DeviceWriteBack};
use nexushub_domain::error::{NexusError, NotFoundError};
use nexushub_domain::id::DeviceId;

pub use catalogue::catalogue;

#[derive(Debug, Default)]
struct Records {
    devices: Vec<Device>,
    thermal: Vec<ThermalEvent>,
    access: Vec<AccessLogEntry>,
    energy: Vec<EnergyEvent>,
    next_id: u64,
    offline: bool,
}

/// The store is unreachable.
#[derive(Debug, thiserror::Error)]
#[error("virtual store is offline")]
pub struct Offline;

/// Simulated record store.
#[derive(Debug, Default)]
pub struct VirtualStore {
    records: RwLock<Records>,
}

impl VirtualStore {
    /// A store holding the reference catalogue and no audit history.
    #[must_use]
    pub fn seeded() -> Self {
        Self::with_devices(catalogue())
    }

    #[must_use]
    pub fn with_devices(devices: Vec<Device>) -> Self {
        Self {
            records: RwLock::new(Records {
                devices,
                ..Records::default()
            }),
        }
    }

    /// Overwrite a device's reading.
    ///
    /// # Errors
    ///
    /// Returns [`NexusError::NotFound`] for an unknown device.
    pub async fn set_value(&self, id: &DeviceId, value: impl Into<String>) -> Result<(), NexusError> {
        let mut records = self.records.write().await;
        let device = find_mut(&mut records.devices, id)?;
        device.value = Some(value.into());
        Ok(())
    }

    /// Mark a device online or offline.
    ///
    /// # Errors
    ///
    /// Returns [`NexusError::NotFound`] for an unknown device.
    pub async fn set_status(&self, id: &DeviceId, status: DeviceStatus) -> Result<(), NexusError> {
        let mut records = self.records.write().await;
        find_mut(&mut records.devices, id)?.status = status;
        Ok(())
    }

    /// While failing, every read and write returns a storage error.
    pub async fn set_failing(&self, failing: bool) {
        self.records.write().await.offline = failing;
        tracing::info!(failing, "virtual store availability changed");
    }

    pub async fn devices(&self) -> Vec<Device> {
        self.records.read().await.devices.clone()
    }

    pub async fn thermal_events(&self) -> Vec<ThermalEvent> {
        self.records.read().await.thermal.clone()
    }

    pub async fn access_log(&self) -> Vec<AccessLogEntry> {
        self.records.read().await.access.clone()
    }

    pub async fn energy_events(&self) -> Vec<EnergyEvent> {
        self.records.read().await.energy.clone()
    }

    async fn read<T>(&self, pick: impl FnOnce(&Records) -> T) -> Result<T, NexusError> {
        let records = self.records.read().await;
        if records.offline {
            return Err(NexusError::Storage(Box::new(Offline)));
        }
        Ok(pick(&records))
    }
}

fn find_mut<'a>(devices: &'a mut [Device], id: &DeviceId) -> Result<&'a mut Device, NexusError> {
    devices
        .iter_mut()
        .find(|d| &d.id == id)
        .ok_or_else(|| {
            NotFoundError {
                entity: "Device",
                id: id.to_string(),
            }
            .into()
        })
}

impl DeviceStore for VirtualStore {
    fn fetch_devices(&self) -> impl Future<Output = Result<Vec<Device>, NexusError>> + Send {
        self.read(|r| r.devices.clone())
    }

    fn fetch_thermal_events(
        &self,
    ) -> impl Future<Output = Result<Vec<ThermalEvent>, NexusError>> + Send {
        self.read(|r| r.thermal.clone())
    }

    fn fetch_access_log(
        &self,
    ) -> impl Future<Output = Result<Vec<AccessLogEntry>, NexusError>> + Send {
        self.read(|r| r.access.clone())
    }

    fn fetch_energy_events(
        &self,
    ) -> impl Future<Output = Result<Vec<EnergyEvent>, NexusError>> + Send {
        self.read(|r| r.energy.clone())
    }

    fn update_device(
        &self,
        write: &DeviceWriteBack,
    ) -> impl Future<Output = Result<(), NexusError>> + Send {
        async move {
            let mut records = self.records.write().await;
            if records.offline {
                return Err(NexusError::Storage(Box::new(Offline)));
            }
            find_mut(&mut records.devices, &write.device_id)?
                .apply_patch(&write.patch, write.timestamp);
            Ok(())
        }
    }

    fn append_entry(
        &self,
        entry: &AuditEntry,
    ) -> impl Future<Output = Result<(), NexusError>> + Send {
        async move {
            let mut records = self.records.write().await;
            if records.offline {
                return Err(NexusError::Storage(Box::new(Offline)));
            }
            records.next_id += 1;
            let id = Some(records.next_id.to_string());
            match entry.clone() {
                AuditEntry::Thermal(mut e) => {
                    e.id = id;
                    records.thermal.push(e);
                }
                AuditEntry::Access(mut e) => {
                    e.id = id;
                    records.access.push(e);
                }
                AuditEntry::Energy(mut e) => {
                    e.id = id;
                    records.energy.push(e);
                }
            }
            Ok(())
        }
    }
}
