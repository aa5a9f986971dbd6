//! Store port: the external record store the engine polls and writes to.
//!
//! The store is the source of truth for devices and audit history. Reads
//! return whole collections; writes are partial device updates and audit
//! appends. Implementations report every failure as [`NexusError::Storage`].

use std::future::Future;

use nexushub_domain::audit::{AccessLogEntry, AuditEntry, EnergyEvent, ThermalEvent};
use nexushub_domain::device::{Device, DeviceWriteBack};
use nexushub_domain::error::NexusError;

/// Read/write access to the backing store.
pub trait DeviceStore {
    /// Fetch the full device collection.
    fn fetch_devices(&self) -> impl Future<Output = Result<Vec<Device>, NexusError>> + Send;

    /// Fetch the full `thermalEvents` collection.
    fn fetch_thermal_events(
        &self,
    ) -> impl Future<Output = Result<Vec<ThermalEvent>, NexusError>> + Send;

    /// Fetch the full `accessLog` collection.
    fn fetch_access_log(
        &self,
    ) -> impl Future<Output = Result<Vec<AccessLogEntry>, NexusError>> + Send;

    /// Fetch the full `energyEvents` collection.
    fn fetch_energy_events(
        &self,
    ) -> impl Future<Output = Result<Vec<EnergyEvent>, NexusError>> + Send;

    /// Persist a partial device update.
    fn update_device(
        &self,
        write: &DeviceWriteBack,
    ) -> impl Future<Output = Result<(), NexusError>> + Send;

    /// Append an audit record to its subsystem's collection.
    fn append_entry(
        &self,
        entry: &AuditEntry,
    ) -> impl Future<Output = Result<(), NexusError>> + Send;
}

impl<T: DeviceStore + Send + Sync> DeviceStore for std::sync::Arc<T> {
    fn fetch_devices(&self) -> impl Future<Output = Result<Vec<Device>, NexusError>> + Send {
        (**self).fetch_devices()
    }

    fn fetch_thermal_events(
        &self,
    ) -> impl Future<Output = Result<Vec<ThermalEvent>, NexusError>> + Send {
        (**self).fetch_thermal_events()
    }

    fn fetch_access_log(
        &self,
    ) -> impl Future<Output = Result<Vec<AccessLogEntry>, NexusError>> + Send {
        (**self).fetch_access_log()
    }

    fn fetch_energy_events(
        &self,
    ) -> impl Future<Output = Result<Vec<EnergyEvent>, NexusError>> + Send {
        (**self).fetch_energy_events()
    }

    fn update_device(
        &self,
        write: &DeviceWriteBack,
    ) -> impl Future<Output = Result<(), NexusError>> + Send {
        (**self).update_device(write)
    }

    fn append_entry(
        &self,
        entry: &AuditEntry,
    ) -> impl Future<Output = Result<(), NexusError>> + Send {
        (**self).append_entry(entry)
    }
}
