//! Action dispatcher: optimistic local writes plus a fire-and-forget
//! write-back queue.
//!
//! Patches land in the [`DeviceRegistry`] immediately. The same patch, and
//! every audit entry, is queued as an [`Outbound`] message that a single
//! worker ([`run_write_back`]) delivers to the store in order. Delivery
//! failures are logged and dropped; the next poll reconciles.

use tokio::sync::mpsc;

use nexushub_domain::audit::AuditEntry;
use nexushub_domain::device::{DevicePatch, DeviceWriteBack};
use nexushub_domain::id::DeviceId;
use nexushub_domain::time::Timestamp;

use crate::audit_log::AuditLog;
use crate::ports::DeviceStore;
use crate::registry::DeviceRegistry;

/// A write waiting to be delivered to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Device(DeviceWriteBack),
    Entry(AuditEntry),
}

/// Sole writer of the registry between polls and sole producer of store writes.
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl ActionDispatcher {
    /// Create a dispatcher and the receiving end of its write-back queue.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        (Self { outbound }, rx)
    }

    /// Patch a device locally and queue the same patch for the store.
    ///
    /// Returns `false` (and queues nothing) when the device is unknown.
    pub fn apply(
        &self,
        registry: &mut DeviceRegistry,
        device_id: &DeviceId,
        patch: DevicePatch,
        at: Timestamp,
    ) -> bool {
        if !registry.apply_patch(device_id, &patch, at) {
            tracing::debug!(%device_id, "patch for unknown device ignored");
            return false;
        }
        self.send(Outbound::Device(DeviceWriteBack {
            device_id: device_id.clone(),
            patch,
            timestamp: at,
        }));
        true
    }

    /// Append an entry to the local ring and queue it for the store.
    pub fn record(&self, audit: &mut AuditLog, entry: AuditEntry) {
        audit.append(entry.clone());
        self.send(Outbound::Entry(entry));
    }

    fn send(&self, message: Outbound) {
        if self.outbound.send(message).is_err() {
            tracing::debug!("write-back worker stopped, write kept local only");
        }
    }
}

/// Drain the write-back queue into `store` until every sender is dropped.
pub async fn run_write_back<S: DeviceStore>(store: S, mut rx: mpsc::UnboundedReceiver<Outbound>) {
    while let Some(message) = rx.recv().await {
        deliver(&store, message).await;
    }
    tracing::debug!("write-back queue closed");
}

async fn deliver<S: DeviceStore>(store: &S, message: Outbound) {
    match message {
        Outbound::Device(write) => {
            if let Err(err) = store.update_device(&write).await {
                tracing::warn!(%err, device_id = %write.device_id, "device write-back failed");
            }
        }
        Outbound::Entry(entry) => {
            if let Err(err) = store.append_entry(&entry).await {
                tracing::warn!(%err, subsystem = %entry.subsystem(), "audit append failed");
            }
        }
    }
}
