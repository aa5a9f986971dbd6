//! Shared mutable state handed to a safety machine for one evaluation.

use nexushub_domain::alert::Alert;
use nexushub_domain::audit::AuditEntry;
use nexushub_domain::device::DevicePatch;
use nexushub_domain::id::DeviceId;
use nexushub_domain::role::Role;
use nexushub_domain::time::Timestamp;

use crate::audit_log::AuditLog;
use crate::dispatcher::ActionDispatcher;
use crate::registry::DeviceRegistry;

/// Everything a machine may touch while it runs.
///
/// Machines read the registry directly but only change it through
/// [`Context::actuate`]. Alerts are collected and published by the engine
/// after the state lock is released.
pub struct Context<'a> {
    pub registry: &'a mut DeviceRegistry,
    pub audit: &'a mut AuditLog,
    pub dispatcher: &'a ActionDispatcher,
    pub alerts: &'a mut Vec<Alert>,
    pub now: Timestamp,
}

impl Context<'_> {
    /// Write `patch` to the device bound to `role`, if one is bound.
    pub fn actuate(&mut self, role: Role, patch: DevicePatch) -> bool {
        let Some(id) = self.registry.role_id(role).cloned() else {
            tracing::debug!(%role, "actuator role unresolved, write skipped");
            return false;
        };
        self.dispatcher.apply(self.registry, &id, patch, self.now)
    }

    pub fn record(&mut self, entry: impl Into<AuditEntry>) {
        self.dispatcher.record(self.audit, entry.into());
    }

    pub fn raise(&mut self, alert: Alert) {
        self.alerts.push(alert);
    }

    #[must_use]
    pub fn role_id(&self, role: Role) -> Option<DeviceId> {
        self.registry.role_id(role).cloned()
    }
}
