//! Device registry: the engine's normalized view of the device collection.
//!
//! Each poll replaces the snapshot wholesale. Between polls the only writer
//! is the [`ActionDispatcher`](crate::dispatcher::ActionDispatcher), which
//! patches devices optimistically; those patches are remembered so the next
//! snapshot can be checked against them.

use std::collections::BTreeSet;

use serde::Serialize;

use nexushub_domain::category::SystemCategory;
use nexushub_domain::device::{Device, DevicePatch};
use nexushub_domain::id::DeviceId;
use nexushub_domain::role::Role;
use nexushub_domain::time::Timestamp;

use crate::roles::{RoleBindings, RoleMap};

/// First device in `devices` whose name contains `keyword`,
/// case-insensitively. A blank keyword matches nothing.
#[must_use]
pub fn find_by_keyword<'a>(devices: &'a [Device], keyword: &str) -> Option<&'a Device> {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    devices
        .iter()
        .find(|d| d.name.to_lowercase().contains(&needle))
}

/// One field where the store disagrees with a local optimistic patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub device_id: DeviceId,
    pub field: &'static str,
    pub expected: String,
    pub observed: String,
}

/// Result of comparing pending optimistic patches with a fresh snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub checked: usize,
    pub discrepancies: Vec<Discrepancy>,
}

impl ReconcileReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

#[derive(Debug, Clone)]
struct PendingPatch {
    device_id: DeviceId,
    patch: DevicePatch,
}

/// Normalized, queryable snapshot of all devices.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
    bindings: RoleBindings,
    roles: RoleMap,
    pending: Vec<PendingPatch>,
    last_unresolved: BTreeSet<Role>,
}

impl DeviceRegistry {
    #[must_use]
    pub fn new(bindings: RoleBindings) -> Self {
        Self {
            bindings,
            ..Self::default()
        }
    }

    /// Replace the whole snapshot with a fresh poll result.
    ///
    /// Pending optimistic patches are compared with the new snapshot first;
    /// the snapshot wins regardless. Roles are then re-resolved.
    pub fn upsert_all(&mut self, devices: Vec<Device>) -> ReconcileReport {
        let report = reconcile(&self.pending, &devices);
        for d in &report.discrepancies {
            tracing::warn!(
                device_id = %d.device_id,
                field = d.field,
                expected = %d.expected,
                observed = %d.observed,
                "store snapshot disagrees with optimistic write-back"
            );
        }
        self.pending.clear();
        self.devices = devices;
        self.resolve_roles();
        report
    }

    fn resolve_roles(&mut self) {
        let mut roles = RoleMap::default();
        for (role, keyword) in self.bindings.iter() {
            if let Some(device) = self.find_by_keyword(keyword) {
                roles.insert(role, device.id.clone());
            }
        }

        let unresolved: BTreeSet<Role> = roles.unresolved().into_iter().collect();
        for role in unresolved.difference(&self.last_unresolved) {
            tracing::warn!(
                %role,
                keyword = self.bindings.keyword(*role),
                "no device matches role, falling back to defaults"
            );
        }
        for role in self.last_unresolved.difference(&unresolved) {
            tracing::info!(%role, "role resolved");
        }
        self.last_unresolved = unresolved;
        self.roles = roles;
    }

    /// First device whose name contains `keyword`, case-insensitively.
    #[must_use]
    pub fn find_by_keyword(&self, keyword: &str) -> Option<&Device> {
        find_by_keyword(&self.devices, keyword)
    }

    #[must_use]
    pub fn category_of(&self, device: &Device) -> SystemCategory {
        SystemCategory::of(device)
    }

    #[must_use]
    pub fn get(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.iter().find(|d| &d.id == id)
    }

    /// The device currently bound to `role`, if any.
    #[must_use]
    pub fn device(&self, role: Role) -> Option<&Device> {
        self.roles.get(role).and_then(|id| self.get(id))
    }

    #[must_use]
    pub fn role_id(&self, role: Role) -> Option<&DeviceId> {
        self.roles.get(role)
    }

    #[must_use]
    pub fn roles(&self) -> &RoleMap {
        &self.roles
    }

    #[must_use]
    pub fn bindings(&self) -> &RoleBindings {
        &self.bindings
    }

    #[must_use]
    pub fn unresolved_roles(&self) -> Vec<Role> {
        self.roles.unresolved()
    }

    #[must_use]
    pub fn all(&self) -> &[Device] {
        &self.devices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Patch a device in place and remember the patch until the next poll.
    ///
    /// Returns `false` when the device is not in the snapshot.
    pub(crate) fn apply_patch(
        &mut self,
        id: &DeviceId,
        patch: &DevicePatch,
        at: Timestamp,
    ) -> bool {
        let Some(device) = self.devices.iter_mut().find(|d| &d.id == id) else {
            return false;
        };
        device.apply_patch(patch, at);
        self.pending.push(PendingPatch {
            device_id: id.clone(),
            patch: patch.clone(),
        });
        true
    }
}

fn reconcile(pending: &[PendingPatch], snapshot: &[Device]) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    // Later patches to the same device supersede earlier ones.
    for (idx, p) in pending.iter().enumerate() {
        report.checked += 1;
        let superseded = |field: fn(&DevicePatch) -> bool| {
            pending[idx + 1..]
                .iter()
                .any(|later| later.device_id == p.device_id && field(&later.patch))
        };
        let Some(device) = snapshot.iter().find(|d| d.id == p.device_id) else {
            report.discrepancies.push(Discrepancy {
                device_id: p.device_id.clone(),
                field: "device",
                expected: "present".to_string(),
                observed: "missing".to_string(),
            });
            continue;
        };
        if let Some(value) = &p.patch.value
            && !superseded(|l| l.value.is_some())
            && device.value.as_deref() != Some(value.as_str())
        {
            report.discrepancies.push(Discrepancy {
                device_id: p.device_id.clone(),
                field: "value",
                expected: value.clone(),
                observed: device.value.clone().unwrap_or_default(),
            });
        }
        if let Some(powered) = p.patch.powered
            && !superseded(|l| l.powered.is_some())
            && device.powered != powered
        {
            report.discrepancies.push(Discrepancy {
                device_id: p.device_id.clone(),
                field: "powered",
                expected: powered.to_string(),
                observed: device.powered.to_string(),
            });
        }
        if let Some(status) = p.patch.status
            && !superseded(|l| l.status.is_some())
            && device.status != status
        {
            report.discrepancies.push(Discrepancy {
                device_id: p.device_id.clone(),
                field: "status",
                expected: status.to_string(),
                observed: device.status.to_string(),
            });
        }
    }
    report
}
