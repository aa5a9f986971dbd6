//! Role bindings and their resolution against the device collection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use nexushub_domain::id::DeviceId;
use nexushub_domain::role::Role;

/// Keyword used to find the device playing each [`Role`].
///
/// Every role always has a keyword: overrides replace the default, they
/// never remove it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Role, String>", into = "BTreeMap<Role, String>")]
pub struct RoleBindings(BTreeMap<Role, String>);

impl Default for RoleBindings {
    fn default() -> Self {
        Self(
            Role::ALL
                .into_iter()
                .map(|role| (role, role.default_keyword().to_string()))
                .collect(),
        )
    }
}

impl From<BTreeMap<Role, String>> for RoleBindings {
    fn from(overrides: BTreeMap<Role, String>) -> Self {
        overrides
            .into_iter()
            .fold(Self::default(), |bindings, (role, keyword)| {
                bindings.with(role, keyword)
            })
    }
}

impl From<RoleBindings> for BTreeMap<Role, String> {
    fn from(bindings: RoleBindings) -> Self {
        bindings.0
    }
}

impl RoleBindings {
    /// Replace the keyword of one role. Blank keywords are ignored.
    #[must_use]
    pub fn with(mut self, role: Role, keyword: impl Into<String>) -> Self {
        let keyword = keyword.into();
        if !keyword.trim().is_empty() {
            self.0.insert(role, keyword);
        }
        self
    }

    #[must_use]
    pub fn keyword(&self, role: Role) -> &str {
        self.0
            .get(&role)
            .map_or_else(|| role.default_keyword(), String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &str)> {
        self.0.iter().map(|(role, kw)| (*role, kw.as_str()))
    }
}

/// Roles resolved to concrete devices for one registry load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleMap(BTreeMap<Role, DeviceId>);

impl RoleMap {
    pub(crate) fn insert(&mut self, role: Role, id: DeviceId) {
        self.0.insert(role, id);
    }

    #[must_use]
    pub fn get(&self, role: Role) -> Option<&DeviceId> {
        self.0.get(&role)
    }

    /// Roles with no matching device, in declaration order.
    #[must_use]
    pub fn unresolved(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| !self.0.contains_key(role))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &DeviceId)> {
        self.0.iter().map(|(role, id)| (*role, id))
    }
}
