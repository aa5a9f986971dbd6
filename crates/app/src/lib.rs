//! # nexushub-app
//!
//! Application layer: the automation engine and its **port definitions**.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement (driven/outbound ports):
//!   - `DeviceStore`: poll the device and event collections, write back
//!     device patches and audit entries
//!   - `AlertPublisher`: hand alerts to the notification layer
//!   - `Clock`: stamp records
//! - Keep the engine's state: `DeviceRegistry`, `AuditLog`
//! - Run the safety machines: rack thermal protection, parcel box access,
//!   energy and gas rules
//! - Schedule the safety and overview polls and the one-second timers
//! - Provide **in-process infrastructure** (alert bus, write-back queue)
//!
//! ## Dependency rule
//! Depends on `nexushub-domain` only (plus `tokio` for channels, timers and
//! tasks). Never imports adapter crates. Adapters depend on *this* crate,
//! not the reverse.

pub mod alert_bus;
pub mod audit_log;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod energy;
pub mod engine;
pub mod overview;
pub mod parcel_box;
pub mod poll;
pub mod ports;
pub mod rack;
pub mod registry;
pub mod roles;

#[cfg(test)]
pub(crate) mod testing;
