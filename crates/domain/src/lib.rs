//! # nexushub-domain
//!
//! Pure domain model for the nexushub home-automation monitor.
//!
//! ## Responsibilities
//! - Foundational types: identifiers, error conventions, timestamps
//! - Define **Devices** (sensor/actuator records as the backing store exposes them)
//! - Derive the **SystemCategory** of a device (rack, access, energy, hub)
//! - Define the logical **Roles** a device can play for the safety machines
//! - Parse free-form device **readings** leniently, with per-field defaults
//! - Encode **actuator states** as explicit enums, translated to the store's
//!   boolean `powered` field only at the boundary
//! - Define **audit entries** (thermal, access, energy) and **alerts**
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod actuator;
pub mod alert;
pub mod audit;
pub mod category;
pub mod device;
mod lenient;
pub mod reading;
pub mod role;
