//! # nexushub-adapter-store-http
//!
//! [`DeviceStore`](nexushub_app::ports::DeviceStore) implementation over the
//! REST record store that holds the device and audit collections.
//!
//! ## Responsibilities
//! - `GET /{collection}` for `devices`, `thermalEvents`, `accessLog` and
//!   `energyEvents`
//! - `PUT /devices/{id}` with the patch fields plus `lastPing`
//! - `POST /{collection}` for new audit records
//! - Skip individual records that do not decode instead of failing the
//!   whole collection
//!
//! ## Dependency rule
//! Depends on `nexushub-app` (for the port trait) and `nexushub-domain`.
//! The `app` and `domain` crates must never reference this adapter.

mod error;
mod store;

pub use error::StoreError;
pub use store::{Collection, HttpDeviceStore, HttpStoreConfig};
