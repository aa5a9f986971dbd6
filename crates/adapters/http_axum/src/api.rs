//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod access;
#[allow(clippy::missing_errors_doc)]
pub mod devices;
pub mod energy;
#[allow(clippy::missing_errors_doc)]
pub mod logs;
pub mod overview;
pub mod rack;
pub mod sse;

use axum::Router;
use axum::routing::{get, post};
use serde::Serialize;

use nexushub_app::ports::DeviceStore;

use crate::state::AppState;

/// Body returned by every manual command: whether the command changed
/// anything and the subsystem status afterwards.
#[derive(Debug, Serialize)]
pub struct CommandResponse<T> {
    pub applied: bool,
    pub status: T,
}

/// Build the `/api` sub-router.
pub fn routes<S>() -> Router<AppState<S>>
where
    S: DeviceStore + Send + Sync + 'static,
{
    Router::new()
        // Devices and roles
        .route("/devices", get(devices::list::<S>))
        .route("/devices/{id}", get(devices::get::<S>))
        .route("/roles", get(devices::roles::<S>))
        // Audit
        .route("/logs/{subsystem}", get(logs::recent::<S>))
        .route("/history/{subsystem}", get(logs::history::<S>))
        // Overview
        .route("/overview", get(overview::get::<S>))
        // Rack
        .route("/rack", get(rack::status::<S>))
        .route("/rack/fan-max", post(rack::fan_max::<S>))
        .route("/rack/cancel-shutdown", post(rack::cancel_shutdown::<S>))
        .route("/rack/ssh-shutdown", post(rack::ssh_shutdown::<S>))
        .route("/rack/cut-relay", post(rack::cut_relay::<S>))
        .route("/rack/rearm", post(rack::rearm::<S>))
        // Access
        .route("/access", get(access::status::<S>))
        .route("/access/unlock", post(access::unlock::<S>))
        .route("/access/lock", post(access::lock::<S>))
        .route("/access/camera", post(access::camera::<S>))
        // Energy
        .route("/energy", get(energy::status::<S>))
        .route("/energy/relay", post(energy::relay::<S>))
        .route("/energy/gas-valve", post(energy::gas_valve::<S>))
        .route("/energy/travel-mode", post(energy::travel_mode::<S>))
        // Alerts
        .route("/alerts/stream", get(sse::stream::<S>))
}
