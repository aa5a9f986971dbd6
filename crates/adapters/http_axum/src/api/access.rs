//! Parcel box status and manual commands.

use axum::Json;
use axum::extract::State;

use nexushub_app::parcel_box::AccessStatus;
use nexushub_app::ports::DeviceStore;

use super::CommandResponse;
use crate::state::AppState;

/// `GET /api/access`
pub async fn status<S>(State(state): State<AppState<S>>) -> Json<AccessStatus>
where
    S: DeviceStore + Send + Sync + 'static,
{
    Json(state.engine.access_status().await)
}

/// `POST /api/access/unlock`
pub async fn unlock<S>(State(state): State<AppState<S>>) -> Json<CommandResponse<AccessStatus>>
where
    S: DeviceStore + Send + Sync + 'static,
{
    state.engine.unlock_box().await;
    Json(CommandResponse {
        applied: true,
        status: state.engine.access_status().await,
    })
}

/// `POST /api/access/lock`
pub async fn lock<S>(State(state): State<AppState<S>>) -> Json<CommandResponse<AccessStatus>>
where
    S: DeviceStore + Send + Sync + 'static,
{
    state.engine.lock_box().await;
    Json(CommandResponse {
        applied: true,
        status: state.engine.access_status().await,
    })
}

/// `POST /api/access/camera`: take a photo on demand.
pub async fn camera<S>(State(state): State<AppState<S>>) -> Json<CommandResponse<AccessStatus>>
where
    S: DeviceStore + Send + Sync + 'static,
{
    state.engine.trigger_camera().await;
    Json(CommandResponse {
        applied: true,
        status: state.engine.access_status().await,
    })
}
