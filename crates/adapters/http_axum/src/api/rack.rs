//! Rack status and manual commands.

use axum::Json;
use axum::extract::State;

use nexushub_app::ports::DeviceStore;
use nexushub_app::rack::RackStatus;

use super::CommandResponse;
use crate::state::AppState;

type RackResponse = Json<CommandResponse<RackStatus>>;

async fn respond<S>(state: &AppState<S>, applied: bool) -> RackResponse
where
    S: DeviceStore + Send + Sync + 'static,
{
    Json(CommandResponse {
        applied,
        status: state.engine.rack_status().await,
    })
}

/// `GET /api/rack`
pub async fn status<S>(State(state): State<AppState<S>>) -> Json<RackStatus>
where
    S: DeviceStore + Send + Sync + 'static,
{
    Json(state.engine.rack_status().await)
}

/// `POST /api/rack/fan-max`
pub async fn fan_max<S>(State(state): State<AppState<S>>) -> RackResponse
where
    S: DeviceStore + Send + Sync + 'static,
{
    state.engine.fan_max().await;
    respond(&state, true).await
}

/// `POST /api/rack/cancel-shutdown`: `applied` is false when no countdown
/// was running.
pub async fn cancel_shutdown<S>(State(state): State<AppState<S>>) -> RackResponse
where
    S: DeviceStore + Send + Sync + 'static,
{
    let applied = state.engine.cancel_shutdown().await;
    respond(&state, applied).await
}

/// `POST /api/rack/ssh-shutdown`
pub async fn ssh_shutdown<S>(State(state): State<AppState<S>>) -> RackResponse
where
    S: DeviceStore + Send + Sync + 'static,
{
    state.engine.trigger_ssh_shutdown().await;
    respond(&state, true).await
}

/// `POST /api/rack/cut-relay`
pub async fn cut_relay<S>(State(state): State<AppState<S>>) -> RackResponse
where
    S: DeviceStore + Send + Sync + 'static,
{
    state.engine.cut_rack_relay().await;
    respond(&state, true).await
}

/// `POST /api/rack/rearm`: only leaves `shutdown`.
pub async fn rearm<S>(State(state): State<AppState<S>>) -> RackResponse
where
    S: DeviceStore + Send + Sync + 'static,
{
    let applied = state.engine.rearm_rack().await;
    respond(&state, applied).await
}
