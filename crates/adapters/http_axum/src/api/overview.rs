//! Overview board handler.

use axum::Json;
use axum::extract::State;

use nexushub_app::overview::OverviewSnapshot;
use nexushub_app::ports::DeviceStore;

use crate::state::AppState;

/// `GET /api/overview`: KPIs, health badges, sparklines and recent events.
pub async fn get<S>(State(state): State<AppState<S>>) -> Json<OverviewSnapshot>
where
    S: DeviceStore + Send + Sync + 'static,
{
    Json(state.engine.overview().await)
}
