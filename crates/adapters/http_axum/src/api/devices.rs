//! JSON handlers for the device registry.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};

use nexushub_app::engine::{CategorizedDevice, RolesView};
use nexushub_app::ports::DeviceStore;
use nexushub_domain::id::DeviceId;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/devices`: the registry snapshot with derived categories.
pub async fn list<S>(State(state): State<AppState<S>>) -> Json<Vec<CategorizedDevice>>
where
    S: DeviceStore + Send + Sync + 'static,
{
    Json(state.engine.devices().await)
}

/// `GET /api/devices/{id}`
pub async fn get<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<CategorizedDevice>, ApiError>
where
    S: DeviceStore + Send + Sync + 'static,
{
    let device_id = DeviceId::from_str(&id)?;
    let device = state.engine.device(&device_id).await?;
    Ok(Json(device))
}

/// `GET /api/roles`: which device each role resolved to.
pub async fn roles<S>(State(state): State<AppState<S>>) -> Json<RolesView>
where
    S: DeviceStore + Send + Sync + 'static,
{
    Json(state.engine.roles().await)
}
