//! Audit log handlers.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};

use nexushub_app::ports::DeviceStore;
use nexushub_domain::audit::AuditEntry;
use nexushub_domain::category::Subsystem;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/logs/{subsystem}`: newest local entries, display window only.
pub async fn recent<S>(
    State(state): State<AppState<S>>,
    Path(subsystem): Path<String>,
) -> Result<Json<Vec<AuditEntry>>, ApiError>
where
    S: DeviceStore + Send + Sync + 'static,
{
    let subsystem = Subsystem::from_str(&subsystem)?;
    Ok(Json(state.engine.recent_log(subsystem).await))
}

/// `GET /api/history/{subsystem}`: the store's records as of the last poll.
pub async fn history<S>(
    State(state): State<AppState<S>>,
    Path(subsystem): Path<String>,
) -> Result<Json<Vec<AuditEntry>>, ApiError>
where
    S: DeviceStore + Send + Sync + 'static,
{
    let subsystem = Subsystem::from_str(&subsystem)?;
    Ok(Json(state.engine.history(subsystem).await))
}
