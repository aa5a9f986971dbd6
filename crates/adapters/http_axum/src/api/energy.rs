//! Energy status and manual commands.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;

use nexushub_app::energy::EnergyStatus;
use nexushub_app::ports::DeviceStore;
use nexushub_domain::category::Sector;

use super::CommandResponse;
use crate::state::AppState;

type EnergyResponse = Json<CommandResponse<EnergyStatus>>;

#[derive(Debug, Deserialize)]
pub struct RelayRequest {
    pub sector: Sector,
    pub on: bool,
}

#[derive(Debug, Deserialize)]
pub struct GasValveRequest {
    pub open: bool,
}

async fn respond<S>(state: &AppState<S>) -> EnergyResponse
where
    S: DeviceStore + Send + Sync + 'static,
{
    Json(CommandResponse {
        applied: true,
        status: state.engine.energy_status().await,
    })
}

/// `GET /api/energy`
pub async fn status<S>(State(state): State<AppState<S>>) -> Json<EnergyStatus>
where
    S: DeviceStore + Send + Sync + 'static,
{
    Json(state.engine.energy_status().await)
}

/// `POST /api/energy/relay` with `{"sector": "sala", "on": false}`
pub async fn relay<S>(
    State(state): State<AppState<S>>,
    Json(req): Json<RelayRequest>,
) -> EnergyResponse
where
    S: DeviceStore + Send + Sync + 'static,
{
    state.engine.set_relay(req.sector, req.on).await;
    respond(&state).await
}

/// `POST /api/energy/gas-valve` with `{"open": true}`
pub async fn gas_valve<S>(
    State(state): State<AppState<S>>,
    Json(req): Json<GasValveRequest>,
) -> EnergyResponse
where
    S: DeviceStore + Send + Sync + 'static,
{
    state.engine.set_gas_valve(req.open).await;
    respond(&state).await
}

/// `POST /api/energy/travel-mode`: flips travel mode.
pub async fn travel_mode<S>(State(state): State<AppState<S>>) -> EnergyResponse
where
    S: DeviceStore + Send + Sync + 'static,
{
    state.engine.toggle_travel_mode().await;
    respond(&state).await
}
