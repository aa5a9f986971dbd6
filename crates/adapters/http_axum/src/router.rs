//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use nexushub_app::ports::DeviceStore;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the API routes under `/api` and includes a [`TraceLayer`] that
/// logs each HTTP request/response at the `DEBUG` level.
pub fn build<S>(state: AppState<S>) -> Router
where
    S: DeviceStore + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::sync::{Arc, Mutex};

    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use nexushub_app::alert_bus::InProcessAlertBus;
    use nexushub_app::config::EngineConfig;
    use nexushub_app::engine::Engine;
    use nexushub_domain::audit::{AccessLogEntry, AuditEntry, EnergyEvent, ThermalEvent};
    use nexushub_domain::device::{Device, DeviceKind, DeviceStatus, DeviceWriteBack};
    use nexushub_domain::error::NexusError;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    /// Serves a fixed device list and records every write.
    #[derive(Default)]
    struct StubStore {
        devices: Vec<Device>,
        writes: Mutex<Vec<DeviceWriteBack>>,
    }

    impl DeviceStore for StubStore {
        fn fetch_devices(&self) -> impl Future<Output = Result<Vec<Device>, NexusError>> + Send {
            let devices = self.devices.clone();
            async move { Ok(devices) }
        }
        fn fetch_thermal_events(
            &self,
        ) -> impl Future<Output = Result<Vec<ThermalEvent>, NexusError>> + Send {
            async { Ok(vec![]) }
        }
        fn fetch_access_log(
            &self,
        ) -> impl Future<Output = Result<Vec<AccessLogEntry>, NexusError>> + Send {
            async { Ok(vec![]) }
        }
        fn fetch_energy_events(
            &self,
        ) -> impl Future<Output = Result<Vec<EnergyEvent>, NexusError>> + Send {
            async { Ok(vec![]) }
        }
        fn update_device(
            &self,
            write: &DeviceWriteBack,
        ) -> impl Future<Output = Result<(), NexusError>> + Send {
            self.writes.lock().unwrap().push(write.clone());
            async { Ok(()) }
        }
        fn append_entry(
            &self,
            _entry: &AuditEntry,
        ) -> impl Future<Output = Result<(), NexusError>> + Send {
            async { Ok(()) }
        }
    }

    fn device(id: &str, name: &str, kind: DeviceKind, location: &str, value: &str, powered: bool) -> Device {
        Device::builder()
            .id(id)
            .name(name)
            .kind(kind)
            .location(location)
            .status(DeviceStatus::Online)
            .value(value)
            .powered(powered)
            .build()
            .unwrap()
    }

    fn devices() -> Vec<Device> {
        vec![
            device("1", "Sensor DHT22 Rack", DeviceKind::Sensor, "Rack Servidor", "36 / 40%", true),
            device("3", "Extractor Rack", DeviceKind::Actuator, "Rack Servidor", "65", true),
            device("7", "Cerradura Caja", DeviceKind::Actuator, "Caja de paquetería", "CERRADA", false),
            device("13", "Relevador Sala", DeviceKind::Actuator, "Sala", "ENCENDIDO", true),
            device("15", "Válvula Gas", DeviceKind::Actuator, "Cocina", "ABIERTA", false),
        ]
    }

    async fn test_state() -> AppState<StubStore> {
        let store = StubStore {
            devices: devices(),
            ..StubStore::default()
        };
        let alerts = InProcessAlertBus::new(16);
        let engine = Arc::new(Engine::new(store, alerts.clone(), EngineConfig::default()));
        engine.run_safety_cycle().await;
        AppState::new(engine, alerts)
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let app = build(test_state().await);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_list_devices_with_category() {
        let (status, body) = call(build(test_state().await), "GET", "/api/devices", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 5);
        assert_eq!(body[0]["category"], "rack");
        assert_eq!(body[0]["name"], "Sensor DHT22 Rack");
    }

    #[tokio::test]
    async fn should_return_404_when_device_unknown() {
        let (status, body) = call(build(test_state().await), "GET", "/api/devices/99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Device 99 not found");
    }

    #[tokio::test]
    async fn should_return_400_when_subsystem_unknown() {
        let (status, _) = call(build(test_state().await), "GET", "/api/logs/garage", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_list_unresolved_roles() {
        let (status, body) = call(build(test_state().await), "GET", "/api/roles", None).await;
        assert_eq!(status, StatusCode::OK);
        let unresolved = body["unresolved"].as_array().unwrap();
        assert!(!unresolved.is_empty());
    }

    #[tokio::test]
    async fn should_force_fans_on_command() {
        let state = test_state().await;
        let (status, body) = call(build(state.clone()), "POST", "/api/rack/fan-max", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["applied"], true);
        assert_eq!(body["status"]["fan_percent"], 100);

        let (_, log) = call(build(state), "GET", "/api/logs/rack", None).await;
        assert_eq!(log.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_report_not_applied_when_no_countdown() {
        let app = build(test_state().await);
        let (status, body) = call(app, "POST", "/api/rack/cancel-shutdown", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["applied"], false);
    }

    #[tokio::test]
    async fn should_unlock_box_on_command() {
        let app = build(test_state().await);
        let (status, body) = call(app, "POST", "/api/access/unlock", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"]["state"], "open");
    }

    #[tokio::test]
    async fn should_cut_sector_relay_on_command() {
        let app = build(test_state().await);
        let (status, body) = call(
            app,
            "POST",
            "/api/energy/relay",
            Some(json!({ "sector": "sala", "on": false })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"]["sala_watts"], 0.0);
    }

    #[tokio::test]
    async fn should_reject_unknown_sector() {
        let app = build(test_state().await);
        let (status, _) = call(
            app,
            "POST",
            "/api/energy/relay",
            Some(json!({ "sector": "garage", "on": false })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn should_toggle_travel_mode() {
        let state = test_state().await;
        let (_, body) = call(build(state.clone()), "POST", "/api/energy/travel-mode", None).await;
        assert_eq!(body["status"]["travel_mode"], true);
        let (_, body) = call(build(state), "POST", "/api/energy/travel-mode", None).await;
        assert_eq!(body["status"]["travel_mode"], false);
    }

    #[tokio::test]
    async fn should_serve_overview_snapshot() {
        let state = test_state().await;
        state.engine.run_overview_cycle().await;
        let (status, body) = call(build(state), "GET", "/api/overview", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kpis"]["refreshCycles"], 1);
        assert_eq!(body["health"]["rack"], "normal");
    }

    #[tokio::test]
    async fn should_open_alert_stream() {
        let state = test_state().await;
        let response = build(state)
            .oneshot(
                Request::builder()
                    .uri("/api/alerts/stream")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
    }
}
