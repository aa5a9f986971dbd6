//! Shared application state for axum handlers.

use std::sync::Arc;

use nexushub_app::alert_bus::InProcessAlertBus;
use nexushub_app::engine::Engine;
use nexushub_app::ports::DeviceStore;

/// Engine type served over HTTP: any store, alerts on the in-process bus.
pub type HubEngine<S> = Engine<S, InProcessAlertBus>;

/// Application state shared across all axum handlers.
///
/// Generic over the store type to avoid dynamic dispatch. `Clone` is
/// implemented manually so the store itself does not need to be `Clone`.
pub struct AppState<S> {
    pub engine: Arc<HubEngine<S>>,
    /// Bus the engine publishes to; each SSE client subscribes to it.
    pub alerts: InProcessAlertBus,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            alerts: self.alerts.clone(),
        }
    }
}

impl<S> AppState<S>
where
    S: DeviceStore + Send + Sync + 'static,
{
    pub fn new(engine: Arc<HubEngine<S>>, alerts: InProcessAlertBus) -> Self {
        Self { engine, alerts }
    }
}
