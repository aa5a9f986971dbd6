//! Server-Sent Events (SSE) stream of alerts.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use nexushub_app::ports::DeviceStore;

use crate::state::AppState;

/// `GET /api/alerts/stream`: SSE stream of alerts as they are raised.
///
/// Each alert is sent as an `alert` event whose data is the JSON-encoded
/// alert. The stream continues until the client disconnects.
pub async fn stream<S>(
    State(state): State<AppState<S>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>
where
    S: DeviceStore + Send + Sync + 'static,
{
    let alert_rx = state.alerts.subscribe();
    let alert_stream = BroadcastStream::new(alert_rx).filter_map(|result| match result {
        Ok(alert) => match serde_json::to_string(&alert) {
            Ok(json) => Some(Ok(Event::default().event("alert").data(json))),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize alert for SSE stream");
                None
            }
        },
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(n)) => {
            tracing::warn!(skipped = n, "SSE subscriber lagged, some alerts were dropped");
            None
        }
    });

    Sse::new(alert_stream).keep_alive(KeepAlive::default())
}
