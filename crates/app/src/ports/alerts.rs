//! Alert port: hand-off of alert descriptors to the notification layer.

use std::future::Future;

use nexushub_domain::alert::Alert;
use nexushub_domain::error::NexusError;

/// Publishes alerts to whoever presents them.
pub trait AlertPublisher {
    /// Publish an alert to all current subscribers.
    fn publish(&self, alert: Alert) -> impl Future<Output = Result<(), NexusError>> + Send;
}

impl<T: AlertPublisher + Send + Sync> AlertPublisher for std::sync::Arc<T> {
    fn publish(&self, alert: Alert) -> impl Future<Output = Result<(), NexusError>> + Send {
        (**self).publish(alert)
    }
}
