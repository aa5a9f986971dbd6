//! In-process alert bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use nexushub_domain::alert::Alert;
use nexushub_domain::error::NexusError;

use crate::ports::AlertPublisher;

/// In-process alert bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the alert is simply dropped).
#[derive(Debug, Clone)]
pub struct InProcessAlertBus {
    sender: broadcast::Sender<Alert>,
}

impl InProcessAlertBus {
    /// Create a new alert bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to alerts published *after* this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Alert> {
        self.sender.subscribe()
    }
}

impl AlertPublisher for InProcessAlertBus {
    fn publish(&self, alert: Alert) -> impl Future<Output = Result<(), NexusError>> + Send {
        // send only fails when nobody is listening
        let _ = self.sender.send(alert);
        async { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexushub_domain::alert::Severity;
    use nexushub_domain::category::Subsystem;

    fn alert(message: &str) -> Alert {
        Alert::new(
            Severity::Warn,
            Subsystem::Rack,
            message,
            nexushub_domain::time::now(),
        )
    }

    #[tokio::test]
    async fn should_deliver_alert_to_every_subscriber() {
        let bus = InProcessAlertBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let sent = alert("hot");
        let id = sent.id;
        bus.publish(sent).await.unwrap();

        assert_eq!(rx1.recv().await.unwrap().id, id);
        assert_eq!(rx2.recv().await.unwrap().id, id);
    }

    #[tokio::test]
    async fn should_succeed_when_no_subscribers() {
        let bus = InProcessAlertBus::new(16);
        assert!(bus.publish(alert("nobody")).await.is_ok());
    }

    #[tokio::test]
    async fn should_not_deliver_alerts_published_before_subscription() {
        let bus = InProcessAlertBus::new(16);
        bus.publish(alert("early")).await.unwrap();

        let mut rx = bus.subscribe();
        bus.publish(alert("late")).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().message, "late");
    }
}
