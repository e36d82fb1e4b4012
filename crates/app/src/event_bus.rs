//! In-process state-change bus backed by a tokio broadcast channel.

use tokio::sync::broadcast;

use castkeep_domain::error::CastKeepError;
use castkeep_domain::event::StateChange;

use crate::ports::StateChangePublisher;

/// In-process state-change bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the change is simply dropped).
pub struct StateChangeBus {
    sender: broadcast::Sender<StateChange>,
}

impl StateChangeBus {
    /// Create a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to state changes on this bus.
    ///
    /// Returns a receiver that will get all changes published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.sender.subscribe()
    }
}

impl Clone for StateChangeBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl StateChangePublisher for StateChangeBus {
    async fn publish(&self, change: StateChange) -> Result<(), CastKeepError> {
        // broadcast::send fails only when there are zero receivers,
        // which is fine — we simply ignore the error.
        let _ = self.sender.send(change);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_deliver_change_to_subscriber() {
        let bus = StateChangeBus::new(16);
        let mut rx = bus.subscribe();

        let change = StateChange::new("binary_sensor.doorbell", Some("off".to_string()), "on");
        let change_id = change.id;

        bus.publish(change).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, change_id);
    }

    #[tokio::test]
    async fn should_deliver_change_to_multiple_subscribers() {
        let bus = StateChangeBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let change = StateChange::new("light.kitchen", None, "on");
        let change_id = change.id;

        bus.publish(change).await.unwrap();

        assert_eq!(rx1.recv().await.unwrap().id, change_id);
        assert_eq!(rx2.recv().await.unwrap().id, change_id);
    }

    #[tokio::test]
    async fn should_succeed_when_no_subscribers() {
        let bus = StateChangeBus::new(16);
        let change = StateChange::new("light.kitchen", None, "off");
        assert!(bus.publish(change).await.is_ok());
    }

    #[tokio::test]
    async fn should_not_deliver_changes_published_before_subscription() {
        let bus = StateChangeBus::new(16);

        bus.publish(StateChange::new("light.kitchen", None, "on"))
            .await
            .unwrap();

        let mut rx = bus.subscribe();

        let later = StateChange::new("light.kitchen", None, "off");
        let later_id = later.id;
        bus.publish(later).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().id, later_id);
    }
}
