//! Event port — pushing entity state changes into the system.

use std::future::Future;

use castkeep_domain::error::CastKeepError;
use castkeep_domain::event::StateChange;

/// Publisher half of the state-change stream.
///
/// Adapters that observe the automation platform (MQTT, websocket, …)
/// publish every entity transition through this port; the scheduler
/// consumes the other end.
pub trait StateChangePublisher: Send + Sync {
    /// Publish a state change.
    fn publish(
        &self,
        change: StateChange,
    ) -> impl Future<Output = Result<(), CastKeepError>> + Send;
}
