//! State-store port — unordered key-value reads of external entity states.
//!
//! The host automation platform owns entity states; castkeep only reads
//! them. A read is infallible: an entity the store does not know about
//! simply yields `None`.

use std::future::Future;

/// Read access to the automation platform's entity states.
pub trait StateStore: Send + Sync {
    /// Current state of the entity, or `None` when unknown.
    fn get_state(&self, entity_id: &str) -> impl Future<Output = Option<String>> + Send;
}

/// A state store that knows nothing.
///
/// Used when no platform adapter is wired up; every gate then defaults to
/// satisfied and no trigger can ever hold an override alive beyond its
/// timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStateStore;

impl StateStore for NullStateStore {
    async fn get_state(&self, _entity_id: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_return_none_for_every_entity() {
        let store = NullStateStore;
        assert_eq!(store.get_state("light.kitchen").await, None);
        assert_eq!(store.get_state("").await, None);
    }
}
