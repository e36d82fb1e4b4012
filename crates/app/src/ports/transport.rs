//! Transport port — the opaque device-control commands.
//!
//! The transport knows how to talk to a cast device; the application core
//! only cares about four commands and their success/failure outcomes.
//! Every call is expected to enforce its own timeout so a dead device can
//! never stall the scheduler.

use std::future::Future;

use castkeep_domain::error::TransportError;

/// Device-control commands exposed by the cast transport.
pub trait CastTransport: Send + Sync {
    /// Instruct the device to display the given URL.
    fn cast(
        &self,
        device: &str,
        url: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Stop whatever the device is currently showing.
    fn stop(&self, device: &str) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Set the device volume as a percentage (0-100).
    fn set_volume(
        &self,
        device: &str,
        percent: u8,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Query the device's raw status text.
    fn query_status(
        &self,
        device: &str,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;
}
