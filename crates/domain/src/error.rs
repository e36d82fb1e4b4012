//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts via `#[from]`.
//! Transport failures are never fatal; configuration failures always are.

/// Top-level error type for castkeep operations.
#[derive(Debug, thiserror::Error)]
pub enum CastKeepError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The startup configuration could not be turned into a valid plan.
    #[error("configuration error")]
    Config(#[from] ConfigurationError),

    /// A cast transport call failed. Always recoverable — retried next tick.
    #[error("transport error")]
    Transport(#[from] TransportError),
}

/// Violation of a domain invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("device must declare at least one dashboard window")]
    NoWindows,
    #[error("dashboard url must not be empty")]
    EmptyDashboardUrl,
    #[error("volume {0} is out of range (0-100)")]
    VolumeOutOfRange(u8),
    #[error("invalid time of day: {0:?} (expected HH:MM)")]
    InvalidTime(String),
    #[error("entity id must not be empty")]
    EmptyEntityId,
    #[error("cast interval must be non-zero")]
    ZeroInterval,
}

/// Fatal startup error: the loaded configuration does not describe a
/// runnable casting plan.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// A device entry failed validation.
    #[error("device {device:?}: {source}")]
    Device {
        device: String,
        #[source]
        source: ValidationError,
    },
    /// A state trigger references something that does not exist or
    /// failed validation.
    #[error("trigger for {device:?}: {reason}")]
    Trigger { device: String, reason: String },
    /// The global settings block failed validation.
    #[error("global settings: {source}")]
    Global {
        #[source]
        source: ValidationError,
    },
}

/// Classified failure of a single transport command.
///
/// Every variant is retried on the next tick; none of them ever
/// propagates as a crash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The command did not complete within the enforced deadline.
    #[error("command timed out after {0:?}")]
    Timeout(std::time::Duration),
    /// The device (or the transport binary itself) could not be reached.
    #[error("device unreachable: {0}")]
    DeviceUnreachable(String),
    /// The transport ran but refused the command.
    #[error("command rejected: {0}")]
    CommandRejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_validation_error_into_castkeep_error() {
        let err: CastKeepError = ValidationError::EmptyName.into();
        assert!(matches!(
            err,
            CastKeepError::Validation(ValidationError::EmptyName)
        ));
    }

    #[test]
    fn should_convert_transport_error_into_castkeep_error() {
        let err: CastKeepError = TransportError::CommandRejected("nope".to_string()).into();
        assert!(matches!(err, CastKeepError::Transport(_)));
    }

    #[test]
    fn should_render_device_configuration_error_with_device_name() {
        let err = ConfigurationError::Device {
            device: "Kitchen display".to_string(),
            source: ValidationError::NoWindows,
        };
        assert!(err.to_string().contains("Kitchen display"));
    }

    #[test]
    fn should_render_transport_timeout_with_duration() {
        let err = TransportError::Timeout(std::time::Duration::from_secs(10));
        assert!(err.to_string().contains("10s"));
    }
}
