//! Error types for traffic-generator driver operations.
//!
//! All errors implement `std::error::Error` via `thiserror`.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for driver operations.
pub type TgnResult<T> = Result<T, TgnError>;

/// Errors that can occur while driving a traffic generator on behalf of a
/// reservation.
#[derive(Debug, Error)]
pub enum TgnError {
    /// A logical port in the loaded configuration has no reservation port
    /// carrying the same logical name.
    #[error("Configuration port \"{port}\" not found in reservation ports {available:?}")]
    UnboundPort {
        /// The unmatched logical port name.
        port: String,
        /// Logical names available in the reservation.
        available: Vec<String>,
    },

    /// Two reservation ports carry the same logical name.
    #[error("Logical name \"{name}\" is set on more than one reservation port: {resources:?}")]
    DuplicateLogicalName {
        /// The shared logical name.
        name: String,
        /// Resource names carrying it.
        resources: Vec<String>,
    },

    /// Two configuration ports resolve to the same reservation port.
    #[error("Configuration ports \"{first}\" and \"{second}\" both resolve to reservation port {resource}")]
    ConflictingBinding {
        /// The port bound first.
        first: String,
        /// The port that would take it over.
        second: String,
        /// The shared reservation resource.
        resource: String,
    },

    /// Statistics output kind is neither JSON nor CSV.
    #[error("Output type should be CSV/JSON - got \"{kind}\"")]
    UnsupportedFormat {
        /// The requested kind, as given.
        kind: String,
    },

    /// Writing to the reservation output or attachment channel failed.
    #[error("Failed to write to {channel}: {message}")]
    SinkWrite {
        /// The channel written to.
        channel: String,
        /// Error message.
        message: String,
    },

    /// The traffic-generator client reported a failure.
    #[error("IxNetwork operation failed: {operation}: {message}")]
    VendorSession {
        /// The operation that failed (e.g., "load_config", "reserve").
        operation: String,
        /// Error message.
        message: String,
    },

    /// The reservation service reported a failure.
    #[error("Reservation operation failed: {operation}: {message}")]
    Reservation {
        /// The operation that failed.
        operation: String,
        /// Error message.
        message: String,
    },

    /// A reserved port did not report link up in time.
    #[error("Port '{port}' did not come up within {timeout:?}")]
    PortNotUp {
        /// The logical port name.
        port: String,
        /// The timeout that expired.
        timeout: Duration,
    },

    /// Configuration validation error.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// A command was issued before `initialize` or after `cleanup`.
    #[error("No IxNetwork session is active")]
    NotInitialized,

    /// The command was interrupted because the session is being torn down.
    #[error("IxNetwork command cancelled: session is shutting down")]
    Cancelled,

    /// Internal error (unexpected state).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl TgnError {
    /// Creates a traffic-generator session error.
    pub fn vendor(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::VendorSession {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a reservation service error.
    pub fn reservation(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Reservation {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates an output sink error.
    pub fn sink(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this error came from matching configuration ports
    /// against the reservation.
    pub fn is_binding_error(&self) -> bool {
        matches!(
            self,
            TgnError::UnboundPort { .. }
                | TgnError::DuplicateLogicalName { .. }
                | TgnError::ConflictingBinding { .. }
        )
    }
}
