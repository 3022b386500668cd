//! Error types surfaced by the scheduling core.

use thiserror::Error;

/// The primary error type for the QoS simulator.
///
/// Only caller contract violations end up here. Unknown stream ids and zero
/// denominators are resolved to documented fallbacks and never raised.
#[derive(Debug, Error)]
pub enum QosError {
    /// A packet field is outside its valid domain.
    #[error("invalid packet: {field} {reason}")]
    InvalidPacket {
        field: &'static str,
        reason: &'static str,
    },

    /// A packet or configuration document could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A configuration value was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The background ingest worker is gone or panicked.
    #[error("ingest worker: {0}")]
    Worker(String),

    /// An underlying I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, QosError>;

impl QosError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str) -> Self {
        QosError::InvalidPacket { field, reason }
    }

    /// Whether this error reports malformed caller input.
    pub fn is_rejected_input(&self) -> bool {
        matches!(self, QosError::InvalidPacket { .. } | QosError::Decode(_))
    }
}
