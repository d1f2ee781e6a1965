//! Bridge error taxonomy
//!
//! None of these are fatal: the control cycle logs them and degrades to
//! "no dispatch" until a later cycle succeeds.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by discovery, selection, connection and dispatch.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Discovery returned nothing (or failed) within the wait window
    #[error("Discovery unavailable: no sources reported within {}ms", timeout.as_millis())]
    DiscoveryUnavailable { timeout: Duration },

    /// A selection referenced a source index/address absent from the registry
    #[error("Source not found: {selector}")]
    NotFound { selector: String },

    /// Opening a link to a source failed
    #[error("Cannot connect to source at {address}: {reason}")]
    ConnectionError { address: String, reason: String },

    /// A command was attempted with no live connection
    #[error("No active device connection")]
    NotConnected,

    /// The link accepted the connection but a send failed
    #[error("Failed to send {command} command: {source}")]
    Transport {
        command: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl BridgeError {
    /// True for conditions that only mean "nothing was sent"
    pub fn is_not_connected(&self) -> bool {
        matches!(self, BridgeError::NotConnected)
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
