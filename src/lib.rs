//! PTZ Bridge - drive a network PTZ camera from per-cycle parameter snapshots
//!
//! Each control cycle hands the [`Bridge`] a [`ParameterSnapshot`]: a source
//! selection plus eleven target values. The bridge keeps one device
//! connection bound to the selected source and sends only the command groups
//! whose values changed since the last successful send.

pub mod bridge;
pub mod cli;
pub mod config;
pub mod connection;
pub mod discovery;
pub mod error;
pub mod panel;
pub mod paths;
pub mod state;
pub mod transport;

#[cfg(test)]
mod testing;

pub use bridge::{Bridge, BridgeSettings, CycleOutput, CycleState, Selection, SharedBridge};
pub use discovery::{DiscoveryService, Source, SourceSelector, StaticDiscovery};
pub use error::{BridgeError, Result};
pub use panel::{ParameterPanel, Pulse};
pub use state::{CameraState, ParameterSnapshot};
pub use transport::{DeviceCommand, DeviceLink, DeviceTransport};
