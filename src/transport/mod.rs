//! Device transports
//!
//! A [`DeviceTransport`] opens links to sources; a [`DeviceLink`] carries
//! individual PTZ commands to one device. The bridge only sees these traits,
//! so tests substitute a recording double for the network.

pub mod console;
pub mod visca;

use std::fmt;
use std::io;

use crate::discovery::Source;

pub use console::ConsoleTransport;
pub use visca::ViscaTransport;

/// A single command understood by a PTZ device
///
/// All values are normalised: positions and speeds in `[-1, 1]` (zoom and
/// focus positions in `[0, 1]`), exposure values in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceCommand {
    PanTilt { pan: f64, tilt: f64 },
    Zoom(f64),
    Focus(f64),
    PanTiltSpeed { pan: f64, tilt: f64 },
    ZoomSpeed(f64),
    FocusSpeed(f64),
    /// Manual exposure; always carries the full triple
    Exposure { iris: f64, gain: f64, shutter_speed: f64 },
}

impl DeviceCommand {
    /// Short command name for logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            DeviceCommand::PanTilt { .. } => "pan_tilt",
            DeviceCommand::Zoom(_) => "zoom",
            DeviceCommand::Focus(_) => "focus",
            DeviceCommand::PanTiltSpeed { .. } => "pan_tilt_speed",
            DeviceCommand::ZoomSpeed(_) => "zoom_speed",
            DeviceCommand::FocusSpeed(_) => "focus_speed",
            DeviceCommand::Exposure { .. } => "exposure_manual",
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceCommand::PanTilt { pan, tilt } | DeviceCommand::PanTiltSpeed { pan, tilt } => {
                write!(f, "{}(pan={}, tilt={})", self.name(), pan, tilt)
            },
            DeviceCommand::Zoom(v)
            | DeviceCommand::Focus(v)
            | DeviceCommand::ZoomSpeed(v)
            | DeviceCommand::FocusSpeed(v) => write!(f, "{}({})", self.name(), v),
            DeviceCommand::Exposure {
                iris,
                gain,
                shutter_speed,
            } => write!(
                f,
                "{}(iris={}, gain={}, shutter={})",
                self.name(),
                iris,
                gain,
                shutter_speed
            ),
        }
    }
}

/// An open link to one device
///
/// Sends must not block the control cycle.
pub trait DeviceLink: Send {
    fn send(&mut self, command: &DeviceCommand) -> io::Result<()>;

    /// Release the underlying handle
    fn close(&mut self) {}
}

/// Opens links to discovered sources
pub trait DeviceTransport: Send {
    /// Transport name for logs (e.g., "visca", "console")
    fn name(&self) -> &str;

    /// Open a link to `source.address`
    fn open(&mut self, source: &Source) -> io::Result<Box<dyn DeviceLink>>;
}
