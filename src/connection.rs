//! Device connection lifetime
//!
//! Owns at most one open [`DeviceLink`]. Opening a new link always closes the
//! previous one first, and a failed open leaves no link behind.

use tracing::{debug, info, warn};

use crate::discovery::Source;
use crate::error::{BridgeError, Result};
use crate::transport::{DeviceCommand, DeviceLink, DeviceTransport};

/// Connection to the one selected device
pub struct DeviceConnection {
    transport: Box<dyn DeviceTransport>,
    link: Option<Box<dyn DeviceLink>>,
    source: Option<Source>,
    /// Successful connects over the lifetime of this connection
    connect_count: u64,
}

impl DeviceConnection {
    pub fn new(transport: Box<dyn DeviceTransport>) -> Self {
        Self {
            transport,
            link: None,
            source: None,
            connect_count: 0,
        }
    }

    /// Tear down any current link, then open one to `source`
    pub fn connect_to(&mut self, source: &Source) -> Result<()> {
        self.close();

        info!(
            "🔌 Connecting to {} via {}",
            source,
            self.transport.name()
        );

        match self.transport.open(source) {
            Ok(link) => {
                self.link = Some(link);
                self.source = Some(source.clone());
                self.connect_count += 1;
                info!("✅ Connected to {}", source.name);
                Ok(())
            },
            Err(e) => {
                warn!("Error connecting to source {}: {}", source, e);
                Err(BridgeError::ConnectionError {
                    address: source.address.clone(),
                    reason: e.to_string(),
                })
            },
        }
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Source of the live link, if any
    pub fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }

    pub fn connect_count(&self) -> u64 {
        self.connect_count
    }

    /// Release the link; calling it while disconnected does nothing
    pub fn close(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.close();
            if let Some(source) = self.source.take() {
                debug!("Closed connection to {}", source);
            }
        }
        self.source = None;
    }

    /// Send one command over the live link
    pub fn send(&mut self, command: DeviceCommand) -> Result<()> {
        let link = self.link.as_mut().ok_or(BridgeError::NotConnected)?;
        link.send(&command).map_err(|source| BridgeError::Transport {
            command: command.name(),
            source,
        })?;
        debug!("→ {}", command);
        Ok(())
    }

    pub fn send_pan_tilt(&mut self, pan: f64, tilt: f64) -> Result<()> {
        self.send(DeviceCommand::PanTilt { pan, tilt })
    }

    pub fn send_zoom(&mut self, zoom: f64) -> Result<()> {
        self.send(DeviceCommand::Zoom(zoom))
    }

    pub fn send_focus(&mut self, focus: f64) -> Result<()> {
        self.send(DeviceCommand::Focus(focus))
    }

    pub fn send_pan_tilt_speed(&mut self, pan: f64, tilt: f64) -> Result<()> {
        self.send(DeviceCommand::PanTiltSpeed { pan, tilt })
    }

    pub fn send_zoom_speed(&mut self, speed: f64) -> Result<()> {
        self.send(DeviceCommand::ZoomSpeed(speed))
    }

    pub fn send_focus_speed(&mut self, speed: f64) -> Result<()> {
        self.send(DeviceCommand::FocusSpeed(speed))
    }

    /// Full absolute position: pan+tilt, then zoom, then focus
    pub fn send_absolute(&mut self, pan: f64, tilt: f64, zoom: f64, focus: f64) -> Result<()> {
        self.send_pan_tilt(pan, tilt)?;
        self.send_zoom(zoom)?;
        self.send_focus(focus)
    }

    /// Full speed set: pan+tilt, then zoom, then focus
    pub fn send_speed(&mut self, pan: f64, tilt: f64, zoom: f64, focus: f64) -> Result<()> {
        self.send_pan_tilt_speed(pan, tilt)?;
        self.send_zoom_speed(zoom)?;
        self.send_focus_speed(focus)
    }

    /// Manual exposure, always as a complete triple
    pub fn send_exposure(&mut self, gain: f64, iris: f64, shutter_speed: f64) -> Result<()> {
        self.send(DeviceCommand::Exposure {
            iris,
            gain,
            shutter_speed,
        })
    }
}

impl Drop for DeviceConnection {
    fn drop(&mut self) {
        self.close();
    }
}
