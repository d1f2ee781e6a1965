//! Last dispatched camera values

use super::types::CameraState;
use crate::transport::DeviceCommand;

/// Values most recently accepted by the device link
///
/// Only [`StateCache::apply`] writes here, and only for commands that were
/// sent successfully.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateCache {
    state: CameraState,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    /// Record the values carried by a dispatched command
    pub fn apply(&mut self, command: &DeviceCommand) {
        let state = &mut self.state;
        match *command {
            DeviceCommand::PanTilt { pan, tilt } => {
                state.absolute.pan = pan;
                state.absolute.tilt = tilt;
            },
            DeviceCommand::Zoom(zoom) => state.absolute.zoom = zoom,
            DeviceCommand::Focus(focus) => state.absolute.focus = focus,
            DeviceCommand::PanTiltSpeed { pan, tilt } => {
                state.speed.pan = pan;
                state.speed.tilt = tilt;
            },
            DeviceCommand::ZoomSpeed(speed) => state.speed.zoom = speed,
            DeviceCommand::FocusSpeed(speed) => state.speed.focus = speed,
            DeviceCommand::Exposure {
                iris,
                gain,
                shutter_speed,
            } => {
                state.exposure.iris = iris;
                state.exposure.gain = gain;
                state.exposure.shutter_speed = shutter_speed;
            },
        }
    }

    /// Forget everything (back to zeros)
    pub fn reset(&mut self) {
        self.state = CameraState::default();
    }
}
