//! Change-only command dispatch
//!
//! Compares a snapshot's targets with the [`StateCache`] and sends one
//! command per changed group:
//!
//! | group | command | changed when |
//! |-------|---------|--------------|
//! | speed | `pan_tilt_speed` | pan or tilt differs |
//! | speed | `zoom_speed` / `focus_speed` | that field differs |
//! | absolute | `pan_tilt` | pan or tilt differs |
//! | absolute | `zoom` / `focus` | that field differs |
//! | exposure | `exposure_manual` | any of gain, iris, shutter differs |
//!
//! Comparison is bit-exact. Unchanged groups send nothing and keep their
//! cached values.

use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::cache::StateCache;
use super::types::{same, CameraState};
use crate::connection::DeviceConnection;
use crate::error::BridgeError;
use crate::transport::DeviceCommand;

/// A command that could not be delivered this cycle
#[derive(Debug)]
pub struct DispatchFailure {
    pub command: DeviceCommand,
    pub error: BridgeError,
}

/// What one dispatch pass did
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Commands delivered, in send order
    pub sent: Vec<DeviceCommand>,
    /// Commands that changed but could not be delivered
    pub failed: Vec<DispatchFailure>,
}

impl DispatchReport {
    /// Nothing differed from the cache
    pub fn is_idle(&self) -> bool {
        self.sent.is_empty() && self.failed.is_empty()
    }

    /// Every failure was only a missing connection
    pub fn only_not_connected(&self) -> bool {
        !self.failed.is_empty() && self.failed.iter().all(|f| f.error.is_not_connected())
    }
}

/// Diffs snapshots against the cache and forwards the changes
#[derive(Debug, Default)]
pub struct ChangeDispatcher {
    cache: StateCache,
    /// Command kinds whose last send failed at the transport
    failing: HashSet<&'static str>,
}

impl ChangeDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &StateCache {
        &self.cache
    }

    /// Last dispatched values
    pub fn state(&self) -> &CameraState {
        self.cache.state()
    }

    /// Commands needed to bring the device from the cache to `target`
    pub fn pending(&self, target: &CameraState) -> Vec<DeviceCommand> {
        let cached = self.cache.state();
        let mut commands = Vec::new();

        // Speed values
        let (new, old) = (&target.speed, &cached.speed);
        if !same(old.pan, new.pan) || !same(old.tilt, new.tilt) {
            commands.push(DeviceCommand::PanTiltSpeed {
                pan: new.pan,
                tilt: new.tilt,
            });
        }
        if !same(old.zoom, new.zoom) {
            commands.push(DeviceCommand::ZoomSpeed(new.zoom));
        }
        if !same(old.focus, new.focus) {
            commands.push(DeviceCommand::FocusSpeed(new.focus));
        }

        // Absolute values
        let (new, old) = (&target.absolute, &cached.absolute);
        if !same(old.pan, new.pan) || !same(old.tilt, new.tilt) {
            commands.push(DeviceCommand::PanTilt {
                pan: new.pan,
                tilt: new.tilt,
            });
        }
        if !same(old.zoom, new.zoom) {
            commands.push(DeviceCommand::Zoom(new.zoom));
        }
        if !same(old.focus, new.focus) {
            commands.push(DeviceCommand::Focus(new.focus));
        }

        // Exposure values
        let (new, old) = (&target.exposure, &cached.exposure);
        if !same(old.iris, new.iris)
            || !same(old.gain, new.gain)
            || !same(old.shutter_speed, new.shutter_speed)
        {
            commands.push(DeviceCommand::Exposure {
                iris: new.iris,
                gain: new.gain,
                shutter_speed: new.shutter_speed,
            });
        }

        commands
    }

    /// Send every changed group and cache what the link accepted
    pub fn dispatch(
        &mut self,
        target: &CameraState,
        connection: &mut DeviceConnection,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        for command in self.pending(target) {
            match connection.send(command) {
                Ok(()) => {
                    if self.failing.remove(command.name()) {
                        info!("{} commands are getting through again", command.name());
                    }
                    self.cache.apply(&command);
                    report.sent.push(command);
                },
                Err(error) => {
                    if let BridgeError::Transport { .. } = error {
                        // Warn once per command kind until it succeeds again
                        if self.failing.insert(command.name()) {
                            warn!("⚠️  {}", error);
                        } else {
                            debug!("{}", error);
                        }
                    }
                    report.failed.push(DispatchFailure { command, error });
                },
            }
        }

        if report.only_not_connected() {
            debug!(
                "{} changed command(s) held back: no active device connection",
                report.failed.len()
            );
        }

        report
    }

    /// True while sends of `command` (a [`DeviceCommand::name`]) keep failing
    pub fn is_failing(&self, command: &str) -> bool {
        self.failing.contains(command)
    }

    /// Forget the cached values
    pub fn reset(&mut self) {
        self.cache.reset();
        self.failing.clear();
    }
}
