//! Camera state and snapshot type definitions

use crate::discovery::SourceSelector;

/// Number of output channels reported every cycle
pub const CHANNEL_COUNT: usize = 11;

/// Output channel names, in report order
pub const CHANNEL_NAMES: [&str; CHANNEL_COUNT] = [
    "abs_pan",
    "abs_tilt",
    "abs_zoom",
    "abs_focus",
    "speed_pan",
    "speed_tilt",
    "speed_zoom",
    "speed_focus",
    "gain",
    "iris",
    "shutter_speed",
];

/// Name reported for indices past the defined channels
pub const UNKNOWN_CHANNEL: &str = "unknown_channel";

/// Name of the output channel at `index`
pub fn channel_name(index: usize) -> &'static str {
    CHANNEL_NAMES.get(index).copied().unwrap_or(UNKNOWN_CHANNEL)
}

/// Absolute position targets
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AbsoluteValues {
    pub pan: f64,
    pub tilt: f64,
    pub zoom: f64,
    pub focus: f64,
}

/// Movement speed targets
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpeedValues {
    pub pan: f64,
    pub tilt: f64,
    pub zoom: f64,
    pub focus: f64,
}

/// Manual exposure triple
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExposureValues {
    pub gain: f64,
    pub iris: f64,
    pub shutter_speed: f64,
}

/// The eleven controllable camera values
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraState {
    pub absolute: AbsoluteValues,
    pub speed: SpeedValues,
    pub exposure: ExposureValues,
}

impl CameraState {
    /// Values in output channel order
    pub fn channels(&self) -> [f64; CHANNEL_COUNT] {
        [
            self.absolute.pan,
            self.absolute.tilt,
            self.absolute.zoom,
            self.absolute.focus,
            self.speed.pan,
            self.speed.tilt,
            self.speed.zoom,
            self.speed.focus,
            self.exposure.gain,
            self.exposure.iris,
            self.exposure.shutter_speed,
        ]
    }

    /// `(name, value)` pairs in output channel order
    pub fn named_channels(&self) -> impl Iterator<Item = (&'static str, f64)> {
        CHANNEL_NAMES.into_iter().zip(self.channels())
    }
}

/// Full set of targets supplied for one control cycle
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterSnapshot {
    pub selection: SourceSelector,
    pub target: CameraState,
}

impl ParameterSnapshot {
    pub fn new(selection: SourceSelector, target: CameraState) -> Self {
        Self { selection, target }
    }
}

/// Bit-exact equality; `0.0` and `-0.0` differ, identical NaNs match
pub(crate) fn same(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits()
}
