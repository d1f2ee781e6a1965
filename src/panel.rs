//! Host parameter panel
//!
//! Holds the values a host operator edits between cycles: the selected source
//! string and eleven float parameters. [`ParameterPanel::snapshot`] freezes
//! them into the [`ParameterSnapshot`] a cycle consumes.

use std::fmt;
use thiserror::Error;

use crate::bridge::DEFAULT_SELECTION;
use crate::discovery::SourceSelector;
use crate::state::{AbsoluteValues, CameraState, ExposureValues, ParameterSnapshot, SpeedValues};

/// Name of the source selection parameter
pub const SELECTION_PARAMETER: &str = "Availablesources";

#[derive(Debug, Error, PartialEq)]
pub enum PanelError {
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("invalid value '{value}' for {name}")]
    InvalidValue { name: String, value: String },
}

/// Float parameters exposed to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    SpeedPan,
    SpeedTilt,
    SpeedZoom,
    SpeedFocus,
    AbsPan,
    AbsTilt,
    AbsZoom,
    AbsFocus,
    Gain,
    Iris,
    ShutterSpeed,
}

/// Registration data for one float parameter
#[derive(Debug, Clone, Copy)]
pub struct ParameterDef {
    pub parameter: Parameter,
    pub name: &'static str,
    pub label: &'static str,
    pub default: f64,
    /// Slider range; advisory only
    pub slider: (f64, f64),
}

const fn def(
    parameter: Parameter,
    name: &'static str,
    label: &'static str,
    slider: (f64, f64),
) -> ParameterDef {
    ParameterDef {
        parameter,
        name,
        label,
        default: 0.0,
        slider,
    }
}

const BIPOLAR: (f64, f64) = (-1.0, 1.0);
const UNIPOLAR: (f64, f64) = (0.0, 1.0);

/// Every float parameter in registration order
pub const PARAMETERS: [ParameterDef; 11] = [
    def(Parameter::SpeedPan, "Speedpan", "Speed Pan", BIPOLAR),
    def(Parameter::SpeedTilt, "Speedtilt", "Speed Tilt", BIPOLAR),
    def(Parameter::SpeedZoom, "Speedzoom", "Speed Zoom", BIPOLAR),
    def(Parameter::SpeedFocus, "Speedfocus", "Speed Focus", BIPOLAR),
    def(Parameter::AbsPan, "Abspan", "Absolute Pan", BIPOLAR),
    def(Parameter::AbsTilt, "Abstilt", "Absolute Tilt", BIPOLAR),
    def(Parameter::AbsZoom, "Abszoom", "Absolute Zoom", UNIPOLAR),
    def(Parameter::AbsFocus, "Absfocus", "Absolute Focus", UNIPOLAR),
    def(Parameter::Gain, "Gain", "Gain", UNIPOLAR),
    def(Parameter::Iris, "Iris", "Iris", UNIPOLAR),
    def(Parameter::ShutterSpeed, "Shutterspeed", "Shutter Speed", UNIPOLAR),
];

/// Find a float parameter by name, ignoring case
pub fn lookup(name: &str) -> Option<&'static ParameterDef> {
    PARAMETERS.iter().find(|d| d.name.eq_ignore_ascii_case(name))
}

/// Momentary host actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pulse {
    /// Zero the diagnostics offset
    Reset,
    /// Refresh discovery and rebuild the source menu
    UpdateSources,
}

impl Pulse {
    pub fn parse(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("reset") {
            Some(Pulse::Reset)
        } else if name.eq_ignore_ascii_case("updatesources") {
            Some(Pulse::UpdateSources)
        } else {
            None
        }
    }
}

impl fmt::Display for Pulse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pulse::Reset => write!(f, "Reset"),
            Pulse::UpdateSources => write!(f, "Updatesources"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParameterPanel {
    values: [f64; PARAMETERS.len()],
    selection: String,
}

impl Default for ParameterPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterPanel {
    pub fn new() -> Self {
        let mut values = [0.0; PARAMETERS.len()];
        for (slot, def) in values.iter_mut().zip(PARAMETERS.iter()) {
            *slot = def.default;
        }
        Self {
            values,
            selection: DEFAULT_SELECTION.to_string(),
        }
    }

    // PARAMETERS lists variants in declaration order
    fn index(parameter: Parameter) -> usize {
        parameter as usize
    }

    pub fn value(&self, parameter: Parameter) -> f64 {
        self.values[Self::index(parameter)]
    }

    /// Current value of a float parameter by name
    pub fn get(&self, name: &str) -> Result<f64, PanelError> {
        let def = lookup(name).ok_or_else(|| PanelError::UnknownParameter(name.to_string()))?;
        Ok(self.value(def.parameter))
    }

    /// Set a float parameter by name; values outside the slider are kept as-is
    pub fn set(&mut self, name: &str, value: f64) -> Result<(), PanelError> {
        let def = lookup(name).ok_or_else(|| PanelError::UnknownParameter(name.to_string()))?;
        self.values[Self::index(def.parameter)] = value;
        Ok(())
    }

    /// Set any parameter, the selection included, from text
    pub fn apply(&mut self, name: &str, raw: &str) -> Result<(), PanelError> {
        if name.eq_ignore_ascii_case(SELECTION_PARAMETER) {
            self.select(raw);
            return Ok(());
        }

        let def = lookup(name).ok_or_else(|| PanelError::UnknownParameter(name.to_string()))?;
        let value: f64 = raw.trim().parse().map_err(|_| PanelError::InvalidValue {
            name: def.name.to_string(),
            value: raw.to_string(),
        })?;
        self.set(def.name, value)
    }

    pub fn select(&mut self, selection: &str) {
        self.selection = selection.trim().to_string();
    }

    pub fn selection(&self) -> &str {
        &self.selection
    }

    /// Every float parameter with its current value
    pub fn entries(&self) -> impl Iterator<Item = (&'static ParameterDef, f64)> + '_ {
        PARAMETERS.iter().zip(self.values.iter().copied())
    }

    /// Freeze the current values for one cycle
    pub fn snapshot(&self) -> ParameterSnapshot {
        let v = |p| self.value(p);
        let target = CameraState {
            absolute: AbsoluteValues {
                pan: v(Parameter::AbsPan),
                tilt: v(Parameter::AbsTilt),
                zoom: v(Parameter::AbsZoom),
                focus: v(Parameter::AbsFocus),
            },
            speed: SpeedValues {
                pan: v(Parameter::SpeedPan),
                tilt: v(Parameter::SpeedTilt),
                zoom: v(Parameter::SpeedZoom),
                focus: v(Parameter::SpeedFocus),
            },
            exposure: ExposureValues {
                gain: v(Parameter::Gain),
                iris: v(Parameter::Iris),
                shutter_speed: v(Parameter::ShutterSpeed),
            },
        };
        ParameterSnapshot::new(SourceSelector::parse(&self.selection), target)
    }
}
