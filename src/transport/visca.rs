//! VISCA over IP transport
//!
//! Encodes [`DeviceCommand`]s as Sony VISCA payloads wrapped in the 8-byte
//! VISCA-over-IP header and sends them over a connected, non-blocking UDP
//! socket.
//!
//! ```text
//! ┌──────────────┬────────────────┬──────────────────┬──────────────┐
//! │ type (u16)   │ length (u16)   │ sequence (u32)   │ VISCA bytes  │
//! │ 0x0100 cmd   │ payload bytes  │ big-endian       │ 8x .. FF     │
//! └──────────────┴────────────────┴──────────────────┴──────────────┘
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use tracing::{debug, info, trace};

use super::{DeviceCommand, DeviceLink, DeviceTransport};
use crate::discovery::Source;

/// Default VISCA-over-IP UDP port
pub const DEFAULT_PORT: u16 = 52381;

/// Largest position limit that fits the signed 16-bit VISCA position
pub const MAX_POSITION_LIMIT: u16 = i16::MAX as u16;

const PAYLOAD_COMMAND: u16 = 0x0100;
const PAYLOAD_CONTROL: u16 = 0x0200;
const CAMERA_ADDRESS: u8 = 0x81;
const TERMINATOR: u8 = 0xFF;

const ZOOM_MAX: f64 = 0x4000 as f64;
const FOCUS_MAX: f64 = 0xF000 as f64;
const ZOOM_FOCUS_SPEED_MAX: f64 = 7.0;
const IRIS_MAX: f64 = 0x11 as f64;
const GAIN_MAX: f64 = 0x0F as f64;
const SHUTTER_MAX: f64 = 0x15 as f64;

/// Device unit ranges used to scale normalised values
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ViscaSettings {
    /// UDP port used when a source address has none
    #[serde(default = "default_port")]
    pub port: u16,
    /// Pan position reached at +/-1.0
    #[serde(default = "default_pan_limit")]
    pub pan_limit: u16,
    /// Tilt position reached at +/-1.0
    #[serde(default = "default_tilt_limit")]
    pub tilt_limit: u16,
    /// Pan drive speed at full deflection (VISCA 0x01..0x18)
    #[serde(default = "default_max_pan_speed")]
    pub max_pan_speed: u8,
    /// Tilt drive speed at full deflection (VISCA 0x01..0x14)
    #[serde(default = "default_max_tilt_speed")]
    pub max_tilt_speed: u8,
}

impl Default for ViscaSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            pan_limit: default_pan_limit(),
            tilt_limit: default_tilt_limit(),
            max_pan_speed: default_max_pan_speed(),
            max_tilt_speed: default_max_tilt_speed(),
        }
    }
}

fn default_port() -> u16 { DEFAULT_PORT }
fn default_pan_limit() -> u16 { 2448 }
fn default_tilt_limit() -> u16 { 1296 }
fn default_max_pan_speed() -> u8 { 0x18 }
fn default_max_tilt_speed() -> u8 { 0x14 }

/// Finite value clamped to `[lo, hi]`; NaN and infinities count as 0
fn unit(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_finite() {
        value.clamp(lo, hi)
    } else {
        0.0
    }
}

/// Split a 16-bit word into four low nibbles, most significant first
fn nibbles(word: u16) -> [u8; 4] {
    [
        ((word >> 12) & 0x0F) as u8,
        ((word >> 8) & 0x0F) as u8,
        ((word >> 4) & 0x0F) as u8,
        (word & 0x0F) as u8,
    ]
}

/// Signed position word for a normalised value; limits above
/// [`MAX_POSITION_LIMIT`] are capped so the result never saturates
fn position(value: f64, limit: u16) -> u16 {
    let limit = i16::try_from(limit).unwrap_or(i16::MAX);
    let scaled = (unit(value, -1.0, 1.0) * f64::from(limit)).round() as i16;
    scaled as u16
}

/// Drive speed byte for a signed speed, never 0
fn drive_speed(value: f64, max: u8) -> u8 {
    let scaled = (value.abs() * f64::from(max)).round() as u8;
    scaled.clamp(1, max.max(1))
}

/// Variable zoom/focus byte: `2p` for positive, `3p` for negative, `00` stop
fn variable_speed(value: f64) -> u8 {
    let v = unit(value, -1.0, 1.0);
    let p = (v.abs() * ZOOM_FOCUS_SPEED_MAX).round() as u8;
    if v > 0.0 {
        0x20 | p
    } else if v < 0.0 {
        0x30 | p
    } else {
        0x00
    }
}

fn direct_word(prefix: [u8; 4], value: f64, max: f64) -> Vec<u8> {
    let word = (unit(value, 0.0, 1.0) * max).round() as u16;
    let mut payload = prefix.to_vec();
    payload.extend_from_slice(&nibbles(word));
    payload.push(TERMINATOR);
    payload
}

fn direct_byte(category: u8, value: f64, max: f64) -> Vec<u8> {
    let v = (unit(value, 0.0, 1.0) * max).round() as u8;
    vec![
        CAMERA_ADDRESS,
        0x01,
        0x04,
        category,
        0x00,
        0x00,
        (v >> 4) & 0x0F,
        v & 0x0F,
        TERMINATOR,
    ]
}

/// VISCA payloads for one command
///
/// Exposure expands to four payloads (manual mode, iris, gain, shutter);
/// every other command is a single payload.
pub fn encode(command: &DeviceCommand, settings: &ViscaSettings) -> Vec<Vec<u8>> {
    match *command {
        DeviceCommand::PanTilt { pan, tilt } => {
            let pan = position(pan, settings.pan_limit);
            let tilt = position(tilt, settings.tilt_limit);

            let mut payload = vec![
                CAMERA_ADDRESS,
                0x01,
                0x06,
                0x02,
                settings.max_pan_speed,
                settings.max_tilt_speed,
            ];
            payload.extend_from_slice(&nibbles(pan));
            payload.extend_from_slice(&nibbles(tilt));
            payload.push(TERMINATOR);
            vec![payload]
        },
        DeviceCommand::Zoom(zoom) => {
            vec![direct_word([CAMERA_ADDRESS, 0x01, 0x04, 0x47], zoom, ZOOM_MAX)]
        },
        DeviceCommand::Focus(focus) => {
            vec![direct_word([CAMERA_ADDRESS, 0x01, 0x04, 0x48], focus, FOCUS_MAX)]
        },
        DeviceCommand::PanTiltSpeed { pan, tilt } => {
            let pan = unit(pan, -1.0, 1.0);
            let tilt = unit(tilt, -1.0, 1.0);

            // 01 left / 02 right / 03 stop, 01 up / 02 down / 03 stop
            let pan_dir = if pan < 0.0 { 0x01 } else if pan > 0.0 { 0x02 } else { 0x03 };
            let tilt_dir = if tilt > 0.0 { 0x01 } else if tilt < 0.0 { 0x02 } else { 0x03 };

            vec![vec![
                CAMERA_ADDRESS,
                0x01,
                0x06,
                0x01,
                drive_speed(pan, settings.max_pan_speed),
                drive_speed(tilt, settings.max_tilt_speed),
                pan_dir,
                tilt_dir,
                TERMINATOR,
            ]]
        },
        DeviceCommand::ZoomSpeed(speed) => {
            vec![vec![CAMERA_ADDRESS, 0x01, 0x04, 0x07, variable_speed(speed), TERMINATOR]]
        },
        DeviceCommand::FocusSpeed(speed) => {
            vec![vec![CAMERA_ADDRESS, 0x01, 0x04, 0x08, variable_speed(speed), TERMINATOR]]
        },
        DeviceCommand::Exposure {
            iris,
            gain,
            shutter_speed,
        } => vec![
            vec![CAMERA_ADDRESS, 0x01, 0x04, 0x39, 0x03, TERMINATOR],
            direct_byte(0x4B, iris, IRIS_MAX),
            direct_byte(0x4C, gain, GAIN_MAX),
            direct_byte(0x4A, shutter_speed, SHUTTER_MAX),
        ],
    }
}

/// Wrap a payload in the VISCA-over-IP header
pub fn frame(payload_type: u16, sequence: u32, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(8 + payload.len());
    buf.put_u16(payload_type);
    buf.put_u16(payload.len() as u16);
    buf.put_u32(sequence);
    buf.put_slice(payload);
    buf.freeze()
}

/// Parse a literal source address, falling back to `default_port`
///
/// Hostnames are rejected: a lookup here would stall the control cycle.
/// Config sources are resolved up front by `AppConfig::resolved_sources`.
fn socket_addr(address: &str, default_port: u16) -> io::Result<SocketAddr> {
    let address = address.trim();
    if address.is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty address"));
    }

    if let Ok(ip) = address.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, default_port));
    }
    address.parse::<SocketAddr>().map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{}' is not an IP address or IP:port", address),
        )
    })
}

/// UDP transport speaking VISCA over IP
#[derive(Debug, Clone, Default)]
pub struct ViscaTransport {
    settings: ViscaSettings,
}

impl ViscaTransport {
    pub fn new(settings: ViscaSettings) -> Self {
        Self { settings }
    }
}

impl DeviceTransport for ViscaTransport {
    fn name(&self) -> &str {
        "visca"
    }

    fn open(&mut self, source: &Source) -> io::Result<Box<dyn DeviceLink>> {
        let peer = socket_addr(&source.address, self.settings.port)?;
        let bind_addr = match peer {
            SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };

        let socket = UdpSocket::bind(bind_addr)?;
        socket.connect(peer)?;
        socket.set_nonblocking(true)?;

        let mut link = ViscaLink {
            socket,
            peer,
            settings: self.settings.clone(),
            sequence: 0,
        };
        link.reset_sequence()?;

        info!("📡 VISCA link open to {} at {}", source.name, peer);
        Ok(Box::new(link))
    }
}

struct ViscaLink {
    socket: UdpSocket,
    peer: SocketAddr,
    settings: ViscaSettings,
    sequence: u32,
}

impl ViscaLink {
    fn send_frame(&mut self, payload_type: u16, payload: &[u8]) -> io::Result<()> {
        let packet = frame(payload_type, self.sequence, payload);
        trace!("VISCA → {} {}", self.peer, hex::encode_upper(&packet));
        self.socket.send(&packet)?;
        self.sequence = self.sequence.wrapping_add(1);
        Ok(())
    }

    /// Ask the camera to restart its sequence counter
    fn reset_sequence(&mut self) -> io::Result<()> {
        self.sequence = 0;
        self.send_frame(PAYLOAD_CONTROL, &[0x01])?;
        self.sequence = 0;
        Ok(())
    }
}

impl DeviceLink for ViscaLink {
    fn send(&mut self, command: &DeviceCommand) -> io::Result<()> {
        for payload in encode(command, &self.settings) {
            self.send_frame(PAYLOAD_COMMAND, &payload)?;
        }
        Ok(())
    }

    fn close(&mut self) {
        debug!("VISCA link to {} closed", self.peer);
    }
}
