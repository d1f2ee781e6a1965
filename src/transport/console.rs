//! Console transport - logs all commands for testing and debugging
//!
//! Useful for dry runs without a camera on the network.

use std::io;
use tracing::info;

use super::{DeviceCommand, DeviceLink, DeviceTransport};
use crate::discovery::Source;

/// Transport whose links only log what they would send
#[derive(Debug, Default)]
pub struct ConsoleTransport;

impl ConsoleTransport {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceTransport for ConsoleTransport {
    fn name(&self) -> &str {
        "console"
    }

    fn open(&mut self, source: &Source) -> io::Result<Box<dyn DeviceLink>> {
        if source.address.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "empty source address",
            ));
        }

        info!("🔌 Console link opened for {}", source);
        Ok(Box::new(ConsoleLink {
            target: source.to_string(),
            sent: 0,
        }))
    }
}

struct ConsoleLink {
    target: String,
    sent: u64,
}

impl DeviceLink for ConsoleLink {
    fn send(&mut self, command: &DeviceCommand) -> io::Result<()> {
        self.sent += 1;
        info!("🎥 [{}] #{} {}", self.target, self.sent, command);
        Ok(())
    }

    fn close(&mut self) {
        info!("Console link to {} closed after {} command(s)", self.target, self.sent);
    }
}
