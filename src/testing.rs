//! Test doubles for the device transport

use parking_lot::Mutex;
use std::collections::HashSet;
use std::io;
use std::sync::Arc;

use crate::discovery::Source;
use crate::transport::{DeviceCommand, DeviceLink, DeviceTransport};

#[derive(Default)]
struct Inner {
    commands: Vec<DeviceCommand>,
    attempts: Vec<String>,
    opened: Vec<String>,
    closed: Vec<String>,
    fail_sends: bool,
}

/// Shared view of everything a [`RecordingTransport`] saw
#[derive(Clone, Default)]
pub struct TransportLog {
    inner: Arc<Mutex<Inner>>,
}

impl TransportLog {
    pub fn commands(&self) -> Vec<DeviceCommand> {
        self.inner.lock().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.inner.lock().commands.clear();
    }

    /// Every address an open was attempted for, including refused ones
    pub fn attempts(&self) -> Vec<String> {
        self.inner.lock().attempts.clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.inner.lock().opened.clone()
    }

    pub fn closed(&self) -> Vec<String> {
        self.inner.lock().closed.clone()
    }

    pub fn open_links(&self) -> usize {
        let inner = self.inner.lock();
        inner.opened.len() - inner.closed.len()
    }

    /// Make every following send fail with an I/O error
    pub fn fail_sends(&self, fail: bool) {
        self.inner.lock().fail_sends = fail;
    }
}

/// Transport that records opens, closes and commands instead of sending
pub struct RecordingTransport {
    log: TransportLog,
    rejected: HashSet<String>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            log: TransportLog::default(),
            rejected: HashSet::new(),
        }
    }

    /// Refuse to open links to `address`
    pub fn reject(mut self, address: &str) -> Self {
        self.rejected.insert(address.to_string());
        self
    }

    pub fn log(&self) -> TransportLog {
        self.log.clone()
    }
}

impl DeviceTransport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    fn open(&mut self, source: &Source) -> io::Result<Box<dyn DeviceLink>> {
        self.log.inner.lock().attempts.push(source.address.clone());
        if self.rejected.contains(&source.address) {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("{} refused", source.address),
            ));
        }

        self.log.inner.lock().opened.push(source.address.clone());
        Ok(Box::new(RecordingLink {
            address: source.address.clone(),
            log: self.log.clone(),
        }))
    }
}

struct RecordingLink {
    address: String,
    log: TransportLog,
}

impl DeviceLink for RecordingLink {
    fn send(&mut self, command: &DeviceCommand) -> io::Result<()> {
        let mut inner = self.log.inner.lock();
        if inner.fail_sends {
            return Err(io::Error::new(io::ErrorKind::WouldBlock, "send buffer full"));
        }
        inner.commands.push(*command);
        Ok(())
    }

    fn close(&mut self) {
        self.log.inner.lock().closed.push(self.address.clone());
    }
}
