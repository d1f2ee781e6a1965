//! Thread-shareable bridge handle
//!
//! A single mutex guards the whole bridge, and it is held for a complete
//! cycle, so no command can ever be sent with values from two snapshots.

use parking_lot::Mutex;
use std::sync::Arc;

use super::{Bridge, CycleOutput};
use crate::error::Result;
use crate::state::ParameterSnapshot;

/// Cloneable handle to one [`Bridge`]
#[derive(Clone)]
pub struct SharedBridge {
    inner: Arc<Mutex<Bridge>>,
}

impl SharedBridge {
    pub fn new(bridge: Bridge) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bridge)),
        }
    }

    /// Run one cycle under the bridge lock
    pub fn run_cycle(&self, snapshot: &ParameterSnapshot) -> CycleOutput {
        self.inner.lock().run_cycle(snapshot)
    }

    /// Blocking discovery refresh; cycles wait for it to finish
    pub fn refresh_sources(&self) -> Result<usize> {
        self.inner.lock().refresh_sources()
    }

    /// Access the bridge under the lock
    pub fn with<R>(&self, f: impl FnOnce(&mut Bridge) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn shutdown(&self) {
        self.inner.lock().shutdown();
    }
}
