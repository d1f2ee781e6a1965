//! Discovery backed by a configured source list
//!
//! Serves the sources listed in the config file. The list lives behind a
//! shared handle so a config reload can replace it while the bridge runs;
//! a refresh waiting on an empty list wakes up as soon as sources appear.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

use super::{DiscoveryService, Source};

#[derive(Default)]
struct Shared {
    sources: Mutex<Vec<Source>>,
    changed: Condvar,
}

/// Discovery service returning a configured, hot-replaceable source list
#[derive(Clone, Default)]
pub struct StaticDiscovery {
    shared: Arc<Shared>,
}

impl StaticDiscovery {
    pub fn new(sources: Vec<Source>) -> Self {
        let discovery = Self::default();
        discovery.replace(sources);
        discovery
    }

    /// Replace the advertised sources (picked up on the next refresh)
    pub fn replace(&self, sources: Vec<Source>) {
        *self.shared.sources.lock() = sources;
        self.shared.changed.notify_all();
    }

    pub fn advertised(&self) -> Vec<Source> {
        self.shared.sources.lock().clone()
    }
}

impl DiscoveryService for StaticDiscovery {
    fn current_sources(&mut self, timeout: Duration) -> Option<Vec<Source>> {
        let deadline = Instant::now() + timeout;
        let mut sources = self.shared.sources.lock();
        if sources.is_empty() {
            trace!("Waiting up to {}ms for sources", timeout.as_millis());
        }
        while sources.is_empty() {
            if self
                .shared
                .changed
                .wait_until(&mut sources, deadline)
                .timed_out()
            {
                break;
            }
        }

        if sources.is_empty() {
            None
        } else {
            Some(sources.clone())
        }
    }
}
