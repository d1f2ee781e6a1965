//! Bridge module - per-cycle orchestration
//!
//! The [`Bridge`] owns every piece of runtime state for one camera bridge:
//! - the source registry and the selectable-source menu
//! - the single device connection
//! - the dispatcher and its cache of last dispatched values
//! - cycle diagnostics
//!
//! The host calls [`Bridge::run_cycle`] once per control cycle. Cycles never
//! overlap; use [`SharedBridge`] when more than one thread drives the bridge.

mod diagnostics;
mod menu;
mod shared;

#[cfg(test)]
mod tests;

use std::fmt;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::connection::DeviceConnection;
use crate::discovery::{DiscoveryService, Source, SourceRegistry, SourceSelector};
use crate::error::{BridgeError, Result};
use crate::state::{CameraState, ChangeDispatcher, DispatchReport, ParameterSnapshot, CHANNEL_COUNT};
use crate::transport::DeviceTransport;

pub use diagnostics::{Diagnostics, DiagnosticsTable};
pub use menu::{MenuEntry, SourceMenu, DEFAULT_SELECTION};
pub use shared::SharedBridge;

/// Default bounded wait for a discovery refresh
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_millis(1000);

/// Tunables for one bridge instance
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// Upper bound on a blocking discovery refresh
    pub discovery_timeout: Duration,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
        }
    }
}

/// Where the selection state machine currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleState {
    /// No live connection
    Idle,
    /// Connected to `source`
    Bound { source: Source },
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleState::Idle => write!(f, "idle"),
            CycleState::Bound { source } => write!(f, "bound to {}", source),
        }
    }
}

/// Result of handling a snapshot's selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Nothing to do (no request, or already bound to it)
    Unchanged,
    /// A new connection was established
    Connected(Source),
}

/// Everything a cycle reports back to the host
#[derive(Debug)]
pub struct CycleOutput {
    /// Value of the execute counter after this cycle
    pub cycle: u64,
    /// Last dispatched values in output channel order
    pub channels: [f64; CHANNEL_COUNT],
    pub state: CycleState,
    /// Outcome of the selection step
    pub selection: Result<Selection>,
    pub dispatch: DispatchReport,
}

/// One camera bridge: discovery, connection, dispatch and diagnostics
pub struct Bridge {
    settings: BridgeSettings,
    registry: SourceRegistry,
    menu: SourceMenu,
    connection: DeviceConnection,
    dispatcher: ChangeDispatcher,
    diagnostics: Diagnostics,
    /// Selector the live connection was made for
    bound: Option<SourceSelector>,
    /// Last selector that failed, for warn-once logging
    last_failure: Option<SourceSelector>,
}

impl Bridge {
    pub fn new(
        discovery: Box<dyn DiscoveryService>,
        transport: Box<dyn DeviceTransport>,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            settings,
            registry: SourceRegistry::new(discovery),
            menu: SourceMenu::new(),
            connection: DeviceConnection::new(transport),
            dispatcher: ChangeDispatcher::new(),
            diagnostics: Diagnostics::new(),
            bound: None,
            last_failure: None,
        }
    }

    /// Refresh the registry and rebuild the source menu
    ///
    /// Blocks for at most the configured discovery timeout. On
    /// `DiscoveryUnavailable` both the registry and the menu keep their
    /// previous contents.
    pub fn refresh_sources(&mut self) -> Result<usize> {
        let count = self.registry.refresh(self.settings.discovery_timeout)?;
        self.menu.rebuild(self.registry.list());
        Ok(count)
    }

    pub fn sources(&self) -> &[Source] {
        self.registry.list()
    }

    pub fn menu(&self) -> &SourceMenu {
        &self.menu
    }

    pub fn state(&self) -> CycleState {
        match self.connection.source() {
            Some(source) if self.connection.is_connected() => CycleState::Bound {
                source: source.clone(),
            },
            _ => CycleState::Idle,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Last dispatched camera values
    pub fn camera_state(&self) -> &CameraState {
        self.dispatcher.state()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Successful connects so far
    pub fn connect_count(&self) -> u64 {
        self.connection.connect_count()
    }

    /// Handle a selection request
    ///
    /// Only a selector that differs from the one the live connection was made
    /// for triggers a connect. Unknown selectors leave the current connection
    /// in place.
    ///
    /// Selectors are compared as given, not as resolved. An index selector
    /// such as `#0` stays bound to the device it first resolved to, even if a
    /// later refresh reorders the list and puts another device at that index.
    /// Supplying a different selector re-resolves against the current list.
    pub fn select(&mut self, selector: &SourceSelector) -> Result<Selection> {
        if selector.is_none() {
            return Ok(Selection::Unchanged);
        }
        if self.connection.is_connected() && self.bound.as_ref() == Some(selector) {
            return Ok(Selection::Unchanged);
        }

        let resolved = self.registry.resolve(selector).map(Source::clone);
        let source = match resolved {
            Ok(source) => source,
            Err(e) => {
                self.log_failure(selector, &e);
                return Err(e);
            },
        };

        // Same device reached through a different selector
        if self.connection.is_connected() && self.connection.source() == Some(&source) {
            debug!("Selector {} resolves to the bound source {}", selector, source);
            self.bound = Some(selector.clone());
            return Ok(Selection::Unchanged);
        }

        info!("Selected source changed: {}", selector);
        match self.connection.connect_to(&source) {
            Ok(()) => {
                self.bound = Some(selector.clone());
                self.last_failure = None;
                Ok(Selection::Connected(source))
            },
            Err(e) => {
                self.bound = None;
                self.log_failure(selector, &e);
                Err(e)
            },
        }
    }

    fn log_failure(&mut self, selector: &SourceSelector, error: &BridgeError) {
        if self.last_failure.as_ref() == Some(selector) {
            debug!("Selection {} still failing: {}", selector, error);
        } else {
            warn!("⚠️  Selection {} failed: {}", selector, error);
            self.last_failure = Some(selector.clone());
        }
    }

    /// Run one control cycle
    pub fn run_cycle(&mut self, snapshot: &ParameterSnapshot) -> CycleOutput {
        let cycle = self.diagnostics.record_cycle();
        trace!("Cycle {} (selection {})", cycle, snapshot.selection);

        let selection = self.select(&snapshot.selection);
        let dispatch = self
            .dispatcher
            .dispatch(&snapshot.target, &mut self.connection);

        if !dispatch.sent.is_empty() {
            debug!("Cycle {}: dispatched {} command(s)", cycle, dispatch.sent.len());
        }

        CycleOutput {
            cycle,
            channels: self.dispatcher.state().channels(),
            state: self.state(),
            selection,
            dispatch,
        }
    }

    /// Close the connection and forget all sources
    pub fn shutdown(&mut self) {
        info!("Shutting down bridge");
        self.connection.close();
        self.registry.clear();
        self.bound = None;
        self.last_failure = None;
    }
}
