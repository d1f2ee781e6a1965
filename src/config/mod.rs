//! Configuration module - YAML config loading and hot-reload
//!
//! ```yaml
//! bridge:
//!   receiver_name: "ptz-bridge"
//!   discovery_timeout_ms: 1000
//!   cycle_interval_ms: 33
//!   initial_selection: "None"
//! transport:
//!   kind: visca
//!   visca: { port: 52381, pan_limit: 2448, tilt_limit: 1296 }
//! sources:
//!   - name: "Stage Left"
//!     address: "192.168.1.50"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, warn};

use crate::bridge::{BridgeSettings, DEFAULT_SELECTION};
use crate::discovery::Source;
use crate::transport::visca::{ViscaSettings, MAX_POSITION_LIMIT};
use crate::transport::{ConsoleTransport, DeviceTransport, ViscaTransport};

pub mod watcher;

pub use watcher::ConfigWatcher;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    /// Sources advertised by the static discovery service
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BridgeConfig {
    /// Name this receiver announces itself with in logs
    #[serde(default = "default_receiver_name")]
    pub receiver_name: String,
    #[serde(default = "default_discovery_timeout_ms")]
    pub discovery_timeout_ms: u64,
    #[serde(default = "default_cycle_interval_ms")]
    pub cycle_interval_ms: u64,
    /// Selection applied before the first cycle ("None" for no selection)
    #[serde(default = "default_initial_selection")]
    pub initial_selection: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            receiver_name: default_receiver_name(),
            discovery_timeout_ms: default_discovery_timeout_ms(),
            cycle_interval_ms: default_cycle_interval_ms(),
            initial_selection: default_initial_selection(),
        }
    }
}

fn default_receiver_name() -> String { "ptz-bridge".to_string() }
fn default_discovery_timeout_ms() -> u64 { 1000 }
fn default_cycle_interval_ms() -> u64 { 33 }
fn default_initial_selection() -> String { DEFAULT_SELECTION.to_string() }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Visca,
    /// Log commands instead of sending them
    Console,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransportConfig {
    #[serde(default)]
    pub kind: TransportKind,
    #[serde(default)]
    pub visca: ViscaSettings,
}

impl TransportConfig {
    /// Build the transport this config describes
    pub fn build(&self) -> Box<dyn DeviceTransport> {
        match self.kind {
            TransportKind::Visca => Box::new(ViscaTransport::new(self.visca.clone())),
            TransportKind::Console => Box::new(ConsoleTransport::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceConfig {
    pub name: String,
    pub address: String,
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config = Self::from_yaml(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path))?;

        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.bridge.discovery_timeout_ms == 0 {
            anyhow::bail!("bridge.discovery_timeout_ms must be greater than 0");
        }
        if self.bridge.cycle_interval_ms == 0 {
            anyhow::bail!("bridge.cycle_interval_ms must be greater than 0");
        }

        let visca = &self.transport.visca;
        if visca.port == 0 {
            anyhow::bail!("transport.visca.port cannot be 0");
        }
        if visca.pan_limit > MAX_POSITION_LIMIT {
            anyhow::bail!("transport.visca.pan_limit must be at most {}", MAX_POSITION_LIMIT);
        }
        if visca.tilt_limit > MAX_POSITION_LIMIT {
            anyhow::bail!("transport.visca.tilt_limit must be at most {}", MAX_POSITION_LIMIT);
        }
        if !(1..=0x18).contains(&visca.max_pan_speed) {
            anyhow::bail!("transport.visca.max_pan_speed must be within 1..=24");
        }
        if !(1..=0x14).contains(&visca.max_tilt_speed) {
            anyhow::bail!("transport.visca.max_tilt_speed must be within 1..=20");
        }

        let mut seen = HashSet::new();
        for (i, source) in self.sources.iter().enumerate() {
            if source.name.trim().is_empty() {
                anyhow::bail!("Source {} has an empty name", i);
            }
            if source.address.trim().is_empty() {
                anyhow::bail!("Source '{}' has an empty address", source.name);
            }
            if !seen.insert(source.address.as_str()) {
                anyhow::bail!("Duplicate source address '{}'", source.address);
            }
        }

        Ok(())
    }

    pub fn bridge_settings(&self) -> BridgeSettings {
        BridgeSettings {
            discovery_timeout: Duration::from_millis(self.bridge.discovery_timeout_ms),
        }
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.bridge.cycle_interval_ms)
    }

    /// Configured sources in file order
    pub fn discovery_sources(&self) -> Vec<Source> {
        self.sources
            .iter()
            .map(|s| Source::new(s.name.clone(), s.address.clone()))
            .collect()
    }

    /// Configured sources with hostnames resolved to `ip:port`
    ///
    /// Links only accept literal addresses, so lookups happen here, off the
    /// control cycle. A name that does not resolve is kept as written and
    /// fails fast when selected.
    pub async fn resolved_sources(&self) -> Vec<Source> {
        let mut sources = Vec::with_capacity(self.sources.len());
        for source in self.discovery_sources() {
            let address = resolve_host(&source.address, self.transport.visca.port).await;
            sources.push(Source::new(source.name, address));
        }
        sources
    }
}

async fn resolve_host(address: &str, default_port: u16) -> String {
    let trimmed = address.trim();
    if trimmed.parse::<IpAddr>().is_ok() || trimmed.parse::<SocketAddr>().is_ok() {
        return address.to_string();
    }

    let (host, port) = match trimmed.rsplit_once(':') {
        Some((host, port)) => match port.parse::<u16>() {
            Ok(port) => (host, port),
            Err(_) => {
                warn!("Source address '{}' has an invalid port", address);
                return address.to_string();
            },
        },
        None => (trimmed, default_port),
    };

    match tokio::net::lookup_host((host, port)).await {
        Ok(mut addrs) => match addrs.next() {
            Some(addr) => {
                debug!("Resolved {} to {}", address, addr);
                addr.to_string()
            },
            None => {
                warn!("Source address '{}' did not resolve", address);
                address.to_string()
            },
        },
        Err(e) => {
            warn!("Failed to resolve source address '{}': {}", address, e);
            address.to_string()
        },
    }
}
