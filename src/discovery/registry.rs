//! Registry of discovered sources

use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{DiscoveryService, Source, SourceSelector};
use crate::error::{BridgeError, Result};

/// Holds the current list of discoverable devices
///
/// The list is replaced wholesale on every successful refresh and is never
/// merged with the previous one. A failed or empty refresh leaves it as is.
pub struct SourceRegistry {
    discovery: Box<dyn DiscoveryService>,
    sources: Vec<Source>,
    /// Number of refreshes that replaced the list
    generation: u64,
}

impl SourceRegistry {
    pub fn new(discovery: Box<dyn DiscoveryService>) -> Self {
        Self {
            discovery,
            sources: Vec::new(),
            generation: 0,
        }
    }

    /// Query discovery and replace the list
    ///
    /// Blocks for at most `timeout`. Returns the new source count, or
    /// `DiscoveryUnavailable` when nothing was reported (the previous list is
    /// kept in that case).
    pub fn refresh(&mut self, timeout: Duration) -> Result<usize> {
        let found = match self.discovery.current_sources(timeout) {
            Some(found) if !found.is_empty() => found,
            _ => {
                warn!(
                    "No change to the sources found within {}ms, keeping {} known source(s)",
                    timeout.as_millis(),
                    self.sources.len()
                );
                return Err(BridgeError::DiscoveryUnavailable { timeout });
            },
        };

        // Keep discovery order, drop repeated addresses
        let mut seen = HashSet::new();
        let sources: Vec<Source> = found
            .into_iter()
            .filter(|s| seen.insert(s.address.clone()))
            .collect();

        self.sources = sources;
        self.generation += 1;

        info!("Network sources ({} found)", self.sources.len());
        for (i, source) in self.sources.iter().enumerate() {
            debug!("  {}. {}\t\t{}", i + 1, source.name, source.address);
        }

        Ok(self.sources.len())
    }

    /// Current sources in discovery order
    pub fn list(&self) -> &[Source] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn find_by_index(&self, index: usize) -> Result<&Source> {
        self.sources.get(index).ok_or_else(|| BridgeError::NotFound {
            selector: format!("#{}", index),
        })
    }

    pub fn find_by_address(&self, address: &str) -> Result<&Source> {
        self.sources
            .iter()
            .find(|s| s.address == address)
            .ok_or_else(|| BridgeError::NotFound {
                selector: address.to_string(),
            })
    }

    /// Resolve a selector to a known source
    pub fn resolve(&self, selector: &SourceSelector) -> Result<&Source> {
        match selector {
            SourceSelector::Index(i) => self.find_by_index(*i),
            SourceSelector::Address(addr) => self.find_by_address(addr),
            SourceSelector::None => Err(BridgeError::NotFound {
                selector: selector.to_string(),
            }),
        }
    }

    /// Drop every known source
    pub fn clear(&mut self) {
        self.sources.clear();
    }
}
