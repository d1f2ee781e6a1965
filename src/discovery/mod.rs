//! Source discovery
//!
//! The bridge never parses discovery traffic itself. It consumes a
//! [`DiscoveryService`] that reports the currently advertised sources, and
//! keeps the result in a [`SourceRegistry`] with replace-on-refresh semantics.

mod registry;
mod static_list;

use std::fmt;
use std::time::Duration;

pub use registry::SourceRegistry;
pub use static_list::StaticDiscovery;

/// A discoverable, network-addressable device
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Source {
    /// Display name as advertised
    pub name: String,
    /// Network endpoint (`host` or `host:port`)
    pub address: String,
}

impl Source {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.address)
    }
}

/// Discovery capability injected into the bridge
///
/// Implementations may block for up to `timeout`. Returning `None` means
/// "no change reported within the window"; the registry then keeps its
/// previous list.
pub trait DiscoveryService: Send {
    /// Wait up to `timeout` for the current set of advertised sources
    fn current_sources(&mut self, timeout: Duration) -> Option<Vec<Source>>;
}

/// How a snapshot identifies the source it wants bound
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum SourceSelector {
    /// No selection requested
    #[default]
    None,
    /// Position in the registry list (discovery order)
    Index(usize),
    /// Network address of the source
    Address(String),
}

impl SourceSelector {
    /// Parse a host-supplied identifier
    ///
    /// Empty or `"None"` selects nothing, `#N` or a bare integer selects by
    /// index, anything else is treated as an address.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
            return SourceSelector::None;
        }

        let digits = raw.strip_prefix('#').unwrap_or(raw);
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(index) = digits.parse::<usize>() {
                return SourceSelector::Index(index);
            }
        }

        SourceSelector::Address(raw.to_string())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, SourceSelector::None)
    }
}

impl fmt::Display for SourceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSelector::None => write!(f, "None"),
            SourceSelector::Index(i) => write!(f, "#{}", i),
            SourceSelector::Address(addr) => write!(f, "{}", addr),
        }
    }
}

impl From<&str> for SourceSelector {
    fn from(raw: &str) -> Self {
        SourceSelector::parse(raw)
    }
}
