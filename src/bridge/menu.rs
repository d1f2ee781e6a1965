//! Selectable-source menu
//!
//! Built from the registry on explicit refresh only; cycles never touch it.

use crate::discovery::Source;

/// Value the host shows before anything is selected
pub const DEFAULT_SELECTION: &str = "None";

/// One `(address, display name)` menu entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub address: String,
    pub label: String,
}

#[derive(Debug, Clone, Default)]
pub struct SourceMenu {
    entries: Vec<MenuEntry>,
    revision: u64,
}

impl SourceMenu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all entries from a source list
    pub fn rebuild(&mut self, sources: &[Source]) {
        self.entries = sources
            .iter()
            .map(|s| MenuEntry {
                address: s.address.clone(),
                label: s.name.clone(),
            })
            .collect();
        self.revision += 1;
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    /// What the host offers: the default entry followed by every source
    pub fn choices(&self) -> Vec<MenuEntry> {
        let default = MenuEntry {
            address: DEFAULT_SELECTION.to_string(),
            label: DEFAULT_SELECTION.to_string(),
        };
        std::iter::once(default).chain(self.entries.iter().cloned()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Times the menu has been rebuilt
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn position(&self, address: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.address == address)
    }
}
