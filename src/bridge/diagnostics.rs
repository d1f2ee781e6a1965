//! Cycle diagnostics (execute counter and offset)

use std::fmt;

/// Counters exposed on the diagnostic surface
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    execute_count: u64,
    offset: f64,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn record_cycle(&mut self) -> u64 {
        self.execute_count += 1;
        self.execute_count
    }

    pub fn execute_count(&self) -> u64 {
        self.execute_count
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
    }

    /// Reset pulse: offset back to zero, the counter keeps running
    pub fn reset(&mut self) {
        self.offset = 0.0;
    }

    /// Named numeric info channels
    pub fn channels(&self) -> [(&'static str, f64); 2] {
        [
            ("executeCount", self.execute_count as f64),
            ("offset", self.offset),
        ]
    }

    /// Two-row, two-column key/value table
    pub fn table(&self) -> DiagnosticsTable {
        DiagnosticsTable {
            rows: [
                ["executeCount".to_string(), self.execute_count.to_string()],
                ["offset".to_string(), self.offset.to_string()],
            ],
        }
    }
}

/// Rendered diagnostic table
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticsTable {
    pub rows: [[String; 2]; 2],
}

impl DiagnosticsTable {
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

impl fmt::Display for DiagnosticsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.rows.iter().map(|r| r[0].len()).max().unwrap_or(0);
        for row in &self.rows {
            writeln!(f, "{:<width$}  {}", row[0], row[1], width = width)?;
        }
        Ok(())
    }
}
