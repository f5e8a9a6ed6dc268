use crate::probe::ProbeMode;
use serde::Serialize;
use std::fmt;

/// Running totals for the current session. Rehash re-placements are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub items_processed: usize,
    pub collisions: usize,
}

impl SessionStats {
    /// Average collisions per processed item.
    pub fn ratio(&self) -> f64 {
        if self.items_processed == 0 {
            0.0
        } else {
            self.collisions as f64 / self.items_processed as f64
        }
    }

    pub fn efficiency(&self) -> Efficiency {
        Efficiency::rate(self.ratio())
    }

    pub(crate) fn add_items(&mut self, n: usize) {
        self.items_processed += n;
    }

    pub(crate) fn add_collisions(&mut self, n: usize) {
        self.collisions += n;
    }

    /// Takes back what one undone entry contributed.
    pub(crate) fn forget(&mut self, collisions: usize) {
        self.items_processed = self.items_processed.saturating_sub(1);
        self.collisions = self.collisions.saturating_sub(collisions);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Efficiency {
    /// At most half a collision per item.
    Excellent,
    /// At most one collision per item.
    Regular,
    Low,
}

impl Efficiency {
    pub fn rate(ratio: f64) -> Self {
        if ratio > 1.0 {
            Efficiency::Low
        } else if ratio > 0.5 {
            Efficiency::Regular
        } else {
            Efficiency::Excellent
        }
    }
}

impl fmt::Display for Efficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Efficiency::Excellent => "excellent",
            Efficiency::Regular => "regular",
            Efficiency::Low => "low (many collisions)",
        })
    }
}

/// Snapshot handed to whoever shows the end-of-session report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub mode: Option<ProbeMode>,
    pub items_processed: usize,
    pub collisions: usize,
    pub ratio: f64,
    pub efficiency: Efficiency,
    pub table_size: usize,
    pub stored: usize,
    pub load_factor: f64,
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode: String = self
            .mode
            .map(|m| m.to_string())
            .unwrap_or_else(|| "none".to_string());
        writeln!(f, "mode        {}", mode)?;
        writeln!(f, "items       {}", self.items_processed)?;
        writeln!(f, "collisions  {}", self.collisions)?;
        writeln!(f, "average     {:.2} collisions/item", self.ratio)?;
        writeln!(f, "efficiency  {}", self.efficiency)?;
        write!(
            f,
            "table       {} stored in {} slots (load {:.2})",
            self.stored, self.table_size, self.load_factor
        )
    }
}
