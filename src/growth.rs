use crate::config::LabConfig;
use crate::planner::{self, InsertionTrace};
use crate::probe::ProbeMode;
use crate::slot_table::{Entry, SlotTable};
use std::fmt::Debug;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthState {
    Stable,
    Resizing,
}

/// Where one stored entry sits. The entry itself lives only in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    pub id: u64,
    pub slot: usize,
}

/// Result of storing one entry.
#[derive(Debug)]
pub struct StoreOutcome<T>
where
    T: Debug + Clone,
{
    pub trace: InsertionTrace,
    /// Table size the trace was computed against.
    pub size: usize,
    /// Handed back when planning was exhausted.
    pub unplaced: Option<Entry<T>>,
    /// Present when this placement pushed the load factor over the limit.
    pub resize: Option<ResizeReport<T>>,
}

/// What a rehash did, in the order it happened.
#[derive(Debug)]
pub struct ResizeReport<T>
where
    T: Debug + Clone,
{
    pub old_size: usize,
    pub new_size: usize,
    /// One trace per re-placed entry, in original storage order.
    pub replaced: Vec<(u64, InsertionTrace)>,
    /// Entries that found no slot in the new table. Doubling the table keeps this empty for
    /// every insertion sequence tried so far; the list is there so a table that was filled
    /// by other means still hands its leftovers to the caller.
    pub stranded: Vec<Entry<T>>,
}

/// Owns the table and the history of placements and doubles the table when it gets too
/// full.
#[derive(Debug, Clone)]
pub struct GrowthManager<T>
where
    T: Debug + Clone,
{
    table: SlotTable<T>,
    history: Vec<Placement>,
    max_load_factor: f64,
    state: GrowthState,
}

impl<T> GrowthManager<T>
where
    T: Debug + Clone,
{
    pub fn new(config: &LabConfig) -> Self {
        GrowthManager {
            table: SlotTable::with_size(config.initial_size),
            history: Vec::new(),
            max_load_factor: config.max_load_factor,
            state: GrowthState::Stable,
        }
    }

    #[inline]
    pub fn table(&self) -> &SlotTable<T> {
        &self.table
    }

    #[inline]
    pub fn history(&self) -> &[Placement] {
        &self.history
    }

    #[inline]
    pub fn state(&self) -> GrowthState {
        self.state
    }

    /// Is the load factor at or above the limit?
    #[inline]
    fn should_grow(&self) -> bool {
        self.table.load_factor() >= self.max_load_factor
    }

    /// Plans `entry` into the current table, records it and grows the table if needed.
    pub fn store(&mut self, mode: ProbeMode, entry: Entry<T>) -> StoreOutcome<T> {
        let size: usize = self.table.size();
        let (trace, unplaced) = self.place(mode, entry);
        let resize: Option<ResizeReport<T>> = if trace.succeeded {
            // only first placements count toward the session tally
            if let Some(stored) = self.table.last_mut(trace.final_slot) {
                stored.set_counted_collisions(trace.collision_count);
            }
            self.check_resize(mode)
        } else {
            None
        };
        StoreOutcome {
            trace,
            size,
            unplaced,
            resize,
        }
    }

    fn place(&mut self, mode: ProbeMode, entry: Entry<T>) -> (InsertionTrace, Option<Entry<T>>) {
        let id: u64 = entry.id;
        let (trace, unplaced) = planner::plan(&mut self.table, mode, entry);
        if trace.succeeded {
            self.history.push(Placement {
                id,
                slot: trace.final_slot,
            });
            debug!(
                id,
                slot = trace.final_slot,
                collisions = trace.collision_count,
                "placed"
            );
        }
        (trace, unplaced)
    }

    /// Grows the table when the load factor calls for it. A no-op while a resize is running.
    pub fn check_resize(&mut self, mode: ProbeMode) -> Option<ResizeReport<T>> {
        if self.state == GrowthState::Resizing || !self.should_grow() {
            return None;
        }
        Some(self.resize(mode))
    }

    fn resize(&mut self, mode: ProbeMode) -> ResizeReport<T> {
        self.state = GrowthState::Resizing;
        let old_size: usize = self.table.size();
        let new_size: usize = old_size * 2;
        info!(
            old_size,
            new_size,
            stored = self.table.count_stored(),
            "load limit reached, rehashing"
        );

        let placements: Vec<Placement> = std::mem::take(&mut self.history);
        let mut old_table: SlotTable<T> =
            std::mem::replace(&mut self.table, SlotTable::with_size(new_size));
        // newest first, so a repeated id in one chain hands back its newest copy
        let mut captured: Vec<Entry<T>> = placements
            .iter()
            .rev()
            .filter_map(|p| old_table.take(p.slot, p.id))
            .collect();
        captured.reverse();

        let mut replaced: Vec<(u64, InsertionTrace)> = Vec::with_capacity(captured.len());
        let mut stranded: Vec<Entry<T>> = Vec::new();
        for mut entry in captured {
            let id: u64 = entry.id;
            // counted_collisions rides along untouched, re-placements are not tallied
            entry.set_stored_slot(None);
            let (trace, unplaced) = self.place(mode, entry);
            if let Some(entry) = unplaced {
                stranded.push(entry);
            }
            replaced.push((id, trace));
        }

        self.state = GrowthState::Stable;
        ResizeReport {
            old_size,
            new_size,
            replaced,
            stranded,
        }
    }

    /// Takes the most recently stored entry back out of the table.
    pub fn undo_last(&mut self) -> Option<Entry<T>> {
        let last: Placement = self.history.pop()?;
        let mut entry: Entry<T> = self.table.take(last.slot, last.id)?;
        entry.set_stored_slot(None);
        Some(entry)
    }

    /// Stores `entry` at `slot` without planning, as if it had been placed there.
    #[cfg(test)]
    pub(crate) fn place_at(&mut self, slot: usize, entry: Entry<T>) {
        self.history.push(Placement { id: entry.id, slot });
        self.table.place(slot, entry);
    }
}
