use crate::planner::Formula;
use crate::probe::ProbeMode;
use serde::Serialize;

/// Everything the presentation layer is told about. Events are buffered in the order the
/// underlying state changes happened and drained by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LabEvent {
    Placed {
        id: u64,
        final_slot: usize,
        collision_count: usize,
        visited_slots: Vec<usize>,
        formula: Formula,
        /// Set for re-placements done by a rehash.
        rehash: bool,
    },
    /// Emitted before any of the re-placements of the rehash.
    Resized { old_size: usize, new_size: usize },
    Exhausted { id: u64, attempts: usize },
    Undone { id: u64, slot: usize },
    /// The saved batch was queued again after a mode change.
    Replayed { mode: ProbeMode, count: usize },
}

impl LabEvent {
    /// Serializes the event as one line of JSON.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
