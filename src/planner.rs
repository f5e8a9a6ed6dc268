use crate::probe::{double_hash_step, start_slot, ProbeMode, SECONDARY_MODULUS};
use crate::slot_table::{Entry, SlotTable};
use serde::Serialize;
use std::fmt::{self, Debug};

/// Outcome of one planning run. Consumed by the caller, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertionTrace {
    pub final_slot: usize,
    pub collision_count: usize,
    /// Every slot looked at, in order. The last one is the final slot on success.
    pub visited_slots: Vec<usize>,
    pub succeeded: bool,
}

/// Upper bound on open addressing attempts for a table of `size` slots.
///
/// Quadratic probing and double hashing with a fixed step do not reach every residue on
/// every table size, so the loop is cut off rather than trusted to find a hole.
#[inline]
pub fn attempt_limit(size: usize) -> usize {
    size.saturating_mul(2)
}

/// Finds a slot for `entry` and stores it there.
///
/// Returns the trace and, when no slot could be found, the entry itself so the caller can
/// keep it waiting. Chaining always succeeds.
pub fn plan<T>(
    table: &mut SlotTable<T>,
    mode: ProbeMode,
    mut entry: Entry<T>,
) -> (InsertionTrace, Option<Entry<T>>)
where
    T: Debug + Clone,
{
    let size: usize = table.size();
    let id: u64 = entry.id;
    entry.set_stored_slot(None);

    if !mode.is_open_addressing() {
        let start: usize = start_slot(id, size);
        let depth: usize = table.bucket(start).len();
        table.place(start, entry);
        let trace: InsertionTrace = InsertionTrace {
            final_slot: start,
            collision_count: depth,
            visited_slots: vec![start],
            succeeded: true,
        };
        return (trace, None);
    }

    let limit: usize = attempt_limit(size);
    let mut visited_slots: Vec<usize> = Vec::new();
    let mut i: usize = 0;
    while i < limit {
        let slot: usize = mode.candidate(id, i, size);
        visited_slots.push(slot);
        if table.is_empty(slot) {
            table.place(slot, entry);
            let trace: InsertionTrace = InsertionTrace {
                final_slot: slot,
                collision_count: i,
                visited_slots,
                succeeded: true,
            };
            return (trace, None);
        }
        i += 1;
    }

    let trace: InsertionTrace = InsertionTrace {
        final_slot: start_slot(id, size),
        collision_count: limit,
        visited_slots,
        succeeded: false,
    };
    (trace, Some(entry))
}

/// Human readable arithmetic behind a placement, as shown next to each item in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Formula {
    /// `"{id} % {size} = {start}"`
    pub base: String,
    /// How the final slot was reached after colliding. `None` without collisions.
    pub detail: Option<String>,
}

impl Formula {
    pub fn describe(id: u64, size: usize, mode: ProbeMode, trace: &InsertionTrace) -> Self {
        let start: usize = start_slot(id, size);
        let base: String = format!("{} % {} = {}", id, size, start);
        let i: usize = trace.collision_count;
        let slot: usize = trace.final_slot;
        let detail: Option<String> = if !trace.succeeded || i == 0 {
            None
        } else {
            Some(match mode {
                ProbeMode::Chaining => format!("chain depth {}", i),
                ProbeMode::Linear => format!("({} + {}) % {} = {}", start, i, size, slot),
                ProbeMode::Quadratic => format!("({} + {}²) % {} = {}", start, i, size, slot),
                ProbeMode::DoubleHash => {
                    let h2: u64 = double_hash_step(id);
                    format!(
                        "H2: {p} - ({id} % {p}) = {h2} -> ({start} + {i}×{h2}) % {size} = {slot}",
                        p = SECONDARY_MODULUS,
                    )
                }
            })
        };
        Formula { base, detail }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} | {}", self.base, detail),
            None => f.write_str(&self.base),
        }
    }
}
