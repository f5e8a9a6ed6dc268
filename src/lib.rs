//! Collision resolution and rehashing engine for a hash table teaching lab.
//!
//! Items are identified by a non-negative integer and stored in a table of `size` slots at
//! `id % size`. When that slot is taken the selected [`ProbeMode`] decides where the item
//! goes instead, and every step of that decision is reported so it can be animated.

pub mod config;
pub mod error;
pub mod events;
pub mod growth;
pub mod item;
pub mod lab;
pub mod planner;
pub mod probe;
pub mod slot_table;
pub mod stats;

pub use config::LabConfig;
pub use error::{LabError, Result};
pub use events::LabEvent;
pub use growth::{GrowthManager, GrowthState, Placement};
pub use item::ItemKind;
pub use lab::{HashLab, ProcessSummary};
pub use planner::{plan, Formula, InsertionTrace};
pub use probe::ProbeMode;
pub use slot_table::{Entry, SlotTable};
pub use stats::{Efficiency, SessionReport, SessionStats};
