use crate::config::LabConfig;
use crate::error::{LabError, Result};
use crate::events::LabEvent;
use crate::growth::{GrowthManager, Placement, ResizeReport, StoreOutcome};
use crate::item::ItemKind;
use crate::planner::{attempt_limit, Formula, InsertionTrace};
use crate::probe::ProbeMode;
use crate::slot_table::{Entry, SlotTable};
use crate::stats::{SessionReport, SessionStats};
use rand::Rng;
use std::collections::VecDeque;
use std::fmt::Debug;
use tracing::{debug, info, warn};

/// Totals of one [`HashLab::process_all`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    pub placed: usize,
    pub exhausted: usize,
}

/// One teaching session: the selected probe mode, the table, the items still waiting to
/// be placed and everything the presentation layer needs to hear about.
///
/// Items are queued with [`insert`](Self::insert) and placed one at a time, in arrival
/// order, by [`process_next`](Self::process_next). Each placement is decided once, against
/// the table as it is when the item reaches the front of the queue.
#[derive(Debug, Clone)]
pub struct HashLab<T>
where
    T: Debug + Clone,
{
    config: LabConfig,
    mode: Option<ProbeMode>,
    growth: GrowthManager<T>,
    pending: VecDeque<Entry<T>>,
    waiting: Vec<Entry<T>>,
    /// Every item inserted and not undone, replayed when the mode changes.
    saved: Vec<(u64, T)>,
    stats: SessionStats,
    events: Vec<LabEvent>,
}

impl<T> HashLab<T>
where
    T: Debug + Clone,
{
    pub fn new(config: LabConfig) -> Result<Self> {
        config.validate()?;
        Ok(HashLab {
            config,
            mode: None,
            growth: GrowthManager::new(&config),
            pending: VecDeque::new(),
            waiting: Vec::new(),
            saved: Vec::new(),
            stats: SessionStats::default(),
            events: Vec::new(),
        })
    }

    pub fn with_mode(config: LabConfig, mode: ProbeMode) -> Result<Self> {
        let mut lab: HashLab<T> = Self::new(config)?;
        lab.mode = Some(mode);
        Ok(lab)
    }

    #[inline]
    pub fn config(&self) -> &LabConfig {
        &self.config
    }

    #[inline]
    pub fn mode(&self) -> Option<ProbeMode> {
        self.mode
    }

    #[inline]
    pub fn table(&self) -> &SlotTable<T> {
        self.growth.table()
    }

    /// Where each stored entry went, oldest first.
    #[inline]
    pub fn history(&self) -> &[Placement] {
        self.growth.history()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.growth.table().size()
    }

    #[inline]
    pub fn count_stored(&self) -> usize {
        self.growth.table().count_stored()
    }

    #[inline]
    pub fn load_factor(&self) -> f64 {
        self.growth.table().load_factor()
    }

    #[inline]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Items that could not be placed and are sitting outside the table.
    #[inline]
    pub fn waiting(&self) -> &[Entry<T>] {
        &self.waiting
    }

    #[inline]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    #[inline]
    pub fn saved_batch(&self) -> &[(u64, T)] {
        &self.saved
    }

    fn require_mode(&self) -> Result<ProbeMode> {
        self.mode.ok_or(LabError::InvalidMode)
    }

    fn clear_table(&mut self) {
        self.growth = GrowthManager::new(&self.config);
        self.pending.clear();
        self.waiting.clear();
        self.stats = SessionStats::default();
    }

    /// Switches the collision strategy. The table starts over at its initial size and the
    /// items inserted so far are queued again, in their original order.
    pub fn set_probe_mode(&mut self, mode: ProbeMode) {
        info!(%mode, replay = self.saved.len(), "probe mode selected");
        self.mode = Some(mode);
        self.clear_table();
        if self.saved.is_empty() {
            return;
        }
        for (id, payload) in self.saved.iter() {
            self.pending.push_back(Entry::new(*id, payload.clone()));
        }
        self.stats.add_items(self.saved.len());
        self.events.push(LabEvent::Replayed {
            mode,
            count: self.saved.len(),
        });
    }

    /// Forgets everything, including the items kept for replay. The mode stays.
    pub fn reset(&mut self) {
        self.saved.clear();
        self.events.clear();
        self.clear_table();
    }

    /// Queues an item for placement.
    pub fn insert(&mut self, id: u64, payload: T) -> Result<()> {
        self.require_mode()?;
        self.saved.push((id, payload.clone()));
        self.pending.push_back(Entry::new(id, payload));
        self.stats.add_items(1);
        Ok(())
    }

    /// Queues every item of `items`, keeping their order. Returns how many were queued.
    pub fn insert_batch<I>(&mut self, items: I) -> Result<usize>
    where
        I: IntoIterator<Item = (u64, T)>,
    {
        self.require_mode()?;
        let mut n: usize = 0;
        for (id, payload) in items {
            self.insert(id, payload)?;
            n += 1;
        }
        debug!(n, "batch queued");
        Ok(n)
    }

    /// Places the item at the front of the queue. `Ok(None)` when the queue is empty.
    ///
    /// An item that finds no slot is moved to the waiting list and reported as
    /// [`LabError::InsertionExhausted`]; the session carries on.
    pub fn process_next(&mut self) -> Result<Option<InsertionTrace>> {
        let mode: ProbeMode = self.require_mode()?;
        let entry: Entry<T> = match self.pending.pop_front() {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let id: u64 = entry.id;
        let outcome: StoreOutcome<T> = self.growth.store(mode, entry);

        if let Some(entry) = outcome.unplaced {
            let attempts: usize = outcome.trace.visited_slots.len();
            warn!(id, attempts, size = outcome.size, %mode, "no free slot found");
            self.waiting.push(entry);
            self.events.push(LabEvent::Exhausted { id, attempts });
            return Err(LabError::InsertionExhausted { id, attempts });
        }

        self.stats.add_collisions(outcome.trace.collision_count);
        self.events.push(LabEvent::Placed {
            id,
            final_slot: outcome.trace.final_slot,
            collision_count: outcome.trace.collision_count,
            visited_slots: outcome.trace.visited_slots.clone(),
            formula: Formula::describe(id, outcome.size, mode, &outcome.trace),
            rehash: false,
        });
        if let Some(report) = outcome.resize {
            self.record_resize(mode, report);
        }
        Ok(Some(outcome.trace))
    }

    /// Reports a rehash. Entries the bigger table could not take join the waiting list,
    /// which doubling has not been seen to produce on its own.
    fn record_resize(&mut self, mode: ProbeMode, report: ResizeReport<T>) {
        self.events.push(LabEvent::Resized {
            old_size: report.old_size,
            new_size: report.new_size,
        });
        for (id, trace) in report.replaced {
            if trace.succeeded {
                let formula: Formula = Formula::describe(id, report.new_size, mode, &trace);
                self.events.push(LabEvent::Placed {
                    id,
                    final_slot: trace.final_slot,
                    collision_count: trace.collision_count,
                    visited_slots: trace.visited_slots,
                    formula,
                    rehash: true,
                });
            } else {
                self.events.push(LabEvent::Exhausted {
                    id,
                    attempts: attempt_limit(report.new_size),
                });
            }
        }
        if !report.stranded.is_empty() {
            warn!(
                stranded = report.stranded.len(),
                new_size = report.new_size,
                "entries lost their slot during rehash"
            );
            self.waiting.extend(report.stranded);
        }
    }

    /// Drains the whole queue. Exhausted items are counted, not fatal.
    pub fn process_all(&mut self) -> Result<ProcessSummary> {
        let mut summary: ProcessSummary = ProcessSummary::default();
        loop {
            match self.process_next() {
                Ok(Some(_)) => summary.placed += 1,
                Ok(None) => break,
                Err(LabError::InsertionExhausted { .. }) => summary.exhausted += 1,
                Err(e) => return Err(e),
            }
        }
        Ok(summary)
    }

    /// Sends the waiting items back to the end of the queue. Returns how many moved.
    pub fn retry_waiting(&mut self) -> usize {
        let n: usize = self.waiting.len();
        self.pending.extend(self.waiting.drain(..));
        n
    }

    /// Takes the most recently stored item out of the table and out of the session.
    pub fn undo_last(&mut self) -> Result<Entry<T>> {
        let slot: Option<usize> = self.growth.history().last().map(|p| p.slot);
        let entry: Entry<T> = self.growth.undo_last().ok_or(LabError::UndoEmpty)?;
        if let Some(i) = self.saved.iter().rposition(|(id, _)| *id == entry.id) {
            self.saved.remove(i);
        }
        self.stats.forget(entry.counted_collisions());
        if let Some(slot) = slot {
            self.events.push(LabEvent::Undone { id: entry.id, slot });
        }
        debug!(id = entry.id, "undone");
        Ok(entry)
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            mode: self.mode,
            items_processed: self.stats.items_processed,
            collisions: self.stats.collisions,
            ratio: self.stats.ratio(),
            efficiency: self.stats.efficiency(),
            table_size: self.size(),
            stored: self.count_stored(),
            load_factor: self.load_factor(),
        }
    }

    pub fn drain_events(&mut self) -> Vec<LabEvent> {
        std::mem::take(&mut self.events)
    }
}

impl HashLab<ItemKind> {
    /// Queues one item with a random id and kind. Returns the id.
    pub fn add_random_item<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<u64> {
        let id: u64 = ItemKind::random_id(rng);
        self.insert(id, ItemKind::random(rng))?;
        Ok(id)
    }

    /// Queues `count` random items. Returns their ids in queue order.
    pub fn add_random_batch<R: Rng + ?Sized>(&mut self, rng: &mut R, count: usize) -> Result<Vec<u64>> {
        self.require_mode()?;
        let mut ids: Vec<u64> = Vec::with_capacity(count);
        for _ in 0..count {
            ids.push(self.add_random_item(rng)?);
        }
        Ok(ids)
    }

    /// Queues a sword whose id lands on a slot that is already taken.
    pub fn force_collision<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<u64> {
        self.require_mode()?;
        let occupied: Vec<usize> = self.table().occupied_slots();
        if occupied.is_empty() {
            return Err(LabError::EmptyTable);
        }
        let target: usize = occupied[rng.gen_range(0..occupied.len())];
        let multiple: u64 = rng.gen_range(1..=50);
        let id: u64 = multiple * self.size() as u64 + target as u64;
        self.insert(id, ItemKind::Sword)?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn lab(mode: ProbeMode) -> HashLab<ItemKind> {
        HashLab::with_mode(LabConfig::default(), mode).unwrap()
    }

    #[test]
    fn insert_needs_a_mode() {
        let mut lab: HashLab<ItemKind> = HashLab::new(LabConfig::default()).unwrap();
        assert_eq!(lab.insert(1, ItemKind::Sword), Err(LabError::InvalidMode));
        assert_eq!(lab.process_next(), Err(LabError::InvalidMode));
        assert_eq!(lab.pending_len(), 0);
        assert!(lab.saved_batch().is_empty());
    }

    #[test]
    fn rejects_bad_config() {
        let config: LabConfig = LabConfig::default().with_max_load_factor(1.5);
        assert!(matches!(
            HashLab::<ItemKind>::new(config),
            Err(LabError::Configuration { .. })
        ));
    }

    #[test]
    fn queue_is_first_in_first_out() {
        let mut lab: HashLab<ItemKind> = lab(ProbeMode::Linear);
        lab.insert_batch([(3, ItemKind::Sword), (13, ItemKind::HealthPotion), (23, ItemKind::ManaPotion)])
            .unwrap();
        let summary: ProcessSummary = lab.process_all().unwrap();
        assert_eq!(summary, ProcessSummary { placed: 3, exhausted: 0 });
        let layout: Vec<Vec<u64>> = lab.table().layout();
        assert_eq!((layout[3].clone(), layout[4].clone(), layout[5].clone()), (vec![3], vec![13], vec![23]));
        assert_eq!(lab.stats().collisions, 0 + 1 + 2);
    }

    #[test]
    fn placement_and_resize_events_are_ordered() {
        let mut lab: HashLab<ItemKind> = lab(ProbeMode::Linear);
        for id in 0..7u64 {
            lab.insert(id, ItemKind::Sword).unwrap();
        }
        lab.process_all().unwrap();
        let events: Vec<LabEvent> = lab.drain_events();
        assert_eq!(events.len(), 7 + 1 + 7);
        assert!(matches!(events[6], LabEvent::Placed { id: 6, rehash: false, .. }));
        assert_eq!(events[7], LabEvent::Resized { old_size: 10, new_size: 20 });
        assert!(events[8..]
            .iter()
            .all(|e| matches!(e, LabEvent::Placed { rehash: true, .. })));
        assert!(lab.drain_events().is_empty());
    }

    #[test]
    fn rehash_collisions_are_not_tallied() {
        let mut lab: HashLab<ItemKind> = lab(ProbeMode::Linear);
        // 0, 10 and 20 pile up at size 10 (1 + 2), only 20 collides again at size 20
        for id in [0u64, 10, 20, 5, 6, 7, 8] {
            lab.insert(id, ItemKind::Sword).unwrap();
        }
        lab.process_all().unwrap();
        assert_eq!(lab.size(), 20);
        assert_eq!(lab.stats().collisions, 3);
        let rehash_collisions: usize = lab
            .drain_events()
            .iter()
            .map(|e| match e {
                LabEvent::Placed {
                    collision_count,
                    rehash: true,
                    ..
                } => *collision_count,
                _ => 0,
            })
            .sum();
        assert_eq!(rehash_collisions, 1);
    }

    #[test]
    fn entries_stranded_by_a_rehash_wait() {
        let mut lab: HashLab<ItemKind> = lab(ProbeMode::Quadratic);
        // at size 20 these cover every i² offset from slot 0
        for (slot, id) in [0u64, 1, 4, 5, 9, 16].into_iter().enumerate() {
            lab.growth.place_at(slot, Entry::new(id, ItemKind::HealthPotion));
        }
        lab.insert(20, ItemKind::Sword).unwrap();
        let trace: InsertionTrace = lab.process_next().unwrap().unwrap();
        assert_eq!(trace.final_slot, 9);
        assert_eq!(lab.size(), 20);
        assert_eq!(lab.count_stored(), 6);
        assert_eq!(lab.waiting().len(), 1);
        assert_eq!(lab.waiting()[0].id, 20);

        let events: Vec<LabEvent> = lab.drain_events();
        assert_eq!(
            events.last(),
            Some(&LabEvent::Exhausted { id: 20, attempts: 40 })
        );
        assert_eq!(lab.retry_waiting(), 1);
        assert_eq!(lab.process_next(), Err(LabError::InsertionExhausted { id: 20, attempts: 40 }));
    }

    #[test]
    fn exhausted_item_waits_and_can_retry() {
        let config: LabConfig = LabConfig::default().with_max_load_factor(0.95);
        let mut lab: HashLab<ItemKind> = HashLab::with_mode(config, ProbeMode::Quadratic).unwrap();
        for id in [0u64, 1, 4, 5, 6, 9] {
            lab.insert(id, ItemKind::HealthPotion).unwrap();
        }
        lab.insert(10, ItemKind::Sword).unwrap();
        lab.insert(2, ItemKind::Sword).unwrap();
        let summary: ProcessSummary = lab.process_all().unwrap();
        assert_eq!(summary, ProcessSummary { placed: 7, exhausted: 1 });
        assert_eq!(lab.waiting().len(), 1);
        assert_eq!(lab.waiting()[0].id, 10);
        assert!(lab
            .drain_events()
            .contains(&LabEvent::Exhausted { id: 10, attempts: 20 }));

        lab.insert(3, ItemKind::Sword).unwrap();
        lab.insert(7, ItemKind::Sword).unwrap();
        lab.process_all().unwrap();
        assert_eq!(lab.count_stored(), 9);
        assert_eq!(lab.retry_waiting(), 1);
        // slot 8 is the last hole and i² never reaches it from 0
        assert_eq!(
            lab.process_next(),
            Err(LabError::InsertionExhausted { id: 10, attempts: 20 })
        );
    }

    #[test]
    fn undo_restores_table_and_tally() {
        let mut lab: HashLab<ItemKind> = lab(ProbeMode::Chaining);
        lab.insert(4, ItemKind::Sword).unwrap();
        lab.process_all().unwrap();
        let before: Vec<Vec<u64>> = lab.table().layout();
        let stats: SessionStats = lab.stats();

        lab.insert(14, ItemKind::ManaPotion).unwrap();
        lab.process_all().unwrap();
        assert_eq!(lab.stats().collisions, 1);
        let undone: Entry<ItemKind> = lab.undo_last().unwrap();
        assert_eq!(undone.id, 14);
        assert_eq!(undone.payload, ItemKind::ManaPotion);
        assert_eq!(lab.table().layout(), before);
        assert_eq!(lab.stats(), stats);
        assert_eq!(lab.saved_batch(), &[(4, ItemKind::Sword)]);
        assert!(lab
            .drain_events()
            .contains(&LabEvent::Undone { id: 14, slot: 4 }));
    }

    #[test]
    fn undo_on_empty_history() {
        let mut lab: HashLab<ItemKind> = lab(ProbeMode::Linear);
        assert_eq!(lab.undo_last().map(|e| e.id), Err(LabError::UndoEmpty));
        assert_eq!(lab.stats(), SessionStats::default());
    }

    #[test]
    fn mode_change_replays_saved_items() {
        let mut lab: HashLab<ItemKind> = lab(ProbeMode::Chaining);
        for id in [5u64, 15, 25, 8] {
            lab.insert(id, ItemKind::Sword).unwrap();
        }
        lab.process_all().unwrap();
        lab.drain_events();

        lab.set_probe_mode(ProbeMode::Linear);
        assert_eq!(lab.mode(), Some(ProbeMode::Linear));
        assert_eq!(lab.count_stored(), 0);
        assert_eq!(lab.pending_len(), 4);
        assert_eq!(lab.stats().items_processed, 4);
        assert_eq!(lab.stats().collisions, 0);
        assert_eq!(
            lab.drain_events(),
            vec![LabEvent::Replayed { mode: ProbeMode::Linear, count: 4 }]
        );

        lab.process_all().unwrap();
        let layout: Vec<Vec<u64>> = lab.table().layout();
        assert_eq!(layout[5], vec![5]);
        assert_eq!(layout[6], vec![15]);
        assert_eq!(layout[7], vec![25]);
        assert_eq!(layout[8], vec![8]);
    }

    #[test]
    fn reset_forgets_the_batch() {
        let mut lab: HashLab<ItemKind> = lab(ProbeMode::DoubleHash);
        lab.insert(1, ItemKind::Sword).unwrap();
        lab.process_all().unwrap();
        lab.reset();
        assert_eq!(lab.count_stored(), 0);
        assert!(lab.saved_batch().is_empty());
        assert!(lab.drain_events().is_empty());
        assert_eq!(lab.mode(), Some(ProbeMode::DoubleHash));
        lab.set_probe_mode(ProbeMode::Linear);
        assert_eq!(lab.pending_len(), 0);
    }

    #[test]
    fn forced_collision_targets_an_occupied_slot() {
        let mut rng: StdRng = StdRng::seed_from_u64(42);
        let mut lab: HashLab<ItemKind> = lab(ProbeMode::Linear);
        assert_eq!(lab.force_collision(&mut rng), Err(LabError::EmptyTable));

        lab.insert(3, ItemKind::Sword).unwrap();
        lab.process_all().unwrap();
        let id: u64 = lab.force_collision(&mut rng).unwrap();
        assert_eq!(id % 10, 3);
        assert!(id >= 13 && id <= 503);
        let trace: InsertionTrace = lab.process_next().unwrap().unwrap();
        assert_eq!(trace.collision_count, 1);
        assert_eq!(trace.final_slot, 4);
    }

    #[test]
    fn random_batch_is_queued_in_order() {
        let mut rng: StdRng = StdRng::seed_from_u64(3);
        let mut lab: HashLab<ItemKind> = lab(ProbeMode::Chaining);
        let ids: Vec<u64> = lab.add_random_batch(&mut rng, 10).unwrap();
        assert_eq!(ids.len(), 10);
        assert_eq!(lab.pending_len(), 10);
        let saved: Vec<u64> = lab.saved_batch().iter().map(|(id, _)| *id).collect();
        assert_eq!(saved, ids);
        let summary: ProcessSummary = lab.process_all().unwrap();
        assert_eq!(summary.placed, 10);
        assert_eq!(lab.size(), 20);
        assert_eq!(lab.count_stored(), 10);
    }
}
