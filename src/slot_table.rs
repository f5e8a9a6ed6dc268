use std::fmt::Debug;

/// An item to be stored in the table. Identity is the `id`; the payload is an opaque tag
/// carried along for whoever draws the item.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<T>
where
    T: Debug + Clone,
{
    pub id: u64,
    pub payload: T,
    stored_slot: Option<usize>,
    counted_collisions: usize,
}

impl<T> Entry<T>
where
    T: Debug + Clone,
{
    pub fn new(id: u64, payload: T) -> Self {
        Self {
            id,
            payload,
            stored_slot: None,
            counted_collisions: 0,
        }
    }

    /// Slot currently holding this entry, `None` while it is pending or waiting.
    #[inline]
    pub fn stored_slot(&self) -> Option<usize> {
        self.stored_slot
    }

    /// Collisions this entry added to the session tally when it was first placed.
    #[inline]
    pub fn counted_collisions(&self) -> usize {
        self.counted_collisions
    }

    pub(crate) fn set_stored_slot(&mut self, slot: Option<usize>) {
        self.stored_slot = slot;
    }

    pub(crate) fn set_counted_collisions(&mut self, collisions: usize) {
        self.counted_collisions = collisions;
    }
}

type Bucket<T> = Vec<Entry<T>>;

/// Fixed number of buckets. The table never resizes itself, growth builds a new one.
#[derive(Debug, Clone)]
pub struct SlotTable<T>
where
    T: Debug + Clone,
{
    count: usize,
    buckets: Vec<Bucket<T>>,
}

impl<T> SlotTable<T>
where
    T: Debug + Clone,
{
    pub fn with_size(size: usize) -> Self {
        assert!(size > 0, "a table must have at least one slot");
        let mut buckets: Vec<Bucket<T>> = Vec::with_capacity(size);
        buckets.resize_with(size, Vec::new);
        SlotTable { count: 0, buckets }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn count_stored(&self) -> usize {
        self.count
    }

    pub fn load_factor(&self) -> f64 {
        self.count as f64 / self.size() as f64
    }

    #[inline]
    pub fn is_empty(&self, slot: usize) -> bool {
        self.buckets[slot].is_empty()
    }

    pub fn bucket(&self, slot: usize) -> &[Entry<T>] {
        &self.buckets[slot]
    }

    /// Appends `entry` to the tail of the bucket at `slot` and records the slot on the entry.
    pub fn place(&mut self, slot: usize, mut entry: Entry<T>) {
        entry.set_stored_slot(Some(slot));
        self.buckets[slot].push(entry);
        self.count += 1;
    }

    /// Removes `entry` from the bucket named by its stored slot. When a chained bucket holds
    /// the same id more than once, the most recently placed one goes.
    pub fn remove(&mut self, entry: &Entry<T>) -> bool {
        match entry.stored_slot() {
            Some(slot) => self.take(slot, entry.id).is_some(),
            None => false,
        }
    }

    /// Takes the most recently placed entry with `id` out of the bucket at `slot`.
    pub(crate) fn take(&mut self, slot: usize, id: u64) -> Option<Entry<T>> {
        let bucket: &mut Bucket<T> = self.buckets.get_mut(slot)?;
        let i: usize = bucket.iter().rposition(|e| e.id == id)?;
        self.count -= 1;
        Some(bucket.remove(i))
    }

    /// The entry appended last to the bucket at `slot`.
    pub(crate) fn last_mut(&mut self, slot: usize) -> Option<&mut Entry<T>> {
        self.buckets.get_mut(slot)?.last_mut()
    }

    pub fn occupied_slots(&self) -> Vec<usize> {
        self.buckets
            .iter()
            .enumerate()
            .filter(|(_, bucket)| !bucket.is_empty())
            .map(|(slot, _)| slot)
            .collect()
    }

    /// Longest bucket, i.e. the deepest chain.
    pub fn max_depth(&self) -> usize {
        self.buckets.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Ids per slot, in bucket order. Handy for comparing table states.
    pub fn layout(&self) -> Vec<Vec<u64>> {
        self.buckets
            .iter()
            .map(|bucket| bucket.iter().map(|e| e.id).collect())
            .collect()
    }

    pub fn print(&self) {
        println!(
            "size {}, count {}, load {:.2}",
            self.size(),
            self.count,
            self.load_factor()
        );
        for (slot, bucket) in self.buckets.iter().enumerate() {
            let ids: Vec<u64> = bucket.iter().map(|e| e.id).collect();
            println!("{:>4} {:?}", slot, ids);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_table_is_empty() {
        let table: SlotTable<()> = SlotTable::with_size(10);
        assert_eq!(table.size(), 10);
        assert_eq!(table.count_stored(), 0);
        assert_eq!(table.load_factor(), 0.0);
        assert!((0..10).all(|slot| table.is_empty(slot)));
        assert!(table.occupied_slots().is_empty());
    }

    #[test]
    fn place_records_the_slot() {
        let mut table: SlotTable<&str> = SlotTable::with_size(10);
        table.place(3, Entry::new(13, "hp"));
        table.place(3, Entry::new(23, "mp"));
        assert_eq!(table.count_stored(), 2);
        assert_eq!(table.bucket(3)[1].stored_slot(), Some(3));
        assert_eq!(table.layout()[3], vec![13, 23]);
        assert_eq!(table.occupied_slots(), vec![3]);
        assert_eq!(table.max_depth(), 2);
    }

    #[test]
    fn remove_by_identity() {
        let mut table: SlotTable<()> = SlotTable::with_size(10);
        table.place(4, Entry::new(4, ()));
        let stored: Entry<()> = table.bucket(4)[0].clone();
        assert!(table.remove(&stored));
        assert!(table.is_empty(4));
        assert_eq!(table.count_stored(), 0);
        // second attempt is a no-op
        assert!(!table.remove(&stored));
        // never stored at all
        assert!(!table.remove(&Entry::new(4, ())));
    }

    #[test]
    fn remove_takes_the_latest_duplicate() {
        let mut table: SlotTable<u8> = SlotTable::with_size(10);
        table.place(1, Entry::new(1, 0));
        table.place(1, Entry::new(11, 1));
        table.place(1, Entry::new(1, 2));
        let last: Entry<u8> = table.bucket(1)[2].clone();
        assert!(table.remove(&last));
        let payloads: Vec<u8> = table.bucket(1).iter().map(|e| e.payload).collect();
        assert_eq!(payloads, vec![0, 1]);
    }

    #[test]
    fn take_hands_back_the_entry() {
        let mut table: SlotTable<u8> = SlotTable::with_size(10);
        table.place(2, Entry::new(12, 7));
        assert!(table.take(3, 12).is_none());
        assert!(table.take(99, 12).is_none());
        let taken: Entry<u8> = table.take(2, 12).expect("stored at 2");
        assert_eq!((taken.id, taken.payload, taken.stored_slot()), (12, 7, Some(2)));
        assert_eq!(table.count_stored(), 0);
        assert!(table.last_mut(2).is_none());
    }
}
