//! Bounded history of published snapshots.
//!
//! The driver thread is the only writer; the broadcast pump and callers
//! holding the session read from it concurrently.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use vantage_core::Snapshot;

/// A stored snapshot and the publication number it was stored under.
struct Entry {
    pos: u64,
    snapshot: Arc<Snapshot>,
}

/// Ring of the last `capacity` snapshots, indexed by publication number.
///
/// Publication `n` lands in slot `n % capacity`. Entries remember `n`,
/// so a lookup that loses a race with the writer yields `None` rather
/// than a newer snapshot.
pub struct SnapshotRing {
    slots: Box<[Mutex<Option<Entry>>]>,
    published: AtomicU64,
}

const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<SnapshotRing>();
};

impl SnapshotRing {
    /// A ring holding up to `capacity` snapshots.
    ///
    /// # Panics
    ///
    /// If `capacity < 2`. [`SessionConfig::validate`](crate::SessionConfig::validate)
    /// rules this out for sessions.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "snapshot ring capacity must be >= 2, got {capacity}");
        Self {
            slots: (0..capacity).map(|_| Mutex::new(None)).collect(),
            published: AtomicU64::new(0),
        }
    }

    fn lock_slot(&self, pos: u64) -> MutexGuard<'_, Option<Entry>> {
        self.slots[(pos % self.slots.len() as u64) as usize]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `snapshot` as the newest entry, overwriting the oldest one
    /// once the ring is full.
    pub fn push(&self, snapshot: Snapshot) {
        let pos = self.published.load(Ordering::Relaxed);
        let entry = Entry {
            pos,
            snapshot: Arc::new(snapshot),
        };
        *self.lock_slot(pos) = Some(entry);
        self.published.store(pos + 1, Ordering::Release);
    }

    /// The newest snapshot, if any was published.
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.latest_with_pos().map(|(_, snapshot)| snapshot)
    }

    /// The newest snapshot together with its publication number, read
    /// under a single slot lock.
    pub fn latest_with_pos(&self) -> Option<(u64, Arc<Snapshot>)> {
        let pos = self.write_pos().checked_sub(1)?;
        self.lookup(pos).map(|snapshot| (pos, snapshot))
    }

    /// Every snapshot still held, oldest first.
    ///
    /// Entries overwritten while the history is being read are skipped.
    pub fn recent(&self) -> Vec<Arc<Snapshot>> {
        let published = self.write_pos();
        let first = published.saturating_sub(self.capacity() as u64);
        let mut held = Vec::with_capacity(self.len());
        held.extend((first..published).filter_map(|pos| self.get_by_pos(pos)));
        held
    }

    /// Snapshot number `pos`, while it is still held.
    pub fn get_by_pos(&self, pos: u64) -> Option<Arc<Snapshot>> {
        let published = self.write_pos();
        let held = published.saturating_sub(self.slots.len() as u64)..published;
        if held.contains(&pos) {
            self.lookup(pos)
        } else {
            None
        }
    }

    /// Entry `pos` as stored in its slot; `None` once a newer
    /// publication took the slot.
    fn lookup(&self, pos: u64) -> Option<Arc<Snapshot>> {
        self.lock_slot(pos)
            .as_ref()
            .filter(|entry| entry.pos == pos)
            .map(|entry| Arc::clone(&entry.snapshot))
    }

    /// Snapshots currently held.
    pub fn len(&self) -> usize {
        self.write_pos().min(self.slots.len() as u64) as usize
    }

    /// True until the first push.
    pub fn is_empty(&self) -> bool {
        self.write_pos() == 0
    }

    /// Maximum number of snapshots held.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of snapshots published so far.
    pub fn write_pos(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_core::{ArenaGeometry, RunPhase};

    fn snap(steps: u64) -> Snapshot {
        Snapshot {
            entities: Vec::new(),
            arena: ArenaGeometry::default(),
            timestamp: 0,
            state: RunPhase::Playing,
            steps,
        }
    }

    #[test]
    fn new_ring_is_empty() {
        let ring = SnapshotRing::new(4);
        assert_eq!(ring.len(), 0);
        assert!(ring.is_empty());
        assert_eq!(ring.capacity(), 4);
        assert_eq!(ring.write_pos(), 0);
        assert!(ring.latest().is_none());
    }

    #[test]
    fn latest_is_newest() {
        let ring = SnapshotRing::new(4);
        for i in 1..=10 {
            ring.push(snap(i));
        }
        assert_eq!(ring.latest().unwrap().steps, 10);
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.write_pos(), 10);
    }

    #[test]
    fn full_ring_overwrites_oldest() {
        let ring = SnapshotRing::new(4);
        for i in 1..=5 {
            ring.push(snap(i));
        }
        assert!(ring.get_by_pos(0).is_none());
        assert_eq!(ring.get_by_pos(1).unwrap().steps, 2);
        assert_eq!(ring.latest_with_pos().map(|(pos, s)| (pos, s.steps)), Some((4, 5)));
    }

    #[test]
    fn recent_lists_held_history_oldest_first() {
        let ring = SnapshotRing::new(3);
        assert!(ring.recent().is_empty());

        ring.push(snap(1));
        ring.push(snap(2));
        let steps: Vec<_> = ring.recent().iter().map(|s| s.steps).collect();
        assert_eq!(steps, [1, 2]);

        for i in 3..=7 {
            ring.push(snap(i));
        }
        let steps: Vec<_> = ring.recent().iter().map(|s| s.steps).collect();
        assert_eq!(steps, [5, 6, 7]);
    }

    #[test]
    fn get_by_pos_respects_tags() {
        let ring = SnapshotRing::new(4);
        for i in 1..=8 {
            ring.push(snap(i * 10));
        }
        assert!(ring.get_by_pos(0).is_none());
        assert!(ring.get_by_pos(3).is_none());
        assert_eq!(ring.get_by_pos(4).unwrap().steps, 50);
        assert_eq!(ring.get_by_pos(7).unwrap().steps, 80);
        assert!(ring.get_by_pos(8).is_none());
    }

    #[test]
    #[should_panic(expected = "capacity must be >= 2")]
    fn capacity_below_two_panics() {
        SnapshotRing::new(1);
    }

    #[test]
    fn readers_see_monotonic_steps_across_threads() {
        use std::thread;

        let ring = Arc::new(SnapshotRing::new(8));
        let producer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                for i in 1..=200 {
                    ring.push(snap(i));
                }
            })
        };
        let reader = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                let mut last = 0;
                while last < 200 {
                    if let Some(s) = ring.latest() {
                        assert!(s.steps >= last);
                        last = s.steps;
                    }
                    thread::yield_now();
                }
            })
        };
        producer.join().unwrap();
        reader.join().unwrap();
    }
}
