//! Change tracking for persisted state.
//!
//! A [`ChangeTracker`] answers one question: has anything changed since the
//! last successful write? Fields opt in by wrapping their value in a
//! [`Tracked`] that shares the owner's tracker.
//!
//! # Flushing without losing updates
//!
//! The tracker is a pair of counters rather than a boolean. Every change
//! bumps `revision`; a successful write records the revision it captured in
//! `persisted`. The owner is dirty while the two differ.
//!
//! ```text
//! begin_flush()  → snapshot revision r, read fields, write row
//!                         ↑ a concurrent set() bumps revision to r+1
//! complete_flush(r) → persisted = r, still != r+1 → still dirty
//! ```
//!
//! A plain `dirty = false` after the write would drop that concurrent
//! change on the floor.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// A revision captured by [`ChangeTracker::begin_flush`].
///
/// Hand it back to [`ChangeTracker::complete_flush`] once the write that
/// captured it has been acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[must_use = "a flush that never completes leaves the owner dirty"]
pub struct Revision(u64);

/// Dirty flag shared by every tracked field of one owner.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    revision: AtomicU64,
    persisted: AtomicU64,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a change happened after the last completed flush.
    pub fn is_dirty(&self) -> bool {
        self.revision.load(Ordering::Acquire)
            != self.persisted.load(Ordering::Acquire)
    }

    /// Forces the owner dirty.
    pub fn mark_dirty(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
    }

    /// Forces the owner clean, as if everything up to now was written.
    ///
    /// Only for owners that know their state matches storage, e.g. right
    /// after hydrating from a freshly loaded record.
    pub fn mark_clean(&self) {
        let current = self.revision.load(Ordering::Acquire);
        self.persisted.fetch_max(current, Ordering::AcqRel);
    }

    /// Starts a flush. Returns `None` when there is nothing to write.
    ///
    /// Read the fields to persist *after* calling this, so every change
    /// included in the write is covered by the returned revision.
    pub fn begin_flush(&self) -> Option<Revision> {
        let current = self.revision.load(Ordering::Acquire);
        if current == self.persisted.load(Ordering::Acquire) {
            None
        } else {
            Some(Revision(current))
        }
    }

    /// Records that everything up to `revision` is in storage.
    ///
    /// Changes made after `revision` was captured keep the owner dirty.
    /// Completing an older flush after a newer one is harmless.
    pub fn complete_flush(&self, revision: Revision) {
        self.persisted.fetch_max(revision.0, Ordering::AcqRel);
    }
}

/// A field whose writes mark its owner dirty.
///
/// Writes go through [`set`](Tracked::set) or [`update`](Tracked::update),
/// both of which compare against the current value first: writing what is
/// already there is not a change.
#[derive(Debug)]
pub struct Tracked<T> {
    value: RwLock<T>,
    tracker: Arc<ChangeTracker>,
}

impl<T: Clone + PartialEq> Tracked<T> {
    pub fn new(value: T, tracker: Arc<ChangeTracker>) -> Self {
        Self {
            value: RwLock::new(value),
            tracker,
        }
    }

    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Replaces the value. Returns `true` (and marks the owner dirty) only
    /// if the new value differs from the old one.
    pub fn set(&self, value: T) -> bool {
        let mut current = self.value.write();
        if *current == value {
            return false;
        }
        *current = value;
        self.tracker.mark_dirty();
        true
    }

    /// Atomically computes a new value from the current one.
    ///
    /// `f` returning `None` leaves the field untouched. Returns whether the
    /// field changed.
    pub fn update(&self, f: impl FnOnce(&T) -> Option<T>) -> bool {
        let mut current = self.value.write();
        match f(&current) {
            Some(next) if next != *current => {
                *current = next;
                self.tracker.mark_dirty();
                true
            }
            _ => false,
        }
    }

    /// Overwrites the value without marking the owner dirty. Used when
    /// loading state that already matches storage.
    pub(crate) fn hydrate(&self, value: T) {
        *self.value.write() = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(value: u32) -> (Arc<ChangeTracker>, Tracked<u32>) {
        let tracker = Arc::new(ChangeTracker::new());
        let tracked = Tracked::new(value, Arc::clone(&tracker));
        (tracker, tracked)
    }

    #[test]
    fn test_new_tracker_is_clean() {
        assert!(!ChangeTracker::new().is_dirty());
    }

    #[test]
    fn test_set_same_value_stays_clean() {
        let (tracker, pen) = field(100);

        assert!(!pen.set(100));

        assert!(!tracker.is_dirty());
        assert_eq!(pen.get(), 100);
    }

    #[test]
    fn test_set_different_value_marks_dirty() {
        let (tracker, pen) = field(100);

        assert!(pen.set(150));

        assert!(tracker.is_dirty());
        assert_eq!(pen.get(), 150);
    }

    #[test]
    fn test_set_back_to_original_value_stays_dirty() {
        // Dirty means "written since the last flush", not "differs from
        // storage".
        let (tracker, pen) = field(100);

        pen.set(150);
        pen.set(100);

        assert!(tracker.is_dirty());
    }

    #[test]
    fn test_update_returning_none_leaves_field() {
        let (tracker, pen) = field(10);

        let changed = pen.update(|current| current.checked_sub(20));

        assert!(!changed);
        assert_eq!(pen.get(), 10);
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn test_update_to_same_value_stays_clean() {
        let (tracker, pen) = field(10);

        assert!(!pen.update(|current| Some(*current)));
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn test_hydrate_does_not_mark_dirty() {
        let (tracker, pen) = field(0);

        pen.hydrate(900);

        assert_eq!(pen.get(), 900);
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn test_begin_flush_clean_returns_none() {
        assert!(ChangeTracker::new().begin_flush().is_none());
    }

    #[test]
    fn test_complete_flush_clears_dirty() {
        let (tracker, pen) = field(0);
        pen.set(1);

        let revision = tracker.begin_flush().expect("dirty");
        tracker.complete_flush(revision);

        assert!(!tracker.is_dirty());
    }

    #[test]
    fn test_change_during_flush_stays_dirty() {
        let (tracker, pen) = field(0);
        pen.set(1);

        let revision = tracker.begin_flush().expect("dirty");
        pen.set(2); // lands while the write is in flight
        tracker.complete_flush(revision);

        assert!(tracker.is_dirty());
    }

    #[test]
    fn test_abandoned_flush_stays_dirty() {
        let (tracker, pen) = field(0);
        pen.set(1);

        let _revision = tracker.begin_flush().expect("dirty");
        // the write failed; complete_flush is never called

        assert!(tracker.is_dirty());
    }

    #[test]
    fn test_complete_flush_out_of_order_keeps_newest() {
        let (tracker, pen) = field(0);
        pen.set(1);
        let older = tracker.begin_flush().expect("dirty");
        pen.set(2);
        let newer = tracker.begin_flush().expect("dirty");

        tracker.complete_flush(newer);
        tracker.complete_flush(older);

        assert!(!tracker.is_dirty());
    }

    #[test]
    fn test_mark_dirty_and_mark_clean() {
        let tracker = ChangeTracker::new();

        tracker.mark_dirty();
        assert!(tracker.is_dirty());

        tracker.mark_clean();
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn test_fields_share_one_tracker() {
        let tracker = Arc::new(ChangeTracker::new());
        let pen = Tracked::new(0u32, Arc::clone(&tracker));
        let ap = Tracked::new(0u32, Arc::clone(&tracker));

        ap.set(5);

        assert!(tracker.is_dirty());
        assert_eq!(pen.get(), 0);
    }
}
