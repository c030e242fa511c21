//! Pending task queue.
//!
//! Ordered by `(due, arrival)` so equal deadlines keep FIFO order. Keyed
//! entries are unique per kind: pushing a kind again removes the pending one.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::time::Instant;

type Slot = (Instant, u64);

struct Pending<K, T> {
    kind: Option<K>,
    task: T,
}

pub(crate) struct PendingQueue<K, T> {
    entries: BTreeMap<Slot, Pending<K, T>>,
    keyed: HashMap<K, Slot>,
    seq: u64,
}

impl<K, T> PendingQueue<K, T>
where
    K: Hash + Eq + Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            keyed: HashMap::new(),
            seq: 0,
        }
    }

    /// Queue a task. Returns true if a pending task of the same kind was replaced.
    pub(crate) fn push(&mut self, kind: Option<K>, due: Instant, task: T) -> bool {
        let replaced = match &kind {
            Some(k) => self.cancel(k),
            None => false,
        };

        let slot = (due, self.seq);
        self.seq += 1;

        if let Some(k) = &kind {
            self.keyed.insert(k.clone(), slot);
        }
        self.entries.insert(slot, Pending { kind, task });
        replaced
    }

    /// Drop the pending task of `kind`, if any.
    pub(crate) fn cancel(&mut self, kind: &K) -> bool {
        match self.keyed.remove(kind) {
            Some(slot) => self.entries.remove(&slot).is_some(),
            None => false,
        }
    }

    /// Remove and return the earliest task due at or before `now`.
    pub(crate) fn pop_due(&mut self, now: Instant) -> Option<T> {
        let (&slot, _) = self.entries.iter().next()?;
        if slot.0 > now {
            return None;
        }
        let pending = self.entries.remove(&slot)?;
        if let Some(kind) = &pending.kind {
            self.keyed.remove(kind);
        }
        Some(pending.task)
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.entries.keys().next().map(|slot| slot.0)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
