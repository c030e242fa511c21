//! Registration ledger.
//!
//! Every watch the monitor acquires is recorded here under a key, so that
//! re-registering a key releases the old watch and stopping the monitor can
//! release everything without relying on drop order.

use statusbar_signals::{SlotId, SubscriptionId, WatchHandle};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WatchKey {
    Subscriptions,
    SimBroadcasts,
    /// Service state and signal strength for the subscription in a slot.
    PhoneState(SlotId),
    Battery,
    Airplane,
    Headset,
    Network,
}

#[derive(Debug)]
struct Entry {
    subscription: Option<SubscriptionId>,
    handle: WatchHandle,
}

#[derive(Debug, Default)]
pub struct RegistrationLedger {
    entries: BTreeMap<WatchKey, Entry>,
}

impl RegistrationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a watch. A previous watch under the same key is released first.
    pub fn insert(&mut self, key: WatchKey, handle: WatchHandle) -> bool {
        self.insert_entry(key, None, handle)
    }

    /// Record a per-subscription watch.
    pub fn insert_for(
        &mut self,
        key: WatchKey,
        subscription: SubscriptionId,
        handle: WatchHandle,
    ) -> bool {
        self.insert_entry(key, Some(subscription), handle)
    }

    /// Release and forget the watch under `key`.
    pub fn remove(&mut self, key: WatchKey) -> bool {
        match self.entries.remove(&key) {
            Some(entry) => {
                entry.handle.release();
                true
            }
            None => false,
        }
    }

    /// Subscription a per-subscription watch was registered for.
    pub fn subscription_of(&self, key: WatchKey) -> Option<SubscriptionId> {
        self.entries.get(&key).and_then(|e| e.subscription)
    }

    pub fn contains(&self, key: WatchKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Slots that currently hold a phone-state watch.
    pub fn phone_slots(&self) -> Vec<SlotId> {
        self.entries
            .keys()
            .filter_map(|key| match key {
                WatchKey::PhoneState(slot) => Some(*slot),
                _ => None,
            })
            .collect()
    }

    /// Release every watch. Returns how many were released.
    pub fn release_all(&mut self) -> usize {
        let entries = std::mem::take(&mut self.entries);
        let count = entries.len();
        for (_, entry) in entries {
            entry.handle.release();
        }
        if count > 0 {
            tracing::debug!(count, "released all watches");
        }
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert_entry(
        &mut self,
        key: WatchKey,
        subscription: Option<SubscriptionId>,
        handle: WatchHandle,
    ) -> bool {
        let previous = self.entries.insert(
            key,
            Entry {
                subscription,
                handle,
            },
        );
        match previous {
            Some(old) => {
                tracing::trace!(?key, "replacing watch");
                old.handle.release();
                true
            }
            None => false,
        }
    }
}
