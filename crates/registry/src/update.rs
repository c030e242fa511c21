//! Outcomes reported by registry mutations.

use statusbar_signals::{SlotId, SubscriptionId};

/// Result of applying one event to the registry.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimUpdate {
    /// Nothing observable changed.
    Unchanged,
    /// Records or primary changed and should be proposed for delivery.
    Changed {
        /// The network classification may be stale and must be recomputed.
        recheck_network: bool,
    },
}

impl SimUpdate {
    pub fn is_changed(&self) -> bool {
        matches!(self, SimUpdate::Changed { .. })
    }

    pub fn recheck_network(&self) -> bool {
        matches!(
            self,
            SimUpdate::Changed {
                recheck_network: true
            }
        )
    }
}

/// Per-subscription watch the caller should hold for a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhoneWatch {
    pub slot: SlotId,
    pub subscription: SubscriptionId,
}

/// Result of re-enumerating subscriptions.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionsOutcome {
    /// Watches to (re)establish, replacing any existing watch for the slot.
    pub watches: Vec<PhoneWatch>,
    /// The platform reported no subscriptions and every record was dropped.
    /// The empty state must be delivered even if it was delivered before.
    pub cleared: bool,
    pub update: SimUpdate,
}

impl SubscriptionsOutcome {
    pub(crate) fn unchanged() -> Self {
        Self {
            watches: Vec::new(),
            cleared: false,
            update: SimUpdate::Unchanged,
        }
    }
}
