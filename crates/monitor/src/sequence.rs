//! Arrival tickets for one dimension.
//!
//! Events of a dimension can travel to the delivery thread by different
//! routes: plain posts run at once, coalesced posts wait out their delay. Each
//! event takes a ticket when it arrives, and the delivery thread drops any
//! ticket older than the newest one it has applied, so a delayed event never
//! lands on top of a later one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Issues increasing tickets. Cloned into every listener of a dimension.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tickets(Arc<AtomicU64>);

impl Tickets {
    pub(crate) fn issue(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Newest ticket applied on the delivery thread.
#[derive(Debug, Default)]
pub(crate) struct Watermark {
    tickets: Tickets,
    applied: u64,
}

impl Watermark {
    pub(crate) fn tickets(&self) -> Tickets {
        self.tickets.clone()
    }

    /// Accept `ticket` unless something newer was already applied.
    pub(crate) fn admit(&mut self, ticket: u64) -> bool {
        if ticket < self.applied {
            return false;
        }
        self.applied = ticket;
        true
    }

    /// Mark every ticket issued so far as stale.
    pub(crate) fn supersede(&mut self) {
        self.applied = self.tickets.issue();
    }
}
