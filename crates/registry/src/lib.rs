//! SIM registry for the status bar monitor.
//!
//! Tracks one `SimRecord` per physical slot and resolves which subscription
//! is primary. Four independent change vectors feed it:
//!
//! - physical insert/remove broadcasts (`on_physical_change`)
//! - subscription list changes (`on_subscriptions_changed`)
//! - per-subscription service state and signal strength callbacks
//! - default data subscription switches
//!
//! Every mutation returns a [`SimUpdate`] telling the caller whether to
//! propose a new snapshot and recheck the network classification. The
//! registry itself never delivers anything.
//!
//! Primary resolution rules:
//! 1. Exactly one usable SIM is always primary.
//! 2. When the primary SIM stops being usable, the first other usable SIM in
//!    slot order takes over.
//! 3. Otherwise the last authoritative value (default data query or switch
//!    event) is kept.

mod registry;
mod update;

pub use registry::SimRegistry;
pub use update::{PhoneWatch, SimUpdate, SubscriptionsOutcome};
