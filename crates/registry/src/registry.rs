//! SIM registry.
//!
//! Owns every `SimRecord` and the primary subscription id. Mutated only from
//! the delivery thread; readers get deep copies through `snapshot()`.

use crate::update::{PhoneWatch, SimUpdate, SubscriptionsOutcome};
use statusbar_signals::{
    clamp_signal_level, data_service_state, require, Capability, CapabilityProvider,
    DataServiceState, PhysicalChange, RawServiceState, SignalError, SignalResult, SimRecord,
    SimSnapshot, SimState, SlotId, SubscriptionId, SubscriptionSource, SIM_INFO_MIN_VERSION,
    SIM_SIGNAL_LEVEL_MAX,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Feature name used when SIM information is unavailable.
const FEATURE: &str = "sim information";

pub struct SimRegistry {
    source: Arc<dyn SubscriptionSource>,
    capabilities: Arc<dyn CapabilityProvider>,
    records: BTreeMap<SlotId, SimRecord>,
    primary: SubscriptionId,
    available: bool,
}

impl SimRegistry {
    pub fn new(
        source: Arc<dyn SubscriptionSource>,
        capabilities: Arc<dyn CapabilityProvider>,
    ) -> Self {
        Self {
            source,
            capabilities,
            records: BTreeMap::new(),
            primary: SubscriptionId::UNKNOWN,
            available: false,
        }
    }

    /// Check whether SIM information may be read on this device.
    pub fn availability(&self) -> SignalResult<()> {
        require(
            self.capabilities.as_ref(),
            Capability::ReadPhoneState,
            SIM_INFO_MIN_VERSION,
            FEATURE,
        )
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn primary(&self) -> SubscriptionId {
        self.primary
    }

    pub fn record(&self, slot: SlotId) -> Option<&SimRecord> {
        self.records.get(&slot)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Watches the caller should hold, one per tracked slot.
    pub fn watch_targets(&self) -> Vec<PhoneWatch> {
        self.records
            .values()
            .map(|r| PhoneWatch {
                slot: r.slot,
                subscription: r.subscription,
            })
            .collect()
    }

    /// Deep copy of every record plus the primary id.
    pub fn snapshot(&self) -> SimSnapshot {
        SimSnapshot {
            records: self.records.clone(),
            primary: self.primary,
        }
    }

    /// Enumerate active subscriptions and start tracking the ready ones.
    ///
    /// Without the capability the registry stays empty; that is not an error.
    pub fn initialize(&mut self) -> Vec<PhoneWatch> {
        self.records.clear();
        self.primary = SubscriptionId::UNKNOWN;

        self.available = match self.availability() {
            Ok(()) => true,
            Err(e) => {
                e.log();
                false
            }
        };
        if !self.available {
            return Vec::new();
        }

        if let Some(sub) = self.source.default_data_subscription() {
            self.primary = sub;
        }

        let mut watches = Vec::new();
        for info in self.source.active_subscriptions() {
            if !self.source.sim_state(info.subscription).is_ready() {
                continue;
            }
            let record = self.query_record(info.slot, info.subscription);
            self.records.insert(info.slot, record);
            watches.push(PhoneWatch {
                slot: info.slot,
                subscription: info.subscription,
            });
        }

        self.enforce_single_primary();
        tracing::debug!(
            sims = self.records.len(),
            primary = %self.primary,
            "sim registry initialized"
        );
        watches
    }

    /// Re-query every physical slot from scratch.
    pub fn refresh_all(&mut self) -> SimUpdate {
        if !self.available {
            return SimUpdate::Unchanged;
        }
        let before = self.snapshot();

        let slot_count = self.source.slot_count();
        self.records.retain(|slot, _| *slot < slot_count);
        for slot in 0..slot_count {
            match self.source.subscription_for_slot(slot) {
                Some(sub) if self.source.sim_state(sub).is_ready() => {
                    let record = self.query_record(slot, sub);
                    self.records.insert(slot, record);
                }
                _ => {
                    self.records.remove(&slot);
                }
            }
        }
        if let Some(sub) = self.source.default_data_subscription() {
            self.primary = sub;
        }

        self.enforce_single_primary();
        self.diff(&before)
    }

    /// Apply a physical insert/remove notification.
    ///
    /// `service` is the service state carried by the event; when absent it is
    /// queried from the source.
    pub fn on_physical_change(
        &mut self,
        change: &PhysicalChange,
        service: Option<&RawServiceState>,
    ) -> SimUpdate {
        if !self.available {
            return SimUpdate::Unchanged;
        }
        let before = self.snapshot();

        if !change.ready {
            if self.records.remove(&change.slot).is_some() {
                tracing::debug!(slot = change.slot, "sim removed");
            }
        } else {
            let data_service = match service {
                Some(raw) => raw.data_service_state(),
                None => data_service_state(self.source.service_state(change.subscription).as_ref()),
            };
            let previous_level = self.records.get(&change.slot).map(|r| r.signal_level);
            let signal_level = self
                .source
                .signal_level(change.subscription)
                .map(clamp_signal_level)
                .or(previous_level)
                .unwrap_or(SIM_SIGNAL_LEVEL_MAX);

            let record = SimRecord::new(
                change.slot,
                change.subscription,
                SimState::Ready,
                data_service,
                signal_level,
            );
            tracing::debug!(slot = change.slot, subscription = %change.subscription, "sim ready");
            self.records.insert(change.slot, record);
        }

        self.enforce_single_primary();
        self.diff(&before)
    }

    /// Re-enumerate subscriptions after the platform reported a change.
    pub fn on_subscriptions_changed(&mut self) -> SubscriptionsOutcome {
        if !self.available {
            return SubscriptionsOutcome::unchanged();
        }
        let before = self.snapshot();

        let active = self.source.active_subscriptions();
        if active.is_empty() {
            self.records.clear();
            tracing::debug!("no active subscriptions");
            return SubscriptionsOutcome {
                watches: Vec::new(),
                cleared: true,
                update: SimUpdate::Changed {
                    recheck_network: true,
                },
            };
        }

        let mut watches = Vec::new();
        for info in active {
            if !self.source.sim_state(info.subscription).is_ready() {
                continue;
            }
            let record = self.query_record(info.slot, info.subscription);
            self.records.insert(info.slot, record);
            watches.push(PhoneWatch {
                slot: info.slot,
                subscription: info.subscription,
            });
        }

        self.enforce_single_primary();
        SubscriptionsOutcome {
            watches,
            cleared: false,
            update: self.diff(&before),
        }
    }

    /// Apply a data service change for a tracked slot.
    pub fn on_service_state_changed(
        &mut self,
        slot: SlotId,
        state: DataServiceState,
    ) -> SignalResult<SimUpdate> {
        let before = self.snapshot();
        let refreshed = if state.is_in_service() && self.available {
            self.source.subscription_for_slot(slot)
        } else {
            None
        };

        let record = self.records.get_mut(&slot).ok_or_else(|| {
            SignalError::inconsistency(format!("service state for untracked slot {}", slot))
        })?;

        let was_usable = record.is_usable();
        record.data_service = state;
        if state.is_in_service() {
            if let Some(sub) = refreshed {
                record.subscription = sub;
            }
            record.sim_state = SimState::Ready;
        }
        let now_usable = record.is_usable();
        let subscription = record.subscription;

        if was_usable != now_usable {
            tracing::debug!(slot, usable = now_usable, "sim usability changed");
            if !now_usable && subscription == self.primary {
                self.reassign_primary(slot);
            }
        }

        self.enforce_single_primary();
        Ok(self.diff(&before))
    }

    /// Apply a raw signal level for a tracked slot.
    pub fn on_signal_strength_changed(&mut self, slot: SlotId, raw: i32) -> SignalResult<SimUpdate> {
        let record = self.records.get_mut(&slot).ok_or_else(|| {
            SignalError::inconsistency(format!("signal strength for untracked slot {}", slot))
        })?;

        if !record.is_usable() {
            tracing::trace!(slot, raw, "signal ignored for unusable sim");
            return Ok(SimUpdate::Unchanged);
        }

        let level = clamp_signal_level(raw);
        if level == record.signal_level {
            return Ok(SimUpdate::Unchanged);
        }

        tracing::trace!(slot, level, "sim signal changed");
        record.signal_level = level;
        Ok(SimUpdate::Changed {
            recheck_network: true,
        })
    }

    /// Record an explicit switch of the default data subscription.
    pub fn on_default_data_subscription_changed(&mut self, subscription: SubscriptionId) -> SimUpdate {
        if !self.available || subscription == self.primary {
            return SimUpdate::Unchanged;
        }
        let before = self.snapshot();

        tracing::debug!(from = %self.primary, to = %subscription, "default data subscription changed");
        self.primary = subscription;

        self.enforce_single_primary();
        self.diff(&before)
    }

    /// Move primary to the first other usable SIM in slot order.
    fn reassign_primary(&mut self, lost_slot: SlotId) {
        let survivor = self
            .records
            .values()
            .find(|r| r.slot != lost_slot && r.is_usable())
            .map(|r| r.subscription);

        if let Some(sub) = survivor {
            tracing::debug!(from = %self.primary, to = %sub, "primary sim reassigned");
            self.primary = sub;
        }
    }

    /// A single usable SIM is always primary.
    fn enforce_single_primary(&mut self) {
        let mut usable = self.records.values().filter(|r| r.is_usable());
        if let (Some(only), None) = (usable.next(), usable.next()) {
            self.primary = only.subscription;
        }
    }

    fn query_record(&self, slot: SlotId, subscription: SubscriptionId) -> SimRecord {
        let sim_state = self.source.sim_state(subscription);
        let data_service = data_service_state(self.source.service_state(subscription).as_ref());
        let signal_level = self
            .source
            .signal_level(subscription)
            .map(clamp_signal_level)
            .unwrap_or(SIM_SIGNAL_LEVEL_MAX);
        SimRecord::new(slot, subscription, sim_state, data_service, signal_level)
    }

    fn diff(&self, before: &SimSnapshot) -> SimUpdate {
        if self.records == before.records && self.primary == before.primary {
            SimUpdate::Unchanged
        } else {
            SimUpdate::Changed {
                recheck_network: true,
            }
        }
    }
}

impl std::fmt::Debug for SimRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimRegistry")
            .field("records", &self.records)
            .field("primary", &self.primary)
            .field("available", &self.available)
            .finish()
    }
}
