//! State machine run on the delivery thread.
//!
//! `Core` owns the SIM registry, the dedup gate and the registration ledger.
//! Only tasks executed by the scheduler reach it, so none of this needs locks.

use crate::adapters;
use crate::config::MonitorConfig;
use crate::ledger::{RegistrationLedger, WatchKey};
use crate::reconciler::{DeliveredSnapshot, Reconciler};
use crate::sequence::Watermark;
use statusbar_events::{Delivery, Dimension, RenderTarget};
use statusbar_registry::{PhoneWatch, SimRegistry, SimUpdate};
use statusbar_scheduler::SchedulerHandle;
use statusbar_signals::{
    any_headset, classify, normalize_battery, BatteryState, DataServiceState, HeadsetEvent,
    NetworkState, NetworkType, PhysicalChange, Platform, SignalResult, SimSnapshot, SlotId,
    TransportInfo, WatchHandle, AUDIO_DEVICES_MIN_VERSION, BLUETOOTH_STATE_CONNECTED,
};
use std::sync::Arc;

/// Kinds of coalesced work. At most one task per kind is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    Battery,
    Network,
    NetworkLostRecheck,
}

pub(crate) type CoreHandle = SchedulerHandle<Core, UpdateKind>;

pub struct Core {
    config: MonitorConfig,
    platform: Platform,
    target: Arc<dyn RenderTarget>,
    registry: SimRegistry,
    reconciler: Reconciler,
    ledger: RegistrationLedger,
    handle: CoreHandle,
    battery_order: Watermark,
    network_order: Watermark,
    started: bool,
}

impl Core {
    pub(crate) fn new(
        config: MonitorConfig,
        platform: Platform,
        target: Arc<dyn RenderTarget>,
        handle: CoreHandle,
    ) -> Self {
        let registry = SimRegistry::new(
            Arc::clone(&platform.subscriptions),
            Arc::clone(&platform.capabilities),
        );
        let reconciler = Reconciler::new(config.animation_correction);
        Self {
            config,
            platform,
            target,
            registry,
            reconciler,
            ledger: RegistrationLedger::new(),
            handle,
            battery_order: Watermark::default(),
            network_order: Watermark::default(),
            started: false,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Install every enabled watch, then deliver all dimensions once.
    pub(crate) fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        let sources = self.config.sources;

        if sources.sims {
            let watches = self.registry.initialize();
            self.install(WatchKey::Subscriptions, |core| {
                adapters::watch_subscriptions(core.platform.subscriptions.as_ref(), &core.handle)
            });
            self.install(WatchKey::SimBroadcasts, |core| {
                adapters::watch_sim_broadcasts(core.platform.subscriptions.as_ref(), &core.handle)
            });
            for watch in watches {
                self.install_phone_watch(watch);
            }
        }
        if sources.battery {
            let delay = self.config.battery_coalesce();
            let tickets = self.battery_order.tickets();
            self.install(WatchKey::Battery, |core| {
                adapters::watch_battery(
                    core.platform.battery.as_ref(),
                    &core.handle,
                    tickets,
                    delay,
                )
            });
        }
        if sources.airplane {
            self.install(WatchKey::Airplane, |core| {
                adapters::watch_airplane(core.platform.airplane.as_ref(), &core.handle)
            });
        }
        if sources.headset {
            self.install(WatchKey::Headset, |core| {
                adapters::watch_headset(core.platform.headset.as_ref(), &core.handle)
            });
        }
        if sources.network {
            let delay = self.config.network_coalesce();
            let tickets = self.network_order.tickets();
            self.install(WatchKey::Network, |core| {
                adapters::watch_network(
                    core.platform.network.as_ref(),
                    &core.handle,
                    tickets,
                    delay,
                )
            });
        }

        tracing::info!(watches = self.ledger.len(), "status monitor started");
        self.full_refresh();
    }

    /// Release every watch and drop pending coalesced work.
    pub(crate) fn stop(&mut self) {
        if !self.started {
            return;
        }
        self.started = false;
        let released = self.ledger.release_all();
        for kind in [
            UpdateKind::Battery,
            UpdateKind::Network,
            UpdateKind::NetworkLostRecheck,
        ] {
            let _ = self.handle.cancel(kind);
        }
        self.reconciler.reset();
        tracing::info!(released, "status monitor stopped");
    }

    /// Recompute every enabled dimension and deliver it, bypassing the gate.
    pub(crate) fn full_refresh(&mut self) {
        if !self.started {
            return;
        }
        let sources = self.config.sources;

        if sources.sims {
            let _ = self.registry.refresh_all();
            self.sync_phone_watches();
            self.force(Delivery::Sim(self.registry.snapshot()));
        }
        if sources.battery {
            self.battery_order.supersede();
            match normalize_battery(self.platform.battery.current().as_ref()) {
                Ok(state) => self.force(Delivery::Battery(state)),
                Err(e) => e.log(),
            }
        }
        if sources.airplane {
            let enabled = self.platform.airplane.is_airplane_mode();
            self.force(Delivery::Airplane { enabled });
        }
        if sources.headset {
            let present = self.query_headset();
            self.force(Delivery::Headset { present });
        }
        if sources.network {
            self.network_order.supersede();
            let state = self.current_network();
            self.force(Delivery::Network(state));
        }
    }

    pub(crate) fn sim_snapshot(&self) -> SimSnapshot {
        self.registry.snapshot()
    }

    pub(crate) fn delivered(&self) -> DeliveredSnapshot {
        self.reconciler.delivered().clone()
    }

    pub(crate) fn watch_count(&self) -> usize {
        self.ledger.len()
    }

    // ------------------------------------------------------------------
    // SIM events
    // ------------------------------------------------------------------

    pub(crate) fn on_subscriptions_changed(&mut self) {
        if !self.started {
            return;
        }
        let outcome = self.registry.on_subscriptions_changed();
        for watch in outcome.watches {
            self.install_phone_watch(watch);
        }
        self.sync_phone_watches();

        if outcome.cleared {
            self.force(Delivery::Sim(self.registry.snapshot()));
            self.recheck_network();
        } else {
            self.apply_sim_update(outcome.update);
        }
    }

    pub(crate) fn on_physical_change(&mut self, change: PhysicalChange) {
        if !self.started {
            return;
        }
        let update = self.registry.on_physical_change(&change, None);
        self.apply_sim_update(update);
    }

    pub(crate) fn on_service_state(&mut self, slot: SlotId, state: DataServiceState) {
        if !self.started {
            return;
        }
        let result = self.registry.on_service_state_changed(slot, state);
        self.apply_sim_result(result);
    }

    pub(crate) fn on_signal_strength(&mut self, slot: SlotId, raw: i32) {
        if !self.started {
            return;
        }
        let result = self.registry.on_signal_strength_changed(slot, raw);
        self.apply_sim_result(result);
    }

    fn apply_sim_result(&mut self, result: SignalResult<SimUpdate>) {
        match result {
            Ok(update) => self.apply_sim_update(update),
            Err(e) => e.log(),
        }
    }

    fn apply_sim_update(&mut self, update: SimUpdate) {
        if !update.is_changed() {
            return;
        }
        self.sync_phone_watches();
        self.propose(Delivery::Sim(self.registry.snapshot()));
        if update.recheck_network() {
            self.recheck_network();
        }
    }

    // ------------------------------------------------------------------
    // Battery, airplane, headset
    // ------------------------------------------------------------------

    pub(crate) fn on_battery(&mut self, ticket: u64, state: BatteryState) {
        if !self.started || !self.admit_battery(ticket) {
            return;
        }
        self.propose(Delivery::Battery(state));
    }

    /// `None` means the event did not carry the value; query it.
    pub(crate) fn on_airplane(&mut self, enabled: Option<bool>) {
        if !self.started {
            return;
        }
        let enabled = enabled.unwrap_or_else(|| self.platform.airplane.is_airplane_mode());
        self.propose(Delivery::Airplane { enabled });
    }

    pub(crate) fn on_headset(&mut self, event: HeadsetEvent) {
        if !self.started {
            return;
        }
        let caps = self.platform.capabilities.as_ref();
        let present = match event {
            HeadsetEvent::DevicesAdded(devices) => {
                if !any_headset(&devices, caps) {
                    return;
                }
                true
            }
            HeadsetEvent::DevicesRemoved(devices) => {
                if !any_headset(&devices, caps) {
                    return;
                }
                self.query_headset()
            }
            HeadsetEvent::WiredPlug { state } => state == 1,
            HeadsetEvent::BluetoothConnection { state } => state == BLUETOOTH_STATE_CONNECTED,
            HeadsetEvent::BecomingNoisy => false,
        };
        self.propose(Delivery::Headset { present });
    }

    fn admit_battery(&mut self, ticket: u64) -> bool {
        let admitted = self.battery_order.admit(ticket);
        if !admitted {
            tracing::trace!(ticket, "stale battery reading dropped");
        }
        admitted
    }

    fn query_headset(&self) -> bool {
        let caps = self.platform.capabilities.as_ref();
        if !caps.platform_version_at_least(AUDIO_DEVICES_MIN_VERSION) {
            return self.platform.headset.legacy_headset_on();
        }
        match self.platform.headset.output_devices() {
            Some(devices) => any_headset(&devices, caps),
            None => self.platform.headset.legacy_headset_on(),
        }
    }

    // ------------------------------------------------------------------
    // Network
    // ------------------------------------------------------------------

    pub(crate) fn on_network_capabilities(&mut self, ticket: u64, info: TransportInfo) {
        if !self.started || !self.admit_network(ticket) {
            return;
        }
        let state = classify(Some(&info), self.target.wifi_max_level());
        self.propose(Delivery::Network(state));

        if self.config.sources.sims {
            if let Some(sub) = self.platform.subscriptions.default_data_subscription() {
                let update = self.registry.on_default_data_subscription_changed(sub);
                self.apply_sim_update(update);
            }
        }
    }

    pub(crate) fn on_network_lost(&mut self, ticket: u64) {
        if !self.started || !self.admit_network(ticket) {
            return;
        }
        if self.platform.network.is_network_available() {
            return;
        }
        self.propose(Delivery::Network(NetworkState::none()));

        let delay = self.config.network_lost_recheck();
        let _ = self.handle.post_delayed(UpdateKind::NetworkLostRecheck, delay, |core| {
            core.on_network_lost_recheck()
        });
    }

    /// The platform sometimes reports a loss while a replacement network is
    /// already coming up; pick it up once things settle.
    pub(crate) fn on_network_lost_recheck(&mut self) {
        if !self.started {
            return;
        }
        let state = self.current_network();
        if state.network_type != NetworkType::None {
            self.propose(Delivery::Network(state));
        }
    }

    pub(crate) fn on_network_unavailable(&mut self, ticket: u64) {
        if !self.started || !self.admit_network(ticket) {
            return;
        }
        self.propose(Delivery::Network(NetworkState::none()));
    }

    pub(crate) fn on_default_network_active(&mut self, ticket: u64) {
        if !self.started || !self.admit_network(ticket) {
            return;
        }
        let state = self.current_network();
        if state.network_type != NetworkType::None {
            self.propose(Delivery::Network(state));
        }
    }

    fn admit_network(&mut self, ticket: u64) -> bool {
        let admitted = self.network_order.admit(ticket);
        if !admitted {
            tracing::trace!(ticket, "stale network event dropped");
        }
        admitted
    }

    fn recheck_network(&mut self) {
        if !self.config.sources.network {
            return;
        }
        let state = self.current_network();
        self.propose(Delivery::Network(state));
    }

    fn current_network(&self) -> NetworkState {
        let transport = self.platform.network.current_transport();
        classify(transport.as_ref(), self.target.wifi_max_level())
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    fn propose(&mut self, value: Delivery) {
        if !self.config.sources.enabled(value.dimension()) {
            return;
        }
        self.reconciler.propose(value, self.target.as_ref());
    }

    fn force(&mut self, value: Delivery) {
        if !self.config.sources.enabled(value.dimension()) {
            return;
        }
        if value.dimension() == Dimension::Sim {
            tracing::debug!("forced sim delivery");
        }
        self.reconciler.force(value, self.target.as_ref());
    }

    fn install<F>(&mut self, key: WatchKey, register: F)
    where
        F: FnOnce(&Self) -> SignalResult<WatchHandle>,
    {
        match register(&*self) {
            Ok(handle) => {
                self.ledger.insert(key, handle);
            }
            Err(e) => e.log(),
        }
    }

    /// (Re)establish the phone-state watch for a slot, replacing any old one.
    fn install_phone_watch(&mut self, watch: PhoneWatch) {
        let result = adapters::watch_phone_state(
            self.platform.subscriptions.as_ref(),
            &self.handle,
            watch,
        );
        match result {
            Ok(handle) => {
                self.ledger
                    .insert_for(WatchKey::PhoneState(watch.slot), watch.subscription, handle);
            }
            Err(e) => e.log(),
        }
    }

    /// Make phone-state watches match the tracked records.
    fn sync_phone_watches(&mut self) {
        let targets = self.registry.watch_targets();

        for slot in self.ledger.phone_slots() {
            if !targets.iter().any(|t| t.slot == slot) {
                self.ledger.remove(WatchKey::PhoneState(slot));
            }
        }
        for watch in targets {
            let key = WatchKey::PhoneState(watch.slot);
            if self.ledger.subscription_of(key) != Some(watch.subscription) {
                self.install_phone_watch(watch);
            }
        }
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        self.ledger.release_all();
    }
}
