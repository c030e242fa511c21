//! Scriptable in-process device.
//!
//! `FakeDevice` implements every source trait over plain in-memory state.
//! Setters change what queries return; `fire_*` methods invoke the registered
//! listeners the way a platform would. Used by tests and the simulation demo.

use crate::capability::{Capability, CapabilityProvider, PlatformVersion};
use crate::error::{SignalError, SignalResult};
use crate::model::{DataServiceState, SimState, SlotId, SubscriptionId};
use crate::network::TransportInfo;
use crate::normalize::{AudioDeviceType, BatteryReading, RawServiceState, SimBroadcast};
use crate::provider::{
    AirplaneEvent, AirplaneSource, BatterySource, HeadsetEvent, HeadsetSource, Listener,
    NetworkEvent, NetworkSource, PhoneStateEvent, SubscriptionInfo, SubscriptionSource,
};
use crate::watch::WatchHandle;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
struct FakeSim {
    subscription: SubscriptionId,
    sim_state: SimState,
    service: Option<RawServiceState>,
    level: Option<i32>,
}

#[derive(Debug)]
struct DeviceState {
    version: u32,
    denied: HashSet<Capability>,
    slot_count: u32,
    sims: BTreeMap<SlotId, FakeSim>,
    default_data: Option<SubscriptionId>,
    transport: Option<TransportInfo>,
    network_available: bool,
    battery: Option<BatteryReading>,
    airplane: bool,
    output_devices: Option<Vec<AudioDeviceType>>,
    legacy_headset: bool,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            version: PlatformVersion::Q.0,
            denied: HashSet::new(),
            slot_count: 2,
            sims: BTreeMap::new(),
            default_data: None,
            transport: None,
            network_available: false,
            battery: None,
            airplane: false,
            output_devices: Some(Vec::new()),
            legacy_headset: false,
        }
    }
}

#[derive(Default)]
struct Listeners {
    subscriptions: Vec<(u64, Listener<()>)>,
    phone: Vec<(u64, SubscriptionId, Listener<PhoneStateEvent>)>,
    sim_broadcasts: Vec<(u64, Listener<SimBroadcast>)>,
    network: Vec<(u64, Listener<NetworkEvent>)>,
    battery: Vec<(u64, Listener<Option<BatteryReading>>)>,
    airplane: Vec<(u64, Listener<AirplaneEvent>)>,
    headset: Vec<(u64, Listener<HeadsetEvent>)>,
}

impl Listeners {
    fn remove(&mut self, id: u64) {
        self.subscriptions.retain(|(i, _)| *i != id);
        self.phone.retain(|(i, _, _)| *i != id);
        self.sim_broadcasts.retain(|(i, _)| *i != id);
        self.network.retain(|(i, _)| *i != id);
        self.battery.retain(|(i, _)| *i != id);
        self.airplane.retain(|(i, _)| *i != id);
        self.headset.retain(|(i, _)| *i != id);
    }

    fn len(&self) -> usize {
        self.subscriptions.len()
            + self.phone.len()
            + self.sim_broadcasts.len()
            + self.network.len()
            + self.battery.len()
            + self.airplane.len()
            + self.headset.len()
    }
}

/// In-memory device with scriptable state and events.
pub struct FakeDevice {
    state: Mutex<DeviceState>,
    listeners: Arc<Mutex<Listeners>>,
    next_id: AtomicU64,
}

impl Default for FakeDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDevice {
    /// Dual-slot device on a recent platform with every capability granted.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DeviceState::default()),
            listeners: Arc::new(Mutex::new(Listeners::default())),
            next_id: AtomicU64::new(1),
        }
    }

    // ------------------------------------------------------------------
    // Scripting
    // ------------------------------------------------------------------

    pub fn set_platform_version(&self, version: u32) {
        lock(&self.state).version = version;
    }

    pub fn deny(&self, capability: Capability) {
        lock(&self.state).denied.insert(capability);
    }

    pub fn grant(&self, capability: Capability) {
        lock(&self.state).denied.remove(&capability);
    }

    pub fn set_slot_count(&self, count: u32) {
        lock(&self.state).slot_count = count;
    }

    /// Put a ready, in-service card into `slot`.
    pub fn insert_sim(&self, slot: SlotId, subscription: SubscriptionId, level: i32) {
        lock(&self.state).sims.insert(
            slot,
            FakeSim {
                subscription,
                sim_state: SimState::Ready,
                service: Some(RawServiceState::with_data_state(DataServiceState::InService)),
                level: Some(level),
            },
        );
    }

    pub fn remove_sim(&self, slot: SlotId) {
        lock(&self.state).sims.remove(&slot);
    }

    pub fn set_sim_state(&self, slot: SlotId, sim_state: SimState) {
        if let Some(sim) = lock(&self.state).sims.get_mut(&slot) {
            sim.sim_state = sim_state;
        }
    }

    pub fn set_data_service(&self, slot: SlotId, state: DataServiceState) {
        if let Some(sim) = lock(&self.state).sims.get_mut(&slot) {
            sim.service = Some(RawServiceState::with_data_state(state));
        }
    }

    pub fn set_signal_level(&self, slot: SlotId, level: Option<i32>) {
        if let Some(sim) = lock(&self.state).sims.get_mut(&slot) {
            sim.level = level;
        }
    }

    pub fn set_default_data(&self, subscription: Option<SubscriptionId>) {
        lock(&self.state).default_data = subscription;
    }

    /// Set the default network. `Some` also marks the network available.
    pub fn set_transport(&self, transport: Option<TransportInfo>) {
        let mut state = lock(&self.state);
        state.network_available = transport.is_some();
        state.transport = transport;
    }

    pub fn set_network_available(&self, available: bool) {
        lock(&self.state).network_available = available;
    }

    pub fn set_battery(&self, reading: Option<BatteryReading>) {
        lock(&self.state).battery = reading;
    }

    pub fn set_airplane(&self, enabled: bool) {
        lock(&self.state).airplane = enabled;
    }

    pub fn set_output_devices(&self, devices: Option<Vec<AudioDeviceType>>) {
        lock(&self.state).output_devices = devices;
    }

    pub fn set_legacy_headset(&self, on: bool) {
        lock(&self.state).legacy_headset = on;
    }

    /// Listeners currently registered across all sources.
    pub fn active_watch_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn fire_subscriptions_changed(&self) {
        let targets: Vec<_> = lock(&self.listeners)
            .subscriptions
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in targets {
            listener(());
        }
    }

    pub fn fire_phone_state(&self, subscription: SubscriptionId, event: PhoneStateEvent) {
        let targets: Vec<_> = lock(&self.listeners)
            .phone
            .iter()
            .filter(|(_, sub, _)| *sub == subscription)
            .map(|(_, _, l)| l.clone())
            .collect();
        for listener in targets {
            listener(event.clone());
        }
    }

    /// Fire a service-state callback reflecting the slot's current service.
    pub fn fire_service_state(&self, slot: SlotId) {
        let found = lock(&self.state)
            .sims
            .get(&slot)
            .map(|sim| (sim.subscription, sim.service.clone().unwrap_or_default()));
        if let Some((subscription, raw)) = found {
            self.fire_phone_state(subscription, PhoneStateEvent::ServiceState(raw));
        }
    }

    pub fn fire_signal_strength(&self, subscription: SubscriptionId, level: i32) {
        self.fire_phone_state(subscription, PhoneStateEvent::SignalStrength(level));
    }

    pub fn fire_sim_broadcast(&self, broadcast: SimBroadcast) {
        let targets: Vec<_> = lock(&self.listeners)
            .sim_broadcasts
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in targets {
            listener(broadcast.clone());
        }
    }

    pub fn fire_network(&self, event: NetworkEvent) {
        let targets: Vec<_> = lock(&self.listeners)
            .network
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in targets {
            listener(event.clone());
        }
    }

    pub fn fire_battery(&self, reading: Option<BatteryReading>) {
        let targets: Vec<_> = lock(&self.listeners)
            .battery
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in targets {
            listener(reading);
        }
    }

    pub fn fire_airplane(&self, enabled: Option<bool>) {
        let targets: Vec<_> = lock(&self.listeners)
            .airplane
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in targets {
            listener(AirplaneEvent { enabled });
        }
    }

    pub fn fire_headset(&self, event: HeadsetEvent) {
        let targets: Vec<_> = lock(&self.listeners)
            .headset
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in targets {
            listener(event.clone());
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn handle(&self, label: &'static str, id: u64) -> WatchHandle {
        let listeners = Arc::clone(&self.listeners);
        WatchHandle::new(label, move || lock(&listeners).remove(id))
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn require_phone_state(&self) -> SignalResult<()> {
        if self.has_permission(Capability::ReadPhoneState) {
            Ok(())
        } else {
            Err(SignalError::CapabilityDenied(Capability::ReadPhoneState))
        }
    }

    fn sim_by_subscription(&self, subscription: SubscriptionId) -> Option<FakeSim> {
        lock(&self.state)
            .sims
            .values()
            .find(|sim| sim.subscription == subscription)
            .cloned()
    }
}

impl CapabilityProvider for FakeDevice {
    fn has_permission(&self, capability: Capability) -> bool {
        !lock(&self.state).denied.contains(&capability)
    }

    fn platform_version_at_least(&self, version: PlatformVersion) -> bool {
        lock(&self.state).version >= version.0
    }
}

impl SubscriptionSource for FakeDevice {
    fn slot_count(&self) -> u32 {
        lock(&self.state).slot_count
    }

    fn subscription_for_slot(&self, slot: SlotId) -> Option<SubscriptionId> {
        lock(&self.state).sims.get(&slot).map(|sim| sim.subscription)
    }

    fn active_subscriptions(&self) -> Vec<SubscriptionInfo> {
        if !self.has_permission(Capability::ReadPhoneState) {
            return Vec::new();
        }
        lock(&self.state)
            .sims
            .iter()
            .map(|(slot, sim)| SubscriptionInfo {
                slot: *slot,
                subscription: sim.subscription,
            })
            .collect()
    }

    fn sim_state(&self, subscription: SubscriptionId) -> SimState {
        self.sim_by_subscription(subscription)
            .map(|sim| sim.sim_state)
            .unwrap_or(SimState::Absent)
    }

    fn service_state(&self, subscription: SubscriptionId) -> Option<RawServiceState> {
        self.sim_by_subscription(subscription)
            .and_then(|sim| sim.service)
    }

    fn signal_level(&self, subscription: SubscriptionId) -> Option<i32> {
        self.sim_by_subscription(subscription)
            .and_then(|sim| sim.level)
    }

    fn default_data_subscription(&self) -> Option<SubscriptionId> {
        lock(&self.state).default_data
    }

    fn watch_subscriptions(&self, listener: Listener<()>) -> SignalResult<WatchHandle> {
        self.require_phone_state()?;
        let id = self.next_id();
        lock(&self.listeners).subscriptions.push((id, listener));
        Ok(self.handle("subscriptions", id))
    }

    fn watch_phone_state(
        &self,
        subscription: SubscriptionId,
        listener: Listener<PhoneStateEvent>,
    ) -> SignalResult<WatchHandle> {
        self.require_phone_state()?;
        let id = self.next_id();
        lock(&self.listeners)
            .phone
            .push((id, subscription, listener));
        Ok(self.handle("phone-state", id))
    }

    fn watch_sim_broadcasts(&self, listener: Listener<SimBroadcast>) -> SignalResult<WatchHandle> {
        let id = self.next_id();
        lock(&self.listeners).sim_broadcasts.push((id, listener));
        Ok(self.handle("sim-broadcasts", id))
    }
}

impl NetworkSource for FakeDevice {
    fn current_transport(&self) -> Option<TransportInfo> {
        lock(&self.state).transport.clone()
    }

    fn is_network_available(&self) -> bool {
        lock(&self.state).network_available
    }

    fn watch(&self, listener: Listener<NetworkEvent>) -> SignalResult<WatchHandle> {
        let id = self.next_id();
        lock(&self.listeners).network.push((id, listener));
        Ok(self.handle("network", id))
    }
}

impl BatterySource for FakeDevice {
    fn current(&self) -> Option<BatteryReading> {
        lock(&self.state).battery
    }

    fn watch(&self, listener: Listener<Option<BatteryReading>>) -> SignalResult<WatchHandle> {
        let id = self.next_id();
        lock(&self.listeners).battery.push((id, listener));
        Ok(self.handle("battery", id))
    }
}

impl AirplaneSource for FakeDevice {
    fn is_airplane_mode(&self) -> bool {
        lock(&self.state).airplane
    }

    fn watch(&self, listener: Listener<AirplaneEvent>) -> SignalResult<WatchHandle> {
        let id = self.next_id();
        lock(&self.listeners).airplane.push((id, listener));
        Ok(self.handle("airplane", id))
    }
}

impl HeadsetSource for FakeDevice {
    fn output_devices(&self) -> Option<Vec<AudioDeviceType>> {
        lock(&self.state).output_devices.clone()
    }

    fn legacy_headset_on(&self) -> bool {
        lock(&self.state).legacy_headset
    }

    fn watch(&self, listener: Listener<HeadsetEvent>) -> SignalResult<WatchHandle> {
        let id = self.next_id();
        lock(&self.listeners).headset.push((id, listener));
        Ok(self.handle("headset", id))
    }
}
