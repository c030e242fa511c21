//! Source traits for device signals.
//!
//! Each trait abstracts one platform subsystem. Implementations may invoke
//! listeners from any thread; consumers must hand events off before touching
//! shared state.

use crate::capability::{AllowAll, CapabilityProvider};
use crate::error::SignalResult;
use crate::model::{SimState, SlotId, SubscriptionId};
use crate::network::TransportInfo;
use crate::normalize::{AudioDeviceType, BatteryReading, RawServiceState, SimBroadcast};
use crate::watch::WatchHandle;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Listener invoked by a source for every event.
pub type Listener<E> = Arc<dyn Fn(E) + Send + Sync>;

/// Active subscription as listed by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionInfo {
    pub slot: SlotId,
    pub subscription: SubscriptionId,
}

/// Per-subscription phone state callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhoneStateEvent {
    ServiceState(RawServiceState),
    /// Raw signal level, not yet clamped.
    SignalStrength(i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    CapabilitiesChanged(TransportInfo),
    Lost,
    Unavailable,
    DefaultNetworkActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AirplaneEvent {
    /// New value when the broadcast carries it.
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadsetEvent {
    DevicesAdded(Vec<AudioDeviceType>),
    DevicesRemoved(Vec<AudioDeviceType>),
    /// Legacy wired plug broadcast; 1 means plugged.
    WiredPlug { state: i32 },
    /// Legacy bluetooth headset connection broadcast.
    BluetoothConnection { state: i32 },
    BecomingNoisy,
}

/// Cellular subscriptions and per-subscription radio state.
pub trait SubscriptionSource: Send + Sync {
    /// Number of physical SIM slots.
    fn slot_count(&self) -> u32;

    /// Subscription currently bound to a slot, if the slot holds a card.
    fn subscription_for_slot(&self, slot: SlotId) -> Option<SubscriptionId>;

    fn active_subscriptions(&self) -> Vec<SubscriptionInfo>;

    fn sim_state(&self, subscription: SubscriptionId) -> SimState;

    fn service_state(&self, subscription: SubscriptionId) -> Option<RawServiceState>;

    fn signal_level(&self, subscription: SubscriptionId) -> Option<i32>;

    fn default_data_subscription(&self) -> Option<SubscriptionId>;

    fn watch_subscriptions(&self, listener: Listener<()>) -> SignalResult<WatchHandle>;

    fn watch_phone_state(
        &self,
        subscription: SubscriptionId,
        listener: Listener<PhoneStateEvent>,
    ) -> SignalResult<WatchHandle>;

    fn watch_sim_broadcasts(&self, listener: Listener<SimBroadcast>) -> SignalResult<WatchHandle>;
}

pub trait NetworkSource: Send + Sync {
    /// Transport of the default network, `None` when nothing is connected.
    fn current_transport(&self) -> Option<TransportInfo>;

    fn is_network_available(&self) -> bool;

    fn watch(&self, listener: Listener<NetworkEvent>) -> SignalResult<WatchHandle>;
}

pub trait BatterySource: Send + Sync {
    fn current(&self) -> Option<BatteryReading>;

    /// `None` payloads are forwarded so the consumer can drop them as malformed.
    fn watch(&self, listener: Listener<Option<BatteryReading>>) -> SignalResult<WatchHandle>;
}

pub trait AirplaneSource: Send + Sync {
    fn is_airplane_mode(&self) -> bool;

    fn watch(&self, listener: Listener<AirplaneEvent>) -> SignalResult<WatchHandle>;
}

pub trait HeadsetSource: Send + Sync {
    /// Output devices, or `None` when the platform cannot enumerate them.
    fn output_devices(&self) -> Option<Vec<AudioDeviceType>>;

    /// Legacy wired/bluetooth headset query.
    fn legacy_headset_on(&self) -> bool;

    fn watch(&self, listener: Listener<HeadsetEvent>) -> SignalResult<WatchHandle>;
}

/// Explicitly owned bundle of every platform collaborator.
#[derive(Clone)]
pub struct Platform {
    pub capabilities: Arc<dyn CapabilityProvider>,
    pub subscriptions: Arc<dyn SubscriptionSource>,
    pub network: Arc<dyn NetworkSource>,
    pub battery: Arc<dyn BatterySource>,
    pub airplane: Arc<dyn AirplaneSource>,
    pub headset: Arc<dyn HeadsetSource>,
}

impl Platform {
    /// Platform that reports nothing and never fires.
    pub fn null() -> Self {
        let null = Arc::new(NullProvider);
        Self {
            capabilities: Arc::new(AllowAll),
            subscriptions: null.clone(),
            network: null.clone(),
            battery: null.clone(),
            airplane: null.clone(),
            headset: null,
        }
    }

    /// Use one object for every source.
    pub fn from_device<D>(device: Arc<D>) -> Self
    where
        D: CapabilityProvider
            + SubscriptionSource
            + NetworkSource
            + BatterySource
            + AirplaneSource
            + HeadsetSource
            + 'static,
    {
        Self {
            capabilities: device.clone(),
            subscriptions: device.clone(),
            network: device.clone(),
            battery: device.clone(),
            airplane: device.clone(),
            headset: device,
        }
    }
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform").finish_non_exhaustive()
    }
}

/// Null implementation for tests or unsupported platforms.
pub struct NullProvider;

impl SubscriptionSource for NullProvider {
    fn slot_count(&self) -> u32 {
        0
    }

    fn subscription_for_slot(&self, _slot: SlotId) -> Option<SubscriptionId> {
        None
    }

    fn active_subscriptions(&self) -> Vec<SubscriptionInfo> {
        Vec::new()
    }

    fn sim_state(&self, _subscription: SubscriptionId) -> SimState {
        SimState::Unknown
    }

    fn service_state(&self, _subscription: SubscriptionId) -> Option<RawServiceState> {
        None
    }

    fn signal_level(&self, _subscription: SubscriptionId) -> Option<i32> {
        None
    }

    fn default_data_subscription(&self) -> Option<SubscriptionId> {
        None
    }

    fn watch_subscriptions(&self, _listener: Listener<()>) -> SignalResult<WatchHandle> {
        Ok(WatchHandle::detached("null-subscriptions"))
    }

    fn watch_phone_state(
        &self,
        _subscription: SubscriptionId,
        _listener: Listener<PhoneStateEvent>,
    ) -> SignalResult<WatchHandle> {
        Ok(WatchHandle::detached("null-phone-state"))
    }

    fn watch_sim_broadcasts(&self, _listener: Listener<SimBroadcast>) -> SignalResult<WatchHandle> {
        Ok(WatchHandle::detached("null-sim-broadcasts"))
    }
}

impl NetworkSource for NullProvider {
    fn current_transport(&self) -> Option<TransportInfo> {
        None
    }

    fn is_network_available(&self) -> bool {
        false
    }

    fn watch(&self, _listener: Listener<NetworkEvent>) -> SignalResult<WatchHandle> {
        Ok(WatchHandle::detached("null-network"))
    }
}

impl BatterySource for NullProvider {
    fn current(&self) -> Option<BatteryReading> {
        None
    }

    fn watch(&self, _listener: Listener<Option<BatteryReading>>) -> SignalResult<WatchHandle> {
        Ok(WatchHandle::detached("null-battery"))
    }
}

impl AirplaneSource for NullProvider {
    fn is_airplane_mode(&self) -> bool {
        false
    }

    fn watch(&self, _listener: Listener<AirplaneEvent>) -> SignalResult<WatchHandle> {
        Ok(WatchHandle::detached("null-airplane"))
    }
}

impl HeadsetSource for NullProvider {
    fn output_devices(&self) -> Option<Vec<AudioDeviceType>> {
        None
    }

    fn legacy_headset_on(&self) -> bool {
        false
    }

    fn watch(&self, _listener: Listener<HeadsetEvent>) -> SignalResult<WatchHandle> {
        Ok(WatchHandle::detached("null-headset"))
    }
}
