//! Render-target contract and stock implementations.
//!
//! The render target is touched only from the delivery thread, and only with
//! values that already passed the dedup gate.

use crate::bus::EventBusRef;
use crate::delivery::{Delivery, Dimension};
use statusbar_signals::{NetworkState, NetworkType, SimSnapshot, TransferDirection, BatteryState};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Wifi level count assumed when the target does not say otherwise.
pub const DEFAULT_WIFI_MAX_LEVEL: u8 = 4;

/// Consumer of reconciled status values.
pub trait RenderTarget: Send + Sync {
    /// SIM records keyed by slot, plus the primary subscription. Always a copy.
    fn on_sim_changed(&self, snapshot: SimSnapshot);

    fn on_battery_changed(&self, fraction: f32, charging: bool);

    fn on_airplane_changed(&self, enabled: bool);

    fn on_network_type_changed(
        &self,
        network_type: NetworkType,
        signal_fraction: f32,
        transfer: TransferDirection,
    );

    fn on_headset_changed(&self, present: bool);

    /// Number of wifi bars the target draws.
    fn wifi_max_level(&self) -> u8 {
        DEFAULT_WIFI_MAX_LEVEL
    }

    /// Whether the target's charging animation disagrees with `charging`.
    ///
    /// Returning true forces a battery redelivery even when the value is unchanged.
    fn battery_animation_desynced(&self, _charging: bool) -> bool {
        false
    }
}

/// Target that ignores everything.
pub struct NullTarget;

impl RenderTarget for NullTarget {
    fn on_sim_changed(&self, _snapshot: SimSnapshot) {}

    fn on_battery_changed(&self, _fraction: f32, _charging: bool) {}

    fn on_airplane_changed(&self, _enabled: bool) {}

    fn on_network_type_changed(
        &self,
        _network_type: NetworkType,
        _signal_fraction: f32,
        _transfer: TransferDirection,
    ) {
    }

    fn on_headset_changed(&self, _present: bool) {}
}

#[derive(Debug)]
struct RecorderHints {
    wifi_max_level: u8,
    animation_desynced: bool,
}

/// Target that records every delivery for later inspection.
pub struct RecordingTarget {
    deliveries: Mutex<Vec<Delivery>>,
    hints: Mutex<RecorderHints>,
}

impl Default for RecordingTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self {
            deliveries: Mutex::new(Vec::new()),
            hints: Mutex::new(RecorderHints {
                wifi_max_level: DEFAULT_WIFI_MAX_LEVEL,
                animation_desynced: false,
            }),
        }
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<Delivery>> {
        self.deliveries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn hints(&self) -> MutexGuard<'_, RecorderHints> {
        self.hints.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_wifi_max_level(&self, level: u8) {
        self.hints().wifi_max_level = level;
    }

    /// Pretend the charging animation is out of step with the logical state.
    pub fn set_animation_desynced(&self, desynced: bool) {
        self.hints().animation_desynced = desynced;
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.recorded().clone()
    }

    pub fn deliveries_for(&self, dimension: Dimension) -> Vec<Delivery> {
        self.recorded()
            .iter()
            .filter(|d| d.dimension() == dimension)
            .cloned()
            .collect()
    }

    pub fn count_for(&self, dimension: Dimension) -> usize {
        self.recorded()
            .iter()
            .filter(|d| d.dimension() == dimension)
            .count()
    }

    pub fn last_for(&self, dimension: Dimension) -> Option<Delivery> {
        self.recorded()
            .iter()
            .rev()
            .find(|d| d.dimension() == dimension)
            .cloned()
    }

    pub fn sim_deliveries(&self) -> Vec<SimSnapshot> {
        self.recorded()
            .iter()
            .filter_map(|d| match d {
                Delivery::Sim(snapshot) => Some(snapshot.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn network_deliveries(&self) -> Vec<NetworkState> {
        self.recorded()
            .iter()
            .filter_map(|d| match d {
                Delivery::Network(state) => Some(*state),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.recorded().clear();
    }

    pub fn len(&self) -> usize {
        self.recorded().len()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded().is_empty()
    }

    fn push(&self, delivery: Delivery) {
        self.recorded().push(delivery);
    }
}

impl RenderTarget for RecordingTarget {
    fn on_sim_changed(&self, snapshot: SimSnapshot) {
        self.push(Delivery::Sim(snapshot));
    }

    fn on_battery_changed(&self, fraction: f32, charging: bool) {
        self.push(Delivery::Battery(BatteryState { fraction, charging }));
    }

    fn on_airplane_changed(&self, enabled: bool) {
        self.push(Delivery::Airplane { enabled });
    }

    fn on_network_type_changed(
        &self,
        network_type: NetworkType,
        signal_fraction: f32,
        transfer: TransferDirection,
    ) {
        self.push(Delivery::Network(NetworkState {
            network_type,
            signal_fraction,
            transfer,
        }));
    }

    fn on_headset_changed(&self, present: bool) {
        self.push(Delivery::Headset { present });
    }

    fn wifi_max_level(&self) -> u8 {
        self.hints().wifi_max_level
    }

    fn battery_animation_desynced(&self, _charging: bool) -> bool {
        self.hints().animation_desynced
    }
}

/// Target that mirrors every delivery onto an event bus as JSON.
pub struct EventBusTarget {
    bus: EventBusRef,
    wifi_max_level: u8,
}

impl EventBusTarget {
    pub fn new(bus: EventBusRef) -> Self {
        Self {
            bus,
            wifi_max_level: DEFAULT_WIFI_MAX_LEVEL,
        }
    }

    pub fn with_wifi_max_level(mut self, level: u8) -> Self {
        self.wifi_max_level = level;
        self
    }

    fn publish(&self, delivery: Delivery) {
        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let topic = delivery.dimension().topic();
        match delivery.to_event(timestamp_ms) {
            Ok(payload) => self.bus.publish(topic, payload),
            Err(e) => tracing::warn!(topic, error = %e, "failed to serialize status event"),
        }
    }
}

impl RenderTarget for EventBusTarget {
    fn on_sim_changed(&self, snapshot: SimSnapshot) {
        self.publish(Delivery::Sim(snapshot));
    }

    fn on_battery_changed(&self, fraction: f32, charging: bool) {
        self.publish(Delivery::Battery(BatteryState { fraction, charging }));
    }

    fn on_airplane_changed(&self, enabled: bool) {
        self.publish(Delivery::Airplane { enabled });
    }

    fn on_network_type_changed(
        &self,
        network_type: NetworkType,
        signal_fraction: f32,
        transfer: TransferDirection,
    ) {
        self.publish(Delivery::Network(NetworkState {
            network_type,
            signal_fraction,
            transfer,
        }));
    }

    fn on_headset_changed(&self, present: bool) {
        self.publish(Delivery::Headset { present });
    }

    fn wifi_max_level(&self) -> u8 {
        self.wifi_max_level
    }
}
