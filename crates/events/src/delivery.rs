//! Delivery payloads and their event-bus DTOs.

use crate::target::RenderTarget;
use serde::{Deserialize, Serialize};
use statusbar_signals::{
    BatteryState, NetworkState, NetworkType, SimRecord, SimSnapshot, SubscriptionId,
    TransferDirection,
};

/// Independently observed status dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Sim,
    Battery,
    Airplane,
    Headset,
    Network,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Sim,
        Dimension::Battery,
        Dimension::Airplane,
        Dimension::Headset,
        Dimension::Network,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Sim => "sim",
            Dimension::Battery => "battery",
            Dimension::Airplane => "airplane",
            Dimension::Headset => "headset",
            Dimension::Network => "network",
        }
    }

    /// Event-bus topic for this dimension.
    pub fn topic(&self) -> &'static str {
        match self {
            Dimension::Sim => event_names::SIM_CHANGED,
            Dimension::Battery => event_names::BATTERY_CHANGED,
            Dimension::Airplane => event_names::AIRPLANE_CHANGED,
            Dimension::Headset => event_names::HEADSET_CHANGED,
            Dimension::Network => event_names::NETWORK_CHANGED,
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One value handed to the render target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    Sim(SimSnapshot),
    Battery(BatteryState),
    Airplane { enabled: bool },
    Headset { present: bool },
    Network(NetworkState),
}

impl Delivery {
    pub fn dimension(&self) -> Dimension {
        match self {
            Delivery::Sim(_) => Dimension::Sim,
            Delivery::Battery(_) => Dimension::Battery,
            Delivery::Airplane { .. } => Dimension::Airplane,
            Delivery::Headset { .. } => Dimension::Headset,
            Delivery::Network(_) => Dimension::Network,
        }
    }

    /// Invoke the matching render-target callback.
    pub fn apply(self, target: &dyn RenderTarget) {
        match self {
            Delivery::Sim(snapshot) => target.on_sim_changed(snapshot),
            Delivery::Battery(battery) => {
                target.on_battery_changed(battery.fraction, battery.charging)
            }
            Delivery::Airplane { enabled } => target.on_airplane_changed(enabled),
            Delivery::Headset { present } => target.on_headset_changed(present),
            Delivery::Network(state) => target.on_network_type_changed(
                state.network_type,
                state.signal_fraction,
                state.transfer,
            ),
        }
    }

    /// Event-bus payload stamped with `timestamp_ms`.
    pub fn to_event(&self, timestamp_ms: i64) -> serde_json::Result<serde_json::Value> {
        match self {
            Delivery::Sim(snapshot) => serde_json::to_value(SimChangedEvent {
                records: snapshot.records.values().cloned().collect(),
                primary: snapshot.primary,
                timestamp_ms,
            }),
            Delivery::Battery(battery) => serde_json::to_value(BatteryChangedEvent {
                fraction: battery.fraction,
                charging: battery.charging,
                percent: battery.percent(),
                timestamp_ms,
            }),
            Delivery::Airplane { enabled } => serde_json::to_value(AirplaneChangedEvent {
                enabled: *enabled,
                timestamp_ms,
            }),
            Delivery::Headset { present } => serde_json::to_value(HeadsetChangedEvent {
                present: *present,
                timestamp_ms,
            }),
            Delivery::Network(state) => serde_json::to_value(NetworkChangedEvent {
                network_type: state.network_type,
                signal_fraction: state.signal_fraction,
                transfer: state.transfer,
                timestamp_ms,
            }),
        }
    }
}

/// Event emitted when the SIM map or primary subscription changes.
///
/// Records are ordered by slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimChangedEvent {
    pub records: Vec<SimRecord>,
    pub primary: SubscriptionId,
    /// Timestamp in milliseconds.
    #[serde(default)]
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryChangedEvent {
    pub fraction: f32,
    pub charging: bool,
    /// Rounded percentage, for display.
    pub percent: u8,
    #[serde(default)]
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirplaneChangedEvent {
    pub enabled: bool,
    #[serde(default)]
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadsetChangedEvent {
    pub present: bool,
    #[serde(default)]
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkChangedEvent {
    pub network_type: NetworkType,
    pub signal_fraction: f32,
    #[serde(default)]
    pub transfer: TransferDirection,
    #[serde(default)]
    pub timestamp_ms: i64,
}

/// Event names as constants to prevent typos.
pub mod event_names {
    pub const SIM_CHANGED: &str = "statusbar:sim";
    pub const BATTERY_CHANGED: &str = "statusbar:battery";
    pub const AIRPLANE_CHANGED: &str = "statusbar:airplane";
    pub const NETWORK_CHANGED: &str = "statusbar:network";
    pub const HEADSET_CHANGED: &str = "statusbar:headset";
}
