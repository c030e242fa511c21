//! Device signal model for the status bar monitor.
//!
//! This crate holds everything that does not need a thread:
//! - Canonical values (SIM records, battery, network state)
//! - Traits for the platform sources that produce them
//! - Pure classifiers and normalisers applied to raw platform payloads
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                             │
//! │  model.rs      - SimRecord, SimSnapshot, BatteryState        │
//! │  network.rs    - NetworkState and the network classifier     │
//! │  normalize.rs  - Broadcast/blob normalisation (pure)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Source Layer                             │
//! │  capability.rs - Permission/version oracle                   │
//! │  provider.rs   - Source traits, Platform bundle, nulls       │
//! │  watch.rs      - Scoped registration handles                 │
//! │  fake.rs       - Scriptable device for tests and demos       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use statusbar_signals::{classify, NetworkType, TransportInfo};
//!
//! let state = classify(Some(&TransportInfo::wifi(-65)), 4);
//! assert_eq!(state.network_type, NetworkType::Wifi);
//! assert_eq!(state.signal_fraction, 0.75);
//! ```

mod capability;
mod error;
mod model;
mod network;
mod normalize;
mod provider;
mod watch;

pub mod fake;

pub use capability::{
    require, AllowAll, Capability, CapabilityProvider, PlatformVersion,
    AUDIO_DEVICES_MIN_VERSION, SIM_INFO_MIN_VERSION,
};
pub use error::{SignalError, SignalResult};
pub use model::{
    clamp_signal_level, BatteryState, DataServiceState, SimRecord, SimSnapshot, SimState, SlotId,
    SubscriptionId, SIM_SIGNAL_LEVEL_MAX,
};
pub use network::{
    classify, classify_cellular, subtype, wifi_fraction, wifi_level, NetworkState, NetworkType,
    TransferDirection, TransportInfo, CELLULAR_SIGNAL_FRACTION, WIFI_MAX_RSSI, WIFI_MIN_RSSI,
};
pub use normalize::{
    any_headset, battery_status, data_service_state, is_headset_device, is_sim_ready_str,
    normalize_battery, normalize_sim_broadcast, AudioDeviceType, BatteryReading, PhysicalChange,
    RawServiceState, SimBroadcast, BLUETOOTH_STATE_CONNECTED,
};
pub use provider::{
    AirplaneEvent, AirplaneSource, BatterySource, HeadsetEvent, HeadsetSource, Listener,
    NetworkEvent, NetworkSource, NullProvider, PhoneStateEvent, Platform, SubscriptionInfo,
    SubscriptionSource,
};
pub use watch::WatchHandle;
