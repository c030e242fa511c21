//! Output side of the status bar monitor.
//!
//! This crate defines the contract the monitor delivers reconciled values
//! through (`RenderTarget`), the typed `Delivery` union used for recording
//! and dedup, and the `EventBus` abstraction for mirroring updates as JSON
//! events under stable topic names.

mod bus;
mod delivery;
mod target;

pub use bus::{CallbackBus, CapturingBus, EventBus, EventBusRef, PublishedEvent};
pub use delivery::{
    event_names, AirplaneChangedEvent, BatteryChangedEvent, Delivery, Dimension,
    HeadsetChangedEvent, NetworkChangedEvent, SimChangedEvent,
};
pub use target::{
    EventBusTarget, NullTarget, RecordingTarget, RenderTarget, DEFAULT_WIFI_MAX_LEVEL,
};
