//! SIM and battery state structures.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Highest SIM signal level any consumer will ever see.
pub const SIM_SIGNAL_LEVEL_MAX: u8 = 4;

/// Physical SIM slot index, stable for a session.
pub type SlotId = u32;

/// Logical identity of an active SIM registration.
///
/// May change when a card is reseated. `SubscriptionId::UNKNOWN` stands in
/// when no authoritative source has reported a value yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub i32);

impl SubscriptionId {
    pub const UNKNOWN: SubscriptionId = SubscriptionId(i32::MIN);

    pub fn is_known(&self) -> bool {
        *self != Self::UNKNOWN
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_known() {
            write!(f, "{}", self.0)
        } else {
            f.write_str("unknown")
        }
    }
}

/// Card state as reported by the telephony stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimState {
    #[default]
    Unknown,
    Absent,
    PinRequired,
    PukRequired,
    NetworkLocked,
    Ready,
    NotReady,
    PermDisabled,
    CardIoError,
    CardRestricted,
}

impl SimState {
    /// Map a platform state code. Unrecognised codes map to `Unknown`.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => SimState::Absent,
            2 => SimState::PinRequired,
            3 => SimState::PukRequired,
            4 => SimState::NetworkLocked,
            5 => SimState::Ready,
            6 => SimState::NotReady,
            7 => SimState::PermDisabled,
            8 => SimState::CardIoError,
            9 => SimState::CardRestricted,
            _ => SimState::Unknown,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, SimState::Ready)
    }
}

/// Data registration state of a SIM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataServiceState {
    InService,
    OutOfService,
    EmergencyOnly,
    #[default]
    PowerOff,
}

impl DataServiceState {
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => DataServiceState::InService,
            1 => DataServiceState::OutOfService,
            2 => DataServiceState::EmergencyOnly,
            _ => DataServiceState::PowerOff,
        }
    }

    pub fn is_in_service(&self) -> bool {
        matches!(self, DataServiceState::InService)
    }
}

/// Clamp a raw platform signal level into `[0, SIM_SIGNAL_LEVEL_MAX]`.
///
/// Some vendors report levels outside the documented range.
pub fn clamp_signal_level(raw: i32) -> u8 {
    raw.clamp(0, SIM_SIGNAL_LEVEL_MAX as i32) as u8
}

/// Per-slot SIM record owned by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimRecord {
    pub slot: SlotId,
    pub subscription: SubscriptionId,
    pub sim_state: SimState,
    pub data_service: DataServiceState,
    /// Stored level in `[0, 4]`. Only meaningful while the record is usable.
    pub signal_level: u8,
}

impl SimRecord {
    pub fn new(
        slot: SlotId,
        subscription: SubscriptionId,
        sim_state: SimState,
        data_service: DataServiceState,
        signal_level: u8,
    ) -> Self {
        Self {
            slot,
            subscription,
            sim_state,
            data_service,
            signal_level: signal_level.min(SIM_SIGNAL_LEVEL_MAX),
        }
    }

    /// Ready card with data service.
    pub fn is_usable(&self) -> bool {
        self.sim_state.is_ready() && self.data_service.is_in_service()
    }

    /// Signal level as consumers should read it: `None` means "no signal".
    pub fn effective_level(&self) -> Option<u8> {
        self.is_usable().then_some(self.signal_level)
    }
}

/// Copy of the registry handed across the render boundary.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub records: BTreeMap<SlotId, SimRecord>,
    pub primary: SubscriptionId,
}

impl SimSnapshot {
    pub fn empty(primary: SubscriptionId) -> Self {
        Self {
            records: BTreeMap::new(),
            primary,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn primary_record(&self) -> Option<&SimRecord> {
        self.records
            .values()
            .find(|r| r.subscription == self.primary)
    }

    pub fn usable_count(&self) -> usize {
        self.records.values().filter(|r| r.is_usable()).count()
    }
}

/// Normalised battery state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct BatteryState {
    /// Charge in `[0, 1]`.
    pub fraction: f32,
    pub charging: bool,
}

impl BatteryState {
    pub fn new(fraction: f32, charging: bool) -> Self {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        Self { fraction, charging }
    }

    /// Percentage rounded the way the bar label shows it.
    pub fn percent(&self) -> u8 {
        (self.fraction * 100.0 + 0.5) as u8
    }
}
