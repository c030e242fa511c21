//! Adapter normalisation rules.
//!
//! Turns platform payloads (broadcast extras, opaque state strings, device
//! type codes) into canonical domain values. Pure functions only.

use crate::capability::{CapabilityProvider, PlatformVersion};
use crate::error::{SignalError, SignalResult};
use crate::model::{BatteryState, DataServiceState, SlotId, SubscriptionId};
use serde::{Deserialize, Serialize};

/// Field carrying the data registration state inside a service-state dump.
pub const DATA_REG_STATE_FIELD: &str = "mDataRegState=";

/// Textual SIM states that count as a usable card in SIM broadcasts.
pub const READY_SIM_STATES: &[&str] = &["READY", "LOADED"];

/// Battery status codes carried by battery broadcasts.
pub mod battery_status {
    pub const UNKNOWN: i32 = 1;
    pub const CHARGING: i32 = 2;
    pub const DISCHARGING: i32 = 3;
    pub const NOT_CHARGING: i32 = 4;
    pub const FULL: i32 = 5;
}

/// Legacy bluetooth headset connection state meaning "connected".
pub const BLUETOOTH_STATE_CONNECTED: i32 = 2;

/// Opaque service state as handed out by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawServiceState(pub String);

impl RawServiceState {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Build a dump carrying only the data registration field.
    pub fn with_data_state(state: DataServiceState) -> Self {
        let code = match state {
            DataServiceState::InService => 0,
            DataServiceState::OutOfService => 1,
            DataServiceState::EmergencyOnly => 2,
            DataServiceState::PowerOff => 3,
        };
        Self(format!("{{{}{}}}", DATA_REG_STATE_FIELD, code))
    }

    /// Parse the data registration state. Absent or garbled means powered off.
    pub fn data_service_state(&self) -> DataServiceState {
        let Some(idx) = self.0.find(DATA_REG_STATE_FIELD) else {
            return DataServiceState::PowerOff;
        };
        self.0[idx + DATA_REG_STATE_FIELD.len()..]
            .chars()
            .next()
            .and_then(|c| c.to_digit(10))
            .map(DataServiceState::from_code)
            .unwrap_or(DataServiceState::PowerOff)
    }
}

/// Service state of an optional dump; a missing dump means powered off.
pub fn data_service_state(raw: Option<&RawServiceState>) -> DataServiceState {
    raw.map(RawServiceState::data_service_state)
        .unwrap_or(DataServiceState::PowerOff)
}

/// Raw battery broadcast extras.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatteryReading {
    pub level: i32,
    pub scale: i32,
    pub status: i32,
    pub plugged: i32,
}

/// Normalise a battery broadcast.
///
/// A full battery that is still plugged in counts as charging.
pub fn normalize_battery(reading: Option<&BatteryReading>) -> SignalResult<BatteryState> {
    let reading = reading.ok_or_else(|| SignalError::malformed("battery broadcast without extras"))?;

    let fraction = if reading.scale == 0 {
        0.0
    } else {
        reading.level as f32 / reading.scale as f32
    };

    let charging = matches!(
        reading.status,
        battery_status::CHARGING | battery_status::FULL
    ) && reading.plugged != 0;

    Ok(BatteryState::new(fraction, charging))
}

/// Raw physical SIM broadcast extras.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimBroadcast {
    pub slot: Option<i32>,
    pub subscription: Option<i32>,
    /// Textual state, e.g. "READY", "ABSENT", "LOADED".
    pub state: Option<String>,
}

/// Canonical physical SIM change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalChange {
    pub slot: SlotId,
    pub ready: bool,
    pub subscription: SubscriptionId,
}

pub fn is_sim_ready_str(state: Option<&str>) -> bool {
    state.is_some_and(|s| READY_SIM_STATES.contains(&s))
}

pub fn normalize_sim_broadcast(broadcast: &SimBroadcast) -> SignalResult<PhysicalChange> {
    let slot = broadcast
        .slot
        .ok_or_else(|| SignalError::malformed("sim broadcast without slot"))?;
    let slot = SlotId::try_from(slot)
        .map_err(|_| SignalError::malformed(format!("sim broadcast with negative slot {}", slot)))?;

    let ready = is_sim_ready_str(broadcast.state.as_deref());
    let subscription = match (ready, broadcast.subscription) {
        (_, Some(id)) => SubscriptionId(id),
        (false, None) => SubscriptionId::UNKNOWN,
        (true, None) => {
            return Err(SignalError::malformed(format!(
                "ready sim broadcast for slot {} without subscription",
                slot
            )))
        }
    };

    Ok(PhysicalChange {
        slot,
        ready,
        subscription,
    })
}

/// Audio output device categories relevant to headset detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioDeviceType {
    WiredHeadset,
    WiredHeadphones,
    BluetoothSco,
    BluetoothA2dp,
    UsbHeadset,
    HearingAid,
    Other(i32),
}

impl AudioDeviceType {
    pub fn from_code(code: i32) -> Self {
        match code {
            3 => AudioDeviceType::WiredHeadset,
            4 => AudioDeviceType::WiredHeadphones,
            7 => AudioDeviceType::BluetoothSco,
            8 => AudioDeviceType::BluetoothA2dp,
            22 => AudioDeviceType::UsbHeadset,
            23 => AudioDeviceType::HearingAid,
            other => AudioDeviceType::Other(other),
        }
    }

    /// Oldest platform on which this type is reported as a headset.
    fn headset_since(&self) -> Option<PlatformVersion> {
        match self {
            AudioDeviceType::WiredHeadset
            | AudioDeviceType::WiredHeadphones
            | AudioDeviceType::BluetoothSco
            | AudioDeviceType::BluetoothA2dp => Some(PlatformVersion::M),
            AudioDeviceType::UsbHeadset => Some(PlatformVersion::O),
            AudioDeviceType::HearingAid => Some(PlatformVersion::P),
            AudioDeviceType::Other(_) => None,
        }
    }
}

/// Whether the platform treats this device as a headset.
pub fn is_headset_device(device: AudioDeviceType, caps: &dyn CapabilityProvider) -> bool {
    device
        .headset_since()
        .is_some_and(|v| caps.platform_version_at_least(v))
}

pub fn any_headset(devices: &[AudioDeviceType], caps: &dyn CapabilityProvider) -> bool {
    devices.iter().any(|d| is_headset_device(*d, caps))
}
