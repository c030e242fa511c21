//! Network type definitions and classification.
//!
//! Pure domain logic - no I/O, no platform dependencies.

use serde::{Deserialize, Serialize};

/// Closed set of network categories shown by the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    #[default]
    Unknown,
    None,
    Wifi,
    #[serde(rename = "2g")]
    G2,
    #[serde(rename = "3g")]
    G3,
    #[serde(rename = "4g")]
    G4,
    #[serde(rename = "5g")]
    G5,
}

impl NetworkType {
    pub fn label(&self) -> &'static str {
        match self {
            NetworkType::Unknown => "unknown",
            NetworkType::None => "none",
            NetworkType::Wifi => "wifi",
            NetworkType::G2 => "2g",
            NetworkType::G3 => "3g",
            NetworkType::G4 => "4g",
            NetworkType::G5 => "5g",
        }
    }

    pub fn is_cellular(&self) -> bool {
        matches!(
            self,
            NetworkType::G2 | NetworkType::G3 | NetworkType::G4 | NetworkType::G5
        )
    }
}

impl std::fmt::Display for NetworkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Data transfer activity indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    #[default]
    Unknown,
    Upload,
    Download,
    Dual,
}

/// Classified network state delivered to the render target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct NetworkState {
    pub network_type: NetworkType,
    /// Signal in `[0, 1]`. Only carries information for wifi.
    pub signal_fraction: f32,
    pub transfer: TransferDirection,
}

impl NetworkState {
    pub fn none() -> Self {
        Self {
            network_type: NetworkType::None,
            signal_fraction: 0.0,
            transfer: TransferDirection::Unknown,
        }
    }

    pub fn unknown() -> Self {
        Self {
            network_type: NetworkType::Unknown,
            signal_fraction: 0.0,
            transfer: TransferDirection::Unknown,
        }
    }
}

/// Raw transport information for the active (or a specific) network.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransportInfo {
    pub has_wifi: bool,
    pub has_cellular: bool,
    /// Platform radio subtype code (cellular only).
    pub subtype: Option<i32>,
    /// Human-readable subtype name, e.g. "LTE" or "WCDMA".
    pub subtype_name: Option<String>,
    /// Wifi RSSI in dBm.
    pub wifi_rssi: Option<i32>,
    pub transfer: Option<TransferDirection>,
}

impl TransportInfo {
    pub fn wifi(rssi: i32) -> Self {
        Self {
            has_wifi: true,
            wifi_rssi: Some(rssi),
            ..Self::default()
        }
    }

    pub fn cellular(subtype: i32, subtype_name: impl Into<String>) -> Self {
        Self {
            has_cellular: true,
            subtype: Some(subtype),
            subtype_name: Some(subtype_name.into()),
            ..Self::default()
        }
    }
}

/// Radio subtype codes as published by the telephony stack.
pub mod subtype {
    pub const GPRS: i32 = 1;
    pub const EDGE: i32 = 2;
    pub const UMTS: i32 = 3;
    pub const CDMA: i32 = 4;
    pub const EVDO_0: i32 = 5;
    pub const EVDO_A: i32 = 6;
    pub const RTT_1X: i32 = 7;
    pub const HSDPA: i32 = 8;
    pub const HSUPA: i32 = 9;
    pub const HSPA: i32 = 10;
    pub const IDEN: i32 = 11;
    pub const EVDO_B: i32 = 12;
    pub const LTE: i32 = 13;
    pub const EHRPD: i32 = 14;
    pub const HSPAP: i32 = 15;
    pub const NR: i32 = 20;
}

/// Subtype codes that classify as 2G.
pub const SUBTYPES_2G: &[i32] = &[
    subtype::GPRS,
    subtype::CDMA,
    subtype::EDGE,
    subtype::RTT_1X,
    subtype::IDEN,
];

/// Subtype codes that classify as 3G.
pub const SUBTYPES_3G: &[i32] = &[
    subtype::EVDO_A,
    subtype::UMTS,
    subtype::EVDO_0,
    subtype::HSDPA,
    subtype::HSUPA,
    subtype::HSPA,
    subtype::EVDO_B,
    subtype::EHRPD,
    subtype::HSPAP,
];

/// Subtype names matched (case-insensitively) as 3G when the code is unknown.
pub const NAMES_3G: &[&str] = &["TD-SCDMA", "WCDMA", "CDMA2000"];

/// Weakest RSSI that still counts as a signal.
pub const WIFI_MIN_RSSI: i32 = -100;

/// RSSI at or above which wifi is reported at full strength.
pub const WIFI_MAX_RSSI: i32 = -55;

/// Non-signal-bearing fraction reported for cellular networks.
pub const CELLULAR_SIGNAL_FRACTION: f32 = 1.0;

/// Bucket a wifi RSSI into `[0, max_level]`.
///
/// Monotonic in `rssi`; mirrors the platform's standard level calculation.
pub fn wifi_level(rssi: i32, max_level: u8) -> u8 {
    if max_level == 0 {
        return 0;
    }
    if rssi <= WIFI_MIN_RSSI {
        return 0;
    }
    if rssi >= WIFI_MAX_RSSI {
        return max_level;
    }
    let input_range = (WIFI_MAX_RSSI - WIFI_MIN_RSSI) as i64;
    let level = (rssi - WIFI_MIN_RSSI) as i64 * max_level as i64 / input_range;
    level.clamp(0, max_level as i64) as u8
}

/// Wifi signal as a fraction of `max_level`. Unknown RSSI reads as full.
pub fn wifi_fraction(rssi: Option<i32>, max_level: u8) -> f32 {
    if max_level == 0 {
        return 0.0;
    }
    match rssi {
        Some(rssi) => (wifi_level(rssi, max_level) as f32 / max_level as f32).clamp(0.0, 1.0),
        None => 1.0,
    }
}

/// Resolve a cellular subtype into a network generation.
///
/// Priority:
/// 1. Known subtype code
/// 2. 3G subtype names
/// 3. Name contains "LTE" (4G) or "NR" (5G)
/// 4. Unknown
pub fn classify_cellular(subtype: Option<i32>, subtype_name: Option<&str>) -> NetworkType {
    if let Some(code) = subtype {
        if SUBTYPES_2G.contains(&code) {
            return NetworkType::G2;
        }
        if SUBTYPES_3G.contains(&code) {
            return NetworkType::G3;
        }
        if code == subtype::LTE {
            return NetworkType::G4;
        }
        if code == subtype::NR {
            return NetworkType::G5;
        }
    }

    let Some(name) = subtype_name else {
        return NetworkType::Unknown;
    };

    if NAMES_3G.iter().any(|n| n.eq_ignore_ascii_case(name)) {
        NetworkType::G3
    } else if name.contains("LTE") {
        NetworkType::G4
    } else if name.contains("NR") {
        NetworkType::G5
    } else {
        NetworkType::Unknown
    }
}

/// Classify transport information into a `NetworkState`.
///
/// Total and side-effect-free. `None` transport means no network at all.
/// Wifi takes precedence over cellular when both transports are present.
pub fn classify(transport: Option<&TransportInfo>, wifi_max_level: u8) -> NetworkState {
    let Some(info) = transport else {
        return NetworkState::none();
    };

    let transfer = info.transfer.unwrap_or_default();

    if info.has_wifi {
        return NetworkState {
            network_type: NetworkType::Wifi,
            signal_fraction: wifi_fraction(info.wifi_rssi, wifi_max_level),
            transfer,
        };
    }

    if info.has_cellular {
        let network_type = classify_cellular(info.subtype, info.subtype_name.as_deref());
        let signal_fraction = if network_type == NetworkType::Unknown {
            0.0
        } else {
            CELLULAR_SIGNAL_FRACTION
        };
        return NetworkState {
            network_type,
            signal_fraction,
            transfer,
        };
    }

    NetworkState {
        transfer,
        ..NetworkState::unknown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wifi_level_three_of_four() {
        let state = classify(Some(&TransportInfo::wifi(-65)), 4);
        assert_eq!(state.network_type, NetworkType::Wifi);
        assert_eq!(wifi_level(-65, 4), 3);
        assert_eq!(state.signal_fraction, 0.75);
    }

    #[test]
    fn test_wifi_level_bounds() {
        assert_eq!(wifi_level(-120, 4), 0);
        assert_eq!(wifi_level(-100, 4), 0);
        assert_eq!(wifi_level(-55, 4), 4);
        assert_eq!(wifi_level(-20, 4), 4);
        assert_eq!(wifi_level(-60, 0), 0);
    }

    #[test]
    fn test_wifi_level_is_monotonic() {
        let mut last = 0;
        for rssi in -110..=-40 {
            let level = wifi_level(rssi, 5);
            assert!(level >= last, "level dropped at rssi {}", rssi);
            assert!(level <= 5);
            last = level;
        }
    }

    #[test]
    fn test_wifi_fraction_in_unit_range() {
        for max in 0..=8u8 {
            for rssi in [-130, -100, -80, -70, -55, 0] {
                let f = wifi_fraction(Some(rssi), max);
                assert!((0.0..=1.0).contains(&f));
            }
        }
        assert_eq!(wifi_fraction(None, 4), 1.0);
        assert_eq!(wifi_fraction(None, 0), 0.0);
    }

    #[test]
    fn test_cellular_codes() {
        assert_eq!(classify_cellular(Some(subtype::EDGE), None), NetworkType::G2);
        assert_eq!(classify_cellular(Some(subtype::HSPAP), None), NetworkType::G3);
        assert_eq!(classify_cellular(Some(subtype::LTE), None), NetworkType::G4);
        assert_eq!(classify_cellular(Some(subtype::NR), None), NetworkType::G5);
    }

    #[test]
    fn test_cellular_name_fallback() {
        assert_eq!(classify_cellular(Some(99), Some("td-scdma")), NetworkType::G3);
        assert_eq!(classify_cellular(Some(99), Some("WCDMA")), NetworkType::G3);
        assert_eq!(classify_cellular(Some(99), Some("LTE_CA")), NetworkType::G4);
        assert_eq!(classify_cellular(Some(99), Some("NR_SA")), NetworkType::G5);
        assert_eq!(classify_cellular(Some(99), Some("IWLAN")), NetworkType::Unknown);
        assert_eq!(classify_cellular(None, None), NetworkType::Unknown);
    }

    #[test]
    fn test_classify_cellular_fraction_fixed() {
        let state = classify(Some(&TransportInfo::cellular(subtype::LTE, "LTE")), 4);
        assert_eq!(state.network_type, NetworkType::G4);
        assert_eq!(state.signal_fraction, CELLULAR_SIGNAL_FRACTION);
        assert_eq!(state.transfer, TransferDirection::Unknown);
    }

    #[test]
    fn test_classify_no_transport() {
        let state = classify(None, 4);
        assert_eq!(state.network_type, NetworkType::None);
        assert_eq!(state.signal_fraction, 0.0);
    }

    #[test]
    fn test_wifi_wins_over_cellular() {
        let info = TransportInfo {
            has_wifi: true,
            has_cellular: true,
            subtype: Some(subtype::LTE),
            wifi_rssi: Some(-50),
            ..TransportInfo::default()
        };
        assert_eq!(classify(Some(&info), 4).network_type, NetworkType::Wifi);
    }

    #[test]
    fn test_transfer_passes_through() {
        let info = TransportInfo {
            transfer: Some(TransferDirection::Dual),
            ..TransportInfo::cellular(subtype::UMTS, "UMTS")
        };
        assert_eq!(classify(Some(&info), 4).transfer, TransferDirection::Dual);
    }

    #[test]
    fn test_network_type_labels() {
        assert_eq!(NetworkType::G4.to_string(), "4g");
        assert_eq!(NetworkType::None.to_string(), "none");
        assert!(NetworkType::G5.is_cellular());
        assert!(!NetworkType::Wifi.is_cellular());
    }
}
