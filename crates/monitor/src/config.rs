//! Monitor configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use crate::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use statusbar_events::Dimension;
use std::path::Path;
use std::time::Duration;

/// Default name of the delivery thread.
pub const DEFAULT_WORKER_THREAD_NAME: &str = "statusbar-delivery";

/// Default delay of the re-check scheduled after a network loss.
pub const DEFAULT_NETWORK_LOST_RECHECK_MS: u64 = 500;

/// Upper bound accepted for the network-lost re-check delay.
pub const MAX_RECHECK_MS: u64 = 60_000;

/// Per-dimension enable switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceToggles {
    pub sims: bool,
    pub battery: bool,
    pub airplane: bool,
    pub headset: bool,
    pub network: bool,
}

impl Default for SourceToggles {
    fn default() -> Self {
        Self {
            sims: true,
            battery: true,
            airplane: true,
            headset: true,
            network: true,
        }
    }
}

impl SourceToggles {
    pub fn enabled(&self, dimension: Dimension) -> bool {
        match dimension {
            Dimension::Sim => self.sims,
            Dimension::Battery => self.battery,
            Dimension::Airplane => self.airplane,
            Dimension::Headset => self.headset,
            Dimension::Network => self.network,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub worker_thread_name: String,
    /// Delay of the compensating re-check after a "network lost" event.
    pub network_lost_recheck_ms: u64,
    /// Delay of the coalesced battery update; the latest reading wins.
    pub battery_coalesce_ms: u64,
    /// Delay of the coalesced network update.
    pub network_coalesce_ms: u64,
    /// Let the render target force a battery redelivery when its charging
    /// animation has drifted from the logical state.
    pub animation_correction: bool,
    pub sources: SourceToggles,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            worker_thread_name: DEFAULT_WORKER_THREAD_NAME.to_string(),
            network_lost_recheck_ms: DEFAULT_NETWORK_LOST_RECHECK_MS,
            battery_coalesce_ms: 0,
            network_coalesce_ms: 0,
            animation_correction: true,
            sources: SourceToggles::default(),
        }
    }
}

impl MonitorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| MonitorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_thread_name.trim().is_empty() {
            return Err(MonitorError::InvalidConfig(
                "worker_thread_name must not be empty".to_string(),
            ));
        }
        if self.network_lost_recheck_ms > MAX_RECHECK_MS {
            return Err(MonitorError::InvalidConfig(format!(
                "network_lost_recheck_ms {} exceeds {}",
                self.network_lost_recheck_ms, MAX_RECHECK_MS
            )));
        }
        Ok(())
    }

    pub fn network_lost_recheck(&self) -> Duration {
        Duration::from_millis(self.network_lost_recheck_ms)
    }

    pub fn battery_coalesce(&self) -> Duration {
        Duration::from_millis(self.battery_coalesce_ms)
    }

    pub fn network_coalesce(&self) -> Duration {
        Duration::from_millis(self.network_coalesce_ms)
    }
}
