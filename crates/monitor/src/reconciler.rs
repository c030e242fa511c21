//! Dedup gate.
//!
//! Remembers the last value handed to the render target per dimension and
//! only lets a proposal through when it differs by value.

use statusbar_events::{Delivery, Dimension, RenderTarget};
use statusbar_signals::{BatteryState, NetworkState, SimSnapshot};
use std::collections::BTreeMap;

/// Last delivered value per dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveredSnapshot {
    values: BTreeMap<Dimension, Delivery>,
}

impl DeliveredSnapshot {
    pub fn get(&self, dimension: Dimension) -> Option<&Delivery> {
        self.values.get(&dimension)
    }

    pub fn sim(&self) -> Option<&SimSnapshot> {
        match self.values.get(&Dimension::Sim) {
            Some(Delivery::Sim(snapshot)) => Some(snapshot),
            _ => None,
        }
    }

    pub fn battery(&self) -> Option<BatteryState> {
        match self.values.get(&Dimension::Battery) {
            Some(Delivery::Battery(state)) => Some(*state),
            _ => None,
        }
    }

    pub fn airplane(&self) -> Option<bool> {
        match self.values.get(&Dimension::Airplane) {
            Some(Delivery::Airplane { enabled }) => Some(*enabled),
            _ => None,
        }
    }

    pub fn headset(&self) -> Option<bool> {
        match self.values.get(&Dimension::Headset) {
            Some(Delivery::Headset { present }) => Some(*present),
            _ => None,
        }
    }

    pub fn network(&self) -> Option<NetworkState> {
        match self.values.get(&Dimension::Network) {
            Some(Delivery::Network(state)) => Some(*state),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Reconciler {
    delivered: DeliveredSnapshot,
    animation_correction: bool,
}

impl Reconciler {
    pub fn new(animation_correction: bool) -> Self {
        Self {
            delivered: DeliveredSnapshot::default(),
            animation_correction,
        }
    }

    /// Deliver `value` if it differs from what the target last received.
    ///
    /// Returns whether the target was called.
    pub fn propose(&mut self, value: Delivery, target: &dyn RenderTarget) -> bool {
        let dimension = value.dimension();
        if self.delivered.get(dimension) == Some(&value) {
            if !self.needs_animation_correction(&value, target) {
                tracing::trace!(%dimension, "unchanged, suppressed");
                return false;
            }
            tracing::debug!(%dimension, "charging animation desynced, redelivering");
        }
        self.deliver(value, target);
        true
    }

    /// Deliver `value` unconditionally.
    pub fn force(&mut self, value: Delivery, target: &dyn RenderTarget) {
        self.deliver(value, target);
    }

    pub fn delivered(&self) -> &DeliveredSnapshot {
        &self.delivered
    }

    /// Forget everything delivered so far.
    pub fn reset(&mut self) {
        self.delivered = DeliveredSnapshot::default();
    }

    fn needs_animation_correction(&self, value: &Delivery, target: &dyn RenderTarget) -> bool {
        match value {
            Delivery::Battery(state) => {
                self.animation_correction && target.battery_animation_desynced(state.charging)
            }
            _ => false,
        }
    }

    fn deliver(&mut self, value: Delivery, target: &dyn RenderTarget) {
        let dimension = value.dimension();
        tracing::trace!(%dimension, "delivering");
        self.delivered.values.insert(dimension, value.clone());
        value.apply(target);
    }
}
