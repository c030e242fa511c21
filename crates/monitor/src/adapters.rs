//! Signal source adapters.
//!
//! Each adapter registers a listener with one platform source. Listeners run
//! on whatever thread the platform uses, so they only validate and normalise
//! the payload, then hand it to the delivery thread. Shared state is never
//! touched here.

use crate::engine::{CoreHandle, UpdateKind};
use crate::sequence::Tickets;
use statusbar_registry::PhoneWatch;
use statusbar_scheduler::SchedulerError;
use statusbar_signals::{
    normalize_battery, normalize_sim_broadcast, AirplaneEvent, AirplaneSource, BatteryReading,
    BatterySource, HeadsetEvent, HeadsetSource, NetworkEvent, NetworkSource, PhoneStateEvent,
    SignalResult, SimBroadcast, SubscriptionSource, WatchHandle,
};
use std::sync::Arc;
use std::time::Duration;

fn handed_off(result: Result<(), SchedulerError>) {
    if let Err(e) = result {
        tracing::trace!(error = %e, "event arrived after shutdown");
    }
}

pub(crate) fn watch_subscriptions(
    source: &dyn SubscriptionSource,
    handle: &CoreHandle,
) -> SignalResult<WatchHandle> {
    let handle = handle.clone();
    source.watch_subscriptions(Arc::new(move |()| {
        handed_off(handle.post(|core| core.on_subscriptions_changed()));
    }))
}

pub(crate) fn watch_sim_broadcasts(
    source: &dyn SubscriptionSource,
    handle: &CoreHandle,
) -> SignalResult<WatchHandle> {
    let handle = handle.clone();
    source.watch_sim_broadcasts(Arc::new(move |broadcast: SimBroadcast| {
        match normalize_sim_broadcast(&broadcast) {
            Ok(change) => handed_off(handle.post(move |core| core.on_physical_change(change))),
            Err(e) => e.log(),
        }
    }))
}

pub(crate) fn watch_phone_state(
    source: &dyn SubscriptionSource,
    handle: &CoreHandle,
    watch: PhoneWatch,
) -> SignalResult<WatchHandle> {
    let handle = handle.clone();
    let slot = watch.slot;
    source.watch_phone_state(
        watch.subscription,
        Arc::new(move |event: PhoneStateEvent| match event {
            PhoneStateEvent::ServiceState(raw) => {
                let state = raw.data_service_state();
                handed_off(handle.post(move |core| core.on_service_state(slot, state)));
            }
            PhoneStateEvent::SignalStrength(level) => {
                handed_off(handle.post(move |core| core.on_signal_strength(slot, level)));
            }
        }),
    )
}

/// Battery readings coalesce: only the latest pending reading is applied.
pub(crate) fn watch_battery(
    source: &dyn BatterySource,
    handle: &CoreHandle,
    tickets: Tickets,
    delay: Duration,
) -> SignalResult<WatchHandle> {
    let handle = handle.clone();
    source.watch(Arc::new(move |reading: Option<BatteryReading>| {
        match normalize_battery(reading.as_ref()) {
            Ok(state) => {
                let ticket = tickets.issue();
                handed_off(handle.post_delayed(UpdateKind::Battery, delay, move |core| {
                    core.on_battery(ticket, state)
                }));
            }
            Err(e) => e.log(),
        }
    }))
}

/// Airplane events are posted individually so a quick on/off reaches the gate twice.
pub(crate) fn watch_airplane(
    source: &dyn AirplaneSource,
    handle: &CoreHandle,
) -> SignalResult<WatchHandle> {
    let handle = handle.clone();
    source.watch(Arc::new(move |event: AirplaneEvent| {
        handed_off(handle.post(move |core| core.on_airplane(event.enabled)));
    }))
}

pub(crate) fn watch_headset(
    source: &dyn HeadsetSource,
    handle: &CoreHandle,
) -> SignalResult<WatchHandle> {
    let handle = handle.clone();
    source.watch(Arc::new(move |event: HeadsetEvent| {
        handed_off(handle.post(move |core| core.on_headset(event)));
    }))
}

/// Capability changes coalesce; every network event carries an arrival ticket
/// so a delayed capability change cannot overwrite a later loss.
pub(crate) fn watch_network(
    source: &dyn NetworkSource,
    handle: &CoreHandle,
    tickets: Tickets,
    delay: Duration,
) -> SignalResult<WatchHandle> {
    let handle = handle.clone();
    source.watch(Arc::new(move |event: NetworkEvent| {
        let ticket = tickets.issue();
        let result = match event {
            NetworkEvent::CapabilitiesChanged(info) => {
                handle.post_delayed(UpdateKind::Network, delay, move |core| {
                    core.on_network_capabilities(ticket, info)
                })
            }
            NetworkEvent::Lost => handle.post(move |core| core.on_network_lost(ticket)),
            NetworkEvent::Unavailable => {
                handle.post(move |core| core.on_network_unavailable(ticket))
            }
            NetworkEvent::DefaultNetworkActive => {
                handle.post(move |core| core.on_default_network_active(ticket))
            }
        };
        handed_off(result);
    }))
}
