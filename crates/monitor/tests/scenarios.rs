//! End-to-end scenarios for the monitor engine.
//!
//! Drives a running `StatusMonitor` through a scripted `FakeDevice` and
//! inspects what reached the `RecordingTarget`. `flush()` waits for the
//! delivery thread to apply everything handed off so far.

use statusbar_events::{
    event_names, Delivery, Dimension, EventBusTarget, CapturingBus, RecordingTarget,
    RenderTarget,
};
use statusbar_monitor::{MonitorConfig, MonitorError, MonitorHandle, SchedulerError, StatusMonitor};
use statusbar_signals::fake::FakeDevice;
use statusbar_signals::{
    battery_status, subtype, AudioDeviceType, BatteryReading, BatteryState, Capability,
    DataServiceState, HeadsetEvent, NetworkEvent, NetworkState, NetworkType, Platform,
    SimBroadcast, SimSnapshot, SubscriptionId, TransferDirection, TransportInfo,
};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

fn dual_sim_device() -> Arc<FakeDevice> {
    let device = Arc::new(FakeDevice::new());
    device.insert_sim(0, SubscriptionId(10), 3);
    device.insert_sim(1, SubscriptionId(20), 1);
    device.set_default_data(Some(SubscriptionId(10)));
    device.set_transport(Some(TransportInfo::wifi(-65)));
    device
}

fn reading(level: i32, charging: bool) -> BatteryReading {
    BatteryReading {
        level,
        scale: 100,
        status: if charging {
            battery_status::CHARGING
        } else {
            battery_status::DISCHARGING
        },
        plugged: if charging { 1 } else { 0 },
    }
}

/// Start a monitor and wait for the initial full refresh.
fn start_with(
    device: &Arc<FakeDevice>,
    target: &Arc<RecordingTarget>,
    config: MonitorConfig,
) -> StatusMonitor {
    let mut monitor = StatusMonitor::new(
        config,
        Platform::from_device(device.clone()),
        target.clone(),
    )
    .unwrap();
    monitor.start().unwrap();
    monitor.flush().unwrap();
    monitor
}

fn start(device: &Arc<FakeDevice>) -> (Arc<RecordingTarget>, StatusMonitor) {
    let target = Arc::new(RecordingTarget::new());
    let monitor = start_with(device, &target, MonitorConfig::default());
    (target, monitor)
}

// =============================================================================
// Startup and full refresh
// =============================================================================

mod startup {
    use super::*;

    #[test]
    fn test_start_delivers_every_dimension() {
        let device = dual_sim_device();
        device.set_battery(Some(reading(64, false)));
        let (target, _monitor) = start(&device);

        for dimension in Dimension::ALL {
            assert_eq!(target.count_for(dimension), 1, "{} delivered once", dimension);
        }

        let sims = target.sim_deliveries();
        assert_eq!(sims[0].records.len(), 2);
        assert_eq!(sims[0].primary, SubscriptionId(10));
    }

    #[test]
    fn test_wifi_three_of_four_bars() {
        let device = dual_sim_device();
        let (target, _monitor) = start(&device);

        let network = target.network_deliveries();
        assert_eq!(network[0].network_type, NetworkType::Wifi);
        assert_eq!(network[0].signal_fraction, 0.75);
    }

    #[test]
    fn test_wifi_levels_follow_target_max() {
        let device = dual_sim_device();
        let target = Arc::new(RecordingTarget::new());
        target.set_wifi_max_level(5);
        let _monitor = start_with(&device, &target, MonitorConfig::default());

        // (-65 + 100) * 5 / 45 = 3
        assert_eq!(target.network_deliveries()[0].signal_fraction, 0.6);
    }

    #[test]
    fn test_full_refresh_bypasses_gate() {
        let device = dual_sim_device();
        let (target, monitor) = start(&device);

        monitor.request_immediate_full_refresh().unwrap();
        monitor.flush().unwrap();

        assert_eq!(target.count_for(Dimension::Airplane), 2);
        assert_eq!(target.count_for(Dimension::Sim), 2);
        assert_eq!(target.count_for(Dimension::Network), 2);
    }

    #[test]
    fn test_missing_battery_reading_is_skipped() {
        let device = dual_sim_device();
        let (target, _monitor) = start(&device);

        assert_eq!(target.count_for(Dimension::Battery), 0);
        assert_eq!(target.count_for(Dimension::Airplane), 1);
    }

    #[test]
    fn test_disabled_source_is_never_delivered() {
        let device = dual_sim_device();
        let target = Arc::new(RecordingTarget::new());
        let mut config = MonitorConfig::default();
        config.sources.headset = false;
        let monitor = start_with(&device, &target, config);

        device.fire_headset(HeadsetEvent::BecomingNoisy);
        monitor.flush().unwrap();

        assert_eq!(target.count_for(Dimension::Headset), 0);
        assert_eq!(monitor.handle().unwrap().watch_count().unwrap(), 7);
    }

    #[test]
    fn test_denied_phone_state_reports_no_sims() {
        let device = dual_sim_device();
        device.deny(Capability::ReadPhoneState);
        let (target, monitor) = start(&device);

        let sims = target.sim_deliveries();
        assert_eq!(sims.len(), 1);
        assert!(sims[0].is_empty());
        assert_eq!(sims[0].primary, SubscriptionId::UNKNOWN);
        assert!(monitor.sim_snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_denied_phone_state_hides_default_data_switch() {
        let device = dual_sim_device();
        device.deny(Capability::ReadPhoneState);
        let (target, monitor) = start(&device);
        target.clear();

        device.set_default_data(Some(SubscriptionId(20)));
        device.fire_network(NetworkEvent::CapabilitiesChanged(TransportInfo::wifi(-65)));
        monitor.flush().unwrap();

        assert_eq!(target.count_for(Dimension::Sim), 0);
        assert_eq!(
            monitor.sim_snapshot().unwrap().primary,
            SubscriptionId::UNKNOWN
        );
    }

    #[test]
    fn test_old_platform_reports_no_sims() {
        let device = dual_sim_device();
        device.set_platform_version(25);
        let (target, _monitor) = start(&device);

        assert!(target.sim_deliveries()[0].is_empty());
    }
}

// =============================================================================
// Dedup gate
// =============================================================================

mod dedup {
    use super::*;

    #[test]
    fn test_same_battery_twice_delivers_once() {
        let device = dual_sim_device();
        let (target, monitor) = start(&device);

        device.fire_battery(Some(reading(50, false)));
        device.fire_battery(Some(reading(50, false)));
        monitor.flush().unwrap();

        assert_eq!(
            target.deliveries_for(Dimension::Battery),
            vec![Delivery::Battery(BatteryState::new(0.5, false))]
        );
    }

    #[test]
    fn test_malformed_battery_is_dropped() {
        let device = dual_sim_device();
        let (target, monitor) = start(&device);

        device.fire_battery(None);
        monitor.flush().unwrap();

        assert_eq!(target.count_for(Dimension::Battery), 0);
    }

    #[test]
    fn test_airplane_on_then_off_delivers_both() {
        let device = dual_sim_device();
        let (target, monitor) = start(&device);
        target.clear();

        device.fire_airplane(Some(true));
        device.fire_airplane(Some(false));
        monitor.flush().unwrap();

        assert_eq!(
            target.deliveries_for(Dimension::Airplane),
            vec![
                Delivery::Airplane { enabled: true },
                Delivery::Airplane { enabled: false }
            ]
        );
    }

    #[test]
    fn test_airplane_event_without_value_queries_source() {
        let device = dual_sim_device();
        let (target, monitor) = start(&device);
        target.clear();

        device.set_airplane(true);
        device.fire_airplane(None);
        device.fire_airplane(None);
        monitor.flush().unwrap();

        assert_eq!(target.count_for(Dimension::Airplane), 1);
    }

    #[test]
    fn test_animation_correction_redelivers_battery() {
        let device = dual_sim_device();
        let (target, monitor) = start(&device);

        device.fire_battery(Some(reading(80, true)));
        monitor.flush().unwrap();
        target.set_animation_desynced(true);
        device.fire_battery(Some(reading(80, true)));
        monitor.flush().unwrap();

        assert_eq!(target.count_for(Dimension::Battery), 2);
    }
}

// =============================================================================
// Coalescing
// =============================================================================

mod coalescing {
    use super::*;

    #[test]
    fn test_rapid_battery_readings_apply_last() {
        let device = dual_sim_device();
        let target = Arc::new(RecordingTarget::new());
        let config = MonitorConfig {
            battery_coalesce_ms: 50,
            ..MonitorConfig::default()
        };
        let monitor = start_with(&device, &target, config);

        for level in [10, 20, 30] {
            device.fire_battery(Some(reading(level, false)));
        }
        thread::sleep(Duration::from_millis(200));
        monitor.flush().unwrap();

        assert_eq!(
            target.deliveries_for(Dimension::Battery),
            vec![Delivery::Battery(BatteryState::new(0.3, false))]
        );
    }

    #[test]
    fn test_network_changes_coalesce() {
        let device = dual_sim_device();
        let target = Arc::new(RecordingTarget::new());
        let config = MonitorConfig {
            network_coalesce_ms: 50,
            ..MonitorConfig::default()
        };
        let monitor = start_with(&device, &target, config);
        target.clear();

        device.fire_network(NetworkEvent::CapabilitiesChanged(TransportInfo::wifi(-90)));
        device.fire_network(NetworkEvent::CapabilitiesChanged(TransportInfo::cellular(
            subtype::NR,
            "NR",
        )));
        thread::sleep(Duration::from_millis(200));
        monitor.flush().unwrap();

        let network = target.network_deliveries();
        assert_eq!(network.len(), 1);
        assert_eq!(network[0].network_type, NetworkType::G5);
        assert_eq!(network[0].signal_fraction, 1.0);
    }

    #[test]
    fn test_pending_capabilities_do_not_override_loss() {
        let device = dual_sim_device();
        let target = Arc::new(RecordingTarget::new());
        let config = MonitorConfig {
            network_coalesce_ms: 100,
            ..MonitorConfig::default()
        };
        let monitor = start_with(&device, &target, config);
        target.clear();

        device.fire_network(NetworkEvent::CapabilitiesChanged(TransportInfo::wifi(-90)));
        device.set_transport(None);
        device.fire_network(NetworkEvent::Lost);
        thread::sleep(Duration::from_millis(300));
        monitor.flush().unwrap();

        assert_eq!(target.network_deliveries(), vec![NetworkState::none()]);
        assert_eq!(monitor.delivered().unwrap().network(), Some(NetworkState::none()));
    }

    #[test]
    fn test_full_refresh_supersedes_pending_capabilities() {
        let device = dual_sim_device();
        let target = Arc::new(RecordingTarget::new());
        let config = MonitorConfig {
            network_coalesce_ms: 100,
            ..MonitorConfig::default()
        };
        let monitor = start_with(&device, &target, config);
        target.clear();

        device.fire_network(NetworkEvent::CapabilitiesChanged(TransportInfo::cellular(
            subtype::NR,
            "NR",
        )));
        device.set_transport(Some(TransportInfo::wifi(-50)));
        monitor.request_immediate_full_refresh().unwrap();
        thread::sleep(Duration::from_millis(300));
        monitor.flush().unwrap();

        let network = target.network_deliveries();
        assert_eq!(network.len(), 1);
        assert_eq!(network[0].network_type, NetworkType::Wifi);
    }

    #[test]
    fn test_full_refresh_supersedes_pending_battery() {
        let device = dual_sim_device();
        device.set_battery(Some(reading(80, false)));
        let target = Arc::new(RecordingTarget::new());
        let config = MonitorConfig {
            battery_coalesce_ms: 100,
            ..MonitorConfig::default()
        };
        let monitor = start_with(&device, &target, config);
        target.clear();

        device.fire_battery(Some(reading(10, false)));
        device.set_battery(Some(reading(60, true)));
        monitor.request_immediate_full_refresh().unwrap();
        thread::sleep(Duration::from_millis(300));
        monitor.flush().unwrap();

        assert_eq!(
            target.deliveries_for(Dimension::Battery),
            vec![Delivery::Battery(BatteryState::new(0.6, true))]
        );
    }
}

// =============================================================================
// SIM topology
// =============================================================================

mod sims {
    use super::*;

    #[test]
    fn test_primary_loses_service() {
        let device = dual_sim_device();
        let (target, monitor) = start(&device);
        target.clear();

        device.set_data_service(0, DataServiceState::OutOfService);
        device.fire_service_state(0);
        monitor.flush().unwrap();

        let sims = target.sim_deliveries();
        assert_eq!(sims.len(), 1);
        assert_eq!(sims[0].primary, SubscriptionId(20));
        assert_eq!(sims[0].records[&0].effective_level(), None);
        assert_eq!(sims[0].records[&1].effective_level(), Some(1));
        assert_eq!(monitor.sim_snapshot().unwrap(), sims[0]);
    }

    #[test]
    fn test_signal_strength_change() {
        let device = dual_sim_device();
        let (target, monitor) = start(&device);
        target.clear();

        device.fire_signal_strength(SubscriptionId(20), 3);
        device.fire_signal_strength(SubscriptionId(20), 3);
        device.fire_signal_strength(SubscriptionId(20), 12);
        monitor.flush().unwrap();

        let sims = target.sim_deliveries();
        assert_eq!(sims.len(), 2);
        assert_eq!(sims[0].records[&1].signal_level, 3);
        assert_eq!(sims[1].records[&1].signal_level, 4);
    }

    #[test]
    fn test_sim_removed_by_broadcast() {
        let device = dual_sim_device();
        let (target, monitor) = start(&device);
        target.clear();

        device.fire_sim_broadcast(SimBroadcast {
            slot: Some(0),
            subscription: None,
            state: Some("ABSENT".into()),
        });
        monitor.flush().unwrap();

        let sims = target.sim_deliveries();
        assert_eq!(sims.len(), 1);
        assert!(!sims[0].records.contains_key(&0));
        assert_eq!(sims[0].primary, SubscriptionId(20));
    }

    #[test]
    fn test_malformed_sim_broadcast_is_dropped() {
        let device = dual_sim_device();
        let (target, monitor) = start(&device);
        target.clear();

        device.fire_sim_broadcast(SimBroadcast {
            slot: None,
            subscription: Some(10),
            state: Some("READY".into()),
        });
        monitor.flush().unwrap();

        assert!(target.is_empty());
    }

    #[test]
    fn test_empty_subscriptions_always_reported() {
        let device = dual_sim_device();
        let (target, monitor) = start(&device);
        target.clear();

        device.remove_sim(0);
        device.remove_sim(1);
        device.fire_subscriptions_changed();
        device.fire_subscriptions_changed();
        monitor.flush().unwrap();

        let sims = target.sim_deliveries();
        assert_eq!(sims.len(), 2);
        for snapshot in sims {
            assert_eq!(snapshot, SimSnapshot::empty(SubscriptionId(10)));
        }
    }

    #[test]
    fn test_default_data_switch_via_network_event() {
        let device = dual_sim_device();
        let (target, monitor) = start(&device);
        target.clear();

        device.set_default_data(Some(SubscriptionId(20)));
        device.fire_network(NetworkEvent::CapabilitiesChanged(TransportInfo::wifi(-65)));
        monitor.flush().unwrap();

        assert_eq!(target.count_for(Dimension::Network), 0);
        let sims = target.sim_deliveries();
        assert_eq!(sims.len(), 1);
        assert_eq!(sims[0].primary, SubscriptionId(20));
    }

    #[test]
    fn test_sim_change_rechecks_network() {
        let device = dual_sim_device();
        let (target, monitor) = start(&device);
        target.clear();

        device.set_transport(Some(TransportInfo::cellular(subtype::HSPA, "HSPA")));
        device.set_data_service(0, DataServiceState::OutOfService);
        device.fire_service_state(0);
        monitor.flush().unwrap();

        assert_eq!(
            target.network_deliveries(),
            vec![NetworkState {
                network_type: NetworkType::G3,
                signal_fraction: 1.0,
                transfer: TransferDirection::Unknown,
            }]
        );
    }

    #[test]
    fn test_subscription_changes_do_not_leak_watches() {
        let device = dual_sim_device();
        let (_target, monitor) = start(&device);
        let before = device.active_watch_count();

        for _ in 0..3 {
            device.fire_subscriptions_changed();
        }
        monitor.flush().unwrap();

        assert_eq!(device.active_watch_count(), before);
    }
}

// =============================================================================
// Network
// =============================================================================

mod network {
    use super::*;

    fn quick_recheck() -> MonitorConfig {
        MonitorConfig {
            network_lost_recheck_ms: 50,
            ..MonitorConfig::default()
        }
    }

    #[test]
    fn test_lost_then_recovered_by_recheck() {
        let device = dual_sim_device();
        let target = Arc::new(RecordingTarget::new());
        let monitor = start_with(&device, &target, quick_recheck());
        target.clear();

        device.set_transport(None);
        device.fire_network(NetworkEvent::Lost);
        monitor.flush().unwrap();
        device.set_transport(Some(TransportInfo::cellular(subtype::LTE, "LTE")));
        thread::sleep(Duration::from_millis(200));
        monitor.flush().unwrap();

        let types: Vec<NetworkType> = target
            .network_deliveries()
            .iter()
            .map(|s| s.network_type)
            .collect();
        assert_eq!(types, vec![NetworkType::None, NetworkType::G4]);
    }

    #[test]
    fn test_lost_while_still_available_is_ignored() {
        let device = dual_sim_device();
        let target = Arc::new(RecordingTarget::new());
        let monitor = start_with(&device, &target, quick_recheck());
        target.clear();

        device.fire_network(NetworkEvent::Lost);
        thread::sleep(Duration::from_millis(120));
        monitor.flush().unwrap();

        assert_eq!(target.count_for(Dimension::Network), 0);
    }

    #[test]
    fn test_unavailable_reports_none() {
        let device = dual_sim_device();
        let (target, monitor) = start(&device);
        target.clear();

        device.fire_network(NetworkEvent::Unavailable);
        monitor.flush().unwrap();

        assert_eq!(target.network_deliveries(), vec![NetworkState::none()]);
    }

    #[test]
    fn test_default_network_active_skips_none() {
        let device = dual_sim_device();
        let (target, monitor) = start(&device);
        device.fire_network(NetworkEvent::Unavailable);
        monitor.flush().unwrap();
        target.clear();

        device.set_transport(None);
        device.fire_network(NetworkEvent::DefaultNetworkActive);
        monitor.flush().unwrap();
        assert!(target.is_empty());

        device.set_transport(Some(TransportInfo::wifi(-40)));
        device.fire_network(NetworkEvent::DefaultNetworkActive);
        monitor.flush().unwrap();
        assert_eq!(target.network_deliveries()[0].signal_fraction, 1.0);
    }
}

// =============================================================================
// Headset
// =============================================================================

mod headset {
    use super::*;

    fn headset_values(target: &RecordingTarget) -> Vec<bool> {
        target
            .deliveries_for(Dimension::Headset)
            .into_iter()
            .filter_map(|d| match d {
                Delivery::Headset { present } => Some(present),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_device_added_and_removed() {
        let device = dual_sim_device();
        let (target, monitor) = start(&device);

        device.set_output_devices(Some(vec![AudioDeviceType::BluetoothA2dp]));
        device.fire_headset(HeadsetEvent::DevicesAdded(vec![AudioDeviceType::BluetoothA2dp]));
        device.set_output_devices(Some(vec![]));
        device.fire_headset(HeadsetEvent::DevicesRemoved(vec![AudioDeviceType::BluetoothA2dp]));
        monitor.flush().unwrap();

        assert_eq!(headset_values(&target), vec![false, true, false]);
    }

    #[test]
    fn test_non_headset_devices_are_ignored() {
        let device = dual_sim_device();
        let (target, monitor) = start(&device);
        target.clear();

        device.fire_headset(HeadsetEvent::DevicesAdded(vec![AudioDeviceType::Other(2)]));
        monitor.flush().unwrap();

        assert!(target.is_empty());
    }

    #[test]
    fn test_legacy_broadcasts() {
        let device = dual_sim_device();
        let (target, monitor) = start(&device);

        device.fire_headset(HeadsetEvent::WiredPlug { state: 1 });
        device.fire_headset(HeadsetEvent::BecomingNoisy);
        device.fire_headset(HeadsetEvent::BluetoothConnection { state: 2 });
        device.fire_headset(HeadsetEvent::BluetoothConnection { state: 0 });
        monitor.flush().unwrap();

        assert_eq!(headset_values(&target), vec![false, true, false, true, false]);
    }

    #[test]
    fn test_old_platform_uses_legacy_query() {
        let device = dual_sim_device();
        device.set_platform_version(22);
        device.set_output_devices(Some(vec![AudioDeviceType::WiredHeadset]));
        device.set_legacy_headset(false);
        let (target, _monitor) = start(&device);

        assert_eq!(headset_values(&target), vec![false]);
    }
}

// =============================================================================
// Control surface
// =============================================================================

mod control {
    use super::*;

    /// Target that queries the monitor from inside a render callback.
    struct QueryingTarget {
        inner: RecordingTarget,
        handle: Mutex<Option<MonitorHandle>>,
        outcome: Mutex<Option<bool>>,
    }

    impl RenderTarget for QueryingTarget {
        fn on_sim_changed(&self, snapshot: SimSnapshot) {
            self.inner.on_sim_changed(snapshot);
        }

        fn on_battery_changed(&self, fraction: f32, charging: bool) {
            self.inner.on_battery_changed(fraction, charging);
        }

        fn on_airplane_changed(&self, enabled: bool) {
            if let Some(handle) = self.handle.lock().unwrap().as_ref() {
                let reentrant = matches!(
                    handle.sim_snapshot(),
                    Err(MonitorError::Scheduler(SchedulerError::Reentrant))
                );
                *self.outcome.lock().unwrap() = Some(reentrant);
            }
            self.inner.on_airplane_changed(enabled);
        }

        fn on_network_type_changed(
            &self,
            network_type: NetworkType,
            signal_fraction: f32,
            transfer: TransferDirection,
        ) {
            self.inner
                .on_network_type_changed(network_type, signal_fraction, transfer);
        }

        fn on_headset_changed(&self, present: bool) {
            self.inner.on_headset_changed(present);
        }
    }

    #[test]
    fn test_snapshot_from_render_callback_is_reentrant_error() {
        let device = dual_sim_device();
        let target = Arc::new(QueryingTarget {
            inner: RecordingTarget::new(),
            handle: Mutex::new(None),
            outcome: Mutex::new(None),
        });
        let mut monitor = StatusMonitor::new(
            MonitorConfig::default(),
            Platform::from_device(device.clone()),
            target.clone(),
        )
        .unwrap();
        monitor.start().unwrap();
        *target.handle.lock().unwrap() = Some(monitor.handle().unwrap());

        device.fire_airplane(Some(true));
        monitor.flush().unwrap();

        assert_eq!(*target.outcome.lock().unwrap(), Some(true));
        assert_eq!(monitor.sim_snapshot().unwrap().records.len(), 2);
    }

    #[test]
    fn test_stop_releases_every_watch() {
        let device = dual_sim_device();
        let (_target, mut monitor) = start(&device);
        assert_eq!(device.active_watch_count(), 8);

        monitor.stop();

        assert!(!monitor.is_running());
        assert_eq!(device.active_watch_count(), 0);
    }

    #[test]
    fn test_restart_after_stop() {
        let device = dual_sim_device();
        let (target, mut monitor) = start(&device);
        monitor.stop();
        target.clear();

        monitor.start().unwrap();
        monitor.flush().unwrap();

        assert_eq!(target.count_for(Dimension::Sim), 1);
        assert_eq!(device.active_watch_count(), 8);
    }

    #[test]
    fn test_queries_need_running_monitor() {
        let monitor = StatusMonitor::new(
            MonitorConfig::default(),
            Platform::null(),
            Arc::new(RecordingTarget::new()),
        )
        .unwrap();

        assert!(matches!(monitor.flush(), Err(MonitorError::NotRunning)));
        assert!(matches!(
            monitor.request_immediate_full_refresh(),
            Err(MonitorError::NotRunning)
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = MonitorConfig {
            worker_thread_name: String::new(),
            ..MonitorConfig::default()
        };
        let result = StatusMonitor::new(config, Platform::null(), Arc::new(RecordingTarget::new()));
        assert!(matches!(result, Err(MonitorError::InvalidConfig(_))));
    }

    #[test]
    fn test_null_platform_runs() {
        let target = Arc::new(RecordingTarget::new());
        let mut monitor =
            StatusMonitor::new(MonitorConfig::default(), Platform::null(), target.clone()).unwrap();
        monitor.start().unwrap();
        monitor.flush().unwrap();

        assert_eq!(target.network_deliveries(), vec![NetworkState::none()]);
        assert_eq!(target.count_for(Dimension::Sim), 1);
    }
}

// =============================================================================
// Event bus mirror
// =============================================================================

mod event_bus {
    use super::*;

    #[test]
    fn test_deliveries_are_mirrored_as_json() {
        let device = dual_sim_device();
        let bus = Arc::new(CapturingBus::new());
        let mut monitor = StatusMonitor::new(
            MonitorConfig::default(),
            Platform::from_device(device.clone()),
            Arc::new(EventBusTarget::new(bus.clone())),
        )
        .unwrap();
        monitor.start().unwrap();
        monitor.flush().unwrap();

        device.fire_airplane(Some(true));
        monitor.flush().unwrap();

        let airplane = bus.on_topic(event_names::AIRPLANE_CHANGED);
        assert_eq!(airplane.len(), 2);
        assert_eq!(airplane[1].payload["enabled"], true);
        assert!(airplane[1].payload["timestamp_ms"].as_i64().unwrap() > 0);

        let sims = bus.on_topic(event_names::SIM_CHANGED);
        assert_eq!(sims[0].payload["primary"], 10);
        assert_eq!(sims[0].payload["records"].as_array().unwrap().len(), 2);
    }
}
