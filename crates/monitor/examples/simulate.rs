//! Example: drive the monitor with a scripted device and print deliveries.
//!
//! Run with: cargo run -p statusbar-monitor --example simulate
//! Set RUST_LOG to override the default log filter.

use anyhow::Context;
use statusbar_events::RenderTarget;
use statusbar_monitor::{
    LifecycleBinder, MonitorConfig, OwnerId, OwnerTraits, StatusMonitor, Surface,
};
use statusbar_signals::fake::FakeDevice;
use statusbar_signals::{
    battery_status, subtype, AudioDeviceType, BatteryReading, DataServiceState, HeadsetEvent,
    NetworkEvent, NetworkType, Platform, SimSnapshot, SubscriptionId, TransferDirection,
    TransportInfo,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

struct PrintingTarget;

impl RenderTarget for PrintingTarget {
    fn on_sim_changed(&self, snapshot: SimSnapshot) {
        let sims: Vec<String> = snapshot
            .records
            .values()
            .map(|r| match r.effective_level() {
                Some(level) => format!("slot{}={}:{}", r.slot, r.subscription, level),
                None => format!("slot{}={}:-", r.slot, r.subscription),
            })
            .collect();
        println!("sim      | primary {} | {}", snapshot.primary, sims.join(" "));
    }

    fn on_battery_changed(&self, fraction: f32, charging: bool) {
        println!(
            "battery  | {:3.0}%{}",
            fraction * 100.0,
            if charging { " (charging)" } else { "" }
        );
    }

    fn on_airplane_changed(&self, enabled: bool) {
        println!("airplane | {}", if enabled { "on" } else { "off" });
    }

    fn on_network_type_changed(
        &self,
        network_type: NetworkType,
        signal_fraction: f32,
        transfer: TransferDirection,
    ) {
        println!(
            "network  | {} {:.2} {:?}",
            network_type, signal_fraction, transfer
        );
    }

    fn on_headset_changed(&self, present: bool) {
        println!("headset  | {}", if present { "connected" } else { "none" });
    }
}

struct PrintingSurface;

impl Surface for PrintingSurface {
    fn attach(&self, owner: OwnerId) {
        println!("surface  | attach {}", owner);
    }

    fn detach(&self, owner: OwnerId) {
        println!("surface  | detach {}", owner);
    }

    fn set_visible(&self, visible: bool) {
        println!("surface  | visible={}", visible);
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("statusbar_monitor=debug,statusbar_registry=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== Status Bar Simulation ===\n");

    let device = Arc::new(FakeDevice::new());
    device.insert_sim(0, SubscriptionId(10), 3);
    device.insert_sim(1, SubscriptionId(20), 1);
    device.set_default_data(Some(SubscriptionId(10)));
    device.set_transport(Some(TransportInfo::wifi(-65)));
    device.set_battery(Some(BatteryReading {
        level: 64,
        scale: 100,
        status: battery_status::DISCHARGING,
        plugged: 0,
    }));

    let monitor = StatusMonitor::new(
        MonitorConfig::default(),
        Platform::from_device(device.clone()),
        Arc::new(PrintingTarget),
    )
    .context("invalid monitor configuration")?;
    let mut binder = LifecycleBinder::new(monitor, Arc::new(PrintingSurface));

    binder.enable()?;
    binder.on_owner_resumed(OwnerId(1), OwnerTraits::default())?;
    let handle = binder.monitor().handle()?;
    handle.flush()?;

    println!("\n-- slot 0 loses service --");
    device.set_data_service(0, DataServiceState::OutOfService);
    device.fire_service_state(0);
    handle.flush()?;

    println!("\n-- wifi drops, LTE takes over --");
    device.set_transport(None);
    device.fire_network(NetworkEvent::Lost);
    device.set_transport(Some(TransportInfo::cellular(subtype::LTE, "LTE")));
    std::thread::sleep(Duration::from_millis(600));
    handle.flush()?;

    println!("\n-- charger plugged in, headset connected --");
    device.fire_battery(Some(BatteryReading {
        level: 65,
        scale: 100,
        status: battery_status::CHARGING,
        plugged: 1,
    }));
    device.set_output_devices(Some(vec![AudioDeviceType::WiredHeadset]));
    device.fire_headset(HeadsetEvent::DevicesAdded(vec![AudioDeviceType::WiredHeadset]));
    handle.flush()?;

    println!("\n-- airplane on, then off --");
    device.fire_airplane(Some(true));
    device.fire_airplane(Some(false));
    handle.flush()?;

    let snapshot = handle.sim_snapshot()?;
    println!("\nprimary subscription: {}", snapshot.primary);

    binder.on_owner_paused(OwnerId(1), true);
    binder.disable();
    println!("watches left: {}", device.active_watch_count());

    Ok(())
}
