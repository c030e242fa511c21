//! Device signal monitoring and state reconciliation for an app-drawn
//! status bar.
//!
//! Observes SIM subscriptions, signal strength, network transport, battery,
//! headset and airplane mode through independent platform sources and turns
//! them into one consistent, deduplicated stream of render-target calls.
//!
//! # Architecture
//!
//! ```text
//! platform listeners (any thread)
//!          │  adapters.rs - validate, normalise, hand off
//!          ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              delivery thread (statusbar-scheduler)           │
//! │  engine.rs     - Core: dispatch, cross-dimension rules       │
//! │  registry      - SimRegistry (statusbar-registry)            │
//! │  reconciler.rs - Dedup gate over the last delivered values   │
//! │  ledger.rs     - Every watch held, released on stop          │
//! └─────────────────────────────────────────────────────────────┘
//!          │
//!          ▼
//!   RenderTarget (statusbar-events)
//! ```
//!
//! `StatusMonitor` owns the delivery thread. `LifecycleBinder` drives it from
//! enable/disable and owner foreground transitions.
//!
//! # Example
//!
//! ```no_run
//! use statusbar_events::RecordingTarget;
//! use statusbar_monitor::{MonitorConfig, StatusMonitor};
//! use statusbar_signals::{fake::FakeDevice, Platform};
//! use std::sync::Arc;
//!
//! let device = Arc::new(FakeDevice::new());
//! let target = Arc::new(RecordingTarget::new());
//! let mut monitor = StatusMonitor::new(
//!     MonitorConfig::default(),
//!     Platform::from_device(device.clone()),
//!     target.clone(),
//! )?;
//!
//! monitor.start()?;
//! device.set_airplane(true);
//! device.fire_airplane(Some(true));
//! monitor.flush()?;
//! monitor.stop();
//! # Ok::<(), statusbar_monitor::MonitorError>(())
//! ```

mod adapters;
mod config;
mod engine;
mod error;
mod ledger;
mod lifecycle;
mod monitor;
mod owner;
mod reconciler;
mod sequence;

pub use config::{
    MonitorConfig, SourceToggles, DEFAULT_NETWORK_LOST_RECHECK_MS, DEFAULT_WORKER_THREAD_NAME,
    MAX_RECHECK_MS,
};
pub use engine::UpdateKind;
pub use error::{MonitorError, Result};
pub use ledger::{RegistrationLedger, WatchKey};
pub use lifecycle::{LifecycleBinder, NullSurface, Surface};
pub use monitor::{MonitorHandle, StatusMonitor};
pub use owner::{OwnerId, OwnerTable, OwnerTraits};
pub use reconciler::{DeliveredSnapshot, Reconciler};
pub use statusbar_scheduler::SchedulerError;
