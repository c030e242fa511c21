//! Status monitor engine.
//!
//! Owns the delivery thread and exposes the control surface used by the
//! enclosing application: start/stop, forced full refresh, and blocking
//! queries that run on the delivery thread.

use crate::config::MonitorConfig;
use crate::engine::{Core, CoreHandle, UpdateKind};
use crate::error::{MonitorError, Result};
use crate::reconciler::DeliveredSnapshot;
use statusbar_events::RenderTarget;
use statusbar_scheduler::DeliveryScheduler;
use statusbar_signals::{Platform, SimSnapshot};
use std::sync::Arc;

/// Cloneable handle to a running monitor, usable from any thread.
#[derive(Clone)]
pub struct MonitorHandle {
    inner: CoreHandle,
}

impl MonitorHandle {
    /// Deliver every dimension once, bypassing the dedup gate.
    pub fn request_immediate_full_refresh(&self) -> Result<()> {
        Ok(self.inner.post(|core| core.full_refresh())?)
    }

    /// Copy of the SIM registry, taken on the delivery thread.
    ///
    /// Fails with a reentrancy error when called from a render-target callback.
    pub fn sim_snapshot(&self) -> Result<SimSnapshot> {
        Ok(self.inner.call(|core| core.sim_snapshot())?)
    }

    /// Last value delivered per dimension.
    pub fn delivered(&self) -> Result<DeliveredSnapshot> {
        Ok(self.inner.call(|core| core.delivered())?)
    }

    /// Number of platform watches currently held.
    pub fn watch_count(&self) -> Result<usize> {
        Ok(self.inner.call(|core| core.watch_count())?)
    }

    /// Wait until every event handed off so far has been applied.
    pub fn flush(&self) -> Result<()> {
        Ok(self.inner.flush()?)
    }
}

pub struct StatusMonitor {
    config: MonitorConfig,
    platform: Platform,
    target: Arc<dyn RenderTarget>,
    scheduler: Option<DeliveryScheduler<Core, UpdateKind>>,
}

impl StatusMonitor {
    pub fn new(config: MonitorConfig, platform: Platform, target: Arc<dyn RenderTarget>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            platform,
            target,
            scheduler: None,
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Spawn the delivery thread, install watches and deliver everything once.
    ///
    /// Calling it on a running monitor does nothing.
    pub fn start(&mut self) -> Result<()> {
        if self.scheduler.is_some() {
            tracing::debug!("status monitor already running");
            return Ok(());
        }

        let config = self.config.clone();
        let platform = self.platform.clone();
        let target = Arc::clone(&self.target);
        let scheduler = DeliveryScheduler::<Core, UpdateKind>::spawn(
            &self.config.worker_thread_name,
            move |handle| Core::new(config, platform, target, handle),
        )?;

        scheduler.handle().post(|core| core.start())?;
        self.scheduler = Some(scheduler);
        Ok(())
    }

    /// Release every watch and stop the delivery thread.
    pub fn stop(&mut self) {
        let Some(mut scheduler) = self.scheduler.take() else {
            return;
        };
        if let Err(e) = scheduler.handle().post(|core| core.stop()) {
            tracing::warn!(error = %e, "could not post stop to delivery thread");
        }
        scheduler.shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    pub fn handle(&self) -> Result<MonitorHandle> {
        self.scheduler
            .as_ref()
            .map(|s| MonitorHandle { inner: s.handle() })
            .ok_or(MonitorError::NotRunning)
    }

    pub fn request_immediate_full_refresh(&self) -> Result<()> {
        self.handle()?.request_immediate_full_refresh()
    }

    pub fn sim_snapshot(&self) -> Result<SimSnapshot> {
        self.handle()?.sim_snapshot()
    }

    pub fn delivered(&self) -> Result<DeliveredSnapshot> {
        self.handle()?.delivered()
    }

    pub fn flush(&self) -> Result<()> {
        self.handle()?.flush()
    }
}

impl Drop for StatusMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
