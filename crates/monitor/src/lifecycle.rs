//! Lifecycle binder.
//!
//! Maps enable/disable and owner foreground transitions onto the monitor and
//! the display surface. The bar is shown only while enabled and while the
//! foreground owner allows it; showing starts monitoring, hiding stops it and
//! releases every watch.

use crate::error::Result;
use crate::monitor::StatusMonitor;
use crate::owner::{OwnerId, OwnerTable, OwnerTraits};
use std::sync::Arc;

/// Display surface the status bar view lives in.
pub trait Surface: Send + Sync {
    /// Insert the bar into the owner's view hierarchy.
    fn attach(&self, owner: OwnerId);

    fn detach(&self, owner: OwnerId);

    fn set_visible(&self, visible: bool);
}

/// Surface that does nothing.
pub struct NullSurface;

impl Surface for NullSurface {
    fn attach(&self, _owner: OwnerId) {}

    fn detach(&self, _owner: OwnerId) {}

    fn set_visible(&self, _visible: bool) {}
}

pub struct LifecycleBinder {
    monitor: StatusMonitor,
    surface: Arc<dyn Surface>,
    owners: OwnerTable,
    enabled: bool,
    shown: bool,
    foreground: Option<OwnerId>,
    attached: Option<OwnerId>,
}

impl LifecycleBinder {
    pub fn new(monitor: StatusMonitor, surface: Arc<dyn Surface>) -> Self {
        Self {
            monitor,
            surface,
            owners: OwnerTable::new(),
            enabled: false,
            shown: false,
            foreground: None,
            attached: None,
        }
    }

    /// Turn the status bar on. Takes effect over the current foreground owner.
    pub fn enable(&mut self) -> Result<()> {
        if self.enabled {
            return Ok(());
        }
        self.enabled = true;
        tracing::debug!("status bar enabled");

        match self.foreground {
            Some(id) => {
                let traits = self.owners.get(id).unwrap_or_default();
                self.present(id, traits)
            }
            None => Ok(()),
        }
    }

    /// Turn the status bar off, stop monitoring and detach from the owner.
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.hide();
        self.detach_current();
        tracing::debug!("status bar disabled");
    }

    pub fn on_owner_resumed(&mut self, id: OwnerId, traits: OwnerTraits) -> Result<()> {
        let traits = self.owners.remember(id, traits);
        self.foreground = Some(id);
        if !self.enabled {
            return Ok(());
        }
        self.present(id, traits)
    }

    /// A finishing owner is detached and forgotten.
    pub fn on_owner_paused(&mut self, id: OwnerId, finishing: bool) {
        if finishing {
            self.forget(id);
        }
    }

    /// A stopped foreground owner takes the bar down with it.
    pub fn on_owner_stopped(&mut self, id: OwnerId) {
        if self.foreground == Some(id) {
            self.foreground = None;
            self.hide();
            self.detach_current();
        }
    }

    pub fn on_owner_destroyed(&mut self, id: OwnerId) {
        self.forget(id);
    }

    /// Make the bar visible and start monitoring.
    ///
    /// On an already visible bar this only forces a full refresh.
    pub fn show(&mut self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.shown {
            return self.monitor.request_immediate_full_refresh();
        }
        self.monitor.start()?;
        self.surface.set_visible(true);
        self.shown = true;
        Ok(())
    }

    /// Hide the bar and stop monitoring.
    pub fn hide(&mut self) {
        if !self.shown {
            return;
        }
        self.surface.set_visible(false);
        self.monitor.stop();
        self.shown = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn foreground(&self) -> Option<OwnerId> {
        self.foreground
    }

    pub fn attached(&self) -> Option<OwnerId> {
        self.attached
    }

    pub fn owners(&self) -> &OwnerTable {
        &self.owners
    }

    pub fn monitor(&self) -> &StatusMonitor {
        &self.monitor
    }

    fn present(&mut self, id: OwnerId, traits: OwnerTraits) -> Result<()> {
        if traits.hides_status_bar() {
            tracing::debug!(owner = %id, "owner hides the status bar");
            self.hide();
            self.detach_current();
            return Ok(());
        }
        self.attach_to(id);
        self.show()
    }

    fn attach_to(&mut self, id: OwnerId) {
        if self.attached == Some(id) {
            return;
        }
        if let Some(previous) = self.attached.take() {
            self.surface.detach(previous);
        }
        self.surface.attach(id);
        self.attached = Some(id);
    }

    fn detach_current(&mut self) {
        if let Some(id) = self.attached.take() {
            self.surface.detach(id);
        }
    }

    fn forget(&mut self, id: OwnerId) {
        if self.attached == Some(id) {
            self.surface.detach(id);
            self.attached = None;
        }
        self.owners.remove(id);
        if self.foreground == Some(id) {
            self.foreground = None;
            self.hide();
        }
    }
}
