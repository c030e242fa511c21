//! Scoped watch handles returned by signal sources.

/// Registration with a signal source. Dropping it unregisters the listener.
pub struct WatchHandle {
    label: &'static str,
    release: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl WatchHandle {
    pub fn new<F>(label: &'static str, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            label,
            release: Some(Box::new(release)),
        }
    }

    /// Handle with nothing to release.
    pub fn detached(label: &'static str) -> Self {
        Self {
            label,
            release: None,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Unregister now instead of on drop.
    pub fn release(mut self) {
        self.run_release();
    }

    fn run_release(&mut self) {
        if let Some(release) = self.release.take() {
            tracing::trace!(label = self.label, "releasing watch");
            release();
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.run_release();
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("label", &self.label)
            .field("armed", &self.release.is_some())
            .finish()
    }
}
