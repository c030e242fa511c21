//! Event bus for mirroring status updates.
//!
//! Hosts that want the status stream somewhere other than a render target (a
//! webview bridge, a debug socket) plug in an `EventBus`. Topics are the
//! constants in [`crate::event_names`].

use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub trait EventBus: Send + Sync {
    fn publish(&self, topic: &'static str, payload: Value);
}

pub type EventBusRef = Arc<dyn EventBus>;

/// One event seen by a [`CapturingBus`], numbered in publish order.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEvent {
    pub seq: u64,
    pub topic: &'static str,
    pub payload: Value,
}

/// Bus that keeps everything published to it.
#[derive(Default)]
pub struct CapturingBus {
    published: Mutex<Vec<PublishedEvent>>,
    next_seq: AtomicU64,
}

impl CapturingBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self) -> MutexGuard<'_, Vec<PublishedEvent>> {
        self.published.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn published(&self) -> Vec<PublishedEvent> {
        self.log().clone()
    }

    pub fn on_topic(&self, topic: &str) -> Vec<PublishedEvent> {
        self.log().iter().filter(|e| e.topic == topic).cloned().collect()
    }

    /// Payload of the most recent event on `topic`.
    pub fn latest(&self, topic: &str) -> Option<Value> {
        self.log()
            .iter()
            .rev()
            .find(|e| e.topic == topic)
            .map(|e| e.payload.clone())
    }

    pub fn clear(&self) {
        self.log().clear();
    }

    pub fn len(&self) -> usize {
        self.log().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log().is_empty()
    }
}

impl EventBus for CapturingBus {
    fn publish(&self, topic: &'static str, payload: Value) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.log().push(PublishedEvent {
            seq,
            topic,
            payload,
        });
    }
}

/// Bus that hands every event to a host callback.
pub struct CallbackBus {
    sink: Box<dyn Fn(&'static str, &Value) + Send + Sync>,
}

impl CallbackBus {
    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(&'static str, &Value) + Send + Sync + 'static,
    {
        Self {
            sink: Box::new(sink),
        }
    }
}

impl EventBus for CallbackBus {
    fn publish(&self, topic: &'static str, payload: Value) {
        (self.sink)(topic, &payload);
    }
}
