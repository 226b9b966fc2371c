//! Mock event sinks standing in for live connections
#![allow(dead_code)] // Test utilities may not all be used in every test

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use wsrs::event::DeliveryError;
use wsrs::{EventSink, RoomEvent};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Records delivered payloads; can be switched to fail or hang on demand
#[derive(Default)]
pub struct MockSink {
    received: Mutex<Vec<String>>,
    attempts: AtomicUsize,
    failing: AtomicBool,
    stalled: AtomicBool,
}

impl MockSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let sink = Self::new();
        sink.set_failing(true);
        sink
    }

    pub fn stalled() -> Arc<Self> {
        let sink = Self::new();
        sink.stalled.store(true, Ordering::SeqCst);
        sink
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of writes attempted, successful or not
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<RoomEvent> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(|payload| serde_json::from_str(payload).unwrap())
            .collect()
    }

    pub fn raw(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSink for MockSink {
    async fn deliver(&self, payload: &str) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.stalled.load(Ordering::SeqCst) {
            return std::future::pending().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::SendFailed("connection reset".to_string()));
        }

        self.received.lock().unwrap().push(payload.to_string());
        Ok(())
    }
}
