//! Alert payloads and delivery.
//!
//! The pipeline builds an [`AlertPayload`] per triggering track and
//! hands it to an [`AlertSink`]. `HttpAlertSink` is the production
//! sink; `MemorySink` captures payloads for tests.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

mod http;
mod payload;

pub use http::HttpAlertSink;
pub use payload::AlertPayload;

/// Delivery seam for alerts.
///
/// Dispatch is one attempt; retry policy belongs to the caller.
pub trait AlertSink: Send {
    fn dispatch(&mut self, payload: &AlertPayload) -> Result<()>;
}

/// Sink that records every payload in memory.
///
/// Clones share the same buffer, so tests can keep a handle after
/// boxing one for the pipeline.
#[derive(Clone, Default)]
pub struct MemorySink {
    dispatched: Arc<Mutex<Vec<AlertPayload>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatched(&self) -> Vec<AlertPayload> {
        match self.dispatched.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AlertSink for MemorySink {
    fn dispatch(&mut self, payload: &AlertPayload) -> Result<()> {
        self.dispatched
            .lock()
            .map_err(|_| anyhow!("memory sink lock poisoned"))?
            .push(payload.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Severity;

    #[test]
    fn memory_sink_clones_share_the_buffer() {
        let sink = MemorySink::new();
        let mut handle: Box<dyn AlertSink> = Box::new(sink.clone());
        handle
            .dispatch(&AlertPayload::new(1.0, 2.0, Severity::Low))
            .expect("dispatch");
        assert_eq!(sink.dispatched().len(), 1);
        assert_eq!(sink.dispatched()[0].lat, 1.0);
    }
}
