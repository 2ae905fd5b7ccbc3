use std::time::Duration;

use anyhow::{Context, Result};
use ureq::{Agent, AgentBuilder};

use super::{AlertPayload, AlertSink};

/// Delivers alerts as JSON POSTs to a fixed endpoint.
///
/// The agent reuses connections across alerts. Non-2xx responses and
/// transport failures both surface as dispatch errors.
pub struct HttpAlertSink {
    agent: Agent,
    url: String,
}

impl HttpAlertSink {
    pub fn new(url: String, timeout: Duration) -> Self {
        let agent = AgentBuilder::new().timeout(timeout).build();
        Self { agent, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl AlertSink for HttpAlertSink {
    fn dispatch(&mut self, payload: &AlertPayload) -> Result<()> {
        self.agent
            .post(&self.url)
            .send_json(payload)
            .with_context(|| format!("post alert to {}", self.url))?;
        Ok(())
    }
}
