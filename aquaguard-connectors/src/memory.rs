//! In-process connector for tests and local consumers

use serde_json::Value;

use crate::{Connector, ConnectorError};

/// One delivered message
#[derive(Debug, Clone, PartialEq)]
pub struct Delivered {
    pub topic: String,
    pub data: Vec<u8>,
}

impl Delivered {
    /// Decode the body as JSON
    pub fn json(&self) -> Result<Value, ConnectorError> {
        Ok(serde_json::from_slice(&self.data)?)
    }
}

/// Keeps every message it is sent; can be switched offline
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    delivered: Vec<Delivered>,
    connected: bool,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self {
            delivered: Vec::new(),
            connected: true,
        }
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn delivered(&self) -> &[Delivered] {
        &self.delivered
    }

    /// Messages sent to `topic`, oldest first
    pub fn on_topic<'a>(&'a self, topic: &'a str) -> impl Iterator<Item = &'a Delivered> + 'a {
        self.delivered.iter().filter(move |d| d.topic == topic)
    }

    pub fn take(&mut self) -> Vec<Delivered> {
        std::mem::take(&mut self.delivered)
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for MemoryConnector {
    type Error = ConnectorError;

    fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), Self::Error> {
        if !self.connected {
            return Err(ConnectorError::NotConnected);
        }
        self.delivered.push(Delivered {
            topic: topic.to_string(),
            data: data.to_vec(),
        });
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
