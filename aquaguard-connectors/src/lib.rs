//! Transport adapters for AquaGuard probes
//!
//! ## Overview
//!
//! The probe engine hands finished measurements and alarms to a
//! [`Publisher`](aquaguard_core::Publisher). This crate provides the
//! reusable half of that hand-off:
//!
//! - [`payload`]: renders measurements and alarms as the JSON bodies the pool
//!   monitoring API accepts, one endpoint and value field per sensor type
//! - [`Connector`]: a transport that moves bytes to a topic (an MQTT topic,
//!   an HTTP path, a log line)
//! - [`ConnectorPublisher`]: joins the two and keeps a bounded backlog of
//!   undelivered messages
//!
//! ## Buffering Strategy
//!
//! ```text
//! publish(m):
//!     retry backlog oldest-first
//!     if backlog empty: send(m), on failure push to backlog
//!     else:             push to backlog
//!     backlog full  ->  drop oldest
//! ```
//!
//! Delivery failures never reach the sampling loop; they are counted in
//! [`ConnectionStats`] and logged.
//!
//! ## Example Usage
//!
//! ```rust
//! use aquaguard_connectors::{ConnectorPublisher, MemoryConnector, PayloadConfig};
//!
//! let mut publisher = ConnectorPublisher::new(MemoryConnector::new(), PayloadConfig::for_pool(3));
//! // hand `&mut publisher` to a Probe
//! assert_eq!(publisher.backlog_len(), 0);
//! ```

#![deny(unsafe_code)]

pub mod memory;
pub mod payload;
pub mod publisher;
pub mod writer;

pub use memory::MemoryConnector;
pub use payload::{api_field, ApiField, PayloadConfig, ALERT_TOPIC};
pub use publisher::ConnectorPublisher;
pub use writer::WriterConnector;

use thiserror::Error;

/// Delivery errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConnectorError {
    #[error("Not connected")]
    NotConnected,

    #[error("Rejected by remote: {0}")]
    Rejected(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        ConnectorError::Encoding(err.to_string())
    }
}

impl From<std::io::Error> for ConnectorError {
    fn from(err: std::io::Error) -> Self {
        ConnectorError::Io(err.to_string())
    }
}

/// Trait for all transports
pub trait Connector {
    type Error: std::fmt::Display;

    /// Deliver one encoded message
    fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), Self::Error>;

    /// Check if connected
    fn is_connected(&self) -> bool;
}

impl<C: Connector + ?Sized> Connector for &mut C {
    type Error = C::Error;

    fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), Self::Error> {
        (**self).send(topic, data)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}

/// Delivery statistics of one publisher
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConnectionStats {
    /// Messages delivered, including retried ones
    pub messages_sent: u64,
    /// Send attempts that failed
    pub messages_failed: u64,
    /// Messages evicted from a full backlog
    pub messages_dropped: u64,
    pub bytes_sent: u64,
    /// Last error message
    pub last_error: Option<String>,
}
