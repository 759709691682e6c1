//! [`Publisher`] over any [`Connector`]

use std::collections::VecDeque;

use aquaguard_core::{AlarmEvent, Measurement, Publisher};
use serde_json::Value;

use crate::payload::{alarm_body, api_field, measurement_body, PayloadConfig, ALERT_TOPIC};
use crate::{ConnectionStats, Connector};

/// Undelivered messages kept by default
pub const DEFAULT_BACKLOG: usize = 64;

#[derive(Debug, Clone)]
struct Pending {
    topic: &'static str,
    data: Vec<u8>,
}

/// Renders pool API payloads and hands them to a connector
///
/// Messages that cannot be sent wait in a bounded backlog and are retried,
/// oldest first, before anything newer goes out. When the backlog is full
/// the oldest entry is dropped.
#[derive(Debug)]
pub struct ConnectorPublisher<C: Connector> {
    connector: C,
    payload: PayloadConfig,
    backlog: VecDeque<Pending>,
    max_backlog: usize,
    stats: ConnectionStats,
}

impl<C: Connector> ConnectorPublisher<C> {
    pub fn new(connector: C, payload: PayloadConfig) -> Self {
        Self::with_backlog(connector, payload, DEFAULT_BACKLOG)
    }

    pub fn with_backlog(connector: C, payload: PayloadConfig, max_backlog: usize) -> Self {
        Self {
            connector,
            payload,
            backlog: VecDeque::with_capacity(max_backlog),
            max_backlog,
            stats: ConnectionStats::default(),
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn connector_mut(&mut self) -> &mut C {
        &mut self.connector
    }

    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Retry the backlog, returning how many messages went out
    pub fn flush(&mut self) -> usize {
        let mut sent = 0;
        while let Some(pending) = self.backlog.pop_front() {
            if !self.try_send(pending.topic, &pending.data) {
                self.backlog.push_front(pending);
                break;
            }
            sent += 1;
        }
        sent
    }

    fn try_send(&mut self, topic: &str, data: &[u8]) -> bool {
        match self.connector.send(topic, data) {
            Ok(()) => {
                self.stats.messages_sent += 1;
                self.stats.bytes_sent += data.len() as u64;
                true
            }
            Err(err) => {
                self.stats.messages_failed += 1;
                self.stats.last_error = Some(err.to_string());
                log::debug!("delivery to {} failed: {}", topic, err);
                false
            }
        }
    }

    fn enqueue(&mut self, pending: Pending) {
        if self.max_backlog == 0 {
            self.stats.messages_dropped += 1;
            return;
        }
        if self.backlog.len() >= self.max_backlog {
            if let Some(dropped) = self.backlog.pop_front() {
                self.stats.messages_dropped += 1;
                log::warn!("backlog full, dropping oldest message for {}", dropped.topic);
            }
        }
        self.backlog.push_back(pending);
    }

    fn deliver(&mut self, topic: &'static str, body: Value) {
        let data = match serde_json::to_vec(&body) {
            Ok(data) => data,
            Err(err) => {
                log::warn!("encoding payload for {}: {}", topic, err);
                self.stats.last_error = Some(err.to_string());
                return;
            }
        };

        self.flush();
        if !self.backlog.is_empty() || !self.try_send(topic, &data) {
            self.enqueue(Pending { topic, data });
        }
    }
}

impl<C: Connector> Publisher for ConnectorPublisher<C> {
    fn publish(&mut self, measurement: &Measurement) {
        let body = measurement_body(measurement, &self.payload);
        self.deliver(api_field(measurement.sensor).endpoint, body);
    }

    fn publish_alarm(&mut self, alarm: &AlarmEvent) {
        let body = alarm_body(alarm, &self.payload);
        self.deliver(ALERT_TOPIC, body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryConnector;
    use aquaguard_core::SensorKind;

    fn reading(value: f32, timestamp: u64) -> Measurement {
        let mut m = Measurement::failed(SensorKind::Ph, value, timestamp);
        m.computed_value = value;
        m.valid = true;
        m
    }

    #[test]
    fn delivers_when_connected() {
        let mut publisher = ConnectorPublisher::new(MemoryConnector::new(), PayloadConfig::default());
        publisher.publish(&reading(7.2, 0));

        let delivered = publisher.connector().delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].topic, "/api/ph-readings");
        assert_eq!(delivered[0].json().unwrap()["ph_value"], 7.2);
        assert_eq!(publisher.stats().messages_sent, 1);
    }

    #[test]
    fn backlog_is_replayed_in_order() {
        let mut publisher = ConnectorPublisher::new(MemoryConnector::new(), PayloadConfig::default());
        publisher.connector_mut().set_connected(false);
        publisher.publish(&reading(7.0, 1));
        publisher.publish(&reading(7.1, 2));
        assert_eq!(publisher.backlog_len(), 2);

        publisher.connector_mut().set_connected(true);
        publisher.publish(&reading(7.2, 3));

        let stamps: Vec<_> = publisher
            .connector()
            .delivered()
            .iter()
            .map(|d| d.json().unwrap()["quality"]["timestamp"].as_u64().unwrap())
            .collect();
        assert_eq!(stamps, [1, 2, 3]);
        assert_eq!(publisher.backlog_len(), 0);
        assert_eq!(publisher.stats().messages_failed, 2);
    }

    #[test]
    fn full_backlog_drops_oldest() {
        let mut publisher =
            ConnectorPublisher::with_backlog(MemoryConnector::new(), PayloadConfig::default(), 2);
        publisher.connector_mut().set_connected(false);
        for t in 0..5 {
            publisher.publish(&reading(7.0, t));
        }
        assert_eq!(publisher.backlog_len(), 2);
        assert_eq!(publisher.stats().messages_dropped, 3);

        publisher.connector_mut().set_connected(true);
        assert_eq!(publisher.flush(), 2);
        let first = publisher.connector().delivered()[0].json().unwrap();
        assert_eq!(first["quality"]["timestamp"], 3);
    }
}
