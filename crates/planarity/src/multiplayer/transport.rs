use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

/// Subscription callback. Returns `false` once the subscriber is gone.
pub type Callback = Box<dyn Fn(&str) -> bool + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("broker connection closed")]
    Closed,

    #[error("invalid topic name {0:?}")]
    InvalidTopic(String),
}

/// A publish/subscribe client with at-most-once delivery.
pub trait Transport: Send + Sync {
    fn publish(&self, topic: &str, payload: &str) -> Result<(), TransportError>;

    fn subscribe(&self, topic: &str, callback: Callback) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn publish(&self, topic: &str, payload: &str) -> Result<(), TransportError> {
        (**self).publish(topic, payload)
    }

    fn subscribe(&self, topic: &str, callback: Callback) -> Result<(), TransportError> {
        (**self).subscribe(topic, callback)
    }
}

struct Subscriber {
    id: u64,
    topic: String,
    callback: Arc<dyn Fn(&str) -> bool + Send + Sync>,
}

#[cfg(test)]
struct DropRule {
    prefix: String,
    remaining: u32,
}

#[derive(Default)]
struct BrokerState {
    next_id: u64,
    subscribers: Vec<Subscriber>,
    #[cfg(test)]
    drops: Vec<DropRule>,
    published: Vec<String>,
    closed: bool,
}

impl BrokerState {
    /// Whether a drop rule claims `payload`.
    #[cfg(test)]
    fn loses(&mut self, payload: &str) -> bool {
        let Some(rule) = self
            .drops
            .iter_mut()
            .find(|rule| rule.remaining > 0 && payload.starts_with(&rule.prefix))
        else {
            return false;
        };
        rule.remaining -= 1;
        true
    }

    #[cfg(not(test))]
    fn loses(&mut self, _payload: &str) -> bool {
        false
    }
}

/// In-process broker. Every publish is delivered synchronously to every
/// subscriber of the topic, the publisher included.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Silently lose the next `count` publishes whose payload starts with `prefix`.
    #[cfg(test)]
    pub fn drop_next(&self, prefix: &str, count: u32) {
        self.state.lock().drops.push(DropRule {
            prefix: prefix.to_string(),
            remaining: count,
        });
    }

    /// Refuse all further traffic.
    #[cfg(test)]
    pub fn close(&self) {
        self.state.lock().closed = true;
    }

    /// Every payload published so far, lost ones included.
    pub fn published(&self) -> Vec<String> {
        self.state.lock().published.clone()
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }
}

fn check_topic(topic: &str) -> Result<(), TransportError> {
    if topic.is_empty() || topic.contains(['+', '#']) {
        return Err(TransportError::InvalidTopic(topic.to_string()));
    }
    Ok(())
}

impl Transport for MemoryBroker {
    fn publish(&self, topic: &str, payload: &str) -> Result<(), TransportError> {
        check_topic(topic)?;
        let targets: Vec<_> = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(TransportError::Closed);
            }
            state.published.push(payload.to_string());

            if state.loses(payload) {
                debug!(topic, payload, "dropping message");
                return Ok(());
            }

            state
                .subscribers
                .iter()
                .filter(|sub| sub.topic == topic)
                .map(|sub| (sub.id, Arc::clone(&sub.callback)))
                .collect()
        };

        // Callbacks run unlocked so they may publish in turn.
        trace!(topic, payload, receivers = targets.len(), "delivering");
        let gone: Vec<u64> = targets
            .into_iter()
            .filter(|(_, callback)| !callback(payload))
            .map(|(id, _)| id)
            .collect();
        if !gone.is_empty() {
            self.state
                .lock()
                .subscribers
                .retain(|sub| !gone.contains(&sub.id));
        }
        Ok(())
    }

    fn subscribe(&self, topic: &str, callback: Callback) -> Result<(), TransportError> {
        check_topic(topic)?;
        let mut state = self.state.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.push(Subscriber {
            id,
            topic: topic.to_string(),
            callback: Arc::from(callback),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn collector() -> (Arc<Mutex<Vec<String>>>, Callback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: Callback = Box::new(move |msg| {
            sink.lock().push(msg.to_string());
            true
        });
        (seen, callback)
    }

    #[test]
    fn publisher_hears_its_own_echo() {
        let broker = MemoryBroker::new();
        let (seen, callback) = collector();
        broker.subscribe("t", callback).unwrap();
        broker.publish("t", "Join").unwrap();
        assert_eq!(*seen.lock(), vec!["Join".to_string()]);
    }

    #[test]
    fn topics_are_isolated() {
        let broker = MemoryBroker::new();
        let (seen, callback) = collector();
        broker.subscribe("a", callback).unwrap();
        broker.publish("b", "Host").unwrap();
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn drop_rule_loses_matching_messages_only() {
        let broker = MemoryBroker::new();
        let (seen, callback) = collector();
        broker.subscribe("t", callback).unwrap();
        broker.drop_next("Received", 2);
        for msg in ["Received", "Host", "Received", "Received"] {
            broker.publish("t", msg).unwrap();
        }
        assert_eq!(
            *seen.lock(),
            vec!["Host".to_string(), "Received".to_string()]
        );
        assert_eq!(broker.published().len(), 4);
    }

    #[test]
    fn departed_subscribers_are_pruned() {
        let broker = MemoryBroker::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        broker
            .subscribe(
                "t",
                Box::new(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    false
                }),
            )
            .unwrap();
        broker.publish("t", "x").unwrap();
        broker.publish("t", "y").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(broker.subscriber_count(), 0);
    }

    #[test]
    fn closed_broker_refuses_traffic() {
        let broker = MemoryBroker::new();
        broker.close();
        assert_eq!(broker.publish("t", "x"), Err(TransportError::Closed));
        let (_, callback) = collector();
        assert_eq!(broker.subscribe("t", callback), Err(TransportError::Closed));
    }

    #[test]
    fn wildcard_topics_rejected() {
        let broker = MemoryBroker::new();
        assert!(matches!(
            broker.publish("planarity/#", "x"),
            Err(TransportError::InvalidTopic(_))
        ));
        assert!(matches!(
            broker.publish("", "x"),
            Err(TransportError::InvalidTopic(_))
        ));
    }
}
