use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Something the game loop reacts to besides player input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// One second of game clock.
    Tick,
    /// Crazy mode: teleport a random node.
    Jump,
    /// Time to retransmit whatever is unacknowledged.
    Retry,
    /// A message arrived on the subscribed topic.
    Network(String),
}

/// Single-consumer queue every timer and subscription posts into.
pub struct EventQueue {
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> EventSender {
        EventSender(self.tx.clone())
    }

    /// Next queued event. Cancel-safe.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Pop an event without waiting.
    #[cfg(test)]
    pub fn try_next(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct EventSender(mpsc::UnboundedSender<Event>);

impl EventSender {
    /// Post `event`. Returns `false` once the queue is gone.
    pub fn post(&self, event: Event) -> bool {
        self.0.send(event).is_ok()
    }
}

/// Posts an event every `period` until detached or dropped.
pub struct Ticker {
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Start posting `event`; the first one arrives one `period` from now.
    pub fn attach(sender: EventSender, period: Duration, event: Event) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !sender.post(event.clone()) {
                    break;
                }
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    pub fn detach(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    #[cfg(test)]
    pub fn is_attached(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.detach();
    }
}
