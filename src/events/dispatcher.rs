//! Event dispatcher: the only fan-out point for domain events.
//!
//! Components push events while a tick is processed; nothing reaches
//! observers until the match flushes at the end of the tick, so observers
//! always see a tick's events in generation order and never mid-mutation.

use tokio::sync::broadcast;
use tracing::{debug, info};

use super::types::{EventEnvelope, GameEvent};

/// Receives every dispatched event
pub trait EventObserver: Send {
    fn on_event(&mut self, event: &EventEnvelope);
}

/// Network fan-out: forwards to every broadcast subscriber
impl EventObserver for broadcast::Sender<EventEnvelope> {
    fn on_event(&mut self, event: &EventEnvelope) {
        // No receivers is normal between client connections
        let _ = self.send(event.clone());
    }
}

/// Writes major events to the log, everything else at debug
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl EventObserver for LogObserver {
    fn on_event(&mut self, envelope: &EventEnvelope) {
        match &envelope.event {
            GameEvent::RoundEnd { .. }
            | GameEvent::MatchEnd { .. }
            | GameEvent::Halftime { .. }
            | GameEvent::BombPlanted { .. }
            | GameEvent::BombDefused { .. }
            | GameEvent::BombExploded { .. } => {
                let payload = serde_json::to_string(envelope).unwrap_or_default();
                info!(tick = envelope.tick, event = envelope.event.name(), %payload, "Game event");
            }
            _ => {
                debug!(tick = envelope.tick, event = envelope.event.name(), "Game event");
            }
        }
    }
}

/// Collects a tick's events and hands them to registered observers
#[derive(Default)]
pub struct EventDispatcher {
    observers: Vec<Box<dyn EventObserver>>,
    pending: Vec<EventEnvelope>,
    tick: u64,
    time: f32,
    round_number: u32,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Box<dyn EventObserver>) {
        self.observers.push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Stamp used for subsequently emitted events
    pub fn set_clock(&mut self, tick: u64, time: f32, round_number: u32) {
        self.tick = tick;
        self.time = time;
        self.round_number = round_number;
    }

    /// Queue an event for the next flush
    pub fn emit(&mut self, event: GameEvent) {
        self.pending.push(EventEnvelope {
            tick: self.tick,
            time: self.time,
            round_number: self.round_number,
            event,
        });
    }

    pub fn pending(&self) -> &[EventEnvelope] {
        &self.pending
    }

    /// Deliver queued events to every observer, oldest first, and return them
    pub fn flush(&mut self) -> Vec<EventEnvelope> {
        let events = std::mem::take(&mut self.pending);
        for observer in &mut self.observers {
            for event in &events {
                observer.on_event(event);
            }
        }
        events
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("observers", &self.observers.len())
            .field("pending", &self.pending.len())
            .field("tick", &self.tick)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl EventObserver for Recorder {
        fn on_event(&mut self, event: &EventEnvelope) {
            self.0.lock().unwrap().push(event.event.name().to_string());
        }
    }

    #[test]
    fn events_wait_for_flush_and_keep_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        dispatcher.subscribe(Box::new(Recorder(seen.clone())));

        dispatcher.emit(GameEvent::RoundStart { round_number: 1 });
        dispatcher.emit(GameEvent::RoundFreeze {
            round_number: 2,
            freeze_time: 15.0,
        });
        assert!(seen.lock().unwrap().is_empty());

        let flushed = dispatcher.flush();
        assert_eq!(flushed.len(), 2);
        assert_eq!(*seen.lock().unwrap(), vec!["round_start", "round_freeze"]);
        assert!(dispatcher.pending().is_empty());
    }

    #[test]
    fn events_carry_clock_stamp() {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.set_clock(42, 3.5, 4);
        dispatcher.emit(GameEvent::RoundStart { round_number: 4 });
        let flushed = dispatcher.flush();
        assert_eq!(flushed[0].tick, 42);
        assert_eq!(flushed[0].time, 3.5);
        assert_eq!(flushed[0].round_number, 4);
    }

    #[test]
    fn broadcast_sender_is_an_observer() {
        let (tx, mut rx) = broadcast::channel(8);
        let mut dispatcher = EventDispatcher::new();
        dispatcher.subscribe(Box::new(tx));
        dispatcher.emit(GameEvent::RoundStart { round_number: 1 });
        dispatcher.flush();
        let received = rx.try_recv().unwrap();
        assert_eq!(received.event, GameEvent::RoundStart { round_number: 1 });
    }
}
