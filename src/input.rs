//! Encoder events and the bounded queue that carries them to the menu.

use anyhow::Result;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::logging::{log, log_dropped_events, obj, v_str, Domain, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    RotateUp,
    RotateDown,
    ShortPress,
    LongPress,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::RotateUp => "rotate_up",
            Event::RotateDown => "rotate_down",
            Event::ShortPress => "short_press",
            Event::LongPress => "long_press",
        }
    }

    /// Keyboard command for a non-hardware run.
    pub fn from_command(cmd: &str) -> Option<Self> {
        match cmd.trim().to_lowercase().as_str() {
            "w" | "u" | "up" | "+" => Some(Event::RotateUp),
            "s" | "d" | "down" | "-" => Some(Event::RotateDown),
            "" | "p" | "press" => Some(Event::ShortPress),
            "l" | "long" => Some(Event::LongPress),
            _ => None,
        }
    }
}

/// Sole entry point for events: debounces per kind and enqueues without
/// blocking. When the queue is full the event is dropped.
#[derive(Debug)]
pub struct EventPublisher {
    tx: mpsc::Sender<Event>,
    debounce: Duration,
    last_seen: HashMap<Event, Instant>,
}

/// Bounded event queue between a source and the menu controller.
pub fn channel(capacity: usize, debounce: Duration) -> (EventPublisher, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        EventPublisher {
            tx,
            debounce,
            last_seen: HashMap::new(),
        },
        rx,
    )
}

impl EventPublisher {
    /// Returns true when the event was queued.
    pub fn publish(&mut self, event: Event) -> bool {
        let now = Instant::now();
        if let Some(prev) = self.last_seen.get(&event) {
            if now.duration_since(*prev) < self.debounce {
                log(
                    Level::Trace,
                    Domain::Input,
                    "debounced",
                    obj(&[("event", v_str(event.as_str()))]),
                );
                return false;
            }
        }
        self.last_seen.insert(event, now);

        match self.tx.try_send(event) {
            Ok(()) => {
                log(
                    Level::Debug,
                    Domain::Input,
                    "event",
                    obj(&[("event", v_str(event.as_str()))]),
                );
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                log_dropped_events("queue_full", 1);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Read commands from stdin until it closes or the menu goes away.
pub async fn run_keyboard(mut publisher: EventPublisher) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Event::from_command(&line) {
            Some(event) => {
                publisher.publish(event);
            }
            None => log(
                Level::Info,
                Domain::Input,
                "unknown_command",
                obj(&[
                    ("command", v_str(line.trim())),
                    ("help", json!("w/u up, s/d down, enter/p press, l long press")),
                ]),
            ),
        }
        if publisher.is_closed() {
            break;
        }
    }
    Ok(())
}
