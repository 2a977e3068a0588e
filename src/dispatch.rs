//! Name-keyed routing of decoded messages onto bounded sink channels.
//!
//! Each sink is a `std::sync::mpsc::sync_channel`: routing blocks the
//! calling half-stream worker when a sink is full, which is the intended
//! backpressure path back to that stream's frame parser.

use std::collections::HashMap;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};

use log::debug;

use crate::decode::Decoded;

/// Registers sinks by message name and routes decoded messages to them.
#[derive(Debug, Default)]
pub struct Dispatcher {
    sinks: HashMap<String, SyncSender<Decoded>>,
}

/// Why [`Dispatcher::route`] did not deliver a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Delivered to the registered sink.
    Delivered,
    /// No sink is registered for this message's name; dropped.
    Unrouted,
}

impl Dispatcher {
    /// Creates a dispatcher with no sinks registered.
    pub fn new() -> Self {
        Dispatcher::default()
    }

    /// Registers a bounded sink for `name`, returning the receiving end.
    /// Replaces any previously registered sink for the same name.
    pub fn register(&mut self, name: impl Into<String>, capacity: usize) -> Receiver<Decoded> {
        let (tx, rx) = sync_channel(capacity);
        self.sinks.insert(name.into(), tx);
        rx
    }

    /// Routes `name` to an already-constructed sender, e.g. one shared by
    /// several names feeding a single consumer. Replaces any previously
    /// registered sink for the same name.
    pub fn attach(&mut self, name: impl Into<String>, sink: SyncSender<Decoded>) {
        self.sinks.insert(name.into(), sink);
    }

    /// Routes a decoded message to its sink by name, blocking if the sink
    /// is full. Unrecognised names are dropped and logged at debug level.
    pub fn route(&self, message: Decoded) -> RouteOutcome {
        match self.sinks.get(&message.name) {
            Some(sink) => match sink.send(message) {
                Ok(()) => RouteOutcome::Delivered,
                Err(_) => {
                    // Receiver dropped; nothing downstream wants this name
                    // anymore.
                    RouteOutcome::Unrouted
                }
            },
            None => {
                debug!("dropping message {:?}: no sink registered", message.name);
                RouteOutcome::Unrouted
            }
        }
    }

    /// Like [`Dispatcher::route`], but never blocks: a full sink is treated
    /// the same as an unrouted message rather than applying backpressure.
    /// Useful for diagnostic or best-effort consumers.
    pub fn try_route(&self, message: Decoded) -> RouteOutcome {
        match self.sinks.get(&message.name) {
            Some(sink) => match sink.try_send(message) {
                Ok(()) => RouteOutcome::Delivered,
                Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => {
                    RouteOutcome::Unrouted
                }
            },
            None => {
                debug!("dropping message {:?}: no sink registered", message.name);
                RouteOutcome::Unrouted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DecodedValue;

    fn sample(name: &str) -> Decoded {
        Decoded {
            name: name.to_owned(),
            value: DecodedValue::Composite(vec![]),
            trailing_bytes: 0,
        }
    }

    #[test]
    fn routes_to_registered_sink_by_name() {
        let mut dispatcher = Dispatcher::new();
        let rx = dispatcher.register("Hello", 4);

        let outcome = dispatcher.route(sample("Hello"));
        assert_eq!(outcome, RouteOutcome::Delivered);
        assert_eq!(rx.recv().unwrap().name, "Hello");
    }

    #[test]
    fn unregistered_name_is_unrouted() {
        let dispatcher = Dispatcher::new();
        let outcome = dispatcher.route(sample("Unknown"));
        assert_eq!(outcome, RouteOutcome::Unrouted);
    }

    #[test]
    fn try_route_does_not_block_on_full_sink() {
        let mut dispatcher = Dispatcher::new();
        let _rx = dispatcher.register("Hello", 1);

        assert_eq!(dispatcher.try_route(sample("Hello")), RouteOutcome::Delivered);
        assert_eq!(dispatcher.try_route(sample("Hello")), RouteOutcome::Unrouted);
    }

    #[test]
    fn dropped_receiver_is_treated_as_unrouted() {
        let mut dispatcher = Dispatcher::new();
        let rx = dispatcher.register("Hello", 4);
        drop(rx);

        assert_eq!(dispatcher.route(sample("Hello")), RouteOutcome::Unrouted);
    }
}
