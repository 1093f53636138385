//! Diagnostics infrastructure: observing every message the engine handles.
//!
//! A [`Listener`] sees each decoded incoming message, each incoming packet
//! that failed to decode (as [`Command::Unknown`](cec_core::Command::Unknown)),
//! and each outgoing message after it was successfully encoded.
//!
//! # Threading (for beginners)
//!
//! Listeners may be slow (writing to a terminal, a file, a UI), but the
//! dispatch loop must keep up with the bus.  So the engine never calls the
//! listener directly.  Messages go into a bounded queue, and a dedicated
//! worker thread feeds them to the listener in order:
//!
//! ```text
//! dispatch thread ──observe()──▶ [ queue: 64 ] ──▶ worker thread ──▶ Listener
//! ```
//!
//! When the queue is full the dispatch thread waits.  On shutdown the queue
//! is closed and the worker is joined, so nothing observed is ever lost.

use std::io;
use std::sync::mpsc::{self, SyncSender};
use std::thread::JoinHandle;

use cec_core::Message;
use tracing::{debug, error};

pub mod history;

/// Number of messages that may wait for the listener before the dispatch
/// thread blocks.
pub const LISTENER_QUEUE_CAPACITY: usize = 64;

/// Receives a copy of every incoming and outgoing message.
pub trait Listener: Send {
    fn message(&self, msg: &Message);
}

impl<F> Listener for F
where
    F: Fn(&Message) + Send,
{
    fn message(&self, msg: &Message) {
        self(msg)
    }
}

/// The sending half of a listener queue plus the worker that drains it.
pub struct ListenerTap {
    sender: SyncSender<Message>,
    worker: JoinHandle<()>,
}

impl ListenerTap {
    /// Spawns the worker thread for `listener`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn spawn(listener: Box<dyn Listener>) -> io::Result<Self> {
        let (sender, receiver) = mpsc::sync_channel::<Message>(LISTENER_QUEUE_CAPACITY);
        let worker = std::thread::Builder::new()
            .name("cec-listener".to_string())
            .spawn(move || {
                for msg in receiver {
                    listener.message(&msg);
                }
                debug!("listener queue drained");
            })?;
        Ok(Self { sender, worker })
    }

    /// Queues `msg` for the listener, blocking while the queue is full.
    pub fn observe(&self, msg: Message) {
        if self.sender.send(msg).is_err() {
            // Only happens if the listener panicked and took the worker down.
            error!("listener worker has stopped; message dropped");
        }
    }

    /// Closes the queue and waits until the listener has seen every message.
    pub fn close(self) {
        drop(self.sender);
        if self.worker.join().is_err() {
            error!("listener worker panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use cec_core::{Command, LogicalAddress};

    use super::*;

    fn standby(n: u8) -> Message {
        Message::new(LogicalAddress::from_nibble(n), LogicalAddress::BROADCAST, Command::Standby)
    }

    #[test]
    fn test_tap_delivers_every_message_in_order_before_close_returns() {
        // Arrange: a listener slower than the producer.
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let tap = ListenerTap::spawn(Box::new(move |msg: &Message| {
            std::thread::sleep(Duration::from_millis(1));
            sink.lock().unwrap().push(msg.initiator);
        }))
        .expect("spawn should succeed");

        // Act: more messages than the queue holds.
        let count = LISTENER_QUEUE_CAPACITY + 16;
        for i in 0..count {
            tap.observe(standby((i % 15) as u8));
        }
        tap.close();

        // Assert
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), count);
        assert_eq!(seen[0], LogicalAddress::TV);
        assert_eq!(seen[1], LogicalAddress::RECORDER_1);
    }

    #[test]
    fn test_tap_survives_a_panicking_listener() {
        let tap = ListenerTap::spawn(Box::new(|_: &Message| panic!("listener failure")))
            .expect("spawn should succeed");

        tap.observe(standby(0));
        // The worker is gone; further messages are dropped, not blocked on.
        std::thread::sleep(Duration::from_millis(20));
        tap.observe(standby(1));
        tap.close();
    }
}
