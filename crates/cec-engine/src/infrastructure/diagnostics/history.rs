//! Bounded in-memory history of observed messages.
//!
//! `HistoryLog` is a [`Listener`] that timestamps each message and keeps the
//! most recent ones.  Clones share the same log, so one clone can be given to
//! the engine while another is kept to read the history later.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use cec_core::Message;

use super::Listener;

/// Largest history the host accepts from its configuration.
pub const MAX_HISTORY_SIZE: usize = 65_536;

/// One recorded message.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// When the listener received the message.
    pub time: SystemTime,
    pub message: Message,
}

/// Ring buffer of the last `capacity` messages.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl HistoryLog {
    /// Creates an empty log.  A capacity of zero records nothing.
    ///
    /// Storage grows as entries arrive, so a large capacity costs nothing
    /// until the bus is busy.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::new())),
            capacity,
        }
    }

    /// Appends `message`, evicting the oldest entry when full.
    pub fn record(&self, message: Message) {
        if self.capacity == 0 {
            return;
        }
        let entry = LogEntry {
            time: SystemTime::now(),
            message,
        };
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Returns a snapshot of the log, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Listener for HistoryLog {
    fn message(&self, msg: &Message) {
        self.record(msg.clone());
    }
}
