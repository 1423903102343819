use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use crate::address::SlaveAddress;

/// Journal shared between a session and whoever displays it.
pub type SharedJournal = Arc<Mutex<TransactionLog>>;

#[derive(Debug, Clone)]
pub struct JournalEntry {
    pub timestamp: u64,
    pub direction: Direction,
    pub address: SlaveAddress,
    /// Bytes as they went over the wire, command byte first.
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Direction {
    Rx,
    Tx,
}

pub struct TransactionLog {
    entries: VecDeque<JournalEntry>,
    max_entries: usize,
}

impl TransactionLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries,
        }
    }

    pub fn shared(max_entries: usize) -> SharedJournal {
        Arc::new(Mutex::new(Self::new(max_entries)))
    }

    pub fn push(&mut self, direction: Direction, address: SlaveAddress, data: Vec<u8>) {
        if self.max_entries == 0 {
            return;
        }
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        self.entries.push_back(JournalEntry {
            timestamp,
            direction,
            address,
            data,
        });

        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_text(&self, show_timestamp: bool) -> String {
        let mut result = String::new();
        for entry in &self.entries {
            if show_timestamp {
                let millis = entry.timestamp % 1000;
                let secs = entry.timestamp / 1000;
                let hours = (secs / 3600) % 24;
                let minutes = (secs / 60) % 60;
                let seconds = secs % 60;
                result.push_str(&format!("[{hours:02}:{minutes:02}:{seconds:02}.{millis:03}] "));
            }

            let prefix = match entry.direction {
                Direction::Rx => "RX",
                Direction::Tx => "TX",
            };
            result.push_str(&format!("{prefix} {}:", entry.address));
            for byte in &entry.data {
                result.push_str(&format!(" {byte:02X}"));
            }
            result.push('\n');
        }
        result
    }
}
