//! Core functionalities: i2c-dev bus sessions, device scanning, transaction journal.

pub mod address;
pub mod bus_service;
pub mod error;
pub mod journal;
pub mod scan;
pub mod session;
pub mod transport;

#[cfg(test)]
mod mock;

pub use address::SlaveAddress;
pub use bus_service::{BusEvent, BusService, Operation};
pub use error::{BusError, UsageError};
pub use journal::{Direction, JournalEntry, SharedJournal, TransactionLog};
pub use scan::{probe_kind, ProbeKind, ScanResult};
pub use session::BusSession;
pub use transport::{I2cDev, Transport, I2C_SMBUS_BLOCK_MAX};
