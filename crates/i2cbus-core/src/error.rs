use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::scan::ScanResult;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("failed to open I2C device {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to set address 0x{addr:02x}: {source}")]
    Address {
        addr: u8,
        #[source]
        source: io::Error,
    },

    /// The scan finished but the previous address could not be rebound.
    /// The session has no selected address until the next successful select.
    #[error("scan could not restore address 0x{addr:02x}: {source}")]
    Restore {
        addr: u8,
        #[source]
        source: io::Error,
        result: ScanResult,
    },

    #[error("cannot read device: {0}")]
    Read(#[source] io::Error),

    #[error("cannot write to device: {0}")]
    Write(#[source] io::Error),

    #[error(transparent)]
    Usage(#[from] UsageError),
}

/// Caller mistakes, detected before anything reaches the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("no I2C device is open")]
    NotOpen,

    #[error("no slave address is selected")]
    NoAddress,

    #[error("address {0} is outside the 7-bit range 0..=127")]
    AddressOutOfRange(u32),

    #[error("value {value} does not fit in {bits} bits")]
    ValueOutOfRange { value: u32, bits: u8 },

    #[error("block payload of {0} bytes exceeds the SMBus limit of 32")]
    BlockTooLong(usize),
}

impl BusError {
    pub fn is_usage(&self) -> bool {
        matches!(self, BusError::Usage(_))
    }
}

pub type Result<T, E = BusError> = std::result::Result<T, E>;
