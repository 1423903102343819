use std::path::Path;

use log::{debug, info, trace, warn};

use crate::address::SlaveAddress;
use crate::error::{BusError, Result, UsageError};
use crate::journal::{Direction, SharedJournal, TransactionLog};
use crate::scan::{probe_kind, ProbeKind, ScanResult};
use crate::transport::{I2cDev, Transport, I2C_SMBUS_BLOCK_MAX};

const DEFAULT_JOURNAL_ENTRIES: usize = 256;

/// One open bus adapter and the slave address its descriptor is bound to.
///
/// All transfers go to the selected address; when that is unknown (a scan
/// could not rebind it) transfers are refused. The session is not internally
/// synchronised: callers sharing one must serialise whole operations,
/// including a scan, or use [`crate::BusService`].
pub struct BusSession<T: Transport = I2cDev> {
    handle: Option<T>,
    address: Option<SlaveAddress>,
    journal: SharedJournal,
}

impl<T: Transport> BusSession<T> {
    pub fn new() -> Self {
        Self::with_journal(TransactionLog::shared(DEFAULT_JOURNAL_ENTRIES))
    }

    pub fn with_journal(journal: SharedJournal) -> Self {
        Self {
            handle: None,
            address: None,
            journal,
        }
    }

    /// Take ownership of an already-open transport, closing any previous one.
    pub fn attach(&mut self, transport: T) {
        self.close();
        self.handle = Some(transport);
        self.address = Some(SlaveAddress::default());
    }

    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            drop(handle);
            debug!("bus handle closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// `None` before open, and after a scan that failed to rebind.
    pub fn selected_address(&self) -> Option<SlaveAddress> {
        self.address
    }

    pub fn journal(&self) -> SharedJournal {
        self.journal.clone()
    }

    pub fn select_address(&mut self, addr: u8) -> Result<()> {
        let addr = SlaveAddress::new(addr)?;
        let handle = self.handle.as_mut().ok_or(UsageError::NotOpen)?;
        handle
            .force_address(addr)
            .map_err(|source| BusError::Address { addr: addr.get(), source })?;
        debug!("selected slave address {addr}");
        self.address = Some(addr);
        Ok(())
    }

    /// Probe all 128 addresses, then rebind the address selected beforehand.
    ///
    /// If the rebind fails twice the descriptor is left on the last probed
    /// address, so the selected address becomes unknown and the slots are
    /// returned inside [`BusError::Restore`].
    pub fn scan(&mut self) -> Result<ScanResult> {
        let handle = self.handle.as_mut().ok_or(UsageError::NotOpen)?;
        let previous = self.address;

        let slots = SlaveAddress::all().map(|addr| probe(&mut *handle, addr)).collect();
        let result = ScanResult::from_slots(slots);

        if let Some(previous) = previous {
            if let Err(e) = handle.force_address(previous) {
                warn!("could not restore slave address {previous} after scan, retrying: {e}");
                if let Err(source) = handle.force_address(previous) {
                    warn!("slave address unknown after scan: {source}");
                    self.address = None;
                    return Err(BusError::Restore { addr: previous.get(), source, result });
                }
            }
        }
        info!("scan found {} device(s)", result.present().count());
        Ok(result)
    }

    fn bound(&mut self) -> Result<(&mut T, SlaveAddress), UsageError> {
        let handle = self.handle.as_mut().ok_or(UsageError::NotOpen)?;
        let addr = self.address.ok_or(UsageError::NoAddress)?;
        Ok((handle, addr))
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        let (handle, addr) = self.bound()?;
        let value = handle.read_byte().map_err(BusError::Read)?;
        trace!("read byte 0x{value:02x} from {addr}");
        self.journal.lock().push(Direction::Rx, addr, vec![value]);
        Ok(value)
    }

    pub fn write_byte(&mut self, value: u8) -> Result<()> {
        let (handle, addr) = self.bound()?;
        handle.write_byte(value).map_err(BusError::Write)?;
        trace!("wrote byte 0x{value:02x} to {addr}");
        self.journal.lock().push(Direction::Tx, addr, vec![value]);
        Ok(())
    }

    pub fn write_word(&mut self, command: u8, word: u16) -> Result<()> {
        let (handle, addr) = self.bound()?;
        handle.write_word_data(command, word).map_err(BusError::Write)?;
        trace!("wrote word 0x{word:04x} to {addr} register 0x{command:02x}");
        let [lo, hi] = word.to_le_bytes();
        self.journal.lock().push(Direction::Tx, addr, vec![command, lo, hi]);
        Ok(())
    }

    /// Write `command` followed by all of `data` (at most 32 bytes).
    pub fn write_block(&mut self, command: u8, data: &[u8]) -> Result<()> {
        if data.len() > I2C_SMBUS_BLOCK_MAX {
            return Err(UsageError::BlockTooLong(data.len()).into());
        }
        let (handle, addr) = self.bound()?;
        handle.write_i2c_block_data(command, data).map_err(BusError::Write)?;
        trace!("wrote {} byte block to {addr} register 0x{command:02x}", data.len());
        let mut wire = Vec::with_capacity(data.len() + 1);
        wire.push(command);
        wire.extend_from_slice(data);
        self.journal.lock().push(Direction::Tx, addr, wire);
        Ok(())
    }
}

impl BusSession<I2cDev> {
    /// Open the adapter at `path`. Any previous handle is closed first, so a
    /// failed open leaves the session with no handle at all.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.close();
        let dev = I2cDev::open(path).map_err(|source| BusError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("opened {}", path.display());
        self.attach(dev);
        Ok(())
    }
}

impl<T: Transport> Default for BusSession<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A failed bind or an unacknowledged probe both mean "nothing here".
fn probe<T: Transport>(handle: &mut T, addr: SlaveAddress) -> Option<SlaveAddress> {
    if let Err(e) = handle.force_address(addr) {
        trace!("skipping {addr}: {e}");
        return None;
    }
    let acked = match probe_kind(addr) {
        ProbeKind::QuickWrite => handle.write_quick().is_ok(),
        // the value read is irrelevant, only the acknowledge counts
        ProbeKind::ReadByte => handle.read_byte().is_ok(),
    };
    acked.then_some(addr)
}
