//! SMBus primitives over the Linux `i2c-dev` character device.
//!
//! The slave address is bound to the descriptor, not to the transaction, so
//! every transfer goes to whatever `force_address` last selected.
//!
//! Reference: <https://www.kernel.org/doc/Documentation/i2c/dev-interface>

use std::io;
use std::path::Path;

use i2cdev::core::I2CDevice;
use i2cdev::linux::LinuxI2CDevice;

use crate::address::SlaveAddress;

/// As specified in SMBus standard
pub const I2C_SMBUS_BLOCK_MAX: usize = 32;

/// The transaction set a bus session needs from the layer below it.
pub trait Transport {
    /// Bind to `addr`, even if a kernel driver already claims it.
    fn force_address(&mut self, addr: SlaveAddress) -> io::Result<()>;

    /// Address the device in write mode with no payload.
    fn write_quick(&mut self) -> io::Result<()>;

    fn read_byte(&mut self) -> io::Result<u8>;

    fn write_byte(&mut self, value: u8) -> io::Result<()>;

    fn write_word_data(&mut self, command: u8, word: u16) -> io::Result<()>;

    /// `data` must not exceed [`I2C_SMBUS_BLOCK_MAX`] bytes.
    fn write_i2c_block_data(&mut self, command: u8, data: &[u8]) -> io::Result<()>;
}

/// An open `/dev/i2c-N` adapter. Dropping it closes the descriptor.
pub struct I2cDev {
    dev: LinuxI2CDevice,
}

impl I2cDev {
    /// Open the adapter bound to address 0x00, the kernel's default for a
    /// fresh descriptor. Fails if `path` is not an I2C adapter.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        // SAFETY: forced binds may confuse a kernel driver owning the same
        // address; probing claimed addresses is exactly what scanning needs.
        let dev = unsafe { LinuxI2CDevice::force_new(path, 0) }.map_err(io::Error::from)?;
        Ok(Self { dev })
    }
}

impl std::fmt::Debug for I2cDev {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("I2cDev").finish_non_exhaustive()
    }
}

impl Transport for I2cDev {
    fn force_address(&mut self, addr: SlaveAddress) -> io::Result<()> {
        // SAFETY: see `open`.
        unsafe { self.dev.force_set_slave_address(u16::from(addr.get())) }.map_err(io::Error::from)
    }

    fn write_quick(&mut self) -> io::Result<()> {
        // `false` is the write direction bit
        self.dev.smbus_write_quick(false).map_err(io::Error::from)
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        self.dev.smbus_read_byte().map_err(io::Error::from)
    }

    fn write_byte(&mut self, value: u8) -> io::Result<()> {
        self.dev.smbus_write_byte(value).map_err(io::Error::from)
    }

    fn write_word_data(&mut self, command: u8, word: u16) -> io::Result<()> {
        self.dev.smbus_write_word_data(command, word).map_err(io::Error::from)
    }

    fn write_i2c_block_data(&mut self, command: u8, data: &[u8]) -> io::Result<()> {
        if data.len() > I2C_SMBUS_BLOCK_MAX {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "block exceeds 32 bytes"));
        }
        self.dev.smbus_write_i2c_block_data(command, data).map_err(io::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_reports_missing_device() {
        let err = I2cDev::open("/nonexistent/i2c-99").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn open_rejects_non_adapter() {
        // /dev/null opens fine but refuses the slave-address ioctl
        assert!(I2cDev::open("/dev/null").is_err());
    }
}
