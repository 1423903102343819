use std::fmt;

use serde::Serialize;

use crate::error::UsageError;

/// A 7-bit I2C slave address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(into = "u8")]
pub struct SlaveAddress(u8);

impl SlaveAddress {
    pub const MAX: u8 = 0x7F;
    /// Number of addressable slots on a 7-bit bus.
    pub const COUNT: usize = Self::MAX as usize + 1;

    pub fn new(addr: u8) -> Result<Self, UsageError> {
        if addr > Self::MAX {
            return Err(UsageError::AddressOutOfRange(addr as u32));
        }
        Ok(Self(addr))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Every candidate address in ascending order.
    pub fn all() -> impl Iterator<Item = SlaveAddress> {
        (0..=Self::MAX).map(SlaveAddress)
    }
}

impl TryFrom<u32> for SlaveAddress {
    type Error = UsageError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .filter(|&a| a <= Self::MAX)
            .map(SlaveAddress)
            .ok_or(UsageError::AddressOutOfRange(value))
    }
}

impl From<SlaveAddress> for u8 {
    fn from(addr: SlaveAddress) -> Self {
        addr.0
    }
}

impl fmt::Display for SlaveAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_full_7bit_range() {
        for a in 0..=127u8 {
            assert_eq!(SlaveAddress::new(a).unwrap().get(), a);
        }
        assert_eq!(SlaveAddress::all().count(), SlaveAddress::COUNT);
    }

    #[test]
    fn rejects_8bit_addresses() {
        assert_eq!(SlaveAddress::new(0x80), Err(UsageError::AddressOutOfRange(0x80)));
        assert_eq!(SlaveAddress::try_from(300u32), Err(UsageError::AddressOutOfRange(300)));
    }

    #[test]
    fn displays_as_hex() {
        assert_eq!(SlaveAddress::new(0x48).unwrap().to_string(), "0x48");
    }
}
