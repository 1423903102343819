//! Bus-safe device detection.
//!
//! A quick write is the least intrusive probe, but some EEPROMs
//! (0x50..=0x5F) and write-protect latches (0x30..=0x37) can be left in an
//! undefined state by one, so those ranges are probed with a one-byte read.
//! The boundaries follow `i2cdetect`'s auto mode and must not change.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Serialize, Serializer};

use crate::address::SlaveAddress;

const READ_PROBE_RANGES: [RangeInclusive<u8>; 2] = [0x30..=0x37, 0x50..=0x5F];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    QuickWrite,
    ReadByte,
}

pub fn probe_kind(addr: SlaveAddress) -> ProbeKind {
    if READ_PROBE_RANGES.iter().any(|r| r.contains(&addr.get())) {
        ProbeKind::ReadByte
    } else {
        ProbeKind::QuickWrite
    }
}

/// Outcome of a full 0..=127 scan, one slot per address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    slots: Vec<Option<SlaveAddress>>,
}

impl ScanResult {
    pub(crate) fn from_slots(slots: Vec<Option<SlaveAddress>>) -> Self {
        debug_assert_eq!(slots.len(), SlaveAddress::COUNT);
        Self { slots }
    }

    /// Always 128.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, addr: SlaveAddress) -> Option<SlaveAddress> {
        self.slots[addr.get() as usize]
    }

    pub fn is_present(&self, addr: SlaveAddress) -> bool {
        self.get(addr).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<SlaveAddress>> + '_ {
        self.slots.iter().copied()
    }

    /// Acknowledging addresses, ascending.
    pub fn present(&self) -> impl Iterator<Item = SlaveAddress> + '_ {
        self.slots.iter().flatten().copied()
    }
}

impl Serialize for ScanResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.slots)
    }
}

/// `i2cdetect`-style grid: rows of 16, `--` for an empty slot.
impl fmt::Display for ScanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "    ")?;
        for col in 0..16 {
            write!(f, " {col:2x}")?;
        }
        for (row, chunk) in self.slots.chunks(16).enumerate() {
            write!(f, "\n{:02x}:", row * 16)?;
            for slot in chunk {
                match slot {
                    Some(addr) => write!(f, " {:02x}", addr.get())?,
                    None => write!(f, " --")?,
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(a: u8) -> SlaveAddress {
        SlaveAddress::new(a).unwrap()
    }

    #[test]
    fn eeprom_and_latch_ranges_use_read_probe() {
        for a in [0x30, 0x33, 0x37, 0x50, 0x58, 0x5F] {
            assert_eq!(probe_kind(addr(a)), ProbeKind::ReadByte, "0x{a:02x}");
        }
    }

    #[test]
    fn everything_else_uses_quick_write() {
        for a in [0x00, 0x10, 0x2F, 0x38, 0x40, 0x4F, 0x60, 0x7F] {
            assert_eq!(probe_kind(addr(a)), ProbeKind::QuickWrite, "0x{a:02x}");
        }
    }

    #[test]
    fn read_probe_covers_exactly_24_addresses() {
        let reads = SlaveAddress::all()
            .filter(|&a| probe_kind(a) == ProbeKind::ReadByte)
            .count();
        assert_eq!(reads, 8 + 16);
    }

    fn sample() -> ScanResult {
        let slots = SlaveAddress::all()
            .map(|a| matches!(a.get(), 0x1d | 0x48 | 0x68).then_some(a))
            .collect();
        ScanResult::from_slots(slots)
    }

    #[test]
    fn present_lists_acknowledged_addresses_in_order() {
        let result = sample();
        assert_eq!(result.len(), 128);
        let found: Vec<u8> = result.present().map(SlaveAddress::get).collect();
        assert_eq!(found, vec![0x1d, 0x48, 0x68]);
        assert!(result.is_present(addr(0x48)));
        assert!(!result.is_present(addr(0x49)));
    }

    #[test]
    fn serializes_as_address_or_null() {
        let json = serde_json::to_value(sample()).unwrap();
        let arr = json.as_array().unwrap();
        assert_eq!(arr.len(), 128);
        assert_eq!(arr[0x48], serde_json::json!(0x48));
        assert!(arr[0x49].is_null());
    }

    #[test]
    fn grid_marks_found_devices() {
        let grid = sample().to_string();
        let lines: Vec<&str> = grid.lines().collect();
        assert_eq!(lines.len(), 9);
        assert!(lines[0].starts_with("      0  1  2"));
        assert_eq!(lines[5], "40: -- -- -- -- -- -- -- -- 48 -- -- -- -- -- -- --");
        assert!(lines[2].contains(" 1d"));
    }
}
