use anyhow::{anyhow, bail, Context, Result};
use i2cbus_core::{SlaveAddress, UsageError, I2C_SMBUS_BLOCK_MAX};
use std::path::PathBuf;

pub const USAGE: &str = "\
usage: i2cbus [-d DEVICE] [-v] [--trace] <command>

commands:
  scan [--json]                       probe every 7-bit address
  read <addr>                         read one byte
  write <addr> <byte>                 write one byte
  write-word <addr> <cmd> <word>      write a 16-bit word to register <cmd>
  write-block <addr> <cmd> <hex>      write up to 32 bytes to register <cmd>

numbers are decimal or 0x-prefixed hex";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Scan { json: bool },
    Read { addr: SlaveAddress },
    Write { addr: SlaveAddress, value: u8 },
    WriteWord { addr: SlaveAddress, command: u8, word: u16 },
    WriteBlock { addr: SlaveAddress, command: u8, data: Vec<u8> },
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub device: Option<PathBuf>,
    pub verbose: bool,
    pub trace: bool,
    pub command: Command,
}

impl Args {
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut device = None;
        let mut verbose = false;
        let mut trace = false;
        let mut json = false;
        let mut words = Vec::new();

        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-d" | "--device" => {
                    let value = iter.next().ok_or_else(|| anyhow!("{arg} needs a device path"))?;
                    device = Some(PathBuf::from(value));
                }
                "-v" | "--verbose" => verbose = true,
                "--trace" => trace = true,
                "--json" => json = true,
                "-h" | "--help" => {
                    return Ok(Self { device, verbose, trace, command: Command::Help });
                }
                s if s.starts_with('-') && s.len() > 1 => bail!("unknown option {s}"),
                _ => words.push(arg),
            }
        }

        let command = match words.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
            ["scan"] => Command::Scan { json },
            ["read", addr] => Command::Read { addr: parse_address(addr)? },
            ["write", addr, value] => Command::Write {
                addr: parse_address(addr)?,
                value: parse_u8(value)?,
            },
            ["write-word", addr, command, word] => Command::WriteWord {
                addr: parse_address(addr)?,
                command: parse_u8(command)?,
                word: parse_u16(word)?,
            },
            ["write-block", addr, command, data] => Command::WriteBlock {
                addr: parse_address(addr)?,
                command: parse_u8(command)?,
                data: parse_block(data)?,
            },
            [] => Command::Help,
            [other, ..] => bail!("unknown or incomplete command `{other}`"),
        };
        if json && !matches!(command, Command::Scan { .. }) {
            bail!("--json only applies to scan");
        }

        Ok(Self { device, verbose, trace, command })
    }
}

pub fn parse_number(s: &str) -> Result<u32> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.with_context(|| format!("`{s}` is not a number"))
}

fn parse_address(s: &str) -> Result<SlaveAddress> {
    Ok(SlaveAddress::try_from(parse_number(s)?)?)
}

fn parse_u8(s: &str) -> Result<u8> {
    let value = parse_number(s)?;
    u8::try_from(value).map_err(|_| UsageError::ValueOutOfRange { value, bits: 8 }.into())
}

fn parse_u16(s: &str) -> Result<u16> {
    let value = parse_number(s)?;
    u16::try_from(value).map_err(|_| UsageError::ValueOutOfRange { value, bits: 16 }.into())
}

fn parse_block(s: &str) -> Result<Vec<u8>> {
    let data = hex::decode(s.strip_prefix("0x").unwrap_or(s))
        .with_context(|| format!("`{s}` is not a hex byte string"))?;
    if data.len() > I2C_SMBUS_BLOCK_MAX {
        return Err(UsageError::BlockTooLong(data.len()).into());
    }
    Ok(data)
}
