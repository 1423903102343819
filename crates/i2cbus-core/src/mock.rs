//! Mock transport for testing

use std::collections::HashSet;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::address::SlaveAddress;
use crate::transport::Transport;

/// One primitive as seen by the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    ForceAddress(u8),
    WriteQuick { addr: u8 },
    ReadByte { addr: u8 },
    WriteByte { addr: u8, value: u8 },
    WriteWord { addr: u8, command: u8, word: u16 },
    WriteBlock { addr: u8, command: u8, data: Vec<u8> },
}

/// Primitives that can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    ForceAddress,
    WriteQuick,
    ReadByte,
    WriteByte,
    WriteWord,
    WriteBlock,
}

#[derive(Debug, Default)]
struct State {
    bound: u8,
    present: HashSet<u8>,
    failing: HashSet<Primitive>,
    refuse_bind: HashSet<u8>,
    read_value: u8,
    calls: Vec<MockCall>,
    dropped: bool,
}

/// Records every call and acknowledges only the configured addresses.
///
/// Clones share state, so a test can keep one handle after giving the other
/// to a session.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices(addrs: &[u8]) -> Self {
        let mock = Self::new();
        mock.state.lock().present.extend(addrs.iter().copied());
        mock
    }

    pub fn set_read_value(&self, value: u8) {
        self.state.lock().read_value = value;
    }

    pub fn fail(&self, primitive: Primitive) {
        self.state.lock().failing.insert(primitive);
    }

    /// Make only the bind to `addr` fail.
    pub fn fail_bind_at(&self, addr: u8) {
        self.state.lock().refuse_bind.insert(addr);
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn bound(&self) -> u8 {
        self.state.lock().bound
    }

    /// True once a handle has been dropped.
    pub fn released(&self) -> bool {
        self.state.lock().dropped
    }

    /// A handle whose drop marks the transport as released.
    pub fn handle(&self) -> MockHandle {
        MockHandle(self.clone())
    }

    fn transact(&self, primitive: Primitive, call: impl FnOnce(u8) -> MockCall) -> io::Result<u8> {
        let mut state = self.state.lock();
        let addr = state.bound;
        state.calls.push(call(addr));
        if state.failing.contains(&primitive) {
            return Err(io::Error::new(io::ErrorKind::Other, "bus error"));
        }
        if !state.present.contains(&addr) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no acknowledge"));
        }
        Ok(state.read_value)
    }
}

/// Owned end of a [`MockTransport`] handed to a session.
#[derive(Debug)]
pub struct MockHandle(MockTransport);

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.0.state.lock().dropped = true;
    }
}

impl Transport for MockHandle {
    fn force_address(&mut self, addr: SlaveAddress) -> io::Result<()> {
        let mut state = self.0.state.lock();
        state.calls.push(MockCall::ForceAddress(addr.get()));
        if state.failing.contains(&Primitive::ForceAddress) || state.refuse_bind.contains(&addr.get()) {
            return Err(io::Error::new(io::ErrorKind::Other, "address busy"));
        }
        state.bound = addr.get();
        Ok(())
    }

    fn write_quick(&mut self) -> io::Result<()> {
        self.0.transact(Primitive::WriteQuick, |addr| MockCall::WriteQuick { addr }).map(drop)
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        self.0.transact(Primitive::ReadByte, |addr| MockCall::ReadByte { addr })
    }

    fn write_byte(&mut self, value: u8) -> io::Result<()> {
        self.0
            .transact(Primitive::WriteByte, |addr| MockCall::WriteByte { addr, value })
            .map(drop)
    }

    fn write_word_data(&mut self, command: u8, word: u16) -> io::Result<()> {
        self.0
            .transact(Primitive::WriteWord, |addr| MockCall::WriteWord { addr, command, word })
            .map(drop)
    }

    fn write_i2c_block_data(&mut self, command: u8, data: &[u8]) -> io::Result<()> {
        self.0
            .transact(Primitive::WriteBlock, |addr| MockCall::WriteBlock {
                addr,
                command,
                data: data.to_vec(),
            })
            .map(drop)
    }
}
