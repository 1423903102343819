use std::path::PathBuf;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::debug;

use crate::error::BusError;
use crate::journal::SharedJournal;
use crate::scan::ScanResult;
use crate::session::BusSession;
use crate::transport::{I2cDev, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Open,
    SelectAddress,
    Scan,
    ReadByte,
    WriteByte,
    WriteWord,
    WriteBlock,
}

#[derive(Debug, Clone)]
pub enum BusEvent {
    Opened(PathBuf),
    AddressSelected(u8),
    Scanned(ScanResult),
    ByteRead(u8),
    /// A write completed; data bytes written.
    Written(Operation, usize),
    Error { op: Operation, message: String, usage: bool },
    Closed,
}

impl BusEvent {
    fn from_error(op: Operation, err: BusError) -> Self {
        BusEvent::Error {
            op,
            usage: err.is_usage(),
            message: err.to_string(),
        }
    }
}

enum Command {
    SelectAddress(u8),
    Scan,
    ReadByte,
    WriteByte(u8),
    WriteWord(u8, u16),
    WriteBlock(u8, Vec<u8>),
    Close,
}

/// A bus session driven from its own thread.
///
/// Commands run strictly one after another, so a scan can never interleave
/// with another caller's address selection.
pub struct BusService {
    tx_cmd: Sender<Command>,
    rx_evt: Receiver<BusEvent>,
    journal: SharedJournal,
}

impl BusService {
    /// Open `path` on the worker thread. Failure to open is reported as an
    /// `Error` event followed by `Closed`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let session = BusSession::<I2cDev>::new();
        let journal = session.journal();
        let (tx_cmd, rx_cmd) = unbounded::<Command>();
        let (tx_evt, rx_evt) = unbounded::<BusEvent>();

        std::thread::spawn(move || {
            let mut session = session;
            match session.open(&path) {
                Ok(()) => {
                    let _ = tx_evt.send(BusEvent::Opened(path));
                    run(session, rx_cmd, tx_evt);
                }
                Err(e) => {
                    let _ = tx_evt.send(BusEvent::from_error(Operation::Open, e));
                    let _ = tx_evt.send(BusEvent::Closed);
                }
            }
        });

        Self { tx_cmd, rx_evt, journal }
    }

    /// Drive an already-open session.
    pub fn spawn<T: Transport + Send + 'static>(session: BusSession<T>) -> Self {
        let journal = session.journal();
        let (tx_cmd, rx_cmd) = unbounded::<Command>();
        let (tx_evt, rx_evt) = unbounded::<BusEvent>();

        std::thread::spawn(move || run(session, rx_cmd, tx_evt));

        Self { tx_cmd, rx_evt, journal }
    }

    pub fn select_address(&self, addr: u8) -> Result<(), String> {
        self.send(Command::SelectAddress(addr))
    }

    pub fn scan(&self) -> Result<(), String> {
        self.send(Command::Scan)
    }

    pub fn read_byte(&self) -> Result<(), String> {
        self.send(Command::ReadByte)
    }

    pub fn write_byte(&self, value: u8) -> Result<(), String> {
        self.send(Command::WriteByte(value))
    }

    pub fn write_word(&self, command: u8, word: u16) -> Result<(), String> {
        self.send(Command::WriteWord(command, word))
    }

    pub fn write_block(&self, command: u8, data: Vec<u8>) -> Result<(), String> {
        self.send(Command::WriteBlock(command, data))
    }

    pub fn close(&self) {
        let _ = self.tx_cmd.send(Command::Close);
    }

    pub fn events(&self) -> &Receiver<BusEvent> {
        &self.rx_evt
    }

    pub fn journal(&self) -> SharedJournal {
        self.journal.clone()
    }

    fn send(&self, cmd: Command) -> Result<(), String> {
        self.tx_cmd.send(cmd).map_err(|e| e.to_string())
    }
}

impl Drop for BusService {
    fn drop(&mut self) {
        self.close();
    }
}

fn run<T: Transport>(mut session: BusSession<T>, rx_cmd: Receiver<Command>, tx_evt: Sender<BusEvent>) {
    // a dropped service disconnects the queue, which ends the loop like Close
    while let Ok(cmd) = rx_cmd.recv() {
        let event = match cmd {
            Command::SelectAddress(addr) => match session.select_address(addr) {
                Ok(()) => BusEvent::AddressSelected(addr),
                Err(e) => BusEvent::from_error(Operation::SelectAddress, e),
            },
            Command::Scan => match session.scan() {
                Ok(result) => BusEvent::Scanned(result),
                Err(e) => BusEvent::from_error(Operation::Scan, e),
            },
            Command::ReadByte => match session.read_byte() {
                Ok(value) => BusEvent::ByteRead(value),
                Err(e) => BusEvent::from_error(Operation::ReadByte, e),
            },
            Command::WriteByte(value) => match session.write_byte(value) {
                Ok(()) => BusEvent::Written(Operation::WriteByte, 1),
                Err(e) => BusEvent::from_error(Operation::WriteByte, e),
            },
            Command::WriteWord(command, word) => match session.write_word(command, word) {
                Ok(()) => BusEvent::Written(Operation::WriteWord, 2),
                Err(e) => BusEvent::from_error(Operation::WriteWord, e),
            },
            Command::WriteBlock(command, data) => match session.write_block(command, &data) {
                Ok(()) => BusEvent::Written(Operation::WriteBlock, data.len()),
                Err(e) => BusEvent::from_error(Operation::WriteBlock, e),
            },
            Command::Close => break,
        };
        if tx_evt.send(event).is_err() {
            break;
        }
    }
    drop(rx_cmd);
    session.close();
    debug!("bus worker exiting");
    let _ = tx_evt.send(BusEvent::Closed);
}
