//! Line-oriented host transport.
//!
//! Stands in for a CEC adapter when the engine runs from a terminal or a
//! script.  Every input line holds one raw frame in hex; every transmitted
//! frame is written as one output line:
//!
//! ```text
//! in:   05:83            TV asks the AudioSystem for its physical address
//! in:   0583             same frame without separators
//! out:  << 5f:84:10:00:05
//! out:  >> 50:36
//! ```
//!
//! `<<` marks a reply and `>>` a plain send.  Blank lines and lines starting
//! with `#` are skipped.  End of input closes the inbound stream, which stops
//! the engine.

use std::io::{self, BufRead, BufReader, Write};
use std::sync::{mpsc, Arc, Mutex, PoisonError};

use cec_core::{DeviceType, LogicalAddress, OpCode, Packet, PhysicalAddress};
use tracing::{debug, error, info, warn};

use super::{Device, DeviceError, DeviceIdentity};

type Inbound = Arc<Mutex<Option<mpsc::Sender<Packet>>>>;

/// A [`Device`] that reads frames from a reader and writes them to a writer.
pub struct StdioDevice {
    identity: DeviceIdentity,
    input: Mutex<Option<Box<dyn BufRead + Send>>>,
    output: Mutex<Box<dyn Write + Send>>,
    inbound: Inbound,
}

impl StdioDevice {
    /// Creates a device bound to the process's stdin and stdout.
    pub fn new(identity: DeviceIdentity) -> Self {
        Self::with_io(identity, BufReader::new(io::stdin()), io::stdout())
    }

    /// Creates a device over arbitrary line input and output.
    pub fn with_io(
        identity: DeviceIdentity,
        input: impl BufRead + Send + 'static,
        output: impl Write + Send + 'static,
    ) -> Self {
        Self {
            identity,
            input: Mutex::new(Some(Box::new(input))),
            output: Mutex::new(Box::new(output)),
            inbound: Arc::new(Mutex::new(None)),
        }
    }

    /// Closes the inbound stream without waiting for end of input.
    ///
    /// The reader thread may stay blocked on its input; it exits on the next
    /// line or at process exit.
    pub fn close(&self) {
        *self.inbound.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn transmit(
        &self,
        marker: &str,
        follower: LogicalAddress,
        opcode: OpCode,
        payload: &[u8],
    ) -> Result<(), DeviceError> {
        let packet = Packet::new(self.identity.logical_address, follower, opcode, payload);
        let line = format!("{marker} {}", format_frame(&packet.to_frame()));
        let mut out = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{line}")?;
        out.flush()?;
        Ok(())
    }
}

impl Device for StdioDevice {
    fn receive(&self) -> Result<mpsc::Receiver<Packet>, DeviceError> {
        let input = self
            .input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(DeviceError::AlreadyReceiving)?;

        let (tx, rx) = mpsc::channel();
        *self.inbound.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);

        let inbound = Arc::clone(&self.inbound);
        std::thread::Builder::new()
            .name("cec-stdin".to_string())
            .spawn(move || input_loop(input, inbound))?;

        info!("reading frames from input, one per line");
        Ok(rx)
    }

    fn send(
        &self,
        follower: LogicalAddress,
        opcode: OpCode,
        payload: &[u8],
    ) -> Result<(), DeviceError> {
        self.transmit(">>", follower, opcode, payload)
    }

    fn reply(
        &self,
        follower: LogicalAddress,
        opcode: OpCode,
        payload: &[u8],
    ) -> Result<(), DeviceError> {
        self.transmit("<<", follower, opcode, payload)
    }

    fn vendor_id(&self) -> u32 {
        self.identity.vendor_id
    }

    fn device_type(&self) -> DeviceType {
        self.identity.device_type
    }

    fn physical_address(&self) -> PhysicalAddress {
        self.identity.physical_address
    }

    fn logical_address(&self) -> LogicalAddress {
        self.identity.logical_address
    }
}

/// The read loop executed on the input thread.
fn input_loop(input: Box<dyn BufRead + Send>, inbound: Inbound) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("input read error: {e}");
                break;
            }
        };

        let packet = match parse_frame_line(&line) {
            Ok(Some(packet)) => packet,
            Ok(None) => continue,
            Err(e) => {
                warn!("skipping input line: {e}");
                continue;
            }
        };

        debug!("input frame: {packet}");
        let guard = inbound.lock().unwrap_or_else(PoisonError::into_inner);
        let delivered = match guard.as_ref() {
            Some(tx) => tx.send(packet).is_ok(),
            None => false,
        };
        if !delivered {
            // Closed, or the engine dropped its receiver.
            return;
        }
    }

    *inbound.lock().unwrap_or_else(PoisonError::into_inner) = None;
    info!("end of input");
}

/// Parses one input line into a packet.
///
/// Returns `Ok(None)` for blank lines and `#` comments.  Bytes are two hex
/// digits each, optionally separated by `:` or whitespace.
///
/// # Errors
///
/// Returns [`DeviceError::InvalidHex`] for anything that is not whole hex
/// byte pairs, and [`DeviceError::Frame`] if the bytes do not form a valid
/// frame.
pub fn parse_frame_line(line: &str) -> Result<Option<Packet>, DeviceError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let digits: Vec<u8> = trimmed
        .bytes()
        .filter(|b| *b != b':' && !b.is_ascii_whitespace())
        .collect();
    let invalid = || DeviceError::InvalidHex {
        line: trimmed.to_string(),
    };
    if digits.len() % 2 != 0 || !digits.iter().all(u8::is_ascii_hexdigit) {
        return Err(invalid());
    }

    let frame = digits
        .chunks(2)
        .map(|pair| {
            // Pairs are ASCII hex digits, checked above.
            let hex = std::str::from_utf8(pair).map_err(|_| invalid())?;
            u8::from_str_radix(hex, 16).map_err(|_| invalid())
        })
        .collect::<Result<Vec<u8>, DeviceError>>()?;

    Ok(Some(Packet::from_frame(&frame)?))
}

/// Formats raw frame bytes as `aa:bb:cc`.
pub fn format_frame(frame: &[u8]) -> String {
    frame
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}
