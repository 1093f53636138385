//! Device infrastructure: the boundary between the engine and a CEC adapter.
//!
//! A [`Device`] owns the bus.  It delivers inbound packets through a channel
//! and transmits outbound ones.  Adapters also report the identity the
//! engine needs to answer the standard queries (physical address, vendor id,
//! device type, logical address).
//!
//! # Testability
//!
//! The `Device` trait lets the dispatch runtime run against
//! [`fake::FakeDevice`] in tests and [`stdio::StdioDevice`] from the command
//! line, without any hardware.

use std::sync::mpsc;

use cec_core::protocol::FrameError;
use cec_core::{DeviceType, LogicalAddress, OpCode, Packet, PhysicalAddress};
use thiserror::Error;

pub mod fake;
pub mod stdio;

/// Error type for device operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// `receive` may only be called once per device.
    #[error("device is already receiving")]
    AlreadyReceiving,

    /// Reading from or writing to the underlying transport failed.
    #[error("device I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A textual frame contained something other than hex byte pairs.
    #[error("invalid hex frame: {line:?}")]
    InvalidHex { line: String },

    /// The frame bytes could not be split into a packet.
    #[error("invalid frame: {0}")]
    Frame(#[from] FrameError),
}

/// The identity a device presents on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub logical_address: LogicalAddress,
    pub device_type: DeviceType,
    pub physical_address: PhysicalAddress,
    /// 24-bit IEEE OUI.
    pub vendor_id: u32,
}

/// Trait abstracting a CEC adapter.
///
/// Implementations must be shareable between the dispatch thread and any
/// thread that sends on the engine's behalf.
pub trait Device: Send + Sync {
    /// Returns the inbound packet stream.  The stream ends when the channel
    /// disconnects.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::AlreadyReceiving`] on every call after the first.
    fn receive(&self) -> Result<mpsc::Receiver<Packet>, DeviceError>;

    /// Transmits a packet from this device to `follower`.
    fn send(
        &self,
        follower: LogicalAddress,
        opcode: OpCode,
        payload: &[u8],
    ) -> Result<(), DeviceError>;

    /// Transmits a packet as an answer to a received message.
    fn reply(
        &self,
        follower: LogicalAddress,
        opcode: OpCode,
        payload: &[u8],
    ) -> Result<(), DeviceError>;

    fn vendor_id(&self) -> u32;

    fn device_type(&self) -> DeviceType;

    fn physical_address(&self) -> PhysicalAddress;

    fn logical_address(&self) -> LogicalAddress;
}
