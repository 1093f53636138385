//! Typed CEC commands, raw packets, and decoded messages.
//!
//! Wire format of one frame:
//! ```text
//! [initiator:4 | follower:4][opcode:1][payload:0..=14]
//! ```
//! A [`Packet`] is that frame split into fields.  A [`Message`] is a packet
//! whose payload has been decoded into a typed [`Command`] by the codec.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::codec::{decode_command, CodecError};
use crate::protocol::types::{
    AbortReason, DeviceType, LogicalAddress, OpCode, PhysicalAddress, PowerStatus, UserControl,
};

// ── Protocol constants ────────────────────────────────────────────────────────

/// CEC version byte reported in answer to GetCECVersion (CEC 1.3a).
pub const CEC_VERSION: u8 = 0x04;

/// Maximum number of payload bytes in one frame.
pub const MAX_PAYLOAD_LEN: usize = 14;

/// Volume value meaning "volume unknown" in [`Command::ReportAudioStatus`].
pub const VOLUME_UNKNOWN: i16 = -1;

// ── Commands ──────────────────────────────────────────────────────────────────

/// Every command the engine can decode, plus a pass-through for the rest.
///
/// Matching is exhaustive in both codec directions, so adding a variant is a
/// compile-checked change in [`crate::protocol::codec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Rejects a previously received message.
    FeatureAbort { abort: OpCode, reason: AbortReason },
    /// Reports the sender's physical address and device type, usually in
    /// answer to GivePhysicalAddress.
    ReportPhysicalAddress {
        address: PhysicalAddress,
        device_type: DeviceType,
    },
    /// Reports the audio status.  `volume` is 0–100, or negative if unknown.
    ReportAudioStatus { volume: i16, muted: bool },
    ReportPowerStatus(PowerStatus),
    /// Sets the name shown in OSD menus; 1 to 14 printable ASCII characters.
    SetOsdName(String),
    SetSystemAudioMode(bool),
    GiveAudioStatus,
    GiveSystemAudioModeStatus,
    GiveOsdName,
    GiveDevicePowerStatus,
    GiveDeviceVendorId,
    GivePhysicalAddress,
    GetCecVersion,
    /// Asks a device to start system audio control for the given source, or
    /// with no preferred source when `None`.
    SystemAudioModeRequest(Option<PhysicalAddress>),
    /// 24-bit vendor id.
    DeviceVendorId(u32),
    CecVersion(u8),
    UserControlPressed(UserControl),
    UserControlReleased(UserControl),
    Standby,
    /// The physical address operand is not decoded yet.
    ActiveSource,
    /// Vendor id and vendor data operands are not decoded yet.
    VendorCommandWithId,
    /// Any opcode the codec has no decode rule for, with its raw payload.
    Unknown { opcode: OpCode, payload: Vec<u8> },
}

impl Command {
    /// Returns the opcode this command is sent with.
    pub fn opcode(&self) -> OpCode {
        match self {
            Command::FeatureAbort { .. } => OpCode::FEATURE_ABORT,
            Command::ReportPhysicalAddress { .. } => OpCode::REPORT_PHYSICAL_ADDRESS,
            Command::ReportAudioStatus { .. } => OpCode::REPORT_AUDIO_STATUS,
            Command::ReportPowerStatus(_) => OpCode::REPORT_POWER_STATUS,
            Command::SetOsdName(_) => OpCode::SET_OSD_NAME,
            Command::SetSystemAudioMode(_) => OpCode::SET_SYSTEM_AUDIO_MODE,
            Command::GiveAudioStatus => OpCode::GIVE_AUDIO_STATUS,
            Command::GiveSystemAudioModeStatus => OpCode::GIVE_SYSTEM_AUDIO_MODE_STATUS,
            Command::GiveOsdName => OpCode::GIVE_OSD_NAME,
            Command::GiveDevicePowerStatus => OpCode::GIVE_DEVICE_POWER_STATUS,
            Command::GiveDeviceVendorId => OpCode::GIVE_DEVICE_VENDOR_ID,
            Command::GivePhysicalAddress => OpCode::GIVE_PHYSICAL_ADDRESS,
            Command::GetCecVersion => OpCode::GET_CEC_VERSION,
            Command::SystemAudioModeRequest(_) => OpCode::SYSTEM_AUDIO_MODE_REQUEST,
            Command::DeviceVendorId(_) => OpCode::DEVICE_VENDOR_ID,
            Command::CecVersion(_) => OpCode::CEC_VERSION,
            Command::UserControlPressed(_) => OpCode::USER_CONTROL_PRESSED,
            Command::UserControlReleased(_) => OpCode::USER_CONTROL_RELEASED,
            Command::Standby => OpCode::STANDBY,
            Command::ActiveSource => OpCode::ACTIVE_SOURCE,
            Command::VendorCommandWithId => OpCode::VENDOR_COMMAND_WITH_ID,
            Command::Unknown { opcode, .. } => *opcode,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::FeatureAbort { abort, reason } => {
                write!(f, "FeatureAbort {{ abort: {abort}, reason: {reason} }}")
            }
            Command::ReportPhysicalAddress {
                address,
                device_type,
            } => write!(f, "ReportPhysicalAddress {{ {address}, {device_type} }}"),
            Command::ReportAudioStatus { volume, muted } if *volume < 0 => {
                write!(f, "ReportAudioStatus {{ volume: unknown, muted: {muted} }}")
            }
            Command::ReportAudioStatus { volume, muted } => {
                write!(f, "ReportAudioStatus {{ volume: {volume}, muted: {muted} }}")
            }
            Command::ReportPowerStatus(status) => write!(f, "ReportPowerStatus {{ {status} }}"),
            Command::SetOsdName(name) => write!(f, "SetOSDName {{ {name:?} }}"),
            Command::SetSystemAudioMode(on) => write!(f, "SetSystemAudioMode {{ on: {on} }}"),
            Command::SystemAudioModeRequest(Some(address)) => {
                write!(f, "SystemAudioModeRequest {{ {address} }}")
            }
            Command::DeviceVendorId(id) => write!(f, "DeviceVendorID {{ 0x{id:06X} }}"),
            Command::CecVersion(version) => write!(f, "CECVersion {{ 0x{version:02X} }}"),
            Command::UserControlPressed(key) => write!(f, "UserControlPressed {{ {key} }}"),
            Command::UserControlReleased(key) => write!(f, "UserControlReleased {{ {key} }}"),
            Command::Unknown { opcode, payload } => {
                write!(f, "Unknown {{ {opcode}, {} }}", hex(payload))
            }
            // Operand-less commands print as their opcode name.
            other => write!(f, "{}", other.opcode()),
        }
    }
}

// ── Packets ───────────────────────────────────────────────────────────────────

/// Errors produced when splitting a raw frame into a [`Packet`].
#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    /// The frame contained no bytes at all.
    #[error("empty frame")]
    Empty,

    /// The frame only carries the address byte (a bus poll), no opcode.
    #[error("frame has no opcode (address byte only)")]
    MissingOpcode,

    /// More payload bytes than a single frame can carry.
    #[error("payload too long: {len} bytes, maximum is {}", MAX_PAYLOAD_LEN)]
    PayloadTooLong { len: usize },
}

/// The wire-level unit exchanged with the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// The sender.
    pub initiator: LogicalAddress,
    /// The receiver, or Broadcast.
    pub follower: LogicalAddress,
    pub opcode: OpCode,
    /// Raw payload bytes, 0 to 14.
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn new(
        initiator: LogicalAddress,
        follower: LogicalAddress,
        opcode: OpCode,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            initiator,
            follower,
            opcode,
            payload: payload.into(),
        }
    }

    /// Splits a raw frame (address byte, opcode, payload) into a packet.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] for empty frames, address-only frames, and
    /// payloads longer than [`MAX_PAYLOAD_LEN`].
    pub fn from_frame(frame: &[u8]) -> Result<Self, FrameError> {
        let (&header, rest) = frame.split_first().ok_or(FrameError::Empty)?;
        let (&opcode, payload) = rest.split_first().ok_or(FrameError::MissingOpcode)?;
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(FrameError::PayloadTooLong { len: payload.len() });
        }
        Ok(Self {
            initiator: LogicalAddress::from_nibble(header >> 4),
            follower: LogicalAddress::from_nibble(header),
            opcode: OpCode(opcode),
            payload: payload.to_vec(),
        })
    }

    /// Joins the packet back into a raw frame.
    pub fn to_frame(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(2 + self.payload.len());
        frame.push((self.initiator.value() << 4) | self.follower.value());
        frame.push(self.opcode.0);
        frame.extend_from_slice(&self.payload);
        frame
    }

    /// `true` if the packet was addressed to a single follower by a
    /// registered initiator, i.e. it can meaningfully be answered.
    pub fn is_answerable(&self) -> bool {
        !self.follower.is_broadcast() && !self.initiator.is_unregistered()
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}: {} {}",
            self.initiator.initiator_name(),
            self.follower.follower_name(),
            self.opcode,
            hex(&self.payload)
        )
    }
}

// ── Messages ──────────────────────────────────────────────────────────────────

/// A decoded packet.
///
/// A broadcast message must carry a broadcast-legal opcode; this is checked
/// by the dispatch runtime against [`crate::protocol::rules`], not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub initiator: LogicalAddress,
    pub follower: LogicalAddress,
    pub command: Command,
}

impl Message {
    pub fn new(initiator: LogicalAddress, follower: LogicalAddress, command: Command) -> Self {
        Self {
            initiator,
            follower,
            command,
        }
    }

    /// Decodes a packet's payload into a typed message.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the payload is malformed for a known opcode.
    pub fn from_packet(packet: &Packet) -> Result<Self, CodecError> {
        let command = decode_command(packet.opcode, &packet.payload)?;
        Ok(Self::new(packet.initiator, packet.follower, command))
    }

    /// Wraps a packet that failed to decode so it can still be reported to
    /// diagnostics, keeping the raw opcode and payload.
    pub fn undecoded(packet: &Packet) -> Self {
        Self::new(
            packet.initiator,
            packet.follower,
            Command::Unknown {
                opcode: packet.opcode,
                payload: packet.payload.clone(),
            },
        )
    }

    pub fn opcode(&self) -> OpCode {
        self.command.opcode()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {}: {}",
            self.initiator.initiator_name(),
            self.follower.follower_name(),
            self.command
        )
    }
}

fn hex(bytes: &[u8]) -> String {
    let parts: Vec<String> = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("[{}]", parts.join(":"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_frame_splits_address_byte() {
        // Arrange
        let frame = [0x05, 0x83];

        // Act
        let packet = Packet::from_frame(&frame).expect("valid frame");

        // Assert
        assert_eq!(packet.initiator, LogicalAddress::TV);
        assert_eq!(packet.follower, LogicalAddress::AUDIO_SYSTEM);
        assert_eq!(packet.opcode, OpCode::GIVE_PHYSICAL_ADDRESS);
        assert!(packet.payload.is_empty());
    }

    #[test]
    fn test_to_frame_joins_fields() {
        let packet = Packet::new(
            LogicalAddress::AUDIO_SYSTEM,
            LogicalAddress::BROADCAST,
            OpCode::REPORT_PHYSICAL_ADDRESS,
            vec![0xAB, 0xCD, 0x05],
        );
        assert_eq!(packet.to_frame(), vec![0x5F, 0x84, 0xAB, 0xCD, 0x05]);
    }

    #[test]
    fn test_from_frame_rejects_empty_and_poll_frames() {
        assert_eq!(Packet::from_frame(&[]), Err(FrameError::Empty));
        assert_eq!(Packet::from_frame(&[0x05]), Err(FrameError::MissingOpcode));
    }

    #[test]
    fn test_from_frame_rejects_oversized_payload() {
        let mut frame = vec![0x05, 0x47];
        frame.extend(std::iter::repeat(b'a').take(MAX_PAYLOAD_LEN + 1));
        assert_eq!(
            Packet::from_frame(&frame),
            Err(FrameError::PayloadTooLong { len: 15 })
        );
    }

    #[test]
    fn test_is_answerable_excludes_broadcast_and_unregistered() {
        let direct = Packet::new(
            LogicalAddress::TV,
            LogicalAddress::AUDIO_SYSTEM,
            OpCode::STANDBY,
            vec![],
        );
        let broadcast = Packet::new(
            LogicalAddress::TV,
            LogicalAddress::BROADCAST,
            OpCode::STANDBY,
            vec![],
        );
        let unregistered = Packet::new(
            LogicalAddress::UNREGISTERED,
            LogicalAddress::AUDIO_SYSTEM,
            OpCode::STANDBY,
            vec![],
        );

        assert!(direct.is_answerable());
        assert!(!broadcast.is_answerable());
        assert!(!unregistered.is_answerable());
    }

    #[test]
    fn test_message_display_resolves_address_fifteen_by_role() {
        let msg = Message::new(
            LogicalAddress::UNREGISTERED,
            LogicalAddress::BROADCAST,
            Command::Standby,
        );
        assert_eq!(msg.to_string(), "Unregistered → Broadcast: Standby");
    }

    #[test]
    fn test_undecoded_keeps_raw_bytes() {
        let packet = Packet::new(
            LogicalAddress::TV,
            LogicalAddress::AUDIO_SYSTEM,
            OpCode::SET_OSD_NAME,
            vec![0x01],
        );
        let msg = Message::undecoded(&packet);
        assert_eq!(
            msg.command,
            Command::Unknown {
                opcode: OpCode::SET_OSD_NAME,
                payload: vec![0x01]
            }
        );
    }
}
