//! Payload codec for CEC commands.
//!
//! Decoding is driven by the opcode: each known opcode has its own payload
//! shape and validation rule.  Opcodes without a rule decode to
//! [`Command::Unknown`] and are never an error, since unknown commands are
//! routine on a shared bus.  A [`CodecError`] therefore always means "a known
//! command arrived malformed" (or, on encode, "this value cannot be put on
//! the wire").
//!
//! Payload layouts (all multi-byte integers big-endian):
//! ```text
//! FeatureAbort            [opcode:1][reason:1]
//! ReportPhysicalAddress   [address:2][device_type:1]
//! ReportAudioStatus       [mute:1 bit | volume:7 bits]
//! SetOSDName              [name:1..=14, printable ASCII]
//! SystemAudioModeRequest  [] or [address:2]
//! DeviceVendorID          [vendor_id:3]
//! ```

use thiserror::Error;

use crate::protocol::messages::{Command, Message, Packet};
use crate::protocol::types::{
    AbortReason, DeviceType, OpCode, PhysicalAddress, PowerStatus, UserControl,
};

/// Longest OSD name the protocol allows, in bytes.
pub const OSD_NAME_MAX_LEN: usize = 14;

/// Largest volume value; 0x65..=0x7E are reserved and 0x7F means unknown.
const VOLUME_MAX: u8 = 0x64;
const VOLUME_UNKNOWN_BITS: u8 = 0x7F;
const MUTE_BIT: u8 = 0x80;

/// Errors that can occur while encoding or decoding a command payload.
#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    /// The payload length does not match what the opcode requires.
    #[error("incorrect payload length: expected {expected}, actual {actual}")]
    IncorrectLength { expected: usize, actual: usize },

    /// The audio-status volume is outside 0–100 and not the "unknown" value.
    #[error("invalid volume: {value}")]
    InvalidVolume { value: i16 },

    /// OSD names must be 1 to 14 bytes in the printable ASCII range.
    #[error("invalid OSD name: must be 1 to 14 printable ASCII characters")]
    InvalidOsdName,

    /// Vendor ids are 24-bit values.
    #[error("invalid vendor id: 0x{value:X} does not fit in 24 bits")]
    InvalidVendorId { value: u32 },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes the payload of a command sent with `opcode`.
///
/// # Errors
///
/// Returns [`CodecError`] if `opcode` is known and `payload` is malformed for
/// it.  Unknown opcodes always succeed with [`Command::Unknown`].
///
/// # Examples
///
/// ```rust
/// use cec_core::protocol::{decode_command, Command, OpCode};
///
/// let cmd = decode_command(OpCode::DEVICE_VENDOR_ID, &[0x10, 0x10, 0x10]).unwrap();
/// assert_eq!(cmd, Command::DeviceVendorId(0x101010));
///
/// let unknown = decode_command(OpCode(0xFE), &[0x01]).unwrap();
/// assert_eq!(unknown, Command::Unknown { opcode: OpCode(0xFE), payload: vec![0x01] });
/// ```
pub fn decode_command(opcode: OpCode, payload: &[u8]) -> Result<Command, CodecError> {
    let cmd = match opcode {
        OpCode::FEATURE_ABORT => {
            let [abort, reason] = fixed::<2>(payload)?;
            Command::FeatureAbort {
                abort: OpCode(abort),
                reason: AbortReason(reason),
            }
        }
        OpCode::REPORT_PHYSICAL_ADDRESS => {
            let [hi, lo, device_type] = fixed::<3>(payload)?;
            Command::ReportPhysicalAddress {
                address: PhysicalAddress::from_bytes([hi, lo]),
                device_type: DeviceType::from(device_type),
            }
        }
        OpCode::REPORT_AUDIO_STATUS => {
            let [status] = fixed::<1>(payload)?;
            decode_audio_status(status)?
        }
        OpCode::REPORT_POWER_STATUS => {
            let [status] = fixed::<1>(payload)?;
            Command::ReportPowerStatus(PowerStatus(status))
        }
        OpCode::SET_OSD_NAME => {
            if !is_valid_osd_name(payload) {
                return Err(CodecError::InvalidOsdName);
            }
            // Printable ASCII is valid UTF-8, so this cannot lose data.
            Command::SetOsdName(String::from_utf8_lossy(payload).into_owned())
        }
        OpCode::SET_SYSTEM_AUDIO_MODE => {
            // Only 0 and 1 are defined; anything non-zero is read as "on".
            let [on] = fixed::<1>(payload)?;
            Command::SetSystemAudioMode(on != 0)
        }
        OpCode::SYSTEM_AUDIO_MODE_REQUEST => match payload {
            [] => Command::SystemAudioModeRequest(None),
            [hi, lo] => {
                Command::SystemAudioModeRequest(Some(PhysicalAddress::from_bytes([*hi, *lo])))
            }
            _ => {
                return Err(CodecError::IncorrectLength {
                    expected: 2,
                    actual: payload.len(),
                })
            }
        },
        OpCode::DEVICE_VENDOR_ID => {
            let [a, b, c] = fixed::<3>(payload)?;
            Command::DeviceVendorId(u32::from_be_bytes([0, a, b, c]))
        }
        OpCode::CEC_VERSION => {
            let [version] = fixed::<1>(payload)?;
            Command::CecVersion(version)
        }
        OpCode::USER_CONTROL_PRESSED => {
            let [key] = fixed::<1>(payload)?;
            Command::UserControlPressed(UserControl(key))
        }
        OpCode::USER_CONTROL_RELEASED => {
            let [key] = fixed::<1>(payload)?;
            Command::UserControlReleased(UserControl(key))
        }
        OpCode::GIVE_AUDIO_STATUS => Command::GiveAudioStatus,
        OpCode::GIVE_SYSTEM_AUDIO_MODE_STATUS => Command::GiveSystemAudioModeStatus,
        OpCode::GIVE_OSD_NAME => Command::GiveOsdName,
        OpCode::GIVE_DEVICE_POWER_STATUS => Command::GiveDevicePowerStatus,
        OpCode::GIVE_DEVICE_VENDOR_ID => Command::GiveDeviceVendorId,
        OpCode::GIVE_PHYSICAL_ADDRESS => Command::GivePhysicalAddress,
        OpCode::GET_CEC_VERSION => Command::GetCecVersion,
        OpCode::STANDBY => Command::Standby,
        OpCode::ACTIVE_SOURCE => Command::ActiveSource,
        OpCode::VENDOR_COMMAND_WITH_ID => Command::VendorCommandWithId,
        _ => Command::Unknown {
            opcode,
            payload: payload.to_vec(),
        },
    };
    Ok(cmd)
}

/// Encodes the payload of `cmd` (without address byte and opcode).
///
/// # Errors
///
/// Returns [`CodecError`] if a field cannot be represented on the wire: an
/// invalid OSD name, a volume above 100, or a vendor id wider than 24 bits.
///
/// # Examples
///
/// ```rust
/// use cec_core::protocol::{encode_command, Command};
///
/// let bytes = encode_command(&Command::ReportAudioStatus { volume: 32, muted: true }).unwrap();
/// assert_eq!(bytes, vec![0xA0]);
/// ```
pub fn encode_command(cmd: &Command) -> Result<Vec<u8>, CodecError> {
    let payload = match cmd {
        Command::FeatureAbort { abort, reason } => vec![abort.0, reason.0],
        Command::ReportPhysicalAddress {
            address,
            device_type,
        } => {
            let [hi, lo] = address.to_bytes();
            vec![hi, lo, u8::from(*device_type)]
        }
        Command::ReportAudioStatus { volume, muted } => {
            vec![encode_audio_status(*volume, *muted)?]
        }
        Command::ReportPowerStatus(status) => vec![status.0],
        Command::SetOsdName(name) => {
            if !is_valid_osd_name(name.as_bytes()) {
                return Err(CodecError::InvalidOsdName);
            }
            name.as_bytes().to_vec()
        }
        Command::SetSystemAudioMode(on) => vec![if *on { 0x01 } else { 0x00 }],
        Command::SystemAudioModeRequest(address) => match address {
            Some(address) => address.to_bytes().to_vec(),
            None => Vec::new(),
        },
        Command::DeviceVendorId(id) => {
            if !is_valid_vendor_id(*id) {
                return Err(CodecError::InvalidVendorId { value: *id });
            }
            id.to_be_bytes()[1..].to_vec()
        }
        Command::CecVersion(version) => vec![*version],
        Command::UserControlPressed(key) | Command::UserControlReleased(key) => vec![key.0],
        Command::GiveAudioStatus
        | Command::GiveSystemAudioModeStatus
        | Command::GiveOsdName
        | Command::GiveDevicePowerStatus
        | Command::GiveDeviceVendorId
        | Command::GivePhysicalAddress
        | Command::GetCecVersion
        | Command::Standby
        | Command::ActiveSource
        | Command::VendorCommandWithId => Vec::new(),
        Command::Unknown { payload, .. } => payload.clone(),
    };
    Ok(payload)
}

/// Decodes a whole packet into a [`Message`].
///
/// # Errors
///
/// See [`decode_command`].
pub fn decode_message(packet: &Packet) -> Result<Message, CodecError> {
    Message::from_packet(packet)
}

/// Encodes a [`Message`] into a packet ready for the device.
///
/// # Errors
///
/// See [`encode_command`].
pub fn encode_message(msg: &Message) -> Result<Packet, CodecError> {
    let payload = encode_command(&msg.command)?;
    Ok(Packet::new(msg.initiator, msg.follower, msg.opcode(), payload))
}

/// Returns `true` if `name` is 1 to 14 bytes, all in `0x20..=0x7E`.
///
/// Multi-byte UTF-8 sequences fail the check because their bytes are all
/// above 0x7E.
pub fn is_valid_osd_name(name: &[u8]) -> bool {
    (1..=OSD_NAME_MAX_LEN).contains(&name.len()) && name.iter().all(|b| (0x20..=0x7E).contains(b))
}

/// Returns `true` if `id` fits in 24 bits.
pub fn is_valid_vendor_id(id: u32) -> bool {
    id <= 0x00FF_FFFF
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Requires exactly `N` payload bytes and returns them as an array.
fn fixed<const N: usize>(payload: &[u8]) -> Result<[u8; N], CodecError> {
    payload.try_into().map_err(|_| CodecError::IncorrectLength {
        expected: N,
        actual: payload.len(),
    })
}

fn decode_audio_status(status: u8) -> Result<Command, CodecError> {
    let muted = status & MUTE_BIT != 0;
    let volume = match status & !MUTE_BIT {
        VOLUME_UNKNOWN_BITS => crate::protocol::messages::VOLUME_UNKNOWN,
        v if v > VOLUME_MAX => return Err(CodecError::InvalidVolume { value: i16::from(v) }),
        v => i16::from(v),
    };
    Ok(Command::ReportAudioStatus { volume, muted })
}

fn encode_audio_status(volume: i16, muted: bool) -> Result<u8, CodecError> {
    let bits = if volume < 0 {
        VOLUME_UNKNOWN_BITS
    } else if volume > i16::from(VOLUME_MAX) {
        return Err(CodecError::InvalidVolume { value: volume });
    } else {
        volume as u8
    };
    Ok(if muted { bits | MUTE_BIT } else { bits })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
