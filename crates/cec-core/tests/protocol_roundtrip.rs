//! Integration tests for the cec-core protocol codec.
//!
//! These tests drive complete frames through the public API: raw bytes are
//! split into packets, decoded into messages, encoded back, and joined into
//! frames again.

use cec_core::{
    decode_message, encode_message,
    protocol::{
        codec::CodecError,
        messages::{FrameError, VOLUME_UNKNOWN},
        opcode_flags,
    },
    AbortReason, Command, DeviceType, LogicalAddress, Message, OpCode, Packet, PhysicalAddress,
    PowerStatus, UserControl,
};

/// Encodes a message into a frame, parses the frame back, and decodes it.
fn roundtrip(msg: Message) -> Message {
    let packet = encode_message(&msg).expect("encode must succeed");
    let frame = packet.to_frame();
    let parsed = Packet::from_frame(&frame).expect("frame must parse");
    assert_eq!(parsed, packet, "frame must preserve every packet field");
    decode_message(&parsed).expect("decode must succeed")
}

fn direct(command: Command) -> Message {
    Message::new(LogicalAddress::TV, LogicalAddress::PLAYBACK_1, command)
}

#[test]
fn test_roundtrip_every_command_variant() {
    let commands = vec![
        Command::FeatureAbort {
            abort: OpCode::GIVE_OSD_NAME,
            reason: AbortReason::REFUSED,
        },
        Command::ReportPhysicalAddress {
            address: PhysicalAddress(0x1000),
            device_type: DeviceType::Playback,
        },
        Command::ReportAudioStatus { volume: 55, muted: false },
        Command::ReportAudioStatus { volume: VOLUME_UNKNOWN, muted: true },
        Command::ReportPowerStatus(PowerStatus::STANDBY),
        Command::SetOsdName("Living Room".to_string()),
        Command::SetSystemAudioMode(true),
        Command::GiveAudioStatus,
        Command::GiveSystemAudioModeStatus,
        Command::GiveOsdName,
        Command::GiveDevicePowerStatus,
        Command::GiveDeviceVendorId,
        Command::GivePhysicalAddress,
        Command::GetCecVersion,
        Command::SystemAudioModeRequest(None),
        Command::SystemAudioModeRequest(Some(PhysicalAddress(0x2100))),
        Command::DeviceVendorId(0x00_E0_91),
        Command::CecVersion(0x05),
        Command::UserControlPressed(UserControl::VOLUME_UP),
        Command::UserControlReleased(UserControl::VOLUME_UP),
        Command::Standby,
        Command::ActiveSource,
        Command::VendorCommandWithId,
        Command::Unknown {
            opcode: OpCode::SET_STREAM_PATH,
            payload: vec![0x10, 0x00],
        },
    ];

    for cmd in commands {
        let original = direct(cmd);
        assert_eq!(roundtrip(original.clone()), original);
    }
}

#[test]
fn test_roundtrip_every_valid_volume() {
    for volume in 0..=100i16 {
        for muted in [false, true] {
            let original = direct(Command::ReportAudioStatus { volume, muted });
            assert_eq!(roundtrip(original.clone()), original);
        }
    }
}

#[test]
fn test_broadcast_frame_splits_into_unregistered_and_broadcast() {
    // Arrange: initiator 15, follower 15, Standby.
    let frame = [0xFF, 0x36];

    // Act
    let packet = Packet::from_frame(&frame).unwrap();
    let msg = decode_message(&packet).unwrap();

    // Assert
    assert!(packet.initiator.is_unregistered());
    assert!(packet.follower.is_broadcast());
    assert!(!packet.is_answerable());
    assert_eq!(msg.command, Command::Standby);
    assert_eq!(msg.to_string(), "Unregistered → Broadcast: Standby");
}

#[test]
fn test_undefined_device_type_survives_reencoding() {
    // Arrange: Playback1 reports 1.0.0.0 with device type byte 0x08.
    let frame = [0x4F, 0x84, 0x10, 0x00, 0x08];

    // Act
    let msg = decode_message(&Packet::from_frame(&frame).unwrap()).unwrap();
    let reencoded = encode_message(&msg).unwrap().to_frame();

    // Assert
    assert_eq!(
        msg.command,
        Command::ReportPhysicalAddress {
            address: PhysicalAddress(0x1000),
            device_type: DeviceType::Other(0x08),
        }
    );
    assert_eq!(reencoded, frame);
}

#[test]
fn test_frame_errors_are_reported() {
    assert_eq!(Packet::from_frame(&[]), Err(FrameError::Empty));
    assert_eq!(Packet::from_frame(&[0x40]), Err(FrameError::MissingOpcode));

    let mut too_long = vec![0x40, 0x47];
    too_long.extend_from_slice(&[b'a'; 15]);
    assert_eq!(
        Packet::from_frame(&too_long),
        Err(FrameError::PayloadTooLong { len: 15 })
    );
}

#[test]
fn test_malformed_known_command_fails_to_decode() {
    let packet = Packet::new(
        LogicalAddress::TV,
        LogicalAddress::PLAYBACK_1,
        OpCode::REPORT_PHYSICAL_ADDRESS,
        vec![0x10, 0x00],
    );

    assert_eq!(
        decode_message(&packet),
        Err(CodecError::IncorrectLength { expected: 3, actual: 2 })
    );

    // The diagnostics fallback keeps the raw bytes.
    let undecoded = Message::undecoded(&packet);
    assert_eq!(
        undecoded.command,
        Command::Unknown {
            opcode: OpCode::REPORT_PHYSICAL_ADDRESS,
            payload: vec![0x10, 0x00],
        }
    );
}

#[test]
fn test_invalid_values_fail_to_encode() {
    let bad_name = direct(Command::SetOsdName("much-too-long-name".to_string()));
    assert_eq!(encode_message(&bad_name), Err(CodecError::InvalidOsdName));

    let bad_volume = direct(Command::ReportAudioStatus { volume: 120, muted: false });
    assert_eq!(encode_message(&bad_volume), Err(CodecError::InvalidVolume { value: 120 }));
}

#[test]
fn test_decoded_unknown_opcode_has_no_addressing_rule() {
    let packet = Packet::from_frame(&[0x04, 0xFE, 0x01, 0x02]).unwrap();
    let msg = decode_message(&packet).unwrap();

    assert_eq!(msg.opcode(), OpCode(0xFE));
    assert!(opcode_flags(msg.opcode()).is_none());
}
