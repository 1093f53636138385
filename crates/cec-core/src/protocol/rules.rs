//! Addressing rules for every opcode the engine recognizes.
//!
//! The CEC specification restricts how each message may be addressed: some
//! may only be sent directly to one follower, some only broadcast, a few
//! either way.  It also lists the handful of messages a device without a
//! logical address (initiator 15, *Unregistered*) is allowed to originate.
//!
//! The table below is the single source of that knowledge.  It is consulted
//! by the dispatch runtime's validation step and never by the codec: the
//! codec decides whether a payload is well-formed, this table decides whether
//! the message is legal in the way it was addressed.

use std::ops::BitOr;

use crate::protocol::types::OpCode;

/// Bit set describing the addressing modes in which an opcode is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpCodeFlags(pub u8);

impl OpCodeFlags {
    /// Legal as a directly addressed message.
    pub const DIRECT: OpCodeFlags = OpCodeFlags(1 << 0);
    /// Legal as a broadcast.
    pub const BROADCAST: OpCodeFlags = OpCodeFlags(1 << 1);
    /// An Unregistered device may send it, because the answer is a broadcast.
    pub const BROADCAST_RESPONSE: OpCodeFlags = OpCodeFlags(1 << 2);
    /// Switch/routing message, legal from an Unregistered device.
    pub const SWITCH_MESSAGE: OpCodeFlags = OpCodeFlags(1 << 3);

    /// Returns `true` if every bit of `other` is set in `self`.
    pub fn contains(self, other: OpCodeFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if any bit of `other` is set in `self`.
    pub fn intersects(self, other: OpCodeFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn allows_direct(self) -> bool {
        self.contains(Self::DIRECT)
    }

    pub fn allows_broadcast(self) -> bool {
        self.contains(Self::BROADCAST)
    }

    /// Returns `true` if an Unregistered initiator may send this opcode.
    ///
    /// Standby is handled separately by the caller; it is not a flag.
    pub fn allows_unregistered(self) -> bool {
        self.intersects(Self::BROADCAST_RESPONSE | Self::SWITCH_MESSAGE)
    }
}

impl BitOr for OpCodeFlags {
    type Output = OpCodeFlags;

    fn bitor(self, rhs: OpCodeFlags) -> OpCodeFlags {
        OpCodeFlags(self.0 | rhs.0)
    }
}

/// Looks up the addressing flags of `op`.
///
/// Returns `None` if the opcode is not recognized by the engine, regardless
/// of its payload.
pub fn opcode_flags(op: OpCode) -> Option<OpCodeFlags> {
    const D: OpCodeFlags = OpCodeFlags::DIRECT;
    const B: OpCodeFlags = OpCodeFlags::BROADCAST;
    const BR: OpCodeFlags = OpCodeFlags::BROADCAST_RESPONSE;
    const SW: OpCodeFlags = OpCodeFlags::SWITCH_MESSAGE;

    let flags = match op {
        OpCode::FEATURE_ABORT => D,
        OpCode::IMAGE_VIEW_ON => D,
        OpCode::TUNER_STEP_INCREMENT => D,
        OpCode::TUNER_STEP_DECREMENT => D,
        OpCode::TUNER_DEVICE_STATUS => D,
        OpCode::GIVE_TUNER_DEVICE_STATUS => D,
        OpCode::RECORD_ON => D,
        OpCode::RECORD_STATUS => D,
        OpCode::RECORD_OFF => D,
        OpCode::TEXT_VIEW_ON => D,
        OpCode::RECORD_TV_SCREEN => D,
        OpCode::GIVE_DECK_STATUS => D,
        OpCode::DECK_STATUS => D,
        OpCode::SET_MENU_LANGUAGE => B,
        OpCode::CLEAR_ANALOG_TIMER => D,
        OpCode::SET_ANALOG_TIMER => D,
        OpCode::TIMER_STATUS => D,
        OpCode::STANDBY => B | D,
        OpCode::PLAY => D,
        OpCode::DECK_CONTROL => D,
        OpCode::TIMER_CLEARED_STATUS => D,
        OpCode::USER_CONTROL_PRESSED => D,
        OpCode::USER_CONTROL_RELEASED => D,
        OpCode::GIVE_OSD_NAME => D,
        OpCode::SET_OSD_NAME => D,
        OpCode::SET_OSD_STRING => D,
        OpCode::SET_TIMER_PROGRAM_TITLE => D,
        OpCode::SYSTEM_AUDIO_MODE_REQUEST => D,
        OpCode::GIVE_AUDIO_STATUS => D,
        OpCode::SET_SYSTEM_AUDIO_MODE => B | D,
        OpCode::REPORT_AUDIO_STATUS => D,
        OpCode::GIVE_SYSTEM_AUDIO_MODE_STATUS => D,
        OpCode::SYSTEM_AUDIO_MODE_STATUS => D,
        OpCode::ROUTING_CHANGE => B | SW,
        OpCode::ROUTING_INFORMATION => B | SW,
        OpCode::ACTIVE_SOURCE => B,
        OpCode::GIVE_PHYSICAL_ADDRESS => D | BR,
        OpCode::REPORT_PHYSICAL_ADDRESS => B,
        OpCode::REQUEST_ACTIVE_SOURCE => B,
        OpCode::SET_STREAM_PATH => B,
        OpCode::DEVICE_VENDOR_ID => B,
        OpCode::VENDOR_COMMAND => D,
        OpCode::VENDOR_REMOTE_BUTTON_DOWN => B | D,
        OpCode::VENDOR_REMOTE_BUTTON_UP => B | D,
        OpCode::GIVE_DEVICE_VENDOR_ID => D | BR,
        OpCode::MENU_REQUEST => D,
        OpCode::MENU_STATUS => D,
        OpCode::GIVE_DEVICE_POWER_STATUS => D,
        OpCode::REPORT_POWER_STATUS => D,
        OpCode::GET_MENU_LANGUAGE => D | BR,
        OpCode::SELECT_ANALOG_SERVICE => D,
        OpCode::SELECT_DIGITAL_SERVICE => D,
        OpCode::SET_DIGITAL_TIMER => D,
        OpCode::CLEAR_DIGITAL_TIMER => D,
        OpCode::SET_AUDIO_RATE => D,
        OpCode::INACTIVE_SOURCE => D,
        OpCode::CEC_VERSION => D,
        OpCode::GET_CEC_VERSION => D,
        OpCode::VENDOR_COMMAND_WITH_ID => B | D,
        OpCode::CLEAR_EXTERNAL_TIMER => D,
        OpCode::SET_EXTERNAL_TIMER => D,
        OpCode::ABORT => D,
        _ => return None,
    };
    Some(flags)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_opcode_has_no_flags() {
        assert_eq!(opcode_flags(OpCode(0xFE)), None);
        assert_eq!(opcode_flags(OpCode(0x01)), None);
    }

    #[test]
    fn test_every_named_opcode_has_flags() {
        for raw in 0u8..=0xFF {
            let op = OpCode(raw);
            assert_eq!(
                op.name().is_some(),
                opcode_flags(op).is_some(),
                "name table and rule table disagree on {op}"
            );
        }
    }

    #[test]
    fn test_active_source_is_broadcast_only() {
        let flags = opcode_flags(OpCode::ACTIVE_SOURCE).unwrap();
        assert!(flags.allows_broadcast());
        assert!(!flags.allows_direct());
        assert!(!flags.allows_unregistered());
    }

    #[test]
    fn test_give_physical_address_is_direct_and_broadcast_response() {
        let flags = opcode_flags(OpCode::GIVE_PHYSICAL_ADDRESS).unwrap();
        assert!(flags.allows_direct());
        assert!(!flags.allows_broadcast());
        assert!(flags.allows_unregistered());
    }

    #[test]
    fn test_routing_change_is_a_switch_message() {
        let flags = opcode_flags(OpCode::ROUTING_CHANGE).unwrap();
        assert!(flags.contains(OpCodeFlags::SWITCH_MESSAGE));
        assert!(flags.allows_unregistered());
    }

    #[test]
    fn test_standby_allows_both_modes() {
        let flags = opcode_flags(OpCode::STANDBY).unwrap();
        assert!(flags.allows_direct());
        assert!(flags.allows_broadcast());
    }
}
