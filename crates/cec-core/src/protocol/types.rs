//! Identifier and enumeration value types used on the CEC bus.
//!
//! Most codes here are *open* byte values: the bus may carry any byte, and the
//! engine must be able to pass unknown values through untouched.  They are
//! therefore modelled as `u8` newtypes with named associated constants rather
//! than closed enums.  [`DeviceType`] is the exception: the protocol defines
//! a fixed set, so it is an enum whose [`DeviceType::Other`] variant carries
//! any byte outside that set.
//!
//! # Logical address 15 (for beginners)
//!
//! The 4-bit logical address `0xF` means two different things depending on
//! where it appears:
//!
//! - as the **initiator** it means *Unregistered*: the sender has not (yet)
//!   claimed a logical address on the bus;
//! - as the **follower** it means *Broadcast*: the message is addressed to
//!   every device.
//!
//! [`LogicalAddress::UNREGISTERED`] and [`LogicalAddress::BROADCAST`] are the
//! same value.  Use [`LogicalAddress::is_unregistered`] for initiators and
//! [`LogicalAddress::is_broadcast`] for followers so the intent stays visible
//! at the call site.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Declares an open `u8` code type with named constants, a `name()` lookup,
/// and a `Display` impl that falls back to the raw hex value.
macro_rules! byte_codes {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $konst:ident = $value:literal => $label:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u8);

        impl $name {
            $( pub const $konst: $name = $name($value); )*

            /// Returns the protocol name of this code, or `None` for values the
            /// protocol does not name.
            pub fn name(self) -> Option<&'static str> {
                match self.0 {
                    $( $value => Some($label), )*
                    _ => None,
                }
            }
        }

        impl From<u8> for $name {
            fn from(value: u8) -> Self {
                $name(value)
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.name() {
                    Some(name) => f.write_str(name),
                    None => write!(f, "{}(0x{:02X})", stringify!($name), self.0),
                }
            }
        }
    };
}

// ── Logical address ───────────────────────────────────────────────────────────

/// A 4-bit logical address identifying a device's role on the bus.
///
/// Always holds a value in `0x0..=0xF`.  Frame parsing masks a nibble with
/// [`LogicalAddress::from_nibble`]; every other conversion from `u8` goes
/// through `TryFrom` and rejects wider values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LogicalAddress(u8);

impl LogicalAddress {
    pub const TV: LogicalAddress = LogicalAddress(0x0);
    pub const RECORDER_1: LogicalAddress = LogicalAddress(0x1);
    pub const RECORDER_2: LogicalAddress = LogicalAddress(0x2);
    pub const TUNER_1: LogicalAddress = LogicalAddress(0x3);
    pub const PLAYBACK_1: LogicalAddress = LogicalAddress(0x4);
    pub const AUDIO_SYSTEM: LogicalAddress = LogicalAddress(0x5);
    pub const TUNER_2: LogicalAddress = LogicalAddress(0x6);
    pub const TUNER_3: LogicalAddress = LogicalAddress(0x7);
    pub const PLAYBACK_2: LogicalAddress = LogicalAddress(0x8);
    pub const RECORDER_3: LogicalAddress = LogicalAddress(0x9);
    pub const TUNER_4: LogicalAddress = LogicalAddress(0xA);
    pub const PLAYBACK_3: LogicalAddress = LogicalAddress(0xB);
    pub const RESERVED_1: LogicalAddress = LogicalAddress(0xC);
    pub const RESERVED_2: LogicalAddress = LogicalAddress(0xD);
    pub const FREE_USE: LogicalAddress = LogicalAddress(0xE);
    /// Address 15 as an initiator.
    pub const UNREGISTERED: LogicalAddress = LogicalAddress(0xF);
    /// Address 15 as a follower.
    pub const BROADCAST: LogicalAddress = LogicalAddress(0xF);

    /// Builds an address from the low nibble of `value`.
    pub const fn from_nibble(value: u8) -> Self {
        LogicalAddress(value & 0x0F)
    }

    /// Returns the raw 4-bit value.
    pub const fn value(self) -> u8 {
        self.0
    }

    /// `true` if this address, read as an initiator, is Unregistered.
    pub fn is_unregistered(self) -> bool {
        self.0 == 0xF
    }

    /// `true` if this address, read as a follower, is Broadcast.
    pub fn is_broadcast(self) -> bool {
        self.0 == 0xF
    }

    /// Role name when this address is the sender of a message.
    pub fn initiator_name(self) -> &'static str {
        if self.is_unregistered() {
            "Unregistered"
        } else {
            self.role_name()
        }
    }

    /// Role name when this address is the receiver of a message.
    pub fn follower_name(self) -> &'static str {
        if self.is_broadcast() {
            "Broadcast"
        } else {
            self.role_name()
        }
    }

    fn role_name(self) -> &'static str {
        match self.0 {
            0x0 => "TV",
            0x1 => "Recorder1",
            0x2 => "Recorder2",
            0x3 => "Tuner1",
            0x4 => "Playback1",
            0x5 => "AudioSystem",
            0x6 => "Tuner2",
            0x7 => "Tuner3",
            0x8 => "Playback2",
            0x9 => "Recorder3",
            0xA => "Tuner4",
            0xB => "Playback3",
            0xC => "Reserved1",
            0xD => "Reserved2",
            0xE => "FreeUse",
            _ => "Unregistered/Broadcast",
        }
    }
}

/// Error returned when a byte does not fit in a 4-bit logical address.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("logical address {0} is out of range 0..=15")]
pub struct InvalidLogicalAddress(pub u8);

impl TryFrom<u8> for LogicalAddress {
    type Error = InvalidLogicalAddress;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 0x0F {
            return Err(InvalidLogicalAddress(value));
        }
        Ok(LogicalAddress(value))
    }
}

impl From<LogicalAddress> for u8 {
    fn from(value: LogicalAddress) -> u8 {
        value.0
    }
}

impl fmt::Display for LogicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.role_name())
    }
}

// ── Physical address ──────────────────────────────────────────────────────────

/// A 16-bit physical (topology) address, written as `a.b.c.d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PhysicalAddress(pub u16);

impl PhysicalAddress {
    /// Wire form: two bytes, big-endian.
    pub fn to_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    pub fn from_bytes(bytes: [u8; 2]) -> Self {
        PhysicalAddress(u16::from_be_bytes(bytes))
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.0;
        write!(
            f,
            "{:x}.{:x}.{:x}.{:x}",
            (a >> 12) & 0xF,
            (a >> 8) & 0xF,
            (a >> 4) & 0xF,
            a & 0xF
        )
    }
}

/// Error returned when parsing a physical address from its `a.b.c.d` form.
#[derive(Debug, Error, PartialEq)]
#[error("invalid physical address {input:?}: expected four hex digits separated by dots")]
pub struct ParseAddressError {
    input: String,
}

impl FromStr for PhysicalAddress {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseAddressError {
            input: s.to_string(),
        };
        let mut value = 0u16;
        let mut parts = 0;
        for part in s.split('.') {
            if part.len() != 1 {
                return Err(err());
            }
            let nibble = u16::from_str_radix(part, 16).map_err(|_| err())?;
            value = (value << 4) | nibble;
            parts += 1;
        }
        if parts != 4 {
            return Err(err());
        }
        Ok(PhysicalAddress(value))
    }
}

// ── Device type ───────────────────────────────────────────────────────────────

/// The primary device type a device reports alongside its physical address.
///
/// Bytes outside the defined set are kept in [`DeviceType::Other`] so a
/// received report re-encodes unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Tv,
    Recorder,
    Reserved,
    Tuner,
    Playback,
    Audio,
    Switch,
    VideoProcessor,
    Invalid,
    Other(u8),
}

impl From<u8> for DeviceType {
    fn from(value: u8) -> Self {
        match value {
            0x0 => DeviceType::Tv,
            0x1 => DeviceType::Recorder,
            0x2 => DeviceType::Reserved,
            0x3 => DeviceType::Tuner,
            0x4 => DeviceType::Playback,
            0x5 => DeviceType::Audio,
            0x6 => DeviceType::Switch,
            0x7 => DeviceType::VideoProcessor,
            0xF => DeviceType::Invalid,
            other => DeviceType::Other(other),
        }
    }
}

impl From<DeviceType> for u8 {
    fn from(value: DeviceType) -> u8 {
        match value {
            DeviceType::Tv => 0x0,
            DeviceType::Recorder => 0x1,
            DeviceType::Reserved => 0x2,
            DeviceType::Tuner => 0x3,
            DeviceType::Playback => 0x4,
            DeviceType::Audio => 0x5,
            DeviceType::Switch => 0x6,
            DeviceType::VideoProcessor => 0x7,
            DeviceType::Invalid => 0xF,
            DeviceType::Other(raw) => raw,
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceType::Tv => "TV",
            DeviceType::Recorder => "Recorder",
            DeviceType::Reserved => "Reserved",
            DeviceType::Tuner => "Tuner",
            DeviceType::Playback => "Playback",
            DeviceType::Audio => "Audio",
            DeviceType::Switch => "Switch",
            DeviceType::VideoProcessor => "VideoProcessor",
            DeviceType::Invalid => "Invalid",
            DeviceType::Other(raw) => return write!(f, "DeviceType(0x{raw:02X})"),
        };
        f.write_str(name)
    }
}

// ── Opcodes ───────────────────────────────────────────────────────────────────

byte_codes! {
    /// An 8-bit CEC operation code.
    pub struct OpCode {
        FEATURE_ABORT = 0x00 => "FeatureAbort",
        IMAGE_VIEW_ON = 0x04 => "ImageViewOn",
        TUNER_STEP_INCREMENT = 0x05 => "TunerStepIncrement",
        TUNER_STEP_DECREMENT = 0x06 => "TunerStepDecrement",
        TUNER_DEVICE_STATUS = 0x07 => "TunerDeviceStatus",
        GIVE_TUNER_DEVICE_STATUS = 0x08 => "GiveTunerDeviceStatus",
        RECORD_ON = 0x09 => "RecordOn",
        RECORD_STATUS = 0x0A => "RecordStatus",
        RECORD_OFF = 0x0B => "RecordOff",
        TEXT_VIEW_ON = 0x0D => "TextViewOn",
        RECORD_TV_SCREEN = 0x0F => "RecordTVScreen",
        GIVE_DECK_STATUS = 0x1A => "GiveDeckStatus",
        DECK_STATUS = 0x1B => "DeckStatus",
        SET_MENU_LANGUAGE = 0x32 => "SetMenuLanguage",
        CLEAR_ANALOG_TIMER = 0x33 => "ClearAnalogTimer",
        SET_ANALOG_TIMER = 0x34 => "SetAnalogTimer",
        TIMER_STATUS = 0x35 => "TimerStatus",
        STANDBY = 0x36 => "Standby",
        PLAY = 0x41 => "Play",
        DECK_CONTROL = 0x42 => "DeckControl",
        TIMER_CLEARED_STATUS = 0x43 => "TimerClearedStatus",
        USER_CONTROL_PRESSED = 0x44 => "UserControlPressed",
        USER_CONTROL_RELEASED = 0x45 => "UserControlReleased",
        GIVE_OSD_NAME = 0x46 => "GiveOSDName",
        SET_OSD_NAME = 0x47 => "SetOSDName",
        SET_OSD_STRING = 0x64 => "SetOSDString",
        SET_TIMER_PROGRAM_TITLE = 0x67 => "SetTimerProgramTitle",
        SYSTEM_AUDIO_MODE_REQUEST = 0x70 => "SystemAudioModeRequest",
        GIVE_AUDIO_STATUS = 0x71 => "GiveAudioStatus",
        SET_SYSTEM_AUDIO_MODE = 0x72 => "SetSystemAudioMode",
        REPORT_AUDIO_STATUS = 0x7A => "ReportAudioStatus",
        GIVE_SYSTEM_AUDIO_MODE_STATUS = 0x7D => "GiveSystemAudioModeStatus",
        SYSTEM_AUDIO_MODE_STATUS = 0x7E => "SystemAudioModeStatus",
        ROUTING_CHANGE = 0x80 => "RoutingChange",
        ROUTING_INFORMATION = 0x81 => "RoutingInformation",
        ACTIVE_SOURCE = 0x82 => "ActiveSource",
        GIVE_PHYSICAL_ADDRESS = 0x83 => "GivePhysicalAddress",
        REPORT_PHYSICAL_ADDRESS = 0x84 => "ReportPhysicalAddress",
        REQUEST_ACTIVE_SOURCE = 0x85 => "RequestActiveSource",
        SET_STREAM_PATH = 0x86 => "SetStreamPath",
        DEVICE_VENDOR_ID = 0x87 => "DeviceVendorID",
        VENDOR_COMMAND = 0x89 => "VendorCommand",
        VENDOR_REMOTE_BUTTON_DOWN = 0x8A => "VendorRemoteButtonDown",
        VENDOR_REMOTE_BUTTON_UP = 0x8B => "VendorRemoteButtonUp",
        GIVE_DEVICE_VENDOR_ID = 0x8C => "GiveDeviceVendorID",
        MENU_REQUEST = 0x8D => "MenuRequest",
        MENU_STATUS = 0x8E => "MenuStatus",
        GIVE_DEVICE_POWER_STATUS = 0x8F => "GiveDevicePowerStatus",
        REPORT_POWER_STATUS = 0x90 => "ReportPowerStatus",
        GET_MENU_LANGUAGE = 0x91 => "GetMenuLanguage",
        SELECT_ANALOG_SERVICE = 0x92 => "SelectAnalogService",
        SELECT_DIGITAL_SERVICE = 0x93 => "SelectDigitalService",
        SET_DIGITAL_TIMER = 0x97 => "SetDigitalTimer",
        CLEAR_DIGITAL_TIMER = 0x99 => "ClearDigitalTimer",
        SET_AUDIO_RATE = 0x9A => "SetAudioRate",
        INACTIVE_SOURCE = 0x9D => "InactiveSource",
        CEC_VERSION = 0x9E => "CECVersion",
        GET_CEC_VERSION = 0x9F => "GetCECVersion",
        VENDOR_COMMAND_WITH_ID = 0xA0 => "VendorCommandWithID",
        CLEAR_EXTERNAL_TIMER = 0xA1 => "ClearExternalTimer",
        SET_EXTERNAL_TIMER = 0xA2 => "SetExternalTimer",
        ABORT = 0xFF => "Abort",
    }
}

byte_codes! {
    /// Reason code carried by a feature abort.
    pub struct AbortReason {
        UNRECOGNIZED_OPCODE = 0x00 => "UnrecognizedOpCode",
        NOT_IN_CORRECT_MODE = 0x01 => "NotInCorrectMode",
        CANNOT_PROVIDE_SOURCE = 0x02 => "CannotProvideSource",
        INVALID_OPERAND = 0x03 => "InvalidOperand",
        REFUSED = 0x04 => "Refused",
    }
}

byte_codes! {
    /// Power state reported by a device.
    pub struct PowerStatus {
        ON = 0x00 => "On",
        STANDBY = 0x01 => "Standby",
        ON_TRANSITION = 0x02 => "OnTransition",
        STANDBY_TRANSITION = 0x03 => "StandbyTransition",
    }
}

byte_codes! {
    /// A remote-control key code carried by user control messages.
    pub struct UserControl {
        SELECT = 0x00 => "Select",
        UP = 0x01 => "Up",
        DOWN = 0x02 => "Down",
        LEFT = 0x03 => "Left",
        RIGHT = 0x04 => "Right",
        RIGHT_UP = 0x05 => "RightUp",
        RIGHT_DOWN = 0x06 => "RightDown",
        LEFT_UP = 0x07 => "LeftUp",
        LEFT_DOWN = 0x08 => "LeftDown",
        ROOT_MENU = 0x09 => "RootMenu",
        SETUP_MENU = 0x0A => "SetupMenu",
        CONTENTS_MENU = 0x0B => "ContentsMenu",
        FAVORITE_MENU = 0x0C => "FavoriteMenu",
        EXIT = 0x0D => "Exit",
        NUMBER_0 = 0x20 => "Number0",
        NUMBER_1 = 0x21 => "Number1",
        NUMBER_2 = 0x22 => "Number2",
        NUMBER_3 = 0x23 => "Number3",
        NUMBER_4 = 0x24 => "Number4",
        NUMBER_5 = 0x25 => "Number5",
        NUMBER_6 = 0x26 => "Number6",
        NUMBER_7 = 0x27 => "Number7",
        NUMBER_8 = 0x28 => "Number8",
        NUMBER_9 = 0x29 => "Number9",
        DOT = 0x2A => "Dot",
        ENTER = 0x2B => "Enter",
        CLEAR = 0x2C => "Clear",
        CHANNEL_UP = 0x30 => "ChannelUp",
        CHANNEL_DOWN = 0x31 => "ChannelDown",
        PREVIOUS_CHANNEL = 0x32 => "PreviousChannel",
        SOUND_SELECT = 0x33 => "SoundSelect",
        INPUT_SELECT = 0x34 => "InputSelect",
        DISPLAY_INFORMATION = 0x35 => "DisplayInformation",
        HELP = 0x36 => "Help",
        PAGE_UP = 0x37 => "PageUp",
        PAGE_DOWN = 0x38 => "PageDown",
        POWER = 0x40 => "Power",
        VOLUME_UP = 0x41 => "VolumeUp",
        VOLUME_DOWN = 0x42 => "VolumeDown",
        MUTE = 0x43 => "Mute",
        PLAY = 0x44 => "Play",
        STOP = 0x45 => "Stop",
        PAUSE = 0x46 => "Pause",
        RECORD = 0x47 => "Record",
        REWIND = 0x48 => "Rewind",
        FAST_FORWARD = 0x49 => "FastForward",
        EJECT = 0x4A => "Eject",
        FORWARD = 0x4B => "Forward",
        BACKWARD = 0x4C => "Backward",
        ANGLE = 0x50 => "Angle",
        SUBPICTURE = 0x51 => "Subpicture",
        VIDEO_ON_DEMAND = 0x52 => "VideoOnDemand",
        EPG = 0x53 => "EPG",
        TIMER_PROGRAMMING = 0x54 => "TimerProgramming",
        INITIAL_CONFIG = 0x55 => "InitialConfig",
        PLAY_FUNCTION = 0x60 => "PlayFunction",
        PAUSE_PLAY_FUNCTION = 0x61 => "PausePlayFunction",
        RECORD_FUNCTION = 0x62 => "RecordFunction",
        PAUSE_RECORD_FUNCTION = 0x63 => "PauseRecordFunction",
        STOP_FUNCTION = 0x64 => "StopFunction",
        MUTE_FUNCTION = 0x65 => "MuteFunction",
        RESTORE_VOLUME_FUNCTION = 0x66 => "RestoreVolumeFunction",
        TUNE_FUNCTION = 0x67 => "TuneFunction",
        SELECT_DISK_FUNCTION = 0x68 => "SelectDiskFunction",
        SELECT_AV_INPUT_FUNCTION = 0x69 => "SelectAVInputFunction",
        SELECT_AUDIO_INPUT_FUNCTION = 0x6A => "SelectAudioInputFunction",
        F1_BLUE = 0x71 => "F1Blue",
        F2_RED = 0x72 => "F2Red",
        F3_GREEN = 0x73 => "F3Green",
        F4_YELLOW = 0x74 => "F4Yellow",
        F5 = 0x75 => "F5",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_address_to_bytes_is_big_endian() {
        assert_eq!(PhysicalAddress(0xABCD).to_bytes(), [0xAB, 0xCD]);
    }

    #[test]
    fn test_physical_address_displays_as_dotted_nibbles() {
        assert_eq!(PhysicalAddress(0xABCD).to_string(), "a.b.c.d");
        assert_eq!(PhysicalAddress(0x1000).to_string(), "1.0.0.0");
    }

    #[test]
    fn test_physical_address_parses_dotted_form() {
        assert_eq!("a.b.c.d".parse::<PhysicalAddress>(), Ok(PhysicalAddress(0xABCD)));
        assert_eq!("1.0.0.0".parse::<PhysicalAddress>(), Ok(PhysicalAddress(0x1000)));
        assert_eq!("F.0.2.0".parse::<PhysicalAddress>(), Ok(PhysicalAddress(0xF020)));
    }

    #[test]
    fn test_physical_address_rejects_malformed_input() {
        for bad in ["", "1.0.0", "1.0.0.0.0", "10.0.0.0", "g.0.0.0", "1..0.0"] {
            assert!(bad.parse::<PhysicalAddress>().is_err(), "{bad:?} must be rejected");
        }
    }

    #[test]
    fn test_logical_address_fifteen_names_depend_on_role() {
        // Arrange
        let addr = LogicalAddress::from_nibble(0xF);

        // Assert
        assert_eq!(addr.initiator_name(), "Unregistered");
        assert_eq!(addr.follower_name(), "Broadcast");
        assert_eq!(LogicalAddress::TV.initiator_name(), "TV");
        assert_eq!(LogicalAddress::AUDIO_SYSTEM.follower_name(), "AudioSystem");
    }

    #[test]
    fn test_logical_address_from_nibble_masks_high_bits() {
        assert_eq!(LogicalAddress::from_nibble(0x45), LogicalAddress::AUDIO_SYSTEM);
    }

    #[test]
    fn test_logical_address_try_from_rejects_wide_values() {
        assert_eq!(LogicalAddress::try_from(0x05), Ok(LogicalAddress::AUDIO_SYSTEM));
        assert_eq!(LogicalAddress::try_from(0x0F), Ok(LogicalAddress::BROADCAST));
        assert_eq!(LogicalAddress::try_from(20), Err(InvalidLogicalAddress(20)));
    }

    #[test]
    fn test_device_type_keeps_undefined_bytes() {
        assert_eq!(DeviceType::from(0x05), DeviceType::Audio);
        assert_eq!(DeviceType::from(0x0F), DeviceType::Invalid);
        assert_eq!(DeviceType::from(0x08), DeviceType::Other(0x08));
        assert_eq!(u8::from(DeviceType::from(0x08)), 0x08);
        assert_eq!(DeviceType::Other(0x08).to_string(), "DeviceType(0x08)");
    }

    #[test]
    fn test_opcode_display_uses_name_or_hex() {
        assert_eq!(OpCode::SET_OSD_NAME.to_string(), "SetOSDName");
        assert_eq!(OpCode(0xFE).to_string(), "OpCode(0xFE)");
    }

    #[test]
    fn test_user_control_name_lookup() {
        assert_eq!(UserControl::BACKWARD.0, 0x4C);
        assert_eq!(UserControl::BACKWARD.name(), Some("Backward"));
        assert_eq!(UserControl(0x0E).name(), None);
    }
}
