//! Protocol module containing CEC value types, the payload codec, and the
//! opcode addressing rules.

pub mod codec;
pub mod messages;
pub mod rules;
pub mod types;

pub use codec::{
    decode_command, decode_message, encode_command, encode_message, is_valid_osd_name,
    is_valid_vendor_id, CodecError,
};
pub use messages::*;
pub use rules::{opcode_flags, OpCodeFlags};
pub use types::*;
