//! # cec-core
//!
//! Shared library for the CEC engine containing the HDMI-CEC value types,
//! the typed message codec, and the opcode addressing rule table.
//!
//! This crate has no dependency on any device, thread, or I/O API.  It only
//! turns bytes into typed messages and back.
//!
//! # Architecture overview (for beginners)
//!
//! HDMI-CEC is a slow, shared, single-wire bus that lets the devices in a home
//! theater (TV, AV receiver, players) control each other.  Every frame on the
//! bus is tiny:
//!
//! ```text
//! [initiator:4 | follower:4][opcode:1][payload:0..=14]
//! ```
//!
//! This crate is split the same way the frame is:
//!
//! - **`protocol::types`** – Addresses, device types, and the open code sets
//!   (opcodes, abort reasons, power states, remote-control keys).
//!
//! - **`protocol::messages`** – [`Packet`] (a frame split into fields) and
//!   [`Message`] (a packet whose payload has been decoded into a [`Command`]).
//!
//! - **`protocol::codec`** – Payload encoding and decoding with validation.
//!
//! - **`protocol::rules`** – Which addressing modes each opcode is legal in.
//!   The dispatch runtime in `cec-engine` uses it to drop misaddressed frames.

pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `cec_core::Message` instead of `cec_core::protocol::messages::Message`.
pub use protocol::codec::{decode_message, encode_message, CodecError};
pub use protocol::messages::{Command, FrameError, Message, Packet};
pub use protocol::types::{
    AbortReason, DeviceType, LogicalAddress, OpCode, PhysicalAddress, PowerStatus, UserControl,
};
