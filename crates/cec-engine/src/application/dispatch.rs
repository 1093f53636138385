//! The dispatch runtime: validates each inbound packet and routes it to the
//! handler chain.
//!
//! # Lifecycle
//!
//! ```text
//! CecBuilder::new()      -- validates the OSD name
//!   ├─ add_handler()     -- any number, tried in registration order
//!   ├─ set_listener()    -- at most once, starts the diagnostics worker
//!   ├─ send()            -- allowed before arming
//!   └─ arm() ─▶ Cec
//!                └─ run()  -- blocks until the device's inbound stream ends
//! ```
//!
//! `arm` consumes the builder, so handlers and listeners cannot change once
//! packets are flowing.
//!
//! # Per-packet pipeline
//!
//! 1. Decode.  Malformed payloads are answered with
//!    `FeatureAbort(InvalidOperand)` when the packet is answerable.
//! 2. Look up the opcode's addressing rule.  Unknown opcodes are answered
//!    with `FeatureAbort(UnrecognizedOpCode)` when answerable.
//! 3. Drop messages sent in an addressing mode their opcode does not allow.
//! 4. Drop messages from an Unregistered initiator unless they are Standby,
//!    answered by a broadcast, or switch messages.
//! 5. Offer the message to each handler until one handles it; otherwise the
//!    [`UnhandledHandler`] decides.

use std::io;
use std::sync::Arc;

use cec_core::protocol::codec::{encode_command, is_valid_osd_name, CodecError};
use cec_core::protocol::rules::opcode_flags;
use cec_core::{AbortReason, Command, LogicalAddress, Message, OpCode, Packet};
use tracing::{debug, info, warn};

use crate::application::handlers::{Handler, UnhandledHandler};
use crate::infrastructure::device::{Device, DeviceError};
use crate::infrastructure::diagnostics::{Listener, ListenerTap};

// ── Controller ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Route {
    Send,
    Reply,
}

/// What handlers get to act with: the device, the OSD name, and the
/// send/reply path.
pub struct Controller {
    device: Arc<dyn Device>,
    osd_name: String,
    tap: Option<ListenerTap>,
}

impl Controller {
    /// Encodes `command` and sends it from this device to `follower`.
    ///
    /// Transmission failures are logged, not returned; the bus gives no
    /// delivery guarantee either way.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the command cannot be encoded.  Nothing is
    /// transmitted or observed in that case.
    pub fn send(&self, follower: LogicalAddress, command: Command) -> Result<(), CodecError> {
        self.transmit(Route::Send, follower, command)
    }

    /// Like [`send`](Self::send), but transmitted as an answer to a received
    /// message.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the command cannot be encoded.
    pub fn reply(&self, follower: LogicalAddress, command: Command) -> Result<(), CodecError> {
        self.transmit(Route::Reply, follower, command)
    }

    pub fn device(&self) -> &dyn Device {
        self.device.as_ref()
    }

    pub fn osd_name(&self) -> &str {
        &self.osd_name
    }

    fn transmit(
        &self,
        route: Route,
        follower: LogicalAddress,
        command: Command,
    ) -> Result<(), CodecError> {
        let payload = encode_command(&command)?;
        let opcode = command.opcode();
        self.observe(|| Message::new(self.device.logical_address(), follower, command));

        let result = match route {
            Route::Send => self.device.send(follower, opcode, &payload),
            Route::Reply => self.device.reply(follower, opcode, &payload),
        };
        if let Err(e) = result {
            warn!("failed to transmit {opcode} to {follower}: {e}");
        }
        Ok(())
    }

    /// Hands a message to the listener, if one is installed.  The message is
    /// only built when someone is listening.
    fn observe(&self, msg: impl FnOnce() -> Message) {
        if let Some(tap) = &self.tap {
            tap.observe(msg());
        }
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Configures the engine before it starts receiving.
pub struct CecBuilder {
    controller: Controller,
    handlers: Vec<Box<dyn Handler>>,
}

impl CecBuilder {
    /// Creates a builder for `device` that reports `osd_name` in answer to
    /// GiveOSDName.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidOsdName`] unless `osd_name` is 1 to 14
    /// printable ASCII characters.
    pub fn new(device: Arc<dyn Device>, osd_name: impl Into<String>) -> Result<Self, CodecError> {
        let osd_name = osd_name.into();
        if !is_valid_osd_name(osd_name.as_bytes()) {
            return Err(CodecError::InvalidOsdName);
        }
        Ok(Self {
            controller: Controller {
                device,
                osd_name,
                tap: None,
            },
            handlers: Vec::new(),
        })
    }

    /// Appends a handler to the chain.  Handlers are tried in the order they
    /// were added.
    pub fn add_handler(&mut self, handler: impl Handler + 'static) -> &mut Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Installs the diagnostics listener and starts its worker thread.
    ///
    /// # Panics
    ///
    /// Panics if a listener is already installed.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the worker thread cannot be spawned.
    pub fn set_listener(&mut self, listener: impl Listener + 'static) -> io::Result<&mut Self> {
        assert!(self.controller.tap.is_none(), "listener already set");
        self.controller.tap = Some(ListenerTap::spawn(Box::new(listener))?);
        Ok(self)
    }

    /// Sends a command before the engine is armed, e.g. an initial
    /// ReportPhysicalAddress announcement.
    ///
    /// # Errors
    ///
    /// See [`Controller::send`].
    pub fn send(&self, follower: LogicalAddress, command: Command) -> Result<(), CodecError> {
        self.controller.send(follower, command)
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Freezes the configuration.
    pub fn arm(self) -> Cec {
        Cec {
            controller: self.controller,
            handlers: self.handlers,
        }
    }
}

// ── Runtime ───────────────────────────────────────────────────────────────────

/// An armed engine, ready to [`run`](Cec::run).
pub struct Cec {
    controller: Controller,
    handlers: Vec<Box<dyn Handler>>,
}

impl Cec {
    /// Receives and dispatches packets until the device's inbound stream
    /// ends, then waits for the listener to see every observed message.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError`] if the device refuses to start receiving.
    /// Protocol errors in individual packets never end the loop.
    pub fn run(mut self) -> Result<(), DeviceError> {
        let result = self.controller.device.receive().map(|inbound| {
            info!(
                "engine running as {} ({} handlers)",
                self.controller.device.logical_address(),
                self.handlers.len()
            );
            for packet in inbound {
                self.dispatch(&packet);
            }
        });

        if let Some(tap) = self.controller.tap.take() {
            tap.close();
        }
        info!("engine stopped");
        result
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    fn dispatch(&self, packet: &Packet) {
        debug!("received {packet}");
        let ctl = &self.controller;

        let msg = match Message::from_packet(packet) {
            Ok(msg) => msg,
            Err(e) => {
                ctl.observe(|| Message::undecoded(packet));
                warn!("unable to decode {packet}: {e}");
                self.abort_if_answerable(packet, AbortReason::INVALID_OPERAND);
                return;
            }
        };
        ctl.observe(|| msg.clone());

        let Some(flags) = opcode_flags(msg.opcode()) else {
            debug!("unknown opcode: {msg}");
            self.abort_if_answerable(packet, AbortReason::UNRECOGNIZED_OPCODE);
            return;
        };

        if msg.follower.is_broadcast() && !flags.allows_broadcast() {
            warn!("dropping broadcast of a direct-only message: {msg}");
            return;
        }
        if !msg.follower.is_broadcast() && !flags.allows_direct() {
            warn!("dropping direct message that must be broadcast: {msg}");
            return;
        }
        if msg.initiator.is_unregistered()
            && msg.opcode() != OpCode::STANDBY
            && !flags.allows_unregistered()
        {
            debug!("ignoring message from unregistered initiator: {msg}");
            return;
        }

        let handled = self.handlers.iter().any(|h| h.handle(ctl, &msg));
        if !handled {
            UnhandledHandler.handle(ctl, &msg);
        }
    }

    fn abort_if_answerable(&self, packet: &Packet, reason: AbortReason) {
        if !packet.is_answerable() {
            return;
        }
        let abort = Command::FeatureAbort {
            abort: packet.opcode,
            reason,
        };
        if let Err(e) = self.controller.reply(packet.initiator, abort) {
            warn!("failed to send feature abort for {packet}: {e}");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
