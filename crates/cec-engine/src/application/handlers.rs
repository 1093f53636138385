//! Message handlers: the extension point of the engine.
//!
//! A [`Handler`] inspects a validated message and returns `true` once it has
//! dealt with it, which stops the chain.  Plain closures are handlers too:
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use cec_core::{Command, Message};
//! # use cec_engine::application::dispatch::{CecBuilder, Controller};
//! # use cec_engine::infrastructure::device::fake::FakeDevice;
//! # use cec_core::{DeviceType, LogicalAddress};
//! # let device = Arc::new(FakeDevice::new(LogicalAddress::TV, DeviceType::Tv));
//! let mut builder = CecBuilder::new(device, "Living Room").unwrap();
//! builder.add_handler(|ctl: &Controller, msg: &Message| match msg.command {
//!     Command::GetCecVersion => ctl.reply(msg.initiator, Command::CecVersion(0x05)).is_ok(),
//!     _ => false,
//! });
//! ```

use cec_core::protocol::messages::CEC_VERSION;
use cec_core::{AbortReason, Command, LogicalAddress, Message};
use tracing::{debug, warn};

use crate::application::dispatch::Controller;

/// Handles inbound messages.
pub trait Handler: Send {
    /// Returns `true` if the message was handled.  Later handlers are not
    /// consulted for a handled message.
    fn handle(&self, ctl: &Controller, msg: &Message) -> bool;
}

impl<F> Handler for F
where
    F: Fn(&Controller, &Message) -> bool + Send,
{
    fn handle(&self, ctl: &Controller, msg: &Message) -> bool {
        self(ctl, msg)
    }
}

/// Answers the standard identity queries every device must support.
///
/// | Query               | Answer                                  |
/// |---------------------|-----------------------------------------|
/// | GivePhysicalAddress | ReportPhysicalAddress, broadcast        |
/// | GiveOSDName         | SetOSDName to the initiator             |
/// | GiveDeviceVendorID  | DeviceVendorID, broadcast               |
/// | GetCECVersion       | CECVersion 1.3a to the initiator        |
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHandler;

impl Handler for DefaultHandler {
    fn handle(&self, ctl: &Controller, msg: &Message) -> bool {
        let dev = ctl.device();
        let (follower, answer) = match msg.command {
            Command::GivePhysicalAddress => (
                LogicalAddress::BROADCAST,
                Command::ReportPhysicalAddress {
                    address: dev.physical_address(),
                    device_type: dev.device_type(),
                },
            ),
            Command::GiveOsdName => {
                (msg.initiator, Command::SetOsdName(ctl.osd_name().to_string()))
            }
            Command::GiveDeviceVendorId => {
                (LogicalAddress::BROADCAST, Command::DeviceVendorId(dev.vendor_id()))
            }
            Command::GetCecVersion => (msg.initiator, Command::CecVersion(CEC_VERSION)),
            _ => return false,
        };

        if let Err(e) = ctl.reply(follower, answer) {
            warn!("failed to answer {}: {e}", msg.opcode());
        }
        true
    }
}

/// The last resort for messages no handler took.
///
/// Direct messages are refused with `FeatureAbort(UnrecognizedOpCode)` so
/// the sender does not wait for an answer.  Broadcasts, feature aborts,
/// Standby, and anything from an Unregistered initiator get no reply.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnhandledHandler;

impl Handler for UnhandledHandler {
    fn handle(&self, ctl: &Controller, msg: &Message) -> bool {
        if msg.initiator.is_unregistered() {
            warn!("unexpected message from unregistered initiator: {msg}");
            return true;
        }

        match msg.command {
            Command::FeatureAbort { .. } => {
                warn!("unexpected feature abort: {msg}");
                return true;
            }
            // Mandatory to accept, allowed to ignore.
            Command::Standby => return true,
            _ => {}
        }

        if !msg.follower.is_broadcast() {
            debug!("unhandled message: {msg}");
            let abort = Command::FeatureAbort {
                abort: msg.opcode(),
                reason: AbortReason::UNRECOGNIZED_OPCODE,
            };
            if let Err(e) = ctl.reply(msg.initiator, abort) {
                warn!("failed to send feature abort: {e}");
            }
        }
        true
    }
}
