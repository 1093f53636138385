//! Fake CEC device for testing.
//!
//! Allows tests to inject inbound [`Packet`]s and inspect every transmission
//! without an adapter.  The identity is fixed apart from the logical address
//! and device type, so expected replies are easy to write down.

use std::sync::{
    mpsc::{self, Receiver, Sender},
    Mutex,
};

use cec_core::{DeviceType, LogicalAddress, OpCode, Packet, PhysicalAddress};

use super::{Device, DeviceError};

/// Physical address reported by every [`FakeDevice`].
pub const FAKE_PHYSICAL_ADDRESS: PhysicalAddress = PhysicalAddress(0xABCD);

/// Vendor id reported by every [`FakeDevice`].
pub const FAKE_VENDOR_ID: u32 = 0x10_10_10;

/// One packet transmitted through the fake device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmission {
    pub packet: Packet,
    /// `true` if sent through [`Device::reply`] rather than [`Device::send`].
    pub reply: bool,
}

/// A fake implementation of [`Device`] that records what the engine sends.
pub struct FakeDevice {
    address: LogicalAddress,
    device_type: DeviceType,
    sender: Mutex<Option<Sender<Packet>>>,
    receiver: Mutex<Option<Receiver<Packet>>>,
    transmissions: Mutex<Vec<Transmission>>,
}

impl FakeDevice {
    /// Creates a fake device.  Packets may be injected before the engine
    /// starts receiving.
    pub fn new(address: LogicalAddress, device_type: DeviceType) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            address,
            device_type,
            sender: Mutex::new(Some(tx)),
            receiver: Mutex::new(Some(rx)),
            transmissions: Mutex::new(Vec::new()),
        }
    }

    /// Queues an inbound packet, as if received from the bus.
    ///
    /// Panics if [`close`](Self::close) has been called.
    pub fn inject(&self, packet: Packet) {
        let guard = self.sender.lock().expect("lock poisoned");
        match guard.as_ref() {
            // A dropped receiver only means the engine is gone; nothing to deliver to.
            Some(sender) => {
                let _ = sender.send(packet);
            }
            None => panic!("FakeDevice::inject called after close()"),
        }
    }

    /// Queues every packet in order.
    pub fn inject_all(&self, packets: impl IntoIterator<Item = Packet>) {
        for packet in packets {
            self.inject(packet);
        }
    }

    /// Closes the inbound stream.  The engine stops once it has drained the
    /// packets already queued.
    pub fn close(&self) {
        *self.sender.lock().expect("lock poisoned") = None;
    }

    /// Returns every transmission so far, oldest first.
    pub fn transmissions(&self) -> Vec<Transmission> {
        self.transmissions.lock().expect("lock poisoned").clone()
    }

    /// Returns the transmitted packets without the send/reply distinction.
    pub fn sent_packets(&self) -> Vec<Packet> {
        self.transmissions().into_iter().map(|t| t.packet).collect()
    }

    fn record(&self, follower: LogicalAddress, opcode: OpCode, payload: &[u8], reply: bool) {
        let packet = Packet::new(self.address, follower, opcode, payload);
        self.transmissions
            .lock()
            .expect("lock poisoned")
            .push(Transmission { packet, reply });
    }
}

impl Device for FakeDevice {
    fn receive(&self) -> Result<Receiver<Packet>, DeviceError> {
        self.receiver
            .lock()
            .expect("lock poisoned")
            .take()
            .ok_or(DeviceError::AlreadyReceiving)
    }

    fn send(
        &self,
        follower: LogicalAddress,
        opcode: OpCode,
        payload: &[u8],
    ) -> Result<(), DeviceError> {
        self.record(follower, opcode, payload, false);
        Ok(())
    }

    fn reply(
        &self,
        follower: LogicalAddress,
        opcode: OpCode,
        payload: &[u8],
    ) -> Result<(), DeviceError> {
        self.record(follower, opcode, payload, true);
        Ok(())
    }

    fn vendor_id(&self) -> u32 {
        FAKE_VENDOR_ID
    }

    fn device_type(&self) -> DeviceType {
        self.device_type
    }

    fn physical_address(&self) -> PhysicalAddress {
        FAKE_PHYSICAL_ADDRESS
    }

    fn logical_address(&self) -> LogicalAddress {
        self.address
    }
}
