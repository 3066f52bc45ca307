use core::any::Any;

/// Endpoint address direction bit.
pub const USB_DIR_IN: u8 = 0x80;
pub const USB_DIR_OUT: u8 = 0x00;

pub const USB_ENDPOINT_XFER_ISOC: u8 = 0x01;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetupPacket {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub length: u16,
}

impl SetupPacket {
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self {
            request_type: bytes[0],
            request: bytes[1],
            value: u16::from_le_bytes([bytes[2], bytes[3]]),
            index: u16::from_le_bytes([bytes[4], bytes[5]]),
            length: u16::from_le_bytes([bytes[6], bytes[7]]),
        }
    }

    pub fn to_bytes(&self) -> [u8; 8] {
        let [v0, v1] = self.value.to_le_bytes();
        let [i0, i1] = self.index.to_le_bytes();
        let [l0, l1] = self.length.to_le_bytes();
        [self.request_type, self.request, v0, v1, i0, i1, l0, l1]
    }

    pub fn is_device_to_host(&self) -> bool {
        self.request_type & USB_DIR_IN != 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UsbSpeed {
    Low,
    Full,
    High,
}

/// Outcome of a whole control transfer as seen by the device model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlResponse {
    /// Data stage payload for device-to-host requests (already truncated to `wLength`).
    Data(Vec<u8>),
    Ack,
    Nak,
    Stall,
    Timeout,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UsbInResult {
    Data(Vec<u8>),
    Nak,
    Stall,
    Timeout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UsbOutResult {
    Ack,
    Nak,
    Stall,
    Timeout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UsbPid {
    Setup,
    In,
    Out,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UsbPacketStatus {
    #[default]
    Success,
    Stall,
}

/// A single data-stage packet handed to a device model.
///
/// IN packets start with `len` bytes of room and a cursor at 0; the device appends with
/// [`UsbPacket::copy_in`] and gives up the tail with [`UsbPacket::skip`]. Skipped bytes are not
/// part of [`UsbPacket::transferred`]: a short isochronous IN transfer is reported as short, never
/// padded.
#[derive(Clone, Debug)]
pub struct UsbPacket {
    pid: UsbPid,
    ep: u8,
    buf: Vec<u8>,
    actual: usize,
    skipped: usize,
    pub status: UsbPacketStatus,
}

impl UsbPacket {
    pub fn new_in(ep: u8, len: usize) -> Self {
        Self {
            pid: UsbPid::In,
            ep,
            buf: vec![0; len],
            actual: 0,
            skipped: 0,
            status: UsbPacketStatus::Success,
        }
    }

    pub fn new_out(ep: u8, data: &[u8]) -> Self {
        Self {
            pid: UsbPid::Out,
            ep,
            buf: data.to_vec(),
            actual: 0,
            skipped: 0,
            status: UsbPacketStatus::Success,
        }
    }

    pub fn pid(&self) -> UsbPid {
        self.pid
    }

    /// Endpoint number (direction bit stripped).
    pub fn ep(&self) -> u8 {
        self.ep
    }

    /// Total size of the packet buffer.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// OUT payload supplied by the host controller.
    pub fn payload(&self) -> &[u8] {
        &self.buf
    }

    /// Bytes not yet copied or skipped.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.actual - self.skipped
    }

    /// Appends `data` at the cursor, truncated to the room left. Returns the bytes copied.
    pub fn copy_in(&mut self, data: &[u8]) -> usize {
        if self.skipped != 0 {
            return 0;
        }
        let n = data.len().min(self.remaining());
        self.buf[self.actual..self.actual + n].copy_from_slice(&data[..n]);
        self.actual += n;
        n
    }

    /// Marks the next `n` bytes (at most the remainder) as not transferred.
    pub fn skip(&mut self, n: usize) {
        self.skipped += n.min(self.remaining());
    }

    pub fn actual_len(&self) -> usize {
        self.actual
    }

    pub fn skipped_len(&self) -> usize {
        self.skipped
    }

    pub fn transferred(&self) -> &[u8] {
        &self.buf[..self.actual]
    }

    pub fn into_transferred(mut self) -> Vec<u8> {
        self.buf.truncate(self.actual);
        self.buf
    }
}

/// Per-device-type behaviour invoked by the host controller.
///
/// Endpoint 0 traffic arrives already assembled as a whole control transfer through
/// [`UsbDeviceModel::handle_control_request`]; `ep` arguments of the transfer methods are endpoint
/// addresses (`0x81` for IN endpoint 1).
pub trait UsbDeviceModel {
    fn speed(&self) -> UsbSpeed {
        UsbSpeed::Full
    }

    /// Bus reset.
    fn reset(&mut self) {}

    fn handle_control_request(
        &mut self,
        setup: SetupPacket,
        data_stage: Option<&[u8]>,
    ) -> ControlResponse;

    fn handle_in_transfer(&mut self, _ep: u8, _max_len: usize) -> UsbInResult {
        UsbInResult::Stall
    }

    fn handle_out_transfer(&mut self, _ep: u8, _data: &[u8]) -> UsbOutResult {
        UsbOutResult::Stall
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
