//! Static USB descriptor tables and the standard (chapter 9) request handling shared by all device
//! models.
//!
//! A device model describes itself with a `static` [`UsbDesc`] tree and keeps a [`UsbDescState`]
//! for the per-instance bits (bus address, active configuration, remote wakeup). Control requests
//! go to [`UsbDescState::handle_standard_request`] first; anything it does not recognise is left
//! to the device's class/vendor logic.

use aero_io_snapshot::io::state::codec::{Decoder, Encoder};
use aero_io_snapshot::io::state::{SnapshotError, SnapshotResult};

use crate::usb::{ControlResponse, SetupPacket};

const REQ_GET_STATUS: u8 = 0x00;
const REQ_CLEAR_FEATURE: u8 = 0x01;
const REQ_SET_FEATURE: u8 = 0x03;
const REQ_SET_ADDRESS: u8 = 0x05;
const REQ_GET_DESCRIPTOR: u8 = 0x06;
const REQ_GET_CONFIGURATION: u8 = 0x08;
const REQ_SET_CONFIGURATION: u8 = 0x09;
const REQ_GET_INTERFACE: u8 = 0x0A;
const REQ_SET_INTERFACE: u8 = 0x0B;

const FEATURE_DEVICE_REMOTE_WAKEUP: u16 = 0x0001;

pub const DESC_DEVICE: u8 = 0x01;
pub const DESC_CONFIGURATION: u8 = 0x02;
pub const DESC_STRING: u8 = 0x03;
pub const DESC_INTERFACE: u8 = 0x04;
pub const DESC_ENDPOINT: u8 = 0x05;

/// `bmAttributes` bit 7, reserved and always set.
pub const USB_CFG_ATT_ONE: u8 = 0x80;
pub const USB_CFG_ATT_SELFPOWER: u8 = 0x40;

const LANGID_EN_US: u16 = 0x0409;

#[derive(Clone, Copy, Debug)]
pub struct UsbDescEndpoint {
    pub address: u8,
    pub attributes: u8,
    pub max_packet_size: u16,
    pub interval: u8,
    /// Audio class endpoints carry `bRefresh`/`bSynchAddress` (9-byte descriptor).
    pub is_audio: bool,
    pub refresh: u8,
    pub synch_address: u8,
}

#[derive(Clone, Copy, Debug)]
pub struct UsbDescIface {
    pub number: u8,
    pub alternate: u8,
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
    pub endpoints: &'static [UsbDescEndpoint],
}

#[derive(Clone, Copy, Debug)]
pub struct UsbDescConfig {
    pub value: u8,
    pub attributes: u8,
    /// Raw `bMaxPower` (2 mA units).
    pub max_power: u8,
    pub interfaces: &'static [UsbDescIface],
}

#[derive(Clone, Copy, Debug)]
pub struct UsbDescDevice {
    pub bcd_usb: u16,
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
    pub max_packet_size0: u8,
    pub configs: &'static [UsbDescConfig],
}

#[derive(Clone, Copy, Debug)]
pub struct UsbDescId {
    pub vendor: u16,
    pub product: u16,
    pub bcd_device: u16,
    pub manufacturer_str: u8,
    pub product_str: u8,
    pub serial_str: u8,
}

#[derive(Clone, Copy, Debug)]
pub struct UsbDesc {
    pub id: UsbDescId,
    pub full: &'static UsbDescDevice,
    /// String descriptor `n` is `strings[n - 1]`; index 0 is the language ID table.
    pub strings: &'static [&'static str],
}

impl UsbDesc {
    pub fn device_descriptor(&self) -> [u8; 18] {
        let dev = self.full;
        let [usb0, usb1] = dev.bcd_usb.to_le_bytes();
        let [v0, v1] = self.id.vendor.to_le_bytes();
        let [p0, p1] = self.id.product.to_le_bytes();
        let [d0, d1] = self.id.bcd_device.to_le_bytes();
        [
            18,
            DESC_DEVICE,
            usb0,
            usb1,
            dev.class,
            dev.subclass,
            dev.protocol,
            dev.max_packet_size0,
            v0,
            v1,
            p0,
            p1,
            d0,
            d1,
            self.id.manufacturer_str,
            self.id.product_str,
            self.id.serial_str,
            dev.configs.len() as u8,
        ]
    }

    /// Full configuration descriptor (configuration + interfaces + endpoints).
    pub fn configuration_descriptor(&self, index: u8) -> Option<Vec<u8>> {
        let conf = self.full.configs.get(index as usize)?;

        let mut out = vec![
            9,
            DESC_CONFIGURATION,
            0, // wTotalLength, patched below
            0,
            conf.interfaces.len() as u8,
            conf.value,
            0,
            conf.attributes,
            conf.max_power,
        ];
        for iface in conf.interfaces {
            out.extend_from_slice(&[
                9,
                DESC_INTERFACE,
                iface.number,
                iface.alternate,
                iface.endpoints.len() as u8,
                iface.class,
                iface.subclass,
                iface.protocol,
                0,
            ]);
            for ep in iface.endpoints {
                let [m0, m1] = ep.max_packet_size.to_le_bytes();
                if ep.is_audio {
                    out.extend_from_slice(&[
                        9,
                        DESC_ENDPOINT,
                        ep.address,
                        ep.attributes,
                        m0,
                        m1,
                        ep.interval,
                        ep.refresh,
                        ep.synch_address,
                    ]);
                } else {
                    out.extend_from_slice(&[
                        7,
                        DESC_ENDPOINT,
                        ep.address,
                        ep.attributes,
                        m0,
                        m1,
                        ep.interval,
                    ]);
                }
            }
        }

        let [t0, t1] = (out.len() as u16).to_le_bytes();
        out[2] = t0;
        out[3] = t1;
        Some(out)
    }

    pub fn string_descriptor(&self, index: u8) -> Option<Vec<u8>> {
        if index == 0 {
            return Some(string_descriptor_langid(LANGID_EN_US).to_vec());
        }
        let s = self.strings.get(index as usize - 1)?;
        Some(string_descriptor_utf16le(s))
    }

    fn interface_count(&self, configuration: u8) -> usize {
        self.full
            .configs
            .iter()
            .find(|c| c.value == configuration)
            .map_or(0, |c| c.interfaces.len())
    }
}

fn string_descriptor_utf16le(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + s.len() * 2);
    out.push(0); // bLength placeholder
    out.push(DESC_STRING);
    for unit in s.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out[0] = out.len() as u8;
    out
}

fn string_descriptor_langid(langid: u16) -> [u8; 4] {
    let [l0, l1] = langid.to_le_bytes();
    [4, DESC_STRING, l0, l1]
}

/// Per-instance state owned by the standard request handler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UsbDescState {
    pub address: u8,
    pub configuration: u8,
    pub remote_wakeup: bool,
}

impl UsbDescState {
    /// Returns `None` when `setup` is not a standard request this handler owns, so the caller can
    /// try its own class/vendor handling.
    pub fn handle_standard_request(
        &mut self,
        desc: &UsbDesc,
        setup: SetupPacket,
    ) -> Option<ControlResponse> {
        let data = |mut v: Vec<u8>| {
            v.truncate(setup.length as usize);
            Some(ControlResponse::Data(v))
        };

        match (setup.request_type, setup.request) {
            (0x80, REQ_GET_DESCRIPTOR) => {
                let desc_type = (setup.value >> 8) as u8;
                let index = (setup.value & 0xFF) as u8;
                match desc_type {
                    DESC_DEVICE => data(desc.device_descriptor().to_vec()),
                    DESC_CONFIGURATION => data(desc.configuration_descriptor(index)?),
                    DESC_STRING => data(desc.string_descriptor(index)?),
                    _ => None,
                }
            }
            (0x80, REQ_GET_STATUS) => {
                let mut status = 0u16;
                let self_powered = desc
                    .full
                    .configs
                    .first()
                    .is_some_and(|c| c.attributes & USB_CFG_ATT_SELFPOWER != 0);
                if self_powered {
                    status |= 1 << 0;
                }
                if self.remote_wakeup {
                    status |= 1 << 1;
                }
                data(status.to_le_bytes().to_vec())
            }
            (0x80, REQ_GET_CONFIGURATION) => data(vec![self.configuration]),
            (0x00, REQ_SET_CONFIGURATION) => {
                let cfg = (setup.value & 0xFF) as u8;
                if cfg != 0 && !desc.full.configs.iter().any(|c| c.value == cfg) {
                    return None;
                }
                self.configuration = cfg;
                Some(ControlResponse::Ack)
            }
            (0x00, REQ_SET_ADDRESS) => {
                if setup.value > 127 {
                    return None;
                }
                self.address = setup.value as u8;
                Some(ControlResponse::Ack)
            }
            (0x00, REQ_SET_FEATURE) if setup.value == FEATURE_DEVICE_REMOTE_WAKEUP => {
                self.remote_wakeup = true;
                Some(ControlResponse::Ack)
            }
            (0x00, REQ_CLEAR_FEATURE) if setup.value == FEATURE_DEVICE_REMOTE_WAKEUP => {
                self.remote_wakeup = false;
                Some(ControlResponse::Ack)
            }
            (0x81, REQ_GET_STATUS) | (0x82, REQ_GET_STATUS) => data(vec![0, 0]),
            (0x81, REQ_GET_INTERFACE) => {
                if (setup.index as usize) < desc.interface_count(self.configuration) {
                    data(vec![0])
                } else {
                    None
                }
            }
            (0x01, REQ_SET_INTERFACE) => {
                let known = (setup.index as usize) < desc.interface_count(self.configuration);
                (known && setup.value == 0).then_some(ControlResponse::Ack)
            }
            _ => None,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        Encoder::new()
            .u8(self.address)
            .u8(self.configuration)
            .bool(self.remote_wakeup)
            .finish()
    }

    pub fn decode(buf: &[u8]) -> SnapshotResult<Self> {
        let mut d = Decoder::new(buf);
        let state = Self {
            address: d.u8()?,
            configuration: d.u8()?,
            remote_wakeup: d.bool()?,
        };
        d.finish()?;
        if state.address > 127 {
            return Err(SnapshotError::InvalidFieldEncoding("invalid usb address"));
        }
        Ok(state)
    }
}
