//! USB device models.
//!
//! The host controller side (frame scheduling, port routing) lives elsewhere; this crate only
//! contains the per-device behaviour reached through [`UsbDeviceModel`].

pub mod desc;
pub mod registry;
pub mod usb;
pub mod xblc;

pub use registry::{RegistryError, UsbDeviceRegistry, UsbDeviceTypeInfo};
pub use usb::{
    ControlResponse, SetupPacket, UsbDeviceModel, UsbInResult, UsbOutResult, UsbPacket,
    UsbPacketStatus, UsbPid, UsbSpeed,
};
