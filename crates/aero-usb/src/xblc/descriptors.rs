use crate::desc::{
    UsbDesc, UsbDescConfig, UsbDescDevice, UsbDescEndpoint, UsbDescId, UsbDescIface,
    USB_CFG_ATT_ONE,
};
use crate::usb::USB_ENDPOINT_XFER_ISOC;

use super::{XBLC_EP_IN, XBLC_EP_OUT, XBLC_MAX_PACKET, XBLC_PRODUCT_ID, XBLC_VENDOR_ID};

const XBLC_INTERFACE_CLASS: u8 = 0x78;

const STR_MANUFACTURER: u8 = 1;
const STR_PRODUCT: u8 = 2;
const STR_SERIAL_NUMBER: u8 = 3;

static XBLC_STRINGS: [&str; 3] = ["xemu", "Microsoft Xbox Live Communicator", "1"];

const fn iso_endpoint(address: u8) -> UsbDescEndpoint {
    UsbDescEndpoint {
        address,
        attributes: USB_ENDPOINT_XFER_ISOC,
        max_packet_size: XBLC_MAX_PACKET as u16,
        interval: 1,
        is_audio: true,
        refresh: 0,
        synch_address: 0,
    }
}

static XBLC_OUT_ENDPOINTS: [UsbDescEndpoint; 1] = [iso_endpoint(XBLC_EP_OUT)];
static XBLC_IN_ENDPOINTS: [UsbDescEndpoint; 1] = [iso_endpoint(XBLC_EP_IN)];

static XBLC_INTERFACES: [UsbDescIface; 2] = [
    UsbDescIface {
        number: 0,
        alternate: 0,
        class: XBLC_INTERFACE_CLASS,
        subclass: 0x00,
        protocol: 0x00,
        endpoints: &XBLC_OUT_ENDPOINTS,
    },
    UsbDescIface {
        number: 1,
        alternate: 0,
        class: XBLC_INTERFACE_CLASS,
        subclass: 0x00,
        protocol: 0x00,
        endpoints: &XBLC_IN_ENDPOINTS,
    },
];

static XBLC_CONFIGS: [UsbDescConfig; 1] = [UsbDescConfig {
    value: 1,
    attributes: USB_CFG_ATT_ONE,
    max_power: 100,
    interfaces: &XBLC_INTERFACES,
}];

static XBLC_DEVICE: UsbDescDevice = UsbDescDevice {
    bcd_usb: 0x0110,
    class: 0,
    subclass: 0,
    protocol: 0,
    max_packet_size0: 8,
    configs: &XBLC_CONFIGS,
};

pub static XBLC_DESC: UsbDesc = UsbDesc {
    id: UsbDescId {
        vendor: XBLC_VENDOR_ID,
        product: XBLC_PRODUCT_ID,
        bcd_device: 0x0110,
        manufacturer_str: STR_MANUFACTURER,
        product_str: STR_PRODUCT,
        serial_str: STR_SERIAL_NUMBER,
    },
    full: &XBLC_DEVICE,
    strings: &XBLC_STRINGS,
};
