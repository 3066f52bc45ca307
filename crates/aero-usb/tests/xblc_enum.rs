mod util;

use aero_usb::xblc::{XBLC_PRODUCT_ID, XBLC_VENDOR_ID};
use aero_usb::{ControlResponse, SetupPacket, UsbDeviceModel};

use util::{get_descriptor, realized_xblc};

const DESC_DEVICE: u8 = 0x01;
const DESC_CONFIGURATION: u8 = 0x02;
const DESC_STRING: u8 = 0x03;

fn utf16(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes[2..]
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16(&units).unwrap()
}

#[test]
fn device_descriptor_identifies_the_communicator() {
    let (_host, mut dev) = realized_xblc();
    let d = get_descriptor(&mut dev, DESC_DEVICE, 0, 18);
    assert_eq!(d.len(), 18);
    assert_eq!(u16::from_le_bytes([d[2], d[3]]), 0x0110);
    assert_eq!(d[7], 8);
    assert_eq!(u16::from_le_bytes([d[8], d[9]]), XBLC_VENDOR_ID);
    assert_eq!(u16::from_le_bytes([d[10], d[11]]), XBLC_PRODUCT_ID);
    assert_eq!(u16::from_le_bytes([d[12], d[13]]), 0x0110);
    assert_eq!(d[17], 1);
}

#[test]
fn configuration_descriptor_is_read_in_two_steps() {
    let (_host, mut dev) = realized_xblc();

    let head = get_descriptor(&mut dev, DESC_CONFIGURATION, 0, 9);
    assert_eq!(head.len(), 9);
    let total = u16::from_le_bytes([head[2], head[3]]);
    assert_eq!(total, 45);

    let full = get_descriptor(&mut dev, DESC_CONFIGURATION, 0, total);
    assert_eq!(full.len(), 45);
    assert_eq!(&full[..9], head.as_slice());

    // Two isochronous endpoints with 48-byte packets, one per interface.
    let endpoints: Vec<&[u8]> = full
        .chunks_exact(9)
        .filter(|d| d[1] == 0x05)
        .collect();
    assert_eq!(endpoints.len(), 2);
    assert_eq!(endpoints[0][2], 0x04);
    assert_eq!(endpoints[1][2], 0x85);
    for ep in endpoints {
        assert_eq!(ep[3], 0x01);
        assert_eq!(u16::from_le_bytes([ep[4], ep[5]]), 48);
        assert_eq!(ep[6], 1);
    }
}

#[test]
fn string_descriptors() {
    let (_host, mut dev) = realized_xblc();
    assert_eq!(
        get_descriptor(&mut dev, DESC_STRING, 0, 255),
        vec![4, DESC_STRING, 0x09, 0x04]
    );
    assert_eq!(utf16(&get_descriptor(&mut dev, DESC_STRING, 1, 255)), "xemu");
    assert_eq!(
        utf16(&get_descriptor(&mut dev, DESC_STRING, 2, 255)),
        "Microsoft Xbox Live Communicator"
    );
    assert_eq!(utf16(&get_descriptor(&mut dev, DESC_STRING, 3, 255)), "1");

    let missing = SetupPacket {
        request_type: 0x80,
        request: 0x06,
        value: (u16::from(DESC_STRING) << 8) | 4,
        index: 0x0409,
        length: 255,
    };
    assert_eq!(
        dev.handle_control_request(missing, None),
        ControlResponse::Stall
    );
}

#[test]
fn set_configuration_then_get_configuration() {
    let (_host, mut dev) = realized_xblc();
    let set = SetupPacket {
        request_type: 0x00,
        request: 0x09,
        value: 1,
        index: 0,
        length: 0,
    };
    assert_eq!(dev.handle_control_request(set, None), ControlResponse::Ack);

    let get = SetupPacket {
        request_type: 0x80,
        request: 0x08,
        value: 0,
        index: 0,
        length: 1,
    };
    assert_eq!(
        dev.handle_control_request(get, None),
        ControlResponse::Data(vec![1])
    );

    let get_interface = SetupPacket {
        request_type: 0x81,
        request: 0x0A,
        value: 0,
        index: 1,
        length: 1,
    };
    assert_eq!(
        dev.handle_control_request(get_interface, None),
        ControlResponse::Data(vec![0])
    );
}
