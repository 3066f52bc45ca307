#![allow(dead_code)]

use std::sync::Arc;

use aero_audio::memory::{MemoryAudioHost, MemoryStreamHandle};
use aero_audio::AudioDirection;
use aero_usb::xblc::{
    UsbXblcDevice, XblcConfig, XBLC_FEATURE_AGC, XBLC_FEATURE_SAMPLE_RATE, XBLC_REQ_SET_FEATURE,
    XBLC_REQ_TYPE_SET_FEATURE,
};
use aero_usb::{ControlResponse, SetupPacket, UsbDeviceModel};

/// Routes `tracing` output through the test harness so it only shows for failing tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn realized_xblc() -> (MemoryAudioHost, UsbXblcDevice) {
    realized_xblc_on(MemoryAudioHost::new())
}

pub fn realized_xblc_on(host: MemoryAudioHost) -> (MemoryAudioHost, UsbXblcDevice) {
    init_tracing();
    let mut dev = UsbXblcDevice::new(XblcConfig::default(), Arc::new(host.clone()));
    dev.realize();
    (host, dev)
}

pub fn capture(host: &MemoryAudioHost) -> MemoryStreamHandle {
    host.live_stream(AudioDirection::Capture)
        .expect("capture stream should be open")
}

pub fn playback(host: &MemoryAudioHost) -> MemoryStreamHandle {
    host.live_stream(AudioDirection::Playback)
        .expect("playback stream should be open")
}

pub fn set_feature(index: u16, value: u16) -> SetupPacket {
    SetupPacket {
        request_type: XBLC_REQ_TYPE_SET_FEATURE,
        request: XBLC_REQ_SET_FEATURE,
        value,
        index,
        length: 0,
    }
}

pub fn set_rate_index(dev: &mut UsbXblcDevice, index: u16) -> ControlResponse {
    dev.handle_control_request(set_feature(XBLC_FEATURE_SAMPLE_RATE, index), None)
}

pub fn set_agc(dev: &mut UsbXblcDevice, on: bool) -> ControlResponse {
    dev.handle_control_request(set_feature(XBLC_FEATURE_AGC, u16::from(on)), None)
}

pub fn get_descriptor(
    dev: &mut impl UsbDeviceModel,
    desc_type: u8,
    index: u8,
    len: u16,
) -> Vec<u8> {
    let setup = SetupPacket {
        request_type: 0x80,
        request: 0x06,
        value: (u16::from(desc_type) << 8) | u16::from(index),
        index: 0,
        length: len,
    };
    match dev.handle_control_request(setup, None) {
        ControlResponse::Data(data) => data,
        other => panic!("expected descriptor data, got {other:?}"),
    }
}
