//! Xbox Live Communicator (XBLC): a USB headset that streams mono S16LE PCM over two isochronous
//! endpoints.
//!
//! The guest selects one of five sample rates through a vendor request; both directions always run
//! at the same rate. Microphone audio comes from the host capture stream (endpoint `0x85`) and
//! speaker audio goes to the host playback stream (endpoint `0x04`). The device never blocks on the
//! host backend: capture returns whatever is queued and trims a stale backlog, playback queues
//! the whole packet.

mod bridge;
mod channels;
mod control;
mod descriptors;
mod snapshot;

use std::any::Any;
use std::sync::Arc;

use aero_audio::{AudioDirection, AudioError, AudioHost};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::desc::UsbDescState;
use crate::registry::{RegistryError, UsbDeviceRegistry, UsbDeviceTypeInfo};
use crate::usb::{
    ControlResponse, SetupPacket, UsbDeviceModel, UsbInResult, UsbOutResult, UsbPacket,
    UsbPacketStatus,
};

pub use bridge::max_queued_bytes;
pub use descriptors::XBLC_DESC;

use channels::AudioChannels;

pub const XBLC_VENDOR_ID: u16 = 0x045E;
pub const XBLC_PRODUCT_ID: u16 = 0x0283;

/// Speaker endpoint address (host → device).
pub const XBLC_EP_OUT: u8 = 0x04;
/// Microphone endpoint address (device → host).
pub const XBLC_EP_IN: u8 = 0x85;
pub const XBLC_MAX_PACKET: usize = 48;

pub const XBLC_SAMPLE_RATES: [u32; 5] = [8_000, 11_025, 16_000, 22_050, 24_000];
pub const XBLC_DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Capture backlog beyond this much audio is stale and gets dropped.
pub const XBLC_MAX_QUEUED_MS: u32 = 100;

/// `bmRequestType` of the vendor "set feature" request (host → device, vendor, interface).
pub const XBLC_REQ_TYPE_SET_FEATURE: u8 = 0x41;
pub const XBLC_REQ_SET_FEATURE: u8 = 0x03;
/// `wIndex` selectors of the vendor "set feature" request.
pub const XBLC_FEATURE_SAMPLE_RATE: u16 = 0;
pub const XBLC_FEATURE_AGC: u16 = 1;

pub const XBLC_TYPE_NAME: &str = "usb-xblc";
pub const XBLC_AUDIO_MODEL: &str = "xblc";

pub const XBLC_TYPE_INFO: UsbDeviceTypeInfo = UsbDeviceTypeInfo {
    name: XBLC_TYPE_NAME,
    description: "Microsoft Xbox Live Communicator",
    audio_model: Some(XBLC_AUDIO_MODEL),
};

/// Maps the guest's rate selector to a frequency.
pub fn sample_rate_for_index(index: u8) -> Option<u32> {
    XBLC_SAMPLE_RATES.get(index as usize).copied()
}

/// Device properties supplied by the machine configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct XblcConfig {
    /// Controller port the communicator is plugged into.
    pub index: u8,
}

impl XblcConfig {
    /// A `null` property bag means "all defaults".
    pub fn from_properties(props: &serde_json::Value) -> Result<Self, serde_json::Error> {
        if props.is_null() {
            return Ok(Self::default());
        }
        Self::deserialize(props)
    }
}

#[derive(Debug, Error)]
pub enum XblcError {
    #[error("unsupported control request {request_type:#04x}/{request:#04x} (wIndex {index})")]
    UnsupportedRequest {
        request_type: u8,
        request: u8,
        index: u16,
    },

    #[error("sample rate index {0} out of range")]
    InvalidSampleRateIndex(u8),

    #[error("failed to open {direction} channel")]
    ChannelUnavailable {
        direction: AudioDirection,
        #[source]
        source: AudioError,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum XblcPhase {
    Constructed,
    Realized,
    Unrealized,
}

pub struct UsbXblcDevice {
    config: XblcConfig,
    audio: Arc<dyn AudioHost>,
    usb: UsbDescState,
    phase: XblcPhase,
    sample_rate: u32,
    auto_gain_control: bool,
    channels: AudioChannels,
}

impl UsbXblcDevice {
    pub fn new(config: XblcConfig, audio: Arc<dyn AudioHost>) -> Self {
        Self {
            config,
            audio,
            usb: UsbDescState::default(),
            phase: XblcPhase::Constructed,
            sample_rate: XBLC_DEFAULT_SAMPLE_RATE,
            auto_gain_control: false,
            channels: AudioChannels::default(),
        }
    }

    /// Opens both host channels at the default rate. A direction the host cannot provide stays
    /// disabled; the device still enumerates.
    pub fn realize(&mut self) {
        self.sample_rate = XBLC_DEFAULT_SAMPLE_RATE;
        for direction in [AudioDirection::Capture, AudioDirection::Playback] {
            if let Err(err) = self
                .channels
                .open(self.audio.as_ref(), direction, self.sample_rate)
            {
                tracing::warn!(
                    index = self.config.index,
                    %direction,
                    error = %err,
                    source = %error_source(&err),
                    "XBLC audio channel unavailable"
                );
            }
        }
        self.phase = XblcPhase::Realized;
    }

    pub fn unrealize(&mut self) {
        self.channels.close_all();
        self.phase = XblcPhase::Unrealized;
    }

    pub fn index(&self) -> u8 {
        self.config.index
    }

    pub fn phase(&self) -> XblcPhase {
        self.phase
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn auto_gain_control(&self) -> bool {
        self.auto_gain_control
    }

    pub fn usb_state(&self) -> UsbDescState {
        self.usb
    }

    pub fn has_channel(&self, direction: AudioDirection) -> bool {
        self.channels.is_open(direction)
    }

    /// Switches both channels to `XBLC_SAMPLE_RATES[index]` without reopening them. A channel
    /// that rejects the new rate is closed.
    pub fn set_sample_rate_index(&mut self, index: u8) -> Result<u32, XblcError> {
        let rate = sample_rate_for_index(index).ok_or(XblcError::InvalidSampleRateIndex(index))?;
        self.sample_rate = rate;
        self.channels.reformat(rate);
        tracing::debug!(index = self.config.index, rate, "XBLC sample rate changed");
        Ok(rate)
    }

    /// Stored and reported only; no gain processing is applied.
    pub fn set_auto_gain_control(&mut self, enabled: bool) {
        self.auto_gain_control = enabled;
    }
}

fn error_source(err: &XblcError) -> String {
    std::error::Error::source(err)
        .map(ToString::to_string)
        .unwrap_or_default()
}

impl UsbDeviceModel for UsbXblcDevice {
    fn reset(&mut self) {
        self.channels.clear();
        self.usb = UsbDescState::default();
    }

    fn handle_control_request(
        &mut self,
        setup: SetupPacket,
        _data_stage: Option<&[u8]>,
    ) -> ControlResponse {
        self.handle_control(setup)
    }

    fn handle_in_transfer(&mut self, ep: u8, max_len: usize) -> UsbInResult {
        let mut packet = UsbPacket::new_in(ep & 0x0F, max_len);
        self.handle_data(&mut packet);
        match packet.status {
            UsbPacketStatus::Success => UsbInResult::Data(packet.into_transferred()),
            UsbPacketStatus::Stall => UsbInResult::Stall,
        }
    }

    fn handle_out_transfer(&mut self, ep: u8, data: &[u8]) -> UsbOutResult {
        let mut packet = UsbPacket::new_out(ep & 0x0F, data);
        self.handle_data(&mut packet);
        match packet.status {
            UsbPacketStatus::Success => UsbOutResult::Ack,
            UsbPacketStatus::Stall => UsbOutResult::Stall,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Installs the `usb-xblc` type. Created devices are already realized.
pub fn register(registry: &mut UsbDeviceRegistry) -> Result<(), RegistryError> {
    registry.register(XBLC_TYPE_INFO, |props, audio| {
        let config =
            XblcConfig::from_properties(props).map_err(|source| RegistryError::InvalidProperties {
                type_name: XBLC_TYPE_NAME,
                source,
            })?;
        let mut dev = UsbXblcDevice::new(config, audio);
        dev.realize();
        Ok(Box::new(dev))
    })
}
