use aero_audio::{AudioDirection, AudioSpec};

use crate::usb::{UsbPacket, UsbPacketStatus, UsbPid};

use super::channels::AudioChannels;
use super::{UsbXblcDevice, XBLC_EP_IN, XBLC_EP_OUT, XBLC_MAX_PACKET, XBLC_MAX_QUEUED_MS};

const EP_IN_NUM: u8 = XBLC_EP_IN & 0x0F;
const EP_OUT_NUM: u8 = XBLC_EP_OUT & 0x0F;

/// Capture backlog (in bytes) above which queued microphone audio is discarded.
pub fn max_queued_bytes(rate: u32) -> usize {
    AudioSpec::mono_s16le(rate).bytes_for_ms(XBLC_MAX_QUEUED_MS)
}

impl UsbXblcDevice {
    /// Services one isochronous packet. Only IN on endpoint 5 and OUT on endpoint 4 exist; any
    /// other packet is stalled.
    pub fn handle_data(&mut self, p: &mut UsbPacket) {
        match (p.pid(), p.ep()) {
            (UsbPid::In, EP_IN_NUM) => capture(&mut self.channels, self.sample_rate, p),
            (UsbPid::Out, EP_OUT_NUM) => playback(&mut self.channels, p),
            (pid, ep) => {
                tracing::error!(?pid, ep, "XBLC: unexpected data transfer");
                p.status = UsbPacketStatus::Stall;
            }
        }
    }
}

fn capture(channels: &mut AudioChannels, rate: u32, p: &mut UsbPacket) {
    let Some(stream) = channels.get_mut(AudioDirection::Capture) else {
        p.skip(p.remaining());
        return;
    };

    let mut available = stream.available().unwrap_or_else(|err| {
        tracing::debug!(error = %err, "XBLC capture: failed to query queued audio");
        0
    });

    // The guest fell behind; old microphone audio is only latency now.
    let limit = max_queued_bytes(rate);
    if available > limit {
        tracing::debug!(available, limit, "XBLC capture backlog over limit, dropping");
        if let Err(err) = stream.clear() {
            tracing::warn!(error = %err, "XBLC capture: failed to clear backlog");
        }
        available = 0;
    }

    let target = p.remaining().min(available);
    let mut chunk = [0u8; XBLC_MAX_PACKET];
    let mut copied = 0;
    while copied < target {
        let want = (target - copied).min(chunk.len());
        match stream.get(&mut chunk[..want]) {
            Ok(0) => break,
            Ok(n) => copied += p.copy_in(&chunk[..n]),
            Err(err) => {
                tracing::warn!(error = %err, copied, target, "XBLC capture: read failed");
                break;
            }
        }
    }

    p.skip(p.remaining());
}

fn playback(channels: &mut AudioChannels, p: &UsbPacket) {
    let Some(stream) = channels.get_mut(AudioDirection::Playback) else {
        tracing::debug!(len = p.len(), "XBLC playback: no channel, dropping packet");
        return;
    };
    if let Err(err) = stream.put(p.payload()) {
        tracing::warn!(error = %err, len = p.len(), "XBLC playback: write failed");
    }
}
