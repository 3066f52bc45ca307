mod util;

use aero_audio::memory::MemoryAudioHost;
use aero_audio::AudioDirection;
use aero_usb::xblc::{max_queued_bytes, XBLC_EP_IN, XBLC_EP_OUT};
use aero_usb::{UsbDeviceModel, UsbInResult, UsbOutResult, UsbPacket, UsbPacketStatus};
use proptest::prelude::*;

use util::{capture, playback, realized_xblc, realized_xblc_on, set_rate_index};

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| i as u8).collect()
}

#[test]
fn playback_queues_the_whole_packet() {
    let (host, mut dev) = realized_xblc();
    let data = pattern(48);

    assert_eq!(dev.handle_out_transfer(XBLC_EP_OUT, &data), UsbOutResult::Ack);
    assert_eq!(dev.handle_out_transfer(XBLC_EP_OUT, &data), UsbOutResult::Ack);

    let play = playback(&host);
    assert_eq!(play.queued_bytes(), 96);
    assert_eq!(play.drain(48), data);
}

#[test]
fn capture_returns_queued_audio_in_order() {
    let (host, mut dev) = realized_xblc();
    let data = pattern(100);
    capture(&host).feed(&data);

    // Larger than one chunk: the bridge keeps pulling until the request is met.
    assert_eq!(
        dev.handle_in_transfer(XBLC_EP_IN, 100),
        UsbInResult::Data(data)
    );
    assert_eq!(capture(&host).queued_bytes(), 0);
}

#[test]
fn short_capture_marks_the_rest_skipped() {
    let (host, mut dev) = realized_xblc();
    capture(&host).feed(&pattern(10));

    let mut p = UsbPacket::new_in(XBLC_EP_IN & 0x0F, 48);
    dev.handle_data(&mut p);
    assert_eq!(p.status, UsbPacketStatus::Success);
    assert_eq!(p.actual_len(), 10);
    assert_eq!(p.skipped_len(), 38);
    assert_eq!(p.transferred(), pattern(10).as_slice());
}

#[test]
fn capture_stops_when_a_read_comes_back_empty() {
    let (host, mut dev) = realized_xblc();
    let cap = capture(&host);
    cap.set_available_override(Some(100));
    cap.feed(&pattern(10));

    let mut p = UsbPacket::new_in(XBLC_EP_IN & 0x0F, 48);
    dev.handle_data(&mut p);
    assert_eq!(p.status, UsbPacketStatus::Success);
    assert_eq!(p.actual_len(), 10);
    assert_eq!(p.skipped_len(), 38);
    assert_eq!(p.transferred(), pattern(10).as_slice());

    // Across chunk boundaries the bytes delivered before the empty read are kept.
    cap.feed(&pattern(60));
    let mut p = UsbPacket::new_in(XBLC_EP_IN & 0x0F, 100);
    dev.handle_data(&mut p);
    assert_eq!(p.actual_len(), 60);
    assert_eq!(p.skipped_len(), 40);
    assert_eq!(p.transferred(), pattern(60).as_slice());
    assert_eq!(cap.queued_bytes(), 0);
}

#[test]
fn empty_capture_is_not_padded() {
    let (_host, mut dev) = realized_xblc();
    let mut p = UsbPacket::new_in(XBLC_EP_IN & 0x0F, 48);
    dev.handle_data(&mut p);
    assert_eq!(p.actual_len(), 0);
    assert_eq!(p.skipped_len(), 48);
}

#[test]
fn capture_backlog_over_100ms_is_dropped() {
    let (host, mut dev) = realized_xblc();
    let cap = capture(&host);
    cap.feed(&vec![0x55; max_queued_bytes(16_000) + 1]);

    assert_eq!(
        dev.handle_in_transfer(XBLC_EP_IN, 48),
        UsbInResult::Data(Vec::new())
    );
    assert_eq!(cap.queued_bytes(), 0);
}

#[test]
fn capture_backlog_at_the_limit_is_kept() {
    let (host, mut dev) = realized_xblc();
    let cap = capture(&host);
    cap.feed(&vec![0x55; max_queued_bytes(16_000)]);

    assert_eq!(
        dev.handle_in_transfer(XBLC_EP_IN, 48),
        UsbInResult::Data(vec![0x55; 48])
    );
    assert_eq!(cap.queued_bytes(), max_queued_bytes(16_000) - 48);
}

#[test]
fn backlog_limit_follows_the_sample_rate() {
    let (host, mut dev) = realized_xblc();
    set_rate_index(&mut dev, 0);
    let cap = capture(&host);

    // 2000 bytes is fine at 16 kHz but over 100 ms at 8 kHz.
    cap.feed(&vec![1; 2_000]);
    assert_eq!(
        dev.handle_in_transfer(XBLC_EP_IN, 48),
        UsbInResult::Data(Vec::new())
    );
    assert_eq!(cap.queued_bytes(), 0);
}

#[test]
fn backend_failures_yield_empty_packets() {
    let (host, mut dev) = realized_xblc();
    let cap = capture(&host);
    cap.feed(&pattern(48));

    cap.set_available_failure(true);
    assert_eq!(
        dev.handle_in_transfer(XBLC_EP_IN, 48),
        UsbInResult::Data(Vec::new())
    );
    cap.set_available_failure(false);

    cap.set_get_failure(true);
    assert_eq!(
        dev.handle_in_transfer(XBLC_EP_IN, 48),
        UsbInResult::Data(Vec::new())
    );
    assert_eq!(cap.queued_bytes(), 48);
    cap.set_get_failure(false);

    let play = playback(&host);
    play.set_put_failure(true);
    assert_eq!(
        dev.handle_out_transfer(XBLC_EP_OUT, &pattern(48)),
        UsbOutResult::Ack
    );
    assert_eq!(play.queued_bytes(), 0);
}

#[test]
fn missing_channels_drop_traffic_quietly() {
    let host = MemoryAudioHost::new();
    host.set_open_failure(AudioDirection::Capture, true);
    host.set_open_failure(AudioDirection::Playback, true);
    let (_host, mut dev) = realized_xblc_on(host);

    assert_eq!(
        dev.handle_in_transfer(XBLC_EP_IN, 48),
        UsbInResult::Data(Vec::new())
    );
    assert_eq!(
        dev.handle_out_transfer(XBLC_EP_OUT, &pattern(48)),
        UsbOutResult::Ack
    );
}

#[test]
fn unexpected_endpoints_stall() {
    let (host, mut dev) = realized_xblc();
    capture(&host).feed(&pattern(48));

    assert_eq!(dev.handle_in_transfer(0x84, 48), UsbInResult::Stall);
    assert_eq!(dev.handle_in_transfer(0x81, 48), UsbInResult::Stall);
    assert_eq!(
        dev.handle_out_transfer(0x05, &pattern(48)),
        UsbOutResult::Stall
    );
    assert_eq!(
        dev.handle_out_transfer(0x02, &pattern(48)),
        UsbOutResult::Stall
    );

    assert_eq!(capture(&host).queued_bytes(), 48);
    assert_eq!(playback(&host).queued_bytes(), 0);
}

proptest! {
    #[test]
    fn capture_never_exceeds_request_or_backlog(
        rate_index in 0u16..5,
        queued in 0usize..6_000,
        requested in 0usize..=96,
    ) {
        let (host, mut dev) = realized_xblc();
        set_rate_index(&mut dev, rate_index);
        let cap = capture(&host);
        cap.feed(&vec![0xA5; queued]);

        let limit = max_queued_bytes(dev.sample_rate());
        let mut p = UsbPacket::new_in(XBLC_EP_IN & 0x0F, requested);
        dev.handle_data(&mut p);

        let expected = if queued > limit { 0 } else { requested.min(queued) };
        prop_assert_eq!(p.actual_len(), expected);
        prop_assert_eq!(p.skipped_len(), requested - expected);
        prop_assert!(cap.queued_bytes() <= limit);
    }
}
