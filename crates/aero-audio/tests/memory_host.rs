use aero_audio::memory::MemoryAudioHost;
use aero_audio::{AudioDirection, AudioError, AudioHost, AudioSpec};

#[test]
fn open_failure_is_reported_per_direction() {
    let host = MemoryAudioHost::new();
    host.set_open_failure(AudioDirection::Capture, true);

    let err = host
        .open_stream(AudioDirection::Capture, AudioSpec::mono_s16le(16_000))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        AudioError::OpenFailed {
            direction: AudioDirection::Capture,
            ..
        }
    ));
    assert!(host
        .open_stream(AudioDirection::Playback, AudioSpec::mono_s16le(16_000))
        .is_ok());
    assert_eq!(host.streams().len(), 1);
}

#[test]
fn streams_start_paused_and_track_format_changes() {
    let host = MemoryAudioHost::new();
    let mut stream = host
        .open_stream(AudioDirection::Playback, AudioSpec::mono_s16le(8_000))
        .unwrap();
    let handle = host.live_stream(AudioDirection::Playback).unwrap();
    assert!(!handle.is_running());
    assert_eq!(handle.direction(), AudioDirection::Playback);

    stream.resume().unwrap();
    assert!(handle.is_running());

    stream.set_format(AudioSpec::mono_s16le(22_050)).unwrap();
    assert_eq!(stream.spec().freq, 22_050);
    assert_eq!(handle.spec().freq, 22_050);
    assert_eq!(handle.format_changes(), 1);

    let bad = AudioSpec {
        channels: 0,
        ..AudioSpec::mono_s16le(22_050)
    };
    assert!(matches!(
        stream.set_format(bad),
        Err(AudioError::UnsupportedFormat(_))
    ));
    assert_eq!(handle.format_changes(), 1);
}

#[test]
fn playback_bytes_flow_to_the_host() {
    let host = MemoryAudioHost::new();
    let mut stream = host
        .open_stream(AudioDirection::Playback, AudioSpec::mono_s16le(16_000))
        .unwrap();
    let handle = host.live_stream(AudioDirection::Playback).unwrap();

    stream.put(&[1, 2, 3]).unwrap();
    stream.put(&[4, 5]).unwrap();
    assert_eq!(stream.available().unwrap(), 5);
    assert_eq!(handle.drain(4), vec![1, 2, 3, 4]);
    assert_eq!(handle.drain(4), vec![5]);
    assert!(handle.drain(4).is_empty());
}

#[test]
fn capture_reads_are_partial_and_clear_empties() {
    let host = MemoryAudioHost::new();
    let mut stream = host
        .open_stream(AudioDirection::Capture, AudioSpec::mono_s16le(16_000))
        .unwrap();
    let handle = host.live_stream(AudioDirection::Capture).unwrap();

    let mut buf = [0u8; 4];
    assert_eq!(stream.get(&mut buf).unwrap(), 0);

    handle.feed(&[9, 8, 7, 6, 5, 4]);
    assert_eq!(stream.get(&mut buf).unwrap(), 4);
    assert_eq!(buf, [9, 8, 7, 6]);

    stream.clear().unwrap();
    assert_eq!(stream.available().unwrap(), 0);
    assert_eq!(handle.queued_bytes(), 0);
}

#[test]
fn injected_failures_surface_as_backend_errors() {
    let host = MemoryAudioHost::new();
    let mut stream = host
        .open_stream(AudioDirection::Capture, AudioSpec::mono_s16le(16_000))
        .unwrap();
    let handle = host.live_stream(AudioDirection::Capture).unwrap();
    handle.feed(&[1, 2]);

    handle.set_available_failure(true);
    assert!(matches!(stream.available(), Err(AudioError::Backend(_))));
    handle.set_get_failure(true);
    assert!(matches!(
        stream.get(&mut [0u8; 2]),
        Err(AudioError::Backend(_))
    ));
    handle.set_put_failure(true);
    assert!(matches!(stream.put(&[3]), Err(AudioError::Backend(_))));
    handle.set_format_failure(true);
    assert!(matches!(
        stream.set_format(AudioSpec::mono_s16le(8_000)),
        Err(AudioError::Backend(_))
    ));
    assert_eq!(handle.spec().freq, 16_000);

    assert_eq!(handle.queued_bytes(), 2);
}

#[test]
fn feeding_a_destroyed_stream_is_ignored() {
    let host = MemoryAudioHost::new();
    let stream = host
        .open_stream(AudioDirection::Capture, AudioSpec::mono_s16le(16_000))
        .unwrap();
    let handle = host.live_stream(AudioDirection::Capture).unwrap();
    drop(stream);

    handle.feed(&[1, 2, 3]);
    assert_eq!(handle.queued_bytes(), 0);
    assert_eq!(host.streams().len(), 1);
}

#[test]
fn available_override_can_exceed_what_get_delivers() {
    let host = MemoryAudioHost::new();
    let mut stream = host
        .open_stream(AudioDirection::Capture, AudioSpec::mono_s16le(16_000))
        .unwrap();
    let handle = host.live_stream(AudioDirection::Capture).unwrap();
    handle.feed(&[7, 8]);

    handle.set_available_override(Some(100));
    assert_eq!(stream.available().unwrap(), 100);
    let mut buf = [0u8; 48];
    assert_eq!(stream.get(&mut buf).unwrap(), 2);
    assert_eq!(stream.get(&mut buf).unwrap(), 0);

    handle.set_available_override(None);
    assert_eq!(stream.available().unwrap(), 0);
}
