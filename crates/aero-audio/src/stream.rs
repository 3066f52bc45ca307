use core::fmt;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioDirection {
    /// Host microphone → guest.
    Capture,
    /// Guest → host speakers.
    Playback,
}

impl fmt::Display for AudioDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioDirection::Capture => f.write_str("capture"),
            AudioDirection::Playback => f.write_str("playback"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// Signed 16-bit little-endian PCM.
    S16Le,
}

impl SampleFormat {
    pub const fn bytes_per_sample(self) -> u32 {
        match self {
            SampleFormat::S16Le => 2,
        }
    }
}

/// PCM layout of a stream as seen by the device model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AudioSpec {
    pub format: SampleFormat,
    pub channels: u8,
    pub freq: u32,
}

impl AudioSpec {
    pub const fn mono_s16le(freq: u32) -> Self {
        Self {
            format: SampleFormat::S16Le,
            channels: 1,
            freq,
        }
    }

    pub const fn bytes_per_frame(&self) -> u32 {
        self.format.bytes_per_sample() * self.channels as u32
    }

    /// Byte count covering `ms` milliseconds of audio in this layout.
    pub const fn bytes_for_ms(&self, ms: u32) -> usize {
        (self.freq as u64 * self.bytes_per_frame() as u64 * ms as u64 / 1000) as usize
    }
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to open {direction} stream: {reason}")]
    OpenFailed {
        direction: AudioDirection,
        reason: String,
    },

    #[error("unsupported stream format {0:?}")]
    UnsupportedFormat(AudioSpec),

    #[error("audio backend error: {0}")]
    Backend(String),
}

/// A directional PCM stream owned by a device model.
///
/// Calls never block: `get` returns whatever is queued right now (possibly 0 bytes) and `put`
/// queues without waiting for the backend to drain. Dropping the stream closes it.
pub trait AudioStream: Send {
    fn spec(&self) -> AudioSpec;

    /// Changes the stream layout in place. Audio already queued stays queued.
    fn set_format(&mut self, spec: AudioSpec) -> Result<(), AudioError>;

    /// Starts (or un-pauses) the backend side of the stream.
    fn resume(&mut self) -> Result<(), AudioError>;

    fn put(&mut self, data: &[u8]) -> Result<(), AudioError>;

    /// Dequeues up to `buf.len()` bytes and returns how many were written.
    fn get(&mut self, buf: &mut [u8]) -> Result<usize, AudioError>;

    /// Bytes currently queued and not yet consumed.
    fn available(&self) -> Result<usize, AudioError>;

    /// Drops all queued audio.
    fn clear(&mut self) -> Result<(), AudioError>;
}

/// Opens streams on the host's default capture/playback device.
pub trait AudioHost: Send + Sync {
    fn open_stream(
        &self,
        direction: AudioDirection,
        spec: AudioSpec,
    ) -> Result<Box<dyn AudioStream>, AudioError>;
}
