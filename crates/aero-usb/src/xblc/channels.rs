use aero_audio::{AudioDirection, AudioHost, AudioSpec, AudioStream};

use super::XblcError;

/// The two host streams backing the headset. A slot is `None` until opened, after a failed open
/// and after close.
#[derive(Default)]
pub(super) struct AudioChannels {
    capture: Option<Box<dyn AudioStream>>,
    playback: Option<Box<dyn AudioStream>>,
}

impl AudioChannels {
    fn slot(&mut self, direction: AudioDirection) -> &mut Option<Box<dyn AudioStream>> {
        match direction {
            AudioDirection::Capture => &mut self.capture,
            AudioDirection::Playback => &mut self.playback,
        }
    }

    /// (Re)opens `direction` on the host's default device at `rate` and starts it. Any stream
    /// already in the slot is destroyed first, so on failure the slot is left empty.
    pub fn open(
        &mut self,
        host: &dyn AudioHost,
        direction: AudioDirection,
        rate: u32,
    ) -> Result<(), XblcError> {
        self.close(direction);

        let spec = AudioSpec::mono_s16le(rate);
        let mut stream = host
            .open_stream(direction, spec)
            .map_err(|source| XblcError::ChannelUnavailable { direction, source })?;
        stream
            .resume()
            .map_err(|source| XblcError::ChannelUnavailable { direction, source })?;

        tracing::debug!(%direction, rate, "XBLC audio channel opened");
        *self.slot(direction) = Some(stream);
        Ok(())
    }

    /// Applies `rate` to every open stream in place. Queued audio and stream identity survive.
    /// A stream that rejects the new format is closed, so no open channel runs at a stale rate.
    pub fn reformat(&mut self, rate: u32) {
        let spec = AudioSpec::mono_s16le(rate);
        for direction in [AudioDirection::Capture, AudioDirection::Playback] {
            let Some(stream) = self.slot(direction) else {
                continue;
            };
            if let Err(err) = stream.set_format(spec) {
                tracing::warn!(
                    %direction,
                    rate,
                    error = %err,
                    "XBLC channel rejected new sample rate, closing it"
                );
                self.close(direction);
            }
        }
    }

    pub fn close(&mut self, direction: AudioDirection) {
        if self.slot(direction).take().is_some() {
            tracing::debug!(%direction, "XBLC audio channel closed");
        }
    }

    pub fn close_all(&mut self) {
        self.close(AudioDirection::Capture);
        self.close(AudioDirection::Playback);
    }

    /// Drops buffered audio in both directions.
    pub fn clear(&mut self) {
        for direction in [AudioDirection::Capture, AudioDirection::Playback] {
            if let Some(stream) = self.slot(direction) {
                if let Err(err) = stream.clear() {
                    tracing::debug!(%direction, error = %err, "failed to clear XBLC channel");
                }
            }
        }
    }

    pub fn is_open(&self, direction: AudioDirection) -> bool {
        match direction {
            AudioDirection::Capture => self.capture.is_some(),
            AudioDirection::Playback => self.playback.is_some(),
        }
    }

    pub fn get_mut(&mut self, direction: AudioDirection) -> Option<&mut Box<dyn AudioStream>> {
        self.slot(direction).as_mut()
    }
}
