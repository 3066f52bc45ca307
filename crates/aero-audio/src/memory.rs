//! In-memory audio backend.
//!
//! Every stream is a byte queue shared between the device-side [`AudioStream`] and a
//! [`MemoryStreamHandle`] kept by the host. The host side plays the role of the audio service
//! thread: it feeds captured bytes with [`MemoryStreamHandle::feed`] and consumes rendered bytes
//! with [`MemoryStreamHandle::drain`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::stream::{AudioDirection, AudioError, AudioHost, AudioSpec, AudioStream};

/// One second of 24 kHz mono S16LE.
pub const DEFAULT_QUEUE_CAPACITY: usize = 48_000;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poison| poison.into_inner())
}

#[derive(Debug)]
struct StreamState {
    id: u64,
    direction: AudioDirection,
    spec: AudioSpec,
    running: bool,
    destroyed: bool,
    queue: VecDeque<u8>,
    capacity: usize,
    format_changes: u32,
    fail_set_format: bool,
    /// Reported by `available` in place of the real queue length.
    available_override: Option<usize>,
    fail_available: bool,
    fail_get: bool,
    fail_put: bool,
}

impl StreamState {
    fn enqueue(&mut self, data: &[u8]) {
        self.queue.extend(data);
        let excess = self.queue.len().saturating_sub(self.capacity);
        if excess > 0 {
            tracing::trace!(
                stream = self.id,
                excess,
                "memory audio queue full, dropping oldest bytes"
            );
            self.queue.drain(..excess);
        }
    }
}

#[derive(Debug, Default)]
struct HostState {
    next_id: u64,
    capacity: usize,
    fail_capture_open: bool,
    fail_playback_open: bool,
    streams: Vec<MemoryStreamHandle>,
}

/// Shared, cloneable in-memory [`AudioHost`].
#[derive(Clone, Debug)]
pub struct MemoryAudioHost {
    inner: Arc<Mutex<HostState>>,
}

impl MemoryAudioHost {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Each stream queue keeps at most `capacity` bytes; older bytes are dropped first.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HostState {
                capacity,
                ..HostState::default()
            })),
        }
    }

    /// Makes subsequent `open_stream` calls for `direction` fail.
    pub fn set_open_failure(&self, direction: AudioDirection, fail: bool) {
        let mut host = lock(&self.inner);
        match direction {
            AudioDirection::Capture => host.fail_capture_open = fail,
            AudioDirection::Playback => host.fail_playback_open = fail,
        }
    }

    /// Streams in open order. Destroyed streams stay listed until the next `open_stream` call,
    /// which prunes them.
    pub fn streams(&self) -> Vec<MemoryStreamHandle> {
        lock(&self.inner).streams.clone()
    }

    /// Most recently opened stream for `direction` that has not been destroyed.
    pub fn live_stream(&self, direction: AudioDirection) -> Option<MemoryStreamHandle> {
        lock(&self.inner)
            .streams
            .iter()
            .rev()
            .find(|s| s.direction() == direction && !s.is_destroyed())
            .cloned()
    }
}

impl Default for MemoryAudioHost {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioHost for MemoryAudioHost {
    fn open_stream(
        &self,
        direction: AudioDirection,
        spec: AudioSpec,
    ) -> Result<Box<dyn AudioStream>, AudioError> {
        let mut host = lock(&self.inner);
        let fail = match direction {
            AudioDirection::Capture => host.fail_capture_open,
            AudioDirection::Playback => host.fail_playback_open,
        };
        if fail {
            return Err(AudioError::OpenFailed {
                direction,
                reason: "device unavailable".to_string(),
            });
        }

        let id = host.next_id;
        host.next_id += 1;
        let state = Arc::new(Mutex::new(StreamState {
            id,
            direction,
            spec,
            running: false,
            destroyed: false,
            queue: VecDeque::new(),
            capacity: host.capacity,
            format_changes: 0,
            fail_set_format: false,
            available_override: None,
            fail_available: false,
            fail_get: false,
            fail_put: false,
        }));
        host.streams.retain(|s| !s.is_destroyed());
        host.streams.push(MemoryStreamHandle {
            state: state.clone(),
        });
        Ok(Box::new(MemoryStream { state }))
    }
}

/// Device-side end of a memory stream.
struct MemoryStream {
    state: Arc<Mutex<StreamState>>,
}

impl Drop for MemoryStream {
    fn drop(&mut self) {
        let mut s = lock(&self.state);
        s.destroyed = true;
        s.running = false;
        s.queue.clear();
    }
}

impl AudioStream for MemoryStream {
    fn spec(&self) -> AudioSpec {
        lock(&self.state).spec
    }

    fn set_format(&mut self, spec: AudioSpec) -> Result<(), AudioError> {
        if spec.channels == 0 || spec.freq == 0 {
            return Err(AudioError::UnsupportedFormat(spec));
        }
        let mut s = lock(&self.state);
        if s.fail_set_format {
            return Err(AudioError::Backend("set_format failed".to_string()));
        }
        s.spec = spec;
        s.format_changes += 1;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        lock(&self.state).running = true;
        Ok(())
    }

    fn put(&mut self, data: &[u8]) -> Result<(), AudioError> {
        let mut s = lock(&self.state);
        if s.fail_put {
            return Err(AudioError::Backend("put failed".to_string()));
        }
        s.enqueue(data);
        Ok(())
    }

    fn get(&mut self, buf: &mut [u8]) -> Result<usize, AudioError> {
        let mut s = lock(&self.state);
        if s.fail_get {
            return Err(AudioError::Backend("get failed".to_string()));
        }
        let n = buf.len().min(s.queue.len());
        for (dst, src) in buf.iter_mut().zip(s.queue.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }

    fn available(&self) -> Result<usize, AudioError> {
        let s = lock(&self.state);
        if s.fail_available {
            return Err(AudioError::Backend("available failed".to_string()));
        }
        Ok(s.available_override.unwrap_or(s.queue.len()))
    }

    fn clear(&mut self) -> Result<(), AudioError> {
        lock(&self.state).queue.clear();
        Ok(())
    }
}

/// Host-side view of a memory stream.
#[derive(Clone, Debug)]
pub struct MemoryStreamHandle {
    state: Arc<Mutex<StreamState>>,
}

impl MemoryStreamHandle {
    /// Unique per host, assigned in open order.
    pub fn id(&self) -> u64 {
        lock(&self.state).id
    }

    pub fn direction(&self) -> AudioDirection {
        lock(&self.state).direction
    }

    pub fn spec(&self) -> AudioSpec {
        lock(&self.state).spec
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).running
    }

    pub fn is_destroyed(&self) -> bool {
        lock(&self.state).destroyed
    }

    pub fn format_changes(&self) -> u32 {
        lock(&self.state).format_changes
    }

    pub fn queued_bytes(&self) -> usize {
        lock(&self.state).queue.len()
    }

    /// Queues bytes as if the host device produced them (capture).
    pub fn feed(&self, data: &[u8]) {
        let mut s = lock(&self.state);
        if !s.destroyed {
            s.enqueue(data);
        }
    }

    /// Consumes up to `max` queued bytes as if the host device rendered them (playback).
    pub fn drain(&self, max: usize) -> Vec<u8> {
        let mut s = lock(&self.state);
        let n = max.min(s.queue.len());
        s.queue.drain(..n).collect()
    }

    pub fn set_format_failure(&self, fail: bool) {
        lock(&self.state).fail_set_format = fail;
    }

    /// Makes `available` report `bytes` regardless of what `get` can actually deliver.
    /// `None` restores the real queue length.
    pub fn set_available_override(&self, bytes: Option<usize>) {
        lock(&self.state).available_override = bytes;
    }

    pub fn set_available_failure(&self, fail: bool) {
        lock(&self.state).fail_available = fail;
    }

    pub fn set_get_failure(&self, fail: bool) {
        lock(&self.state).fail_get = fail;
    }

    pub fn set_put_failure(&self, fail: bool) {
        lock(&self.state).fail_put = fail;
    }
}
