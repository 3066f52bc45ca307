//! Aero host audio capability.
//!
//! Device models never talk to an audio library directly. They open directional PCM streams
//! through an [`AudioHost`] and only use the [`AudioStream`] operations (put/get/available/clear
//! and format changes). Each backend owns the thread safety of its own stream buffers.
//!
//! [`memory::MemoryAudioHost`] is a backend with in-memory queues; hosts can feed capture data and
//! drain playback data from their own loop, and tests use it to observe device behaviour.

pub mod memory;
pub mod stream;

pub use stream::{AudioDirection, AudioError, AudioHost, AudioSpec, AudioStream, SampleFormat};
