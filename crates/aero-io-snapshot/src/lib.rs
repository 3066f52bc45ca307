//! Versioned, deterministic snapshot encoding for emulated I/O devices.

pub mod io;
