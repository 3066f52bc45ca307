//! Deterministic snapshot encoding for I/O devices.
//!
//! Every device blob starts with a fixed 16-byte header followed by tag-length-value (TLV)
//! fields:
//! - canonical (ascending) tag order, so identical state always encodes to identical bytes
//! - unknown tags are skipped, so newer minors can add fields without breaking older readers
//! - explicit device major/minor versioning; only the major must match on restore

mod version;

pub use version::{
    codec, SnapshotError, SnapshotHeader, SnapshotReader, SnapshotResult, SnapshotVersion,
    SnapshotWriter, FORMAT_VERSION, SNAPSHOT_MAGIC,
};

/// Snapshotting contract for emulated I/O devices.
///
/// `DEVICE_ID` must stay stable forever. New fields may only be added as new TLV tags within the
/// same major version, and `load_state` must default any tag an older minor did not write.
///
/// Transient host resources (audio streams, file handles, ...) are never part of the blob. Devices
/// that need to re-derive host state from restored fields do so in [`IoSnapshot::post_load`], which
/// the framework runs after the device has been re-realized and `load_state` succeeded.
pub trait IoSnapshot {
    const DEVICE_ID: [u8; 4];
    const DEVICE_VERSION: SnapshotVersion;

    fn save_state(&self) -> Vec<u8>;
    fn load_state(&mut self, bytes: &[u8]) -> SnapshotResult<()>;

    fn post_load(&mut self) -> SnapshotResult<()> {
        Ok(())
    }

    /// `load_state` followed by `post_load`.
    fn restore_state(&mut self, bytes: &[u8]) -> SnapshotResult<()> {
        self.load_state(bytes)?;
        self.post_load()
    }
}
