use aero_io_snapshot::io::state::{
    IoSnapshot, SnapshotError, SnapshotReader, SnapshotResult, SnapshotVersion, SnapshotWriter,
};

use crate::desc::UsbDescState;

use super::{UsbXblcDevice, XBLC_DEFAULT_SAMPLE_RATE, XBLC_SAMPLE_RATES};

// Present since 1.0.
const TAG_USB: u16 = 1;
// Added in 1.1.
const TAG_INDEX: u16 = 2;
const TAG_SAMPLE_RATE: u16 = 3;
const TAG_AGC: u16 = 4;

/// Audio streams are host resources and are never serialized. The restoring device must already
/// be realized; [`IoSnapshot::post_load`] moves its streams to the restored rate.
impl IoSnapshot for UsbXblcDevice {
    const DEVICE_ID: [u8; 4] = *b"XBLC";
    const DEVICE_VERSION: SnapshotVersion = SnapshotVersion::new(1, 1);

    fn save_state(&self) -> Vec<u8> {
        let mut w = SnapshotWriter::new(Self::DEVICE_ID, Self::DEVICE_VERSION);

        w.field_bytes(TAG_USB, self.usb.encode());
        w.field_u8(TAG_INDEX, self.config.index);
        // Every table rate fits in 16 bits.
        w.field_u16(TAG_SAMPLE_RATE, self.sample_rate as u16);
        w.field_bool(TAG_AGC, self.auto_gain_control);

        w.finish()
    }

    fn load_state(&mut self, bytes: &[u8]) -> SnapshotResult<()> {
        let r = SnapshotReader::parse(bytes, Self::DEVICE_ID)?;
        r.ensure_device_major(Self::DEVICE_VERSION.major)?;

        // Decode everything before touching the device so a bad blob leaves it unchanged.
        let usb = match r.bytes(TAG_USB) {
            Some(buf) => UsbDescState::decode(buf)?,
            None => UsbDescState::default(),
        };
        let index = r.u8(TAG_INDEX)?.unwrap_or(self.config.index);
        let sample_rate = match r.u16(TAG_SAMPLE_RATE)? {
            Some(rate) => {
                let rate = u32::from(rate);
                if !XBLC_SAMPLE_RATES.contains(&rate) {
                    return Err(SnapshotError::InvalidFieldEncoding("xblc sample rate"));
                }
                rate
            }
            None => XBLC_DEFAULT_SAMPLE_RATE,
        };
        let auto_gain_control = r.bool(TAG_AGC)?.unwrap_or(false);

        self.usb = usb;
        self.config.index = index;
        self.sample_rate = sample_rate;
        self.auto_gain_control = auto_gain_control;
        Ok(())
    }

    fn post_load(&mut self) -> SnapshotResult<()> {
        self.channels.reformat(self.sample_rate);
        tracing::debug!(
            index = self.config.index,
            rate = self.sample_rate,
            "XBLC state restored"
        );
        Ok(())
    }
}
