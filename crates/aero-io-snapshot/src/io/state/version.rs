use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

pub mod codec;

/// Magic prefix of every `aero-io-snapshot` device blob.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"AERO";

/// Version of the container format itself (header + TLV framing), independent of device versions.
pub const FORMAT_VERSION: SnapshotVersion = SnapshotVersion::new(1, 0);

const HEADER_LEN: usize = 16;
// tag (u16) + len (u32)
const FIELD_HEADER_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotVersion {
    pub major: u16,
    pub minor: u16,
}

impl SnapshotVersion {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for SnapshotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub format_version: SnapshotVersion,
    pub device_id: [u8; 4],
    pub device_version: SnapshotVersion,
}

impl SnapshotHeader {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&SNAPSHOT_MAGIC);
        out.extend_from_slice(&self.format_version.major.to_le_bytes());
        out.extend_from_slice(&self.format_version.minor.to_le_bytes());
        out.extend_from_slice(&self.device_id);
        out.extend_from_slice(&self.device_version.major.to_le_bytes());
        out.extend_from_slice(&self.device_version.minor.to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> SnapshotResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(SnapshotError::UnexpectedEof);
        }
        if bytes[0..4] != SNAPSHOT_MAGIC {
            return Err(SnapshotError::InvalidMagic);
        }
        let u16_at = |off: usize| u16::from_le_bytes([bytes[off], bytes[off + 1]]);
        Ok(Self {
            format_version: SnapshotVersion::new(u16_at(4), u16_at(6)),
            device_id: [bytes[8], bytes[9], bytes[10], bytes[11]],
            device_version: SnapshotVersion::new(u16_at(12), u16_at(14)),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("unexpected end of snapshot data")]
    UnexpectedEof,

    #[error("invalid snapshot magic")]
    InvalidMagic,

    #[error("unsupported snapshot format version {found}")]
    UnsupportedFormatVersion { found: SnapshotVersion },

    #[error(
        "device id mismatch (expected {}, found {})",
        .expected.escape_ascii(),
        .found.escape_ascii()
    )]
    DeviceIdMismatch { expected: [u8; 4], found: [u8; 4] },

    #[error("unsupported device major version {found} (supported {supported})")]
    UnsupportedDeviceMajorVersion { found: u16, supported: u16 },

    #[error("duplicate field tag {0}")]
    DuplicateFieldTag(u16),

    #[error("invalid field encoding: {0}")]
    InvalidFieldEncoding(&'static str),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Builds a device blob. Fields may be written in any order; `finish` emits them sorted by tag.
#[derive(Debug)]
pub struct SnapshotWriter {
    header: SnapshotHeader,
    fields: BTreeMap<u16, Vec<u8>>,
}

impl SnapshotWriter {
    pub fn new(device_id: [u8; 4], device_version: SnapshotVersion) -> Self {
        Self {
            header: SnapshotHeader {
                format_version: FORMAT_VERSION,
                device_id,
                device_version,
            },
            fields: BTreeMap::new(),
        }
    }

    pub fn field_u8(&mut self, tag: u16, v: u8) {
        self.field_bytes(tag, vec![v]);
    }

    pub fn field_u16(&mut self, tag: u16, v: u16) {
        self.field_bytes(tag, v.to_le_bytes().to_vec());
    }

    pub fn field_u32(&mut self, tag: u16, v: u32) {
        self.field_bytes(tag, v.to_le_bytes().to_vec());
    }

    pub fn field_u64(&mut self, tag: u16, v: u64) {
        self.field_bytes(tag, v.to_le_bytes().to_vec());
    }

    pub fn field_bool(&mut self, tag: u16, v: bool) {
        self.field_u8(tag, v as u8);
    }

    /// Writing the same tag twice keeps the last value.
    pub fn field_bytes(&mut self, tag: u16, v: Vec<u8>) {
        self.fields.insert(tag, v);
    }

    pub fn finish(self) -> Vec<u8> {
        let body_len: usize = self
            .fields
            .values()
            .map(|v| FIELD_HEADER_LEN + v.len())
            .sum();
        let mut out = Vec::with_capacity(HEADER_LEN + body_len);
        self.header.encode(&mut out);
        for (tag, value) in &self.fields {
            out.extend_from_slice(&tag.to_le_bytes());
            out.extend_from_slice(&(value.len() as u32).to_le_bytes());
            out.extend_from_slice(value);
        }
        out
    }
}

/// Parsed view over a device blob. Field accessors return `Ok(None)` for absent tags so callers
/// can default fields that older minors did not write.
#[derive(Debug)]
pub struct SnapshotReader<'a> {
    header: SnapshotHeader,
    fields: BTreeMap<u16, &'a [u8]>,
}

impl<'a> SnapshotReader<'a> {
    pub fn parse(bytes: &'a [u8], expected_device_id: [u8; 4]) -> SnapshotResult<Self> {
        let header = SnapshotHeader::decode(bytes)?;
        if header.format_version.major != FORMAT_VERSION.major {
            return Err(SnapshotError::UnsupportedFormatVersion {
                found: header.format_version,
            });
        }
        if header.device_id != expected_device_id {
            return Err(SnapshotError::DeviceIdMismatch {
                expected: expected_device_id,
                found: header.device_id,
            });
        }

        let mut fields = BTreeMap::new();
        let mut rest = &bytes[HEADER_LEN..];
        while !rest.is_empty() {
            if rest.len() < FIELD_HEADER_LEN {
                return Err(SnapshotError::UnexpectedEof);
            }
            let tag = u16::from_le_bytes([rest[0], rest[1]]);
            let len = u32::from_le_bytes([rest[2], rest[3], rest[4], rest[5]]) as usize;
            rest = &rest[FIELD_HEADER_LEN..];
            if rest.len() < len {
                return Err(SnapshotError::UnexpectedEof);
            }
            let (value, tail) = rest.split_at(len);
            if fields.insert(tag, value).is_some() {
                return Err(SnapshotError::DuplicateFieldTag(tag));
            }
            rest = tail;
        }

        Ok(Self { header, fields })
    }

    pub fn header(&self) -> &SnapshotHeader {
        &self.header
    }

    pub fn ensure_device_major(&self, supported: u16) -> SnapshotResult<()> {
        let found = self.header.device_version.major;
        if found != supported {
            return Err(SnapshotError::UnsupportedDeviceMajorVersion { found, supported });
        }
        Ok(())
    }

    pub fn bytes(&self, tag: u16) -> Option<&'a [u8]> {
        self.fields.get(&tag).copied()
    }

    pub fn u8(&self, tag: u16) -> SnapshotResult<Option<u8>> {
        self.fixed::<1>(tag, "u8").map(|v| v.map(|[b]| b))
    }

    pub fn u16(&self, tag: u16) -> SnapshotResult<Option<u16>> {
        self.fixed(tag, "u16").map(|v| v.map(u16::from_le_bytes))
    }

    pub fn u32(&self, tag: u16) -> SnapshotResult<Option<u32>> {
        self.fixed(tag, "u32").map(|v| v.map(u32::from_le_bytes))
    }

    pub fn u64(&self, tag: u16) -> SnapshotResult<Option<u64>> {
        self.fixed(tag, "u64").map(|v| v.map(u64::from_le_bytes))
    }

    pub fn bool(&self, tag: u16) -> SnapshotResult<Option<bool>> {
        match self.u8(tag)? {
            None => Ok(None),
            Some(0) => Ok(Some(false)),
            Some(1) => Ok(Some(true)),
            Some(_) => Err(SnapshotError::InvalidFieldEncoding("bool")),
        }
    }

    fn fixed<const N: usize>(
        &self,
        tag: u16,
        what: &'static str,
    ) -> SnapshotResult<Option<[u8; N]>> {
        let Some(value) = self.bytes(tag) else {
            return Ok(None);
        };
        let arr: [u8; N] = value
            .try_into()
            .map_err(|_| SnapshotError::InvalidFieldEncoding(what))?;
        Ok(Some(arr))
    }
}
