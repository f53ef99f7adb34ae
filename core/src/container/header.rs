//! Fixed 36-byte plaintext file header.
//!
//! Design notes:
//! - Little-endian multi-byte fields, fixed offsets, reserved bytes zeroed
//!   on write for forward compatibility.
//! - The version gate runs here, before any key derivation: a file from a
//!   newer build is rejected without burning 600k PBKDF2 iterations.
//! - Decoding tolerates nonzero flags/reserved bytes (they are reserved for
//!   future versions); encoding always writes zeros.

use std::fmt;

use crate::constants::{HEADER_LEN, MAGIC, MAX_SUPPORTED_VERSION, SALT_LEN};

/// Parsed view of the container header.
///
/// ```text
/// offset  size  field
/// 0       12    magic  b"RBUBACKUPFMT"
/// 12      2     version (u16 LE)
/// 14      2     flags   (u16 LE, currently 0)
/// 16      16    salt    (random)
/// 32      4     reserved (zero)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub version: u16,
    pub flags: u16,
    pub salt: [u8; SALT_LEN],
}

impl FileHeader {
    /// Header for a fresh encode: current version, zero flags, caller salt.
    pub fn new(salt: [u8; SALT_LEN]) -> Self {
        Self {
            version: crate::constants::FORMAT_VERSION,
            flags: 0,
            salt,
        }
    }

    /// Serialize into the fixed 36-byte wire form.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..12].copy_from_slice(&MAGIC);
        out[12..14].copy_from_slice(&self.version.to_le_bytes());
        out[14..16].copy_from_slice(&self.flags.to_le_bytes());
        out[16..32].copy_from_slice(&self.salt);
        // 32..36 reserved, already zero
        out
    }

    /// Parse and validate the first 36 bytes of a container.
    pub fn decode(buf: &[u8]) -> Result<Self, HeaderError> {
        if buf.len() < HEADER_LEN {
            return Err(HeaderError::TooSmall {
                have: buf.len(),
                need: HEADER_LEN,
            });
        }

        let mut magic = [0u8; 12];
        magic.copy_from_slice(&buf[0..12]);
        if magic != MAGIC {
            return Err(HeaderError::WrongMagic { have: magic });
        }

        let version = u16::from_le_bytes([buf[12], buf[13]]);
        if version > MAX_SUPPORTED_VERSION {
            return Err(HeaderError::UnsupportedVersion { have: version });
        }

        let flags = u16::from_le_bytes([buf[14], buf[15]]);

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&buf[16..32]);

        Ok(Self {
            version,
            flags,
            salt,
        })
    }
}

/// Render byte fields as ASCII when printable, hex otherwise.
pub fn fmt_bytes(b: &[u8]) -> String {
    if b.iter().all(|&c| c.is_ascii_graphic() || c == b' ') {
        format!("b\"{}\"", String::from_utf8_lossy(b))
    } else {
        format!("0x{}", hex::encode(b))
    }
}

#[derive(Debug)]
pub enum HeaderError {
    /// Buffer shorter than the fixed header.
    TooSmall { have: usize, need: usize },

    /// Magic marker mismatch at offset 0.
    WrongMagic { have: [u8; 12] },

    /// Header version newer than this build supports.
    UnsupportedVersion { have: u16 },
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderError::TooSmall { have, need } => {
                write!(f, "container too small: {} < {}", have, need)
            }
            HeaderError::WrongMagic { have } => {
                write!(
                    f,
                    "wrong magic: expected {}, got {}",
                    fmt_bytes(&MAGIC),
                    fmt_bytes(have)
                )
            }
            HeaderError::UnsupportedVersion { have } => {
                write!(
                    f,
                    "unsupported version: {} > {}",
                    have, MAX_SUPPORTED_VERSION
                )
            }
        }
    }
}

impl std::error::Error for HeaderError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FORMAT_VERSION;

    #[test]
    fn encode_decode_round_trip() {
        let header = FileHeader::new([0xA5; SALT_LEN]);
        let wire = header.encode();
        assert_eq!(wire.len(), HEADER_LEN);
        assert_eq!(FileHeader::decode(&wire).unwrap(), header);
    }

    #[test]
    fn layout_is_stable() {
        let wire = FileHeader::new([0x11; SALT_LEN]).encode();
        assert_eq!(&wire[0..12], b"RBUBACKUPFMT");
        assert_eq!(u16::from_le_bytes([wire[12], wire[13]]), FORMAT_VERSION);
        assert_eq!(&wire[14..16], &[0, 0]);
        assert_eq!(&wire[16..32], &[0x11; 16]);
        assert_eq!(&wire[32..36], &[0, 0, 0, 0]);
    }

    #[test]
    fn too_small_is_rejected() {
        let wire = FileHeader::new([1; SALT_LEN]).encode();
        let err = FileHeader::decode(&wire[..HEADER_LEN - 1]).unwrap_err();
        assert!(matches!(err, HeaderError::TooSmall { have: 35, need: 36 }));
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut wire = FileHeader::new([1; SALT_LEN]).encode();
        wire[0] = b'X';
        assert!(matches!(
            FileHeader::decode(&wire).unwrap_err(),
            HeaderError::WrongMagic { .. }
        ));
    }

    #[test]
    fn future_version_is_rejected() {
        let mut wire = FileHeader::new([1; SALT_LEN]).encode();
        wire[12..14].copy_from_slice(&(MAX_SUPPORTED_VERSION + 1).to_le_bytes());
        assert!(matches!(
            FileHeader::decode(&wire).unwrap_err(),
            HeaderError::UnsupportedVersion { .. }
        ));
    }

    #[test]
    fn nonzero_flags_are_tolerated() {
        let mut wire = FileHeader::new([1; SALT_LEN]).encode();
        wire[14] = 0x01;
        assert_eq!(FileHeader::decode(&wire).unwrap().flags, 1);
    }

    #[test]
    fn fmt_bytes_ascii_and_binary() {
        assert_eq!(fmt_bytes(b"RBUBACKUPFMT"), "b\"RBUBACKUPFMT\"");
        assert_eq!(fmt_bytes(&[0x00, 0xFF]), "0x00ff");
    }
}
