//! Stable wire constants for the backup container.
//!
//! Every value in this module is part of the on-disk format. Changing any of
//! them is a format-version change, not a tuning knob.

/// Magic marker at offset 0 of every container file.
///
/// Typed `[u8; 12]` so the type itself enforces "exactly 12 bytes" and
/// matches the header struct field.
pub const MAGIC: [u8; 12] = *b"RBUBACKUPFMT";

/// Current container format version, written little-endian at offset 12.
pub const FORMAT_VERSION: u16 = 1;

/// Highest format version this build can read.
pub const MAX_SUPPORTED_VERSION: u16 = FORMAT_VERSION;

/// Fixed file header size: magic 12 + version 2 + flags 2 + salt 16 + reserved 4.
pub const HEADER_LEN: usize = 36;

/// Fixed chunk header size: payload_len 4 + type 1 + reserved 3 + nonce 12.
pub const CHUNK_HEADER_LEN: usize = 20;

/// Random salt length in the file header.
pub const SALT_LEN: usize = 16;

/// AES-GCM nonce length, one fresh nonce per chunk.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length, appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// Derived key length (AES-256).
pub const KEY_LEN: usize = 32;

/// PBKDF2-HMAC-SHA-256 iteration count. Deliberately slow; fixed by the
/// format, so a change here requires a version bump.
pub const PBKDF2_ITERATIONS: u32 = 600_000;

/// Maximum plaintext bytes carried by a single blob part (10 MiB). Blobs
/// above this are split across multiple chunks.
pub const MAX_BLOB_PART_SIZE: usize = 10 * 1024 * 1024;

/// Chunk type identifiers (mirrored in the chunk header type byte).
pub mod chunk_type_ids {
    pub const MANIFEST: u8 = 0;
    pub const DATABASE: u8 = 1;
    pub const BLOB: u8 = 2;
}

/// Separator between the blob header JSON and the raw part bytes inside a
/// decrypted blob chunk.
pub const BLOB_HEADER_SEPARATOR: u8 = 0x00;

/// Historical SQLite bound-parameter ceiling honored by the restore adapter:
/// `columns * rows_per_batch` must stay at or below this.
pub const SQLITE_MAX_BOUND_PARAMS: usize = 999;
