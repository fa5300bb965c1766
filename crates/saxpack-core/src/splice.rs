//! ROM splicing
//!
//! Writes the compressed driver into the ROM image and patches the 16-bit
//! size field the decompressor reads at boot. The two writes are separate
//! open/seek/write sessions with no atomicity across them: a crash in
//! between leaves a correct payload with a stale size field, or vice
//! versa.

use crate::error::SpliceError;
use byteorder::{BigEndian, WriteBytesExt};
use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

/// Byte appended in stray-byte mode
///
/// Certain historical driver builds shipped with one extra byte after the
/// compressed stream, and their decompressors depend on it. Stray-byte
/// mode reproduces that output bit-for-bit.
pub const STRAY_BYTE: u8 = 0x4E;

/// Largest length the 16-bit size field can hold
pub const MAX_SIZE_FIELD: u64 = u16::MAX as u64;

/// Splice a compressed driver into the ROM image
///
/// Validates the compressed size against the reserved space, optionally
/// appends the stray byte, writes the payload at `output_address`, and
/// writes the big-endian size field at `patch_address`. Returns the final
/// payload length. On any validation failure the ROM is left untouched.
pub fn splice(
    rom: &Path,
    sidecar: &Path,
    output_address: u32,
    max_length: u32,
    patch_address: u32,
    stray_byte: bool,
) -> Result<u64, SpliceError> {
    let rom_len = fs::metadata(rom)?.len();
    if rom_len < u64::from(output_address) {
        return Err(SpliceError::DestinationTooSmall {
            rom_len,
            output_address,
        });
    }

    let mut actual_length = fs::metadata(sidecar)?.len();
    if actual_length == 0 {
        return Err(SpliceError::EmptySidecar {
            path: sidecar.to_path_buf(),
        });
    }

    if stray_byte {
        let mut file = OpenOptions::new().append(true).open(sidecar)?;
        file.write_all(&[STRAY_BYTE])?;
        actual_length += 1;
    }

    if actual_length > u64::from(max_length) {
        return Err(SpliceError::CapacityExceeded {
            actual: actual_length,
            max: max_length,
        });
    }
    if actual_length > MAX_SIZE_FIELD {
        return Err(SpliceError::SizeOverflow {
            actual: actual_length,
        });
    }

    let payload = fs::read(sidecar)?;

    // First session: the compressed payload
    let mut image = OpenOptions::new().write(true).open(rom)?;
    image.seek(SeekFrom::Start(u64::from(output_address)))?;
    image.write_all(&payload)?;
    drop(image);

    // Second session: the size field the decompressor reads
    let mut image = OpenOptions::new().write(true).open(rom)?;
    image.seek(SeekFrom::Start(u64::from(patch_address)))?;
    image.write_u16::<BigEndian>(actual_length as u16)?;

    Ok(actual_length)
}
