//! Settings blob parsing
//!
//! The assembler emits a small binary settings file describing where the
//! compressed driver goes in the ROM and which bytes of the driver binary
//! must be fixed up before compression.
//!
//! ## Format Layout
//!
//! ```text
//! [Output address: u32 BE]   offset 0
//! [Space budget: u32 BE]     offset 4
//! [Size-patch address: u32 BE] offset 8
//! [Patch instructions: 4 bytes each, until end of file]
//! ```
//!
//! Each patch instruction is `hi`, `lo`, `value`, `'>'`. The driver
//! address it targets is `(hi << 12) | lo`.

use crate::error::SettingsError;
use byteorder::{BigEndian, ReadBytesExt};
use std::io::Cursor;

/// Fixed header size preceding the instruction stream
pub const HEADER_LEN: usize = 12;

/// Size of one encoded patch instruction
pub const INSTRUCTION_LEN: usize = 4;

/// Delimiter byte terminating every patch instruction
pub const DELIMITER: u8 = b'>';

/// A single byte write into the driver binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchInstruction {
    /// Target address within the driver binary
    pub address: usize,
    /// Byte to write there
    pub value: u8,
}

/// Decoded settings file
#[derive(Debug, Clone)]
pub struct Settings {
    /// ROM address receiving the compressed driver
    pub output_address: u32,
    /// Space reserved for the compressed driver in the ROM
    pub max_length: u32,
    /// ROM address of the 16-bit size field in the decompressor
    pub patch_address: u32,
    /// Byte fixups to apply to the driver binary before compression
    pub instructions: Vec<PatchInstruction>,
}

/// Parse a settings blob
///
/// Fails on a short header, a non-`'>'` instruction delimiter, or a
/// trailing partial instruction record.
pub fn parse_settings(data: &[u8]) -> Result<Settings, SettingsError> {
    if data.len() < HEADER_LEN {
        return Err(SettingsError::TruncatedHeader { len: data.len() });
    }

    let mut header = Cursor::new(&data[..HEADER_LEN]);
    let output_address = header
        .read_u32::<BigEndian>()
        .map_err(|_| SettingsError::TruncatedHeader { len: data.len() })?;
    let max_length = header
        .read_u32::<BigEndian>()
        .map_err(|_| SettingsError::TruncatedHeader { len: data.len() })?;
    let patch_address = header
        .read_u32::<BigEndian>()
        .map_err(|_| SettingsError::TruncatedHeader { len: data.len() })?;

    let body = &data[HEADER_LEN..];
    let records = body.chunks_exact(INSTRUCTION_LEN);
    let remainder = records.remainder();
    if !remainder.is_empty() {
        return Err(SettingsError::TruncatedInstruction {
            offset: data.len() - remainder.len(),
        });
    }

    let mut instructions = Vec::with_capacity(body.len() / INSTRUCTION_LEN);
    for (index, record) in records.enumerate() {
        let offset = HEADER_LEN + index * INSTRUCTION_LEN;
        if record[3] != DELIMITER {
            return Err(SettingsError::BadDelimiter {
                offset: offset + 3,
                found: record[3],
            });
        }
        instructions.push(PatchInstruction {
            address: (usize::from(record[0]) << 12) | usize::from(record[1]),
            value: record[2],
        });
    }

    Ok(Settings {
        output_address,
        max_length,
        patch_address,
        instructions,
    })
}
