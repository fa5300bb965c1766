//! Error types for saxpack

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the pack pipeline
#[derive(Debug, Error)]
pub enum PackError {
    #[error("Unable to read input file {}", .path.display())]
    MissingInput { path: PathBuf },

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Patch error: {0}")]
    Patch(#[from] PatchError),

    #[error("Compression error: {0}")]
    Compress(#[from] CompressError),

    #[error("Splice error: {0}")]
    Splice(#[from] SpliceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors while parsing a settings blob
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings blob is {len} bytes, shorter than the 12-byte header")]
    TruncatedHeader { len: usize },

    #[error("Truncated patch instruction at offset {offset}")]
    TruncatedInstruction { offset: usize },

    #[error("Unexpected delimiter {found:#04x} at offset {offset}")]
    BadDelimiter { offset: usize, found: u8 },
}

/// Errors while applying patch instructions to the driver binary
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("Patch address {address:#x} is outside the driver binary ({len} bytes)")]
    OutOfRange { address: usize, len: usize },
}

/// Errors while running the external compressor
#[derive(Debug, Error)]
pub enum CompressError {
    #[error("Failed to launch compressor {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to wait for compressor: {0}")]
    Wait(#[source] std::io::Error),

    #[error("Compressor produced no output at {}", .path.display())]
    NoOutput { path: PathBuf },
}

/// Errors while splicing the compressed driver into the ROM image
#[derive(Debug, Error)]
pub enum SpliceError {
    #[error("ROM image is {rom_len} bytes, smaller than the driver output address {output_address:#x}")]
    DestinationTooSmall { rom_len: u64, output_address: u32 },

    #[error("Compressed driver {} is empty", .path.display())]
    EmptySidecar { path: PathBuf },

    #[error("Compressed driver does not fit: {actual:#x} bytes exceeds the {max:#x} byte budget; increase the reserved space and rebuild")]
    CapacityExceeded { actual: u64, max: u32 },

    #[error("Compressed driver size {actual:#x} does not fit in a 16-bit size field")]
    SizeOverflow { actual: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
