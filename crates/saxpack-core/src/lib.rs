//! Saxpack Core - compress-and-splice pipeline for ROM sound drivers
//!
//! This crate patches an assembled sound-driver binary with the fixups
//! from a settings file, runs an external Saxman compressor over it, and
//! splices the compressed result plus its 16-bit size field into a ROM
//! image. The CLI crate (saxpack-cli) is a thin wrapper around
//! [`pipeline::pack`].

pub mod compress;
pub mod error;
pub mod patch;
pub mod pipeline;
pub mod settings;
pub mod splice;

// Re-export commonly used types
pub use compress::{
    sidecar_path, Compressor, ACCURATE_TOKEN, DEFAULT_TIMEOUT, SIDECAR_EXTENSION,
};
pub use error::{CompressError, PackError, PatchError, SettingsError, SpliceError};
pub use pipeline::{pack, PackOptions, PackReport};
pub use settings::{
    parse_settings, PatchInstruction, Settings, DELIMITER, HEADER_LEN, INSTRUCTION_LEN,
};
pub use splice::{MAX_SIZE_FIELD, STRAY_BYTE};
