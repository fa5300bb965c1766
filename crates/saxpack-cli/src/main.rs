//! Saxpack CLI - compress a sound driver and splice it into a ROM image

mod pack;

use clap::Parser;
use saxpack_core::{PackError, SpliceError};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "saxpack")]
#[command(author, version, about = "Compress a sound driver and splice it into a ROM image")]
#[command(
    long_about = "Saxpack fixes up an assembled sound-driver binary using a binary settings \
file, compresses it with an external Saxman compressor, writes the compressed driver into \
the ROM at the address the settings name, and patches the decompressor's 16-bit size field.\n\n\
On success the driver binary, the settings file, and the compressed intermediate are deleted.\n\n\
Exit codes: 2 missing input, 3 malformed settings, 4 patch out of range, 5 compression \
failed, 6 compressed driver too large, 7 size-field overflow, 8 ROM smaller than the \
output address, 9 I/O failure."
)]
struct Cli {
    /// Assembled sound-driver binary to fix up and compress
    driver: PathBuf,

    /// Binary settings file: output address, space budget, size-field address, byte fixups
    settings: PathBuf,

    /// ROM image that receives the compressed driver
    rom: PathBuf,

    /// External compressor executable
    compressor: PathBuf,

    /// Primary flag passed to the compressor
    #[arg(allow_hyphen_values = true)]
    flag: String,

    /// Pass the accurate-compression token to the compressor
    #[arg(short = 'a', long)]
    accurate: bool,

    /// Append the historical stray byte to the compressed driver
    #[arg(long)]
    stray_byte: bool,

    /// Working directory for the compressor process
    #[arg(long, default_value = ".")]
    working_dir: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    let result = pack::run(
        &cli.driver,
        &cli.settings,
        &cli.rom,
        &cli.compressor,
        &cli.flag,
        cli.accurate,
        cli.stray_byte,
        &cli.working_dir,
    );
    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(exit_code(&err));
    }
}

/// Map each failure kind to a distinct exit code
fn exit_code(err: &anyhow::Error) -> i32 {
    let Some(pack_err) = err.chain().find_map(|cause| cause.downcast_ref::<PackError>()) else {
        return 1;
    };
    match pack_err {
        PackError::MissingInput { .. } => 2,
        PackError::Settings(_) => 3,
        PackError::Patch(_) => 4,
        PackError::Compress(_) => 5,
        PackError::Splice(splice_err) => match splice_err {
            SpliceError::EmptySidecar { .. } => 5,
            SpliceError::CapacityExceeded { .. } => 6,
            SpliceError::SizeOverflow { .. } => 7,
            SpliceError::DestinationTooSmall { .. } => 8,
            SpliceError::Io(_) => 9,
        },
        PackError::Io(_) => 9,
    }
}
