//! `saxpack` pipeline driver

use anyhow::{Context, Result};
use saxpack_core::{pack, PackOptions};
use std::path::Path;

#[allow(clippy::too_many_arguments)]
pub fn run(
    driver: &Path,
    settings: &Path,
    rom: &Path,
    compressor: &Path,
    flag: &str,
    accurate: bool,
    stray_byte: bool,
    working_dir: &Path,
) -> Result<()> {
    println!("Packing sound driver...");
    println!("  Driver: {}", driver.display());
    println!("  Settings: {}", settings.display());
    println!("  ROM: {}", rom.display());
    println!("  Compressor: {}", compressor.display());
    if accurate {
        println!("  Accurate mode: enabled");
    }
    if stray_byte {
        println!("  Stray byte: enabled");
    }

    let options = PackOptions::new(driver, settings, rom, compressor, flag)
        .with_accurate(accurate)
        .with_stray_byte(stray_byte)
        .with_working_dir(working_dir);

    let report = pack(&options).context("Failed to pack sound driver")?;

    println!();
    println!("Driver packed successfully!");
    println!("  Byte fixups:     {:>8}", report.patched);
    println!(
        "  Compressed size: {:>8} bytes (${:X})",
        report.compressed_len, report.compressed_len
    );
    println!(
        "  Space budget:    {:>8} bytes (${:X})",
        report.max_length, report.max_length
    );
    println!("  Output address:  ${:X}", report.output_address);
    println!("  Size field at:   ${:X}", report.patch_address);

    Ok(())
}
