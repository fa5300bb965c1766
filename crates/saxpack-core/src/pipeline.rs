//! The pack pipeline
//!
//! Strictly forward sequence: parse settings, fix up the driver binary,
//! compress it with the external compressor, splice the result into the
//! ROM. Any failure aborts the run. There is no rollback: a driver binary
//! already overwritten with its patched bytes stays that way if a later
//! stage fails.

use crate::compress::{Compressor, DEFAULT_TIMEOUT};
use crate::error::{PackError, SpliceError};
use crate::settings::parse_settings;
use crate::{patch, splice};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Inputs and switches for one pack run
#[derive(Debug, Clone)]
pub struct PackOptions {
    /// Assembled driver binary; patched in place, deleted on success
    pub driver: PathBuf,
    /// Binary settings file; deleted on success
    pub settings: PathBuf,
    /// ROM image to splice into
    pub rom: PathBuf,
    /// External compressor executable
    pub compressor: PathBuf,
    /// Primary flag passed to the compressor
    pub compressor_flag: String,
    /// Pass the accurate-compression mode token
    pub accurate: bool,
    /// Append the historical stray byte to the compressed driver
    pub stray_byte: bool,
    /// Working directory for the compressor process
    pub working_dir: PathBuf,
    /// Kill timeout for the compressor process
    pub timeout: Duration,
}

impl PackOptions {
    /// Create options with default switches
    pub fn new(
        driver: impl Into<PathBuf>,
        settings: impl Into<PathBuf>,
        rom: impl Into<PathBuf>,
        compressor: impl Into<PathBuf>,
        compressor_flag: impl Into<String>,
    ) -> Self {
        Self {
            driver: driver.into(),
            settings: settings.into(),
            rom: rom.into(),
            compressor: compressor.into(),
            compressor_flag: compressor_flag.into(),
            accurate: false,
            stray_byte: false,
            working_dir: PathBuf::from("."),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Enable the accurate-compression mode token
    pub fn with_accurate(mut self, accurate: bool) -> Self {
        self.accurate = accurate;
        self
    }

    /// Enable stray-byte mode
    pub fn with_stray_byte(mut self, stray_byte: bool) -> Self {
        self.stray_byte = stray_byte;
        self
    }

    /// Set the compressor's working directory
    pub fn with_working_dir(mut self, working_dir: impl Into<PathBuf>) -> Self {
        self.working_dir = working_dir.into();
        self
    }

    /// Override the compressor kill timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Outcome of a successful pack run
#[derive(Debug, Clone, Copy)]
pub struct PackReport {
    /// Final payload length, including the stray byte if appended
    pub compressed_len: u64,
    /// ROM address the payload was written to
    pub output_address: u32,
    /// ROM address of the size field
    pub patch_address: u32,
    /// Space that was reserved for the payload
    pub max_length: u32,
    /// Number of byte fixups applied to the driver
    pub patched: usize,
}

/// Run the whole pipeline
///
/// On success the sidecar, the patched driver binary, and the settings
/// file are deleted; only the spliced ROM remains.
pub fn pack(options: &PackOptions) -> Result<PackReport, PackError> {
    for path in [&options.driver, &options.settings, &options.rom] {
        if !path.is_file() {
            return Err(PackError::MissingInput { path: path.clone() });
        }
    }

    let raw = fs::read(&options.settings)?;
    let settings = parse_settings(&raw)?;

    // Bail out before touching the driver if the ROM cannot hold it
    let rom_len = fs::metadata(&options.rom)?.len();
    if rom_len < u64::from(settings.output_address) {
        return Err(SpliceError::DestinationTooSmall {
            rom_len,
            output_address: settings.output_address,
        }
        .into());
    }

    let mut driver = fs::read(&options.driver)?;
    patch::apply(&mut driver, &settings.instructions)?;
    fs::write(&options.driver, &driver)?;

    let sidecar = Compressor::new(
        &options.compressor,
        &options.compressor_flag,
        &options.working_dir,
    )
    .with_accurate(options.accurate)
    .with_timeout(options.timeout)
    .run(&options.driver)?;

    let compressed_len = splice::splice(
        &options.rom,
        &sidecar,
        settings.output_address,
        settings.max_length,
        settings.patch_address,
        options.stray_byte,
    )?;

    fs::remove_file(&sidecar)?;
    fs::remove_file(&options.driver)?;
    fs::remove_file(&options.settings)?;

    Ok(PackReport {
        compressed_len,
        output_address: settings.output_address,
        patch_address: settings.patch_address,
        max_length: settings.max_length,
        patched: settings.instructions.len(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::{CompressError, SettingsError};
    use std::path::Path;
    use tempfile::TempDir;

    fn write_script(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("compressor.sh");
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn settings_blob(
        output_address: u32,
        max_length: u32,
        patch_address: u32,
        instructions: &[[u8; 4]],
    ) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&output_address.to_be_bytes());
        data.extend_from_slice(&max_length.to_be_bytes());
        data.extend_from_slice(&patch_address.to_be_bytes());
        for record in instructions {
            data.extend_from_slice(record);
        }
        data
    }

    struct Fixture {
        dir: TempDir,
        options: PackOptions,
    }

    /// Driver `[0,0,0,0]`, 16-byte ROM, compressor emitting `[1,2,3]`
    fn fixture(settings: &[u8]) -> Fixture {
        let dir = TempDir::new().unwrap();
        let driver = dir.path().join("driver.bin");
        let settings_path = dir.path().join("driver.set");
        let rom = dir.path().join("image.bin");
        fs::write(&driver, [0x00, 0x00, 0x00, 0x00]).unwrap();
        fs::write(&settings_path, settings).unwrap();
        fs::write(&rom, vec![0u8; 16]).unwrap();
        let script = write_script(
            dir.path(),
            "#!/bin/sh\nprintf '\\001\\002\\003' > \"$3\"\n",
        );
        let options = PackOptions::new(driver, settings_path, rom, script, "-c")
            .with_working_dir(dir.path());
        Fixture { dir, options }
    }

    #[test]
    fn test_pack_end_to_end() {
        let fx = fixture(&settings_blob(0, 10, 8, &[[0x00, 0x00, 0xFF, b'>']]));

        let report = pack(&fx.options).unwrap();
        assert_eq!(report.compressed_len, 3);
        assert_eq!(report.output_address, 0);
        assert_eq!(report.patch_address, 8);
        assert_eq!(report.max_length, 10);
        assert_eq!(report.patched, 1);

        let image = fs::read(&fx.options.rom).unwrap();
        assert_eq!(&image[0..3], &[0x01, 0x02, 0x03]);
        assert_eq!(&image[8..10], &[0x00, 0x03]);

        // Intermediates are gone, the ROM stays
        assert!(!fx.options.driver.exists());
        assert!(!fx.options.settings.exists());
        assert!(!fx.dir.path().join("driver.bin.sax").exists());
        assert!(fx.options.rom.exists());
    }

    #[test]
    fn test_pack_patches_driver_before_compression() {
        let fx = fixture(&settings_blob(0, 10, 8, &[[0x00, 0x01, 0xEE, b'>']]));
        // Compressor that copies its input: the sidecar shows the fixup
        let script = write_script(fx.dir.path(), "#!/bin/sh\ncp \"$2\" \"$3\"\n");
        let options = PackOptions {
            compressor: script,
            ..fx.options.clone()
        };

        pack(&options).unwrap();

        let image = fs::read(&options.rom).unwrap();
        assert_eq!(&image[0..4], &[0x00, 0xEE, 0x00, 0x00]);
    }

    #[test]
    fn test_pack_missing_driver() {
        let fx = fixture(&settings_blob(0, 10, 8, &[]));
        fs::remove_file(&fx.options.driver).unwrap();

        let result = pack(&fx.options);
        assert!(matches!(result, Err(PackError::MissingInput { .. })));
    }

    #[test]
    fn test_pack_rejects_bad_settings() {
        let fx = fixture(&settings_blob(0, 10, 8, &[[0x00, 0x00, 0xFF, b'!']]));

        let result = pack(&fx.options);
        assert!(matches!(
            result,
            Err(PackError::Settings(SettingsError::BadDelimiter {
                offset: 15,
                found: b'!',
            }))
        ));
        // Nothing ran: driver untouched, inputs kept
        assert_eq!(
            fs::read(&fx.options.driver).unwrap(),
            vec![0x00, 0x00, 0x00, 0x00]
        );
        assert!(fx.options.settings.exists());
    }

    #[test]
    fn test_pack_rom_smaller_than_output_address() {
        let fx = fixture(&settings_blob(1000, 10, 8, &[]));

        let result = pack(&fx.options);
        assert!(matches!(
            result,
            Err(PackError::Splice(SpliceError::DestinationTooSmall {
                rom_len: 16,
                output_address: 1000,
            }))
        ));
        // Checked before the driver is patched
        assert_eq!(
            fs::read(&fx.options.driver).unwrap(),
            vec![0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_pack_compressor_without_output_fails() {
        let fx = fixture(&settings_blob(0, 10, 8, &[]));
        let script = write_script(fx.dir.path(), "#!/bin/sh\nexit 0\n");
        let options = PackOptions {
            compressor: script,
            ..fx.options.clone()
        };

        let result = pack(&options);
        assert!(matches!(
            result,
            Err(PackError::Compress(CompressError::NoOutput { .. }))
        ));
        // The patched driver stays on disk; only success cleans up
        assert!(options.driver.exists());
    }

    #[test]
    fn test_pack_capacity_exceeded_keeps_rom() {
        let fx = fixture(&settings_blob(0, 2, 8, &[]));

        let result = pack(&fx.options);
        assert!(matches!(
            result,
            Err(PackError::Splice(SpliceError::CapacityExceeded {
                actual: 3,
                max: 2,
            }))
        ));
        assert!(fs::read(&fx.options.rom).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_pack_stray_byte_mode() {
        let fx = fixture(&settings_blob(0, 10, 8, &[]));
        let options = fx.options.clone().with_stray_byte(true);

        let report = pack(&options).unwrap();
        assert_eq!(report.compressed_len, 4);

        let image = fs::read(&options.rom).unwrap();
        assert_eq!(&image[0..4], &[0x01, 0x02, 0x03, crate::splice::STRAY_BYTE]);
        assert_eq!(&image[8..10], &[0x00, 0x04]);
    }
}
