//! External compressor invocation
//!
//! The compression step is delegated to an external executable (a Saxman
//! compressor build). The child gets a bounded wait; a compressor that
//! hangs is killed, and whatever output it managed to produce is checked
//! afterwards. The exit status is never inspected - the only contract is
//! that a non-empty sidecar file shows up.

use crate::error::CompressError;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// How long the compressor may run before it is killed
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Mode token passed to the compressor in accurate mode
pub const ACCURATE_TOKEN: &str = "-a";

/// Extension appended to the driver path for the compressed output
pub const SIDECAR_EXTENSION: &str = "sax";

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Compressed output path for a driver binary
///
/// The extension is appended to the full file name (`driver.bin` becomes
/// `driver.bin.sax`), not substituted.
pub fn sidecar_path(driver: &Path) -> PathBuf {
    let mut name = driver.as_os_str().to_os_string();
    name.push(".");
    name.push(SIDECAR_EXTENSION);
    PathBuf::from(name)
}

/// Configuration for one compressor invocation
#[derive(Debug, Clone)]
pub struct Compressor {
    program: PathBuf,
    flag: String,
    accurate: bool,
    working_dir: PathBuf,
    timeout: Duration,
}

impl Compressor {
    /// Create a compressor invocation
    ///
    /// `flag` is the primary argument the compressor expects before the
    /// input and output paths. The working directory is an explicit
    /// parameter rather than whatever the process happens to be in.
    pub fn new(
        program: impl Into<PathBuf>,
        flag: impl Into<String>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            flag: flag.into(),
            accurate: false,
            working_dir: working_dir.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Enable the accurate-compression mode token
    pub fn with_accurate(mut self, accurate: bool) -> Self {
        self.accurate = accurate;
        self
    }

    /// Override the kill timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the compressor against a patched driver binary
    ///
    /// Invokes `<program> <flag> [-a] <driver> <driver>.sax` with stdout
    /// and stderr captured, waits up to the timeout, and returns the
    /// sidecar path once the output file exists.
    pub fn run(&self, driver: &Path) -> Result<PathBuf, CompressError> {
        let sidecar = sidecar_path(driver);

        let mut command = Command::new(&self.program);
        command.arg(&self.flag);
        if self.accurate {
            command.arg(ACCURATE_TOKEN);
        }
        command
            .arg(driver)
            .arg(&sidecar)
            .current_dir(&self.working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|source| CompressError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait().map_err(CompressError::Wait)? {
                Some(_) => break,
                None if Instant::now() >= deadline => {
                    // The child may exit between the poll and the kill;
                    // either way it still has to be reaped.
                    let _ = child.kill();
                    let _ = child.wait();
                    break;
                }
                None => std::thread::sleep(POLL_INTERVAL),
            }
        }

        if !sidecar.is_file() {
            return Err(CompressError::NoOutput { path: sidecar });
        }
        Ok(sidecar)
    }
}
