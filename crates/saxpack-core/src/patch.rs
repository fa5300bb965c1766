//! Driver binary fixups
//!
//! Applies the byte writes from the settings file to the assembled driver
//! binary before it is handed to the compressor.

use crate::error::PatchError;
use crate::settings::PatchInstruction;

/// Apply patch instructions to the driver binary in place
///
/// Instructions are applied in order. An out-of-range address aborts the
/// run; writes already made are kept, matching the strictly forward
/// pipeline semantics.
pub fn apply(driver: &mut [u8], instructions: &[PatchInstruction]) -> Result<(), PatchError> {
    let len = driver.len();
    for instruction in instructions {
        let slot = driver
            .get_mut(instruction.address)
            .ok_or(PatchError::OutOfRange {
                address: instruction.address,
                len,
            })?;
        *slot = instruction.value;
    }
    Ok(())
}
