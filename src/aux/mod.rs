//! Auxiliary-data capability abstraction (spec §4.2.2, §9 "Conditional-
//! compilation ladders"): one interface for attribute-style auxiliary
//! extents that are rewritten *inside* every pass, alongside the main
//! extent, through the same open descriptor. Resource forks and alternate
//! data streams are full-sized siblings of the main file and are instead
//! driven through the Target Driver as their own `Target`s (spec §4.4 steps
//! 7 and 10; see `crate::side_streams`).

use std::fs::File;

use crate::error::Result;
use crate::reporter::Reporter;

#[cfg(all(unix, not(feature = "no-platform-caps")))]
pub mod xattr;

/// Enumerates and overwrites the small key/value auxiliary extents attached
/// to an open file (extended attributes, on the platforms that have them).
pub trait AuxiliaryEnumerator {
    /// Overwrites every auxiliary extent reachable through `file` with
    /// `pattern`, tiled via [`crate::pattern::fill`] into a buffer sized to
    /// each value. `pattern` is the current pass's already-filled main
    /// scratch buffer, used as the source to tile from (spec §4.2.2).
    /// Individual key failures are reported through `reporter` and do not
    /// return an error; enumeration blowing past the 1 MiB key-list cap is
    /// reported and abandoned, also without returning an error.
    fn overwrite_all(&self, file: &File, pattern: &[u8], reporter: &dyn Reporter) -> Result<()>;
}

/// No-op `AuxiliaryEnumerator` for platforms (or builds) without an
/// attribute-style auxiliary-data facility.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuxiliaryEnumerator;

impl AuxiliaryEnumerator for NullAuxiliaryEnumerator {
    fn overwrite_all(&self, _file: &File, _pattern: &[u8], _reporter: &dyn Reporter) -> Result<()> {
        Ok(())
    }
}

/// The `AuxiliaryEnumerator` this platform actually supports, chosen at
/// compile time.
#[cfg(all(unix, not(feature = "no-platform-caps")))]
pub fn platform_enumerator() -> Box<dyn AuxiliaryEnumerator> {
    Box::new(xattr::XattrEnumerator)
}

#[cfg(not(all(unix, not(feature = "no-platform-caps"))))]
pub fn platform_enumerator() -> Box<dyn AuxiliaryEnumerator> {
    Box::new(NullAuxiliaryEnumerator)
}
