//! The options bitset (spec §3) that every layer of the crate is configured
//! through.

use std::fmt;

/// How chatty diagnostics and progress reporting should be.
///
/// Mirrors the two-bit verbose mask called out in spec §6: 0 is silent, 3
/// dumps geometry and buffer-size detail.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VerboseLevel(u8);

impl VerboseLevel {
    pub const SILENT: VerboseLevel = VerboseLevel(0);
    pub const PROGRESS: VerboseLevel = VerboseLevel(1);
    pub const PASSES: VerboseLevel = VerboseLevel(2);
    pub const GEOMETRY: VerboseLevel = VerboseLevel(3);

    /// Clamps `level` into the representable 0..=3 range, matching the
    /// two-bit ABI mask.
    pub const fn new(level: u8) -> Self {
        VerboseLevel(if level > 3 { 3 } else { level })
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for VerboseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl PartialEq<u8> for VerboseLevel {
    fn eq(&self, other: &u8) -> bool {
        self.0 == *other
    }
}

impl PartialOrd<u8> for VerboseLevel {
    fn partial_cmp(&self, other: &u8) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(other)
    }
}

/// The pass schedule a target is overwritten with. Mutually exclusive by
/// construction (an enum, rather than the mutually-exclusive-bits convention
/// the C original expresses through a bitmask).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Mode {
    /// One pass of `0x00`.
    Simple,
    /// Three passes: `0xFF`, `0x00`, `0xFF`.
    OpenBsd,
    /// US DoD 5220.22-M: seven passes.
    Dod,
    /// US DoE: three passes.
    Doe,
    /// RCMP TSSIT OPS-II: three passes.
    Rcmp,
    /// 35 Gutmann passes plus a final zero pass. The default.
    #[default]
    Gutmann35,
}

impl Mode {
    /// The mode's name, as reported at verbose >= 2 before its schedule
    /// runs (spec §1A, supplemented from the original's mode-announcement
    /// diagnostics).
    pub const fn name(self) -> &'static str {
        match self {
            Mode::Simple => "Simple mode",
            Mode::OpenBsd => "OpenBSD mode",
            Mode::Dod => "US DoD mode",
            Mode::Doe => "US DoE mode",
            Mode::Rcmp => "RCMP mode",
            Mode::Gutmann35 => "Full 35-pass mode (Gutmann method)",
        }
    }
}

/// The full options bitset consumed by the walker, driver, and engine.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Options {
    pub verbose: VerboseLevel,
    /// Skip interactive prompts; tolerate missing files.
    pub force: bool,
    /// Prompt before each file.
    pub interactive: bool,
    /// Descend into directories; otherwise directories cause a diagnostic.
    pub recursive: bool,
    /// Do not cross mount points during traversal.
    pub one_filesystem: bool,
    pub mode: Mode,
}

impl Options {
    pub fn new(mode: Mode) -> Self {
        Options {
            mode,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_level_clamps() {
        assert_eq!(VerboseLevel::new(7).get(), 3);
        assert_eq!(VerboseLevel::new(2).get(), 2);
    }

    #[test]
    fn default_mode_is_gutmann() {
        assert_eq!(Options::default().mode, Mode::Gutmann35);
    }
}
