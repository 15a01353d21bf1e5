//! Filesystem-level delete-protection flags (spec §4.4 step 6, §9
//! "Conditional-compilation ladders"): the ext2/3 inode flags and BSD
//! `chflags` bits that can veto an unlink outright, unified behind one
//! `FilesystemFlagGate` so the driver doesn't need its own `#[cfg]` ladder.

use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::path::Path;

use bitflags::bitflags;

use crate::error::{errno_from_io, Error, Result};
use crate::reporter::Reporter;

bitflags! {
    /// The subset of `EXT2_IOC_GETFLAGS` bits this crate cares about.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg(all(target_os = "linux", not(feature = "no-platform-caps")))]
    pub struct Ext2Flags: libc::c_long {
        /// Undelete: the filesystem itself tries to preserve file contents.
        const UNRM = 0x0000_0002;
        /// File may not be changed.
        const IMMUTABLE = 0x0000_0010;
        /// File may only be appended to.
        const APPEND = 0x0000_0020;
        /// ext3/4: journal file data as well as metadata.
        const JOURNAL_DATA = 0x0004_0000;
        /// Securely delete: zero the blocks on unlink. Set by this crate on
        /// a successful overwrite, never cleared (spec §1A supplement).
        const SECRM = 0x0000_0001;
    }
}

#[cfg(all(target_os = "linux", not(feature = "no-platform-caps")))]
mod linux_ioctl {
    use super::Ext2Flags;

    nix::ioctl_read!(ext2_get_flags, b'f' as u8, 1, libc::c_long);
    nix::ioctl_write_ptr!(ext2_set_flags, b'f' as u8, 2, libc::c_long);

    pub(super) fn get(fd: std::os::unix::io::RawFd) -> nix::Result<Ext2Flags> {
        let mut raw: libc::c_long = 0;
        unsafe { ext2_get_flags(fd, &mut raw)? };
        Ok(Ext2Flags::from_bits_truncate(raw))
    }

    pub(super) fn set(fd: std::os::unix::io::RawFd, flags: Ext2Flags) -> nix::Result<()> {
        let raw = flags.bits();
        unsafe { ext2_set_flags(fd, &raw)? };
        Ok(())
    }
}

bitflags! {
    /// `chflags(2)` bits, macOS only (the only BSD-flags platform this crate
    /// currently implements a gate for; see `platform_gate`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg(all(target_os = "macos", not(feature = "no-platform-caps")))]
    pub struct BsdFlags: u32 {
        const UF_IMMUTABLE = libc::UF_IMMUTABLE;
        const UF_APPEND = libc::UF_APPEND;
        const UF_NOUNLINK = 0x0000_0010;
        const SF_IMMUTABLE = libc::SF_IMMUTABLE;
        const SF_APPEND = libc::SF_APPEND;
        const SF_NOUNLINK = 0x0010_0000;
    }
}

/// Checks and clears delete-blocking filesystem flags before a target is
/// opened for overwrite, and marks it securely-deleted once the overwrite
/// has finished (spec §4.4 steps 6 and 9).
pub trait FilesystemFlagGate {
    /// Returns `Err(Error::FilesystemVeto)` if `path`'s filesystem flags
    /// would make an unlink pointless or impossible (undelete, immutable,
    /// append-only, nounlink). Clears ext3's per-file journaling flag so the
    /// overwrite actually reaches disk rather than just the journal.
    fn check_and_prepare(&self, file: &File, path: &Path, reporter: &dyn Reporter) -> Result<()>;

    /// Marks the target securely-deleted at the filesystem level, if the
    /// platform has such a concept. Best-effort: failures are reported, not
    /// propagated (spec §9, Open Question: not restored on failure either
    /// way, since this call only ever sets flags forward).
    fn mark_finalized(&self, file: &File, path: &Path, reporter: &dyn Reporter);
}

#[cfg(all(target_os = "linux", not(feature = "no-platform-caps")))]
#[derive(Debug, Default, Clone, Copy)]
pub struct Ext2FlagGate;

#[cfg(all(target_os = "linux", not(feature = "no-platform-caps")))]
impl FilesystemFlagGate for Ext2FlagGate {
    fn check_and_prepare(&self, file: &File, path: &Path, reporter: &dyn Reporter) -> Result<()> {
        let flags = match linux_ioctl::get(file.as_raw_fd()) {
            Ok(flags) => flags,
            Err(_) => return Ok(()), // not an ext2/3/4 inode, or flags unsupported
        };

        if flags.intersects(Ext2Flags::UNRM | Ext2Flags::IMMUTABLE | Ext2Flags::APPEND) {
            return Err(Error::FilesystemVeto { path: path.to_path_buf() });
        }

        if flags.contains(Ext2Flags::JOURNAL_DATA) {
            let cleared = flags - Ext2Flags::JOURNAL_DATA;
            if let Err(err) = linux_ioctl::set(file.as_raw_fd(), cleared) {
                reporter.errorp(
                    &format!("{}: couldn't clear journal-data flag", path.display()),
                    err,
                );
            }
        }

        Ok(())
    }

    fn mark_finalized(&self, file: &File, path: &Path, reporter: &dyn Reporter) {
        let flags = match linux_ioctl::get(file.as_raw_fd()) {
            Ok(flags) => flags,
            Err(_) => return,
        };
        if let Err(err) = linux_ioctl::set(file.as_raw_fd(), flags | Ext2Flags::SECRM) {
            reporter.errorp(&format!("{}: couldn't set secure-delete flag", path.display()), err);
        }
    }
}

#[cfg(all(target_os = "macos", not(feature = "no-platform-caps")))]
#[derive(Debug, Default, Clone, Copy)]
pub struct BsdFlagGate;

#[cfg(all(target_os = "macos", not(feature = "no-platform-caps")))]
impl FilesystemFlagGate for BsdFlagGate {
    fn check_and_prepare(&self, file: &File, path: &Path, _reporter: &dyn Reporter) -> Result<()> {
        let metadata = file.metadata().map_err(|err| Error::io(path, errno_from_io(&err)))?;
        use std::os::macos::fs::MetadataExt;
        let flags = BsdFlags::from_bits_truncate(metadata.st_flags());
        if flags.intersects(
            BsdFlags::UF_IMMUTABLE
                | BsdFlags::UF_APPEND
                | BsdFlags::UF_NOUNLINK
                | BsdFlags::SF_IMMUTABLE
                | BsdFlags::SF_APPEND
                | BsdFlags::SF_NOUNLINK,
        ) {
            return Err(Error::FilesystemVeto { path: path.to_path_buf() });
        }
        Ok(())
    }

    fn mark_finalized(&self, _file: &File, _path: &Path, _reporter: &dyn Reporter) {
        // No secure-delete inode flag on HFS+/APFS; resource fork handling
        // (crate::side_streams) is this platform's equivalent supplement.
    }
}

/// No-op gate for platforms without either flag facility.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFlagGate;

impl FilesystemFlagGate for NullFlagGate {
    fn check_and_prepare(&self, _file: &File, _path: &Path, _reporter: &dyn Reporter) -> Result<()> {
        Ok(())
    }

    fn mark_finalized(&self, _file: &File, _path: &Path, _reporter: &dyn Reporter) {}
}

/// The `FilesystemFlagGate` this platform actually supports, chosen at
/// compile time.
#[cfg(all(target_os = "linux", not(feature = "no-platform-caps")))]
pub fn platform_gate() -> Box<dyn FilesystemFlagGate> {
    Box::new(Ext2FlagGate)
}

#[cfg(all(target_os = "macos", not(feature = "no-platform-caps")))]
pub fn platform_gate() -> Box<dyn FilesystemFlagGate> {
    Box::new(BsdFlagGate)
}

#[cfg(any(
    not(any(target_os = "linux", target_os = "macos")),
    feature = "no-platform-caps"
))]
pub fn platform_gate() -> Box<dyn FilesystemFlagGate> {
    Box::new(NullFlagGate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_gate_never_vetoes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        let file = std::fs::File::create(&path).unwrap();
        let reporter = crate::reporter::LogReporter;
        let gate = NullFlagGate;
        assert!(gate.check_and_prepare(&file, &path, &reporter).is_ok());
    }
}
