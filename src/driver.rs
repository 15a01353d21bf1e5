//! The target driver (spec §4.4): turns one path into a classified,
//! locked, geometry-probed `Target`, runs the overwrite engine over it and
//! its side streams, then hands the (now all-zero) name off to the name
//! scrubber.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::{MetadataExt, OpenOptionsExt};
use std::os::unix::io::AsRawFd;
use std::path::Path;

use nix::fcntl::{fcntl, FcntlArg};

use crate::aux::{self, AuxiliaryEnumerator};
use crate::device::{self, DeviceGeometryProbe};
use crate::engine;
use crate::entropy::{EntropySource, OsEntropySource};
use crate::error::{errno_from_io, Error, Result};
use crate::fs_flags::{self, FilesystemFlagGate};
use crate::options::Options;
use crate::reporter::{LogReporter, Reporter};
use crate::scrub::{NameScrubber, RenameUnlinkScrubber};
use crate::side_streams::{self, SideStreamLocator};
use crate::target::{normalize_buffer_capacity, Target};

/// The collaborators `secure_unlink` delegates to, borrowed for the
/// duration of one call. Bundled so callers don't have to thread six
/// parameters through every helper (spec §6 "external collaborators").
pub struct Collaborators<'a> {
    pub entropy: &'a dyn EntropySource,
    pub reporter: &'a dyn Reporter,
    pub scrubber: &'a dyn NameScrubber,
    pub aux: &'a dyn AuxiliaryEnumerator,
    pub flags: &'a dyn FilesystemFlagGate,
    pub device: &'a dyn DeviceGeometryProbe,
    pub side_streams: &'a dyn SideStreamLocator,
}

/// Owns the default, platform-selected collaborators so a caller that just
/// wants `sunlink`'s stock behavior doesn't have to assemble one of every
/// trait object by hand.
pub struct DefaultCollaborators {
    entropy: OsEntropySource,
    reporter: LogReporter,
    scrubber: RenameUnlinkScrubber,
    aux: Box<dyn AuxiliaryEnumerator>,
    flags: Box<dyn FilesystemFlagGate>,
    device: Box<dyn DeviceGeometryProbe>,
    side_streams: Box<dyn SideStreamLocator>,
}

impl Default for DefaultCollaborators {
    fn default() -> Self {
        DefaultCollaborators {
            entropy: OsEntropySource,
            reporter: LogReporter,
            scrubber: RenameUnlinkScrubber,
            aux: aux::platform_enumerator(),
            flags: fs_flags::platform_gate(),
            device: device::platform_probe(),
            side_streams: side_streams::platform_locator(),
        }
    }
}

impl DefaultCollaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_collaborators(&self) -> Collaborators<'_> {
        Collaborators {
            entropy: &self.entropy,
            reporter: &self.reporter,
            scrubber: &self.scrubber,
            aux: self.aux.as_ref(),
            flags: self.flags.as_ref(),
            device: self.device.as_ref(),
            side_streams: self.side_streams.as_ref(),
        }
    }
}

/// Securely removes a single path: classify, lock, probe geometry, run the
/// pass schedule over the main extent and every side stream, finalize, and
/// scrub the name (spec §4.4).
///
/// A target with more than one hard link is unlinked via the name scrubber
/// but never overwritten, and reported as `Error::TooManyLinks` — the
/// walker treats that specific error as a successful removal, matching the
/// original's `EMLINK` special case (spec §9 Open Question).
pub fn secure_unlink(path: &Path, options: &Options, collab: &Collaborators<'_>) -> Result<()> {
    let metadata = std::fs::symlink_metadata(path).map_err(|err| Error::io(path, errno_from_io(&err)))?;

    if metadata.is_symlink() || metadata.is_dir() {
        return collab.scrubber.rename_unlink(path);
    }

    #[cfg(target_os = "linux")]
    {
        use std::os::unix::fs::FileTypeExt;
        if metadata.file_type().is_block_device() {
            return secure_unlink_block_device(path, options, collab);
        }
    }

    if !metadata.is_file() {
        return collab.scrubber.rename_unlink(path);
    }

    if metadata.nlink() > 1 {
        collab.scrubber.rename_unlink(path)?;
        return Err(Error::TooManyLinks { path: path.to_path_buf() });
    }

    if metadata.len() == 0 {
        return collab.scrubber.rename_unlink(path);
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_SYNC)
        .open(path)
        .map_err(|err| Error::access_denied(path, errno_from_io(&err)))?;

    acquire_whole_file_lock(&file, path)?;

    collab.flags.check_and_prepare(&file, path, collab.reporter)?;

    #[cfg(target_os = "macos")]
    {
        let _ = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_NOCACHE, 1) };
    }

    let buffer_capacity = normalize_buffer_capacity(metadata.blksize());
    if options.verbose > 2u8 {
        collab
            .reporter
            .notice(&format!("file size: {}, buffer_size: {buffer_capacity}", metadata.len()));
    }
    let mut target = Target::new(file, path, metadata.len(), buffer_capacity);

    if options.verbose > 1u8 {
        collab.reporter.notice(options.mode.name());
    }

    let schedule = options.mode.schedule();
    engine::run_passes(&mut target, &schedule, collab.entropy, collab.aux, collab.reporter, options.verbose)?;

    collab.flags.mark_finalized(target.file(), path, collab.reporter);

    target
        .file_mut()
        .set_len(0)
        .map_err(|err| Error::io(path, errno_from_io(&err)))?;
    drop(target.into_file());

    for side_stream in collab.side_streams.locate(path) {
        if let Err(err) = secure_unlink_side_stream(&side_stream, options, collab) {
            let errno = err.errno().unwrap_or(nix::errno::Errno::EIO);
            collab.reporter.errorp(
                &format!("could not overwrite side stream {}", side_stream.display()),
                errno,
            );
        }
    }

    collab.scrubber.rename_unlink(path)
}

#[cfg(target_os = "linux")]
fn secure_unlink_block_device(path: &Path, options: &Options, collab: &Collaborators<'_>) -> Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .custom_flags(libc::O_SYNC)
        .open(path)
        .map_err(|err| Error::access_denied(path, errno_from_io(&err)))?;

    let geometry = collab
        .device
        .probe(&file, collab.reporter)?
        .ok_or_else(|| Error::Precondition(format!("{}: could not determine device geometry", path.display())))?;

    if geometry.size_bytes == 0 {
        return Err(Error::Io {
            path: path.to_path_buf(),
            source: nix::errno::Errno::EIO,
        });
    }

    let buffer_capacity = normalize_buffer_capacity(geometry.sector_size);
    let mut target = Target::new(file, path, geometry.size_bytes, buffer_capacity);

    if options.verbose > 1u8 {
        collab.reporter.notice(options.mode.name());
    }

    let schedule = options.mode.schedule();
    engine::run_passes(&mut target, &schedule, collab.entropy, collab.aux, collab.reporter, options.verbose)?;
    Ok(())
}

/// A side stream is driven through the same full pipeline as a main
/// extent, minus the name-scrub step (the main path's rename_unlink call
/// removes the side stream along with its parent on the platforms that
/// have them).
fn secure_unlink_side_stream(path: &Path, options: &Options, collab: &Collaborators<'_>) -> Result<()> {
    let metadata = std::fs::symlink_metadata(path).map_err(|err| Error::io(path, errno_from_io(&err)))?;
    if metadata.len() == 0 {
        return Ok(());
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_SYNC)
        .open(path)
        .map_err(|err| Error::access_denied(path, errno_from_io(&err)))?;
    acquire_whole_file_lock(&file, path)?;

    let buffer_capacity = normalize_buffer_capacity(metadata.blksize());
    let len = metadata.len();
    let mut target = Target::new(file, path, len, buffer_capacity);
    let schedule = options.mode.schedule();
    engine::run_passes(&mut target, &schedule, collab.entropy, collab.aux, collab.reporter, options.verbose)?;
    target
        .file_mut()
        .set_len(0)
        .map_err(|err| Error::io(path, errno_from_io(&err)))?;
    Ok(())
}

fn acquire_whole_file_lock(file: &File, path: &Path) -> Result<()> {
    let mut lock: libc::flock = unsafe { std::mem::zeroed() };
    lock.l_type = libc::F_WRLCK as libc::c_short;
    lock.l_whence = libc::SEEK_SET as libc::c_short;
    lock.l_start = 0;
    lock.l_len = 0;

    match fcntl(file.as_raw_fd(), FcntlArg::F_SETLK(&lock)) {
        Ok(_) => Ok(()),
        Err(_set_err) => {
            lock.l_pid = 0;
            let holder_pid = match fcntl(file.as_raw_fd(), FcntlArg::F_GETLK(&mut lock)) {
                Ok(_) if lock.l_pid > 0 => Some(lock.l_pid as i32),
                _ => None,
            };
            Err(Error::Locked {
                path: path.to_path_buf(),
                holder_pid,
            })
        }
    }
}
