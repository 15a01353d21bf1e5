//! Crate-wide error type.
//!
//! `nix::errno::Errno` is reused as the underlying platform-error
//! representation rather than re-deriving an errno table, the same way the
//! rest of this crate leans on `nix` for syscall plumbing.

use std::fmt;
use std::path::PathBuf;

use nix::errno::Errno;

/// Everything that can fail between stat-ing a path and handing it to the
/// name scrubber.
#[derive(Debug)]
pub enum Error {
    /// A precondition was violated before any syscall was attempted (e.g. a
    /// zero mode bit, or a caller-supplied buffer too small to proceed).
    Precondition(String),
    /// `open()` denied access, or a lock is held by another process.
    AccessDenied { path: PathBuf, source: Errno },
    /// The whole-file advisory lock is held by another process.
    Locked {
        path: PathBuf,
        holder_pid: Option<i32>,
    },
    /// The filesystem vetoed the operation: an immutable, append-only,
    /// undelete, or nounlink flag is set on the target.
    FilesystemVeto { path: PathBuf },
    /// A syscall failed during I/O (seek, write, fsync, ioctl, truncate).
    Io { path: PathBuf, source: Errno },
    /// The target has more than one hard link; it was unlinked via the name
    /// scrubber but never overwritten.
    TooManyLinks { path: PathBuf },
}

impl Error {
    /// The underlying platform errno, when one is available.
    pub fn errno(&self) -> Option<Errno> {
        match self {
            Error::AccessDenied { source, .. } | Error::Io { source, .. } => Some(*source),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Precondition(msg) => write!(f, "precondition violated: {msg}"),
            Error::AccessDenied { path, source } => {
                write!(f, "{}: access denied: {source}", path.display())
            }
            Error::Locked {
                path,
                holder_pid: Some(pid),
            } => write!(f, "can't unlink {}, locked by process {pid}", path.display()),
            Error::Locked {
                path,
                holder_pid: None,
            } => write!(f, "can't unlink {}, locked by another process", path.display()),
            Error::FilesystemVeto { path } => {
                write!(
                    f,
                    "{}: undelete, immutable, or append-only flag is set",
                    path.display()
                )
            }
            Error::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Error::TooManyLinks { path } => {
                write!(f, "{}: too many hard links, not overwritten", path.display())
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: Errno) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn access_denied(path: impl Into<PathBuf>, source: Errno) -> Self {
        Error::AccessDenied {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Recovers the platform `Errno` carried by a `std::io::Error`, falling back
/// to `EIO` when the source had none (e.g. an error synthesized by a
/// non-OS-backed `io::Error`).
pub(crate) fn errno_from_io(err: &std::io::Error) -> Errno {
    match err.raw_os_error() {
        Some(code) => Errno::from_i32(code),
        None => Errno::EIO,
    }
}
