//! The target record (spec §3 "Target record"): an open descriptor, a
//! display name, a byte extent, and a scratch buffer, all owned by the
//! `secure_unlink` call's stack frame.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Lower bound for a scratch buffer, raised to `RAISED_BUFFER_CAPACITY` when
/// the filesystem reports something smaller (spec §3).
pub const MIN_BUFFER_CAPACITY: usize = 16;
/// The buffer capacity substituted when the filesystem's reported optimal
/// I/O size is below `MIN_BUFFER_CAPACITY`.
pub const RAISED_BUFFER_CAPACITY: usize = 512;

/// Clamps a filesystem-reported optimal I/O size into a usable scratch
/// buffer capacity (spec §3, §4.4 step 6).
pub fn normalize_buffer_capacity(reported: u64) -> usize {
    let reported = usize::try_from(reported).unwrap_or(usize::MAX);
    if reported < MIN_BUFFER_CAPACITY {
        RAISED_BUFFER_CAPACITY
    } else {
        reported
    }
}

/// An in-flight overwrite target: an open, writable, synchronous descriptor,
/// the byte extent to overwrite, and the scratch buffer passes are tiled
/// into.
pub struct Target {
    file: File,
    name: PathBuf,
    extent: u64,
    buffer: Vec<u8>,
}

impl Target {
    pub fn new(file: File, name: impl Into<PathBuf>, extent: u64, buffer_capacity: usize) -> Self {
        Target {
            file,
            name: name.into(),
            extent,
            buffer: vec![0u8; buffer_capacity.max(MIN_BUFFER_CAPACITY)],
        }
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }

    pub fn name(&self) -> &Path {
        &self.name
    }

    pub fn extent(&self) -> u64 {
        self.extent
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Splits the borrow so the descriptor and the scratch buffer can be
    /// used at once, e.g. to overwrite auxiliary extents through `file`
    /// while tiling `buffer` as their fill source.
    pub fn file_and_buffer_mut(&mut self) -> (&File, &mut [u8]) {
        (&self.file, &mut self.buffer)
    }

    /// Writes the first `len` bytes of the scratch buffer to the
    /// descriptor, at its current seek position.
    pub fn write_buffer_prefix(&mut self, len: usize) -> io::Result<()> {
        self.file.write_all(&self.buffer[..len])
    }

    /// Consumes the target, returning the descriptor so the driver can
    /// finalize it (truncate, close) outside the engine.
    pub fn into_file(self) -> File {
        self.file
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_optimal_size_is_raised() {
        assert_eq!(normalize_buffer_capacity(4), RAISED_BUFFER_CAPACITY);
        assert_eq!(normalize_buffer_capacity(15), RAISED_BUFFER_CAPACITY);
    }

    #[test]
    fn adequate_optimal_size_is_kept() {
        assert_eq!(normalize_buffer_capacity(16), 16);
        assert_eq!(normalize_buffer_capacity(4096), 4096);
    }
}
