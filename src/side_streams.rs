//! Side-stream auxiliary targets (spec §4.4 steps 7 and 10): full-sized
//! siblings of the main file that the original treats as their own complete
//! overwrite target, not as an in-pass auxiliary extent, because unlike
//! extended attributes they can be arbitrarily large. macOS resource forks
//! are implemented; NTFS alternate data streams are a Windows-only
//! concept with no counterpart on the platforms this crate targets.

use std::path::{Path, PathBuf};

/// Locates side-stream paths attached to `path` that the driver should run
/// through its own complete `secure_unlink` (schedule, lock, overwrite,
/// truncate), in addition to the main extent.
pub trait SideStreamLocator {
    fn locate(&self, path: &Path) -> Vec<PathBuf>;
}

#[cfg(all(target_os = "macos", not(feature = "no-platform-caps")))]
#[derive(Debug, Default, Clone, Copy)]
pub struct ResourceForkLocator;

#[cfg(all(target_os = "macos", not(feature = "no-platform-caps")))]
impl SideStreamLocator for ResourceForkLocator {
    fn locate(&self, path: &Path) -> Vec<PathBuf> {
        let mut rsrc = path.as_os_str().to_owned();
        rsrc.push("/..namedfork/rsrc");
        let rsrc = PathBuf::from(rsrc);
        match std::fs::symlink_metadata(&rsrc) {
            Ok(metadata) if metadata.len() > 0 => vec![rsrc],
            _ => Vec::new(),
        }
    }
}

/// No side streams on platforms without a namedfork-style facility.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSideStreamLocator;

impl SideStreamLocator for NullSideStreamLocator {
    fn locate(&self, _path: &Path) -> Vec<PathBuf> {
        Vec::new()
    }
}

#[cfg(all(target_os = "macos", not(feature = "no-platform-caps")))]
pub fn platform_locator() -> Box<dyn SideStreamLocator> {
    Box::new(ResourceForkLocator)
}

#[cfg(any(not(target_os = "macos"), feature = "no-platform-caps"))]
pub fn platform_locator() -> Box<dyn SideStreamLocator> {
    Box::new(NullSideStreamLocator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_locator_finds_nothing() {
        assert!(NullSideStreamLocator.locate(Path::new("/tmp/whatever")).is_empty());
    }
}
