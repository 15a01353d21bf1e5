//! The "name scrubber" collaborator (spec §6): renames a path to an
//! obfuscated name before unlinking it, so that directory-entry metadata
//! (the old name itself) doesn't survive the removal.

use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::error::{errno_from_io, Error, Result};

/// Renames `path` to an obfuscated name and removes it (unlink for files and
/// symlinks, rmdir for directories).
pub trait NameScrubber {
    fn rename_unlink(&self, path: &Path) -> Result<()>;
}

/// Default `NameScrubber`: one rename to a random same-length name in the
/// same directory, then remove.
#[derive(Debug, Default, Clone, Copy)]
pub struct RenameUnlinkScrubber;

impl RenameUnlinkScrubber {
    fn obfuscated_sibling(path: &Path) -> PathBuf {
        let name_len = path
            .file_name()
            .map(|n| n.len().max(1))
            .unwrap_or(8)
            .min(64);
        let random_name: String = rand::thread_rng()
            .sample_iter(rand::distributions::Alphanumeric)
            .take(name_len)
            .map(char::from)
            .collect();
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join(random_name),
            _ => PathBuf::from(random_name),
        }
    }
}

impl NameScrubber for RenameUnlinkScrubber {
    fn rename_unlink(&self, path: &Path) -> Result<()> {
        let metadata = fs::symlink_metadata(path).map_err(|e| Error::io(path, errno_from_io(&e)))?;

        let mut scrubbed = Self::obfuscated_sibling(path);
        // A same-directory rename can theoretically collide; retry a
        // handful of times before giving up and using the original name.
        let mut renamed = false;
        for attempt in 0..4 {
            match fs::rename(path, &scrubbed) {
                Ok(()) => {
                    renamed = true;
                    break;
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && attempt < 3 => {
                    scrubbed = Self::obfuscated_sibling(path);
                    continue;
                }
                Err(e) => return Err(Error::io(path, errno_from_io(&e))),
            }
        }
        if !renamed {
            scrubbed = path.to_path_buf();
        }

        let remove_result = if metadata.is_dir() {
            fs::remove_dir(&scrubbed)
        } else {
            fs::remove_file(&scrubbed)
        };
        remove_result.map_err(|e| Error::io(&scrubbed, errno_from_io(&e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn renames_and_removes_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.txt");
        File::create(&path).unwrap();

        RenameUnlinkScrubber.rename_unlink(&path).unwrap();

        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn removes_an_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("leftover");
        fs::create_dir(&sub).unwrap();

        RenameUnlinkScrubber.rename_unlink(&sub).unwrap();

        assert!(!sub.exists());
    }

    #[test]
    fn missing_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist");
        let err = RenameUnlinkScrubber.rename_unlink(&path).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
