//! The tree walker (spec §4.5): drives `secure_unlink` over one or more
//! roots, in physical, post-order, optionally one-filesystem-bounded
//! traversal, handling the confirmation prompts and permission coaxing that
//! sit in front of the driver.
//!
//! Built on `walkdir::WalkDir` with `.contents_first(true)` so directories
//! are only visited after everything inside them has already been removed,
//! and `.follow_links(false)` so a symlink is itself the target rather than
//! whatever it points at — together these are this crate's post-order,
//! physical traversal, standing in for the original's dual fts/nftw
//! backends (spec §9 REDESIGN FLAGS).

use std::fs::{self, Permissions};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use walkdir::WalkDir;

use crate::driver::{self, Collaborators};
use crate::error::Error;
use crate::options::Options;
use crate::prompt::Prompter;
use crate::reporter::Reporter;

/// Removes every path in `roots`, recursing into directories when
/// `options.recursive` is set. Returns `Ok(())` only if every entry was
/// removed; the first failure's summary is still reported through
/// `collab.reporter` even when later entries succeed, matching the
/// original's "keep going, report failure at the end" behavior.
pub fn walk(roots: &[impl AsRef<Path>], options: &Options, collab: &Collaborators<'_>, prompter: &dyn Prompter) -> bool {
    let mut all_removed = true;

    for root in roots {
        let root = root.as_ref();
        if !process_tree(root, options, collab, prompter) {
            all_removed = false;
        }
    }

    all_removed
}

fn process_tree(root: &Path, options: &Options, collab: &Collaborators<'_>, prompter: &dyn Prompter) -> bool {
    let root_metadata = match fs::symlink_metadata(root) {
        Ok(metadata) => metadata,
        Err(err) => {
            if !options.force {
                collab
                    .reporter
                    .errorp(&format!("could not stat {}", root.display()), crate::error::errno_from_io(&err));
            }
            return options.force;
        }
    };

    if root_metadata.is_dir() && !options.recursive {
        collab.reporter.error(&format!("{} is a directory", root.display()));
        return false;
    }

    let mut all_removed = true;
    let walk = WalkDir::new(root)
        .contents_first(true)
        .follow_links(false)
        .same_file_system(options.one_filesystem);

    for entry in walk {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if entry.file_type().is_dir() && !options.recursive {
                    // A bare directory root without -r was already rejected
                    // above; nested directories only appear here when -r is
                    // set, in which case they fall through to process_entry
                    // like everything else.
                    continue;
                }
                if !process_entry(path, options, collab, prompter) {
                    all_removed = false;
                }
            }
            Err(err) => {
                collab.reporter.error(&format!("traversal error: {err}"));
                all_removed = false;
            }
        }
    }

    all_removed
}

fn process_entry(path: &Path, options: &Options, collab: &Collaborators<'_>, prompter: &dyn Prompter) -> bool {
    if !prompt_file(path, options, collab, prompter) {
        return false;
    }

    match driver::secure_unlink(path, options, collab) {
        Ok(()) => true,
        Err(Error::TooManyLinks { path }) => {
            if options.verbose > 0u8 {
                collab.reporter.notice(&format!(
                    "{} has multiple links, this one has been unlinked but not overwritten",
                    path.display()
                ));
            }
            true
        }
        Err(err) => {
            collab.reporter.error(&format!("unable to remove {}: {err}", path.display()));
            false
        }
    }
}

/// Decides whether `path` should be removed, prompting the user or coaxing
/// its permissions as needed (spec §4.5 "Confirmation gate").
fn prompt_file(path: &Path, options: &Options, collab: &Collaborators<'_>, prompter: &dyn Prompter) -> bool {
    if options.force {
        if options.verbose > 0u8 {
            collab.reporter.notice(&format!("removing {}", path.display()));
        }
        return check_perms(path, collab);
    }

    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) => {
            collab
                .reporter
                .errorp(&format!("could not stat {}", path.display()), crate::error::errno_from_io(&err));
            return false;
        }
    };

    let write_protected = metadata.is_file() && fs::OpenOptions::new().write(true).open(path).is_err();

    let approved = if write_protected {
        if prompter.ask(&format!("Remove write protected file {}? (y/n) ", path.display())) {
            check_perms(path, collab)
        } else {
            false
        }
    } else if options.interactive {
        prompter.ask(&format!("Remove {}? (y/n) ", path.display()))
    } else {
        true
    };

    if approved && options.verbose > 0u8 {
        collab.reporter.notice(&format!("removing {}", path.display()));
    }

    approved
}

/// Coaxes a regular file's permissions to writable when it's owner-readable
/// but not owner-writable, so the driver's `open(O_RDWR)` will succeed
/// (spec §4.5).
fn check_perms(path: &Path, collab: &Collaborators<'_>) -> bool {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(_) => return false,
    };

    if !metadata.is_file() {
        return true;
    }

    if fs::OpenOptions::new().write(true).open(path).is_ok() {
        return true;
    }

    if let Err(err) = fs::set_permissions(path, Permissions::from_mode(0o600)) {
        collab.reporter.errorp(
            &format!("unable to reset {} to writable (probably not owner), skipping", path.display()),
            crate::error::errno_from_io(&err),
        );
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aux::NullAuxiliaryEnumerator;
    use crate::device::NullDeviceProbe;
    use crate::entropy::OsEntropySource;
    use crate::fs_flags::NullFlagGate;
    use crate::options::Mode;
    use crate::prompt::scripted::ScriptedPrompter;
    use crate::reporter::LogReporter;
    use crate::scrub::RenameUnlinkScrubber;
    use crate::side_streams::NullSideStreamLocator;

    fn collaborators() -> (
        OsEntropySource,
        LogReporter,
        RenameUnlinkScrubber,
        NullAuxiliaryEnumerator,
        NullFlagGate,
        NullDeviceProbe,
        NullSideStreamLocator,
    ) {
        (
            OsEntropySource,
            LogReporter,
            RenameUnlinkScrubber,
            NullAuxiliaryEnumerator,
            NullFlagGate,
            NullDeviceProbe,
            NullSideStreamLocator,
        )
    }

    #[test]
    fn force_removes_without_prompting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"secret").unwrap();

        let (entropy, reporter, scrubber, aux, flags, device, side_streams) = collaborators();
        let collab = Collaborators {
            entropy: &entropy,
            reporter: &reporter,
            scrubber: &scrubber,
            aux: &aux,
            flags: &flags,
            device: &device,
            side_streams: &side_streams,
        };
        let mut options = Options::new(Mode::Simple);
        options.force = true;
        let prompter = ScriptedPrompter::new(vec![]);

        assert!(walk(&[&path], &options, &collab, &prompter));
        assert!(!path.exists());
    }

    #[test]
    fn interactive_declining_leaves_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"secret").unwrap();

        let (entropy, reporter, scrubber, aux, flags, device, side_streams) = collaborators();
        let collab = Collaborators {
            entropy: &entropy,
            reporter: &reporter,
            scrubber: &scrubber,
            aux: &aux,
            flags: &flags,
            device: &device,
            side_streams: &side_streams,
        };
        let mut options = Options::new(Mode::Simple);
        options.interactive = true;
        let prompter = ScriptedPrompter::new(vec![false]);

        assert!(!walk(&[&path], &options, &collab, &prompter));
        assert!(path.exists());
    }

    #[test]
    fn bare_directory_without_recursive_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (entropy, reporter, scrubber, aux, flags, device, side_streams) = collaborators();
        let collab = Collaborators {
            entropy: &entropy,
            reporter: &reporter,
            scrubber: &scrubber,
            aux: &aux,
            flags: &flags,
            device: &device,
            side_streams: &side_streams,
        };
        let options = Options::new(Mode::Simple);
        let prompter = ScriptedPrompter::new(vec![]);

        assert!(!walk(&[dir.path()], &options, &collab, &prompter));
        assert!(dir.path().exists());
    }
}
