//! The "reporter" collaborator (spec §6): diagnostic and progress output,
//! prefixed by the program's display name in the original, forwarded to the
//! `log` facade here so the binary decides where it actually goes.

use nix::errno::Errno;

/// Diagnostic and progress sink consumed by the walker, driver, and engine.
pub trait Reporter {
    /// A fatal or user-facing diagnostic, no errno attached.
    fn error(&self, msg: &str);
    /// Same as `error`, with a platform error description appended.
    fn errorp(&self, msg: &str, err: Errno);
    /// A non-fatal, verbose-gated informational message.
    fn notice(&self, msg: &str);
    /// A progress line (pass/byte-count updates). Called frequently; must
    /// not itself be fallible.
    fn progress(&self, line: &str);
}

/// Default `Reporter`, forwarding to the `log` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn error(&self, msg: &str) {
        log::error!("{msg}");
    }

    fn errorp(&self, msg: &str, err: Errno) {
        log::error!("{msg}: {err}");
    }

    fn notice(&self, msg: &str) {
        log::info!("{msg}");
    }

    fn progress(&self, line: &str) {
        log::debug!("{line}");
    }
}
