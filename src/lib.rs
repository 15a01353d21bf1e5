//! Secure file removal: overwrite a file's contents with a configurable
//! pass schedule before unlinking it, so that an undelete tool or a disk
//! forensics pass has nothing left to recover.
//!
//! The crate is split the way the on-disk work is split:
//!
//! - [`pattern`] tiles a short byte pattern across an arbitrary buffer.
//! - [`schedule`] and [`options`] describe *what* to write and *how loud*
//!   to be about it.
//! - [`engine`] writes one schedule's passes over an already-open
//!   [`target::Target`].
//! - [`driver`] turns a path into a `Target` (classify, lock, probe
//!   geometry), drives the engine over it and its side streams, and hands
//!   the name off to [`scrub`].
//! - [`walker`] drives the driver over a set of roots, handling
//!   confirmation prompts.
//!
//! Platform-specific concerns ([`aux`], [`fs_flags`], [`device`],
//! [`side_streams`]) are each behind a small trait with one implementation
//! per platform and a no-op fallback, rather than `#[cfg]` ladders running
//! through the engine and driver themselves.

pub mod aux;
pub mod device;
pub mod driver;
pub mod engine;
pub mod entropy;
pub mod error;
pub mod fs_flags;
pub mod options;
pub mod pattern;
pub mod prompt;
pub mod reporter;
pub mod schedule;
pub mod scrub;
pub mod side_streams;
mod signal;
pub mod target;
pub mod walker;

pub use driver::{Collaborators, DefaultCollaborators};
pub use error::{Error, Result};
pub use options::{Mode, Options, VerboseLevel};
pub use prompt::{Prompter, StdinPrompter};
pub use reporter::{LogReporter, Reporter};
pub use walker::walk;
