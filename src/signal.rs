//! Signal discipline for the overwrite engine (spec §4.2 "Signal
//! discipline", §5, §9 "Global flag via signal").
//!
//! The engine installs soft handlers for `SIGUSR2`/`SIGINFO` that only set
//! a flag, and ignores `SIGPIPE`, for the duration of a `run_passes` call.
//! `SignalGuard`'s `Drop` impl restores whatever was installed before,
//! unconditionally — including on early-return error paths, which is the
//! point of making this RAII rather than a manual save/restore pair like
//! the C original's.

use std::sync::atomic::{AtomicBool, Ordering};

use nix::sys::signal::{sigaction, SigAction, SigHandler, SigSet, Signal};

/// Process-wide interrupt flag. Set only by `request_interrupt` (a plain
/// signal handler, async-signal-safe); cleared by the engine once it has
/// reported the current file name (spec: "one-shot").
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn request_interrupt(_signo: libc::c_int) {
    INTERRUPTED.store(true, Ordering::Relaxed);
}

/// Returns whether an interrupt has been observed since the last
/// `clear_interrupt`.
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::Relaxed)
}

/// Clears the interrupt flag (one-shot semantics per pass progress line).
pub fn clear_interrupt() {
    INTERRUPTED.store(false, Ordering::Relaxed);
}

/// RAII guard installing the engine's signal dispositions; restores the
/// previous dispositions on drop.
pub struct SignalGuard {
    previous: Vec<(Signal, SigAction)>,
}

impl SignalGuard {
    /// Installs the engine's signal dispositions. Failures to install a
    /// handler for a given signal are not fatal: the engine still runs, it
    /// just won't observe that particular interrupt source.
    pub fn install() -> Self {
        let handler_action = SigAction::new(
            SigHandler::Handler(request_interrupt),
            nix::sys::signal::SaFlags::empty(),
            SigSet::empty(),
        );
        let ignore_pipe = SigAction::new(
            SigHandler::SigIgn,
            nix::sys::signal::SaFlags::empty(),
            SigSet::empty(),
        );

        let mut previous = Vec::new();
        // SAFETY: the handler only performs an atomic store, which is
        // async-signal-safe.
        unsafe {
            if let Ok(old) = sigaction(Signal::SIGUSR2, &handler_action) {
                previous.push((Signal::SIGUSR2, old));
            }
            #[cfg(any(
                target_os = "macos",
                target_os = "freebsd",
                target_os = "openbsd",
                target_os = "netbsd",
                target_os = "dragonfly"
            ))]
            if let Ok(old) = sigaction(Signal::SIGINFO, &handler_action) {
                previous.push((Signal::SIGINFO, old));
            }
            if let Ok(old) = sigaction(Signal::SIGPIPE, &ignore_pipe) {
                previous.push((Signal::SIGPIPE, old));
            }
        }

        SignalGuard { previous }
    }
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        for (signal, action) in self.previous.drain(..) {
            // SAFETY: restoring a previously-observed disposition.
            let _ = unsafe { sigaction(signal, &action) };
        }
        clear_interrupt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_flag_round_trips() {
        clear_interrupt();
        assert!(!interrupted());
        INTERRUPTED.store(true, Ordering::Relaxed);
        assert!(interrupted());
        clear_interrupt();
        assert!(!interrupted());
    }
}
