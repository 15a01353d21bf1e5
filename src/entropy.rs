//! The "entropy source" collaborator (spec §6): fills a caller-provided
//! buffer with unpredictable bytes for the `random` pass kind.

use rand::RngCore;

/// Fills `buffer` with unpredictable bytes.
pub trait EntropySource {
    fn fill(&self, buffer: &mut [u8]);
}

/// Default `EntropySource`, backed by the thread-local OS-seeded RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropySource;

impl EntropySource for OsEntropySource {
    fn fill(&self, buffer: &mut [u8]) {
        rand::thread_rng().fill_bytes(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_the_whole_buffer() {
        let source = OsEntropySource;
        let mut buf = [0u8; 64];
        source.fill(&mut buf);
        // Not all-zero with overwhelming probability; a flaky failure here
        // would indicate a broken RNG, not bad luck.
        assert!(buf.iter().any(|&b| b != 0));
    }
}
