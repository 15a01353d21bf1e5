//! Extended-attribute auxiliary extents (spec §4.2.2), backed by the
//! `xattr` crate's `FileExt` so enumeration and overwrite both go through
//! the already-open descriptor rather than re-resolving the path.

use std::fs::File;

use xattr::FileExt;

use super::AuxiliaryEnumerator;
use crate::error::Result;
use crate::pattern;
use crate::reporter::Reporter;

/// Enumeration is abandoned, with a diagnostic, once the summed key-name
/// length run past this many bytes — a runaway or hostile attribute list is
/// not worth blocking the rest of the pass over (spec §4.2.2).
const KEY_LIST_ABANDON_BYTES: usize = 1024 * 1024;

#[derive(Debug, Default, Clone, Copy)]
pub struct XattrEnumerator;

impl AuxiliaryEnumerator for XattrEnumerator {
    fn overwrite_all(&self, file: &File, pattern_buffer: &[u8], reporter: &dyn Reporter) -> Result<()> {
        let names = match file.list_xattr() {
            Ok(names) => names,
            Err(err) => {
                reporter.errorp("reading extended attribute list", crate::error::errno_from_io(&err));
                return Ok(());
            }
        };

        let mut scanned_bytes = 0usize;
        let mut value = Vec::new();

        for name in names {
            scanned_bytes += name.len();
            if scanned_bytes > KEY_LIST_ABANDON_BYTES {
                reporter.notice("extended attribute list too large, abandoning the remainder");
                break;
            }

            let existing = match file.get_xattr(&name) {
                Ok(Some(existing)) => existing,
                Ok(None) => continue,
                Err(err) => {
                    reporter.errorp(
                        &format!("reading extended attribute {:?}", name),
                        crate::error::errno_from_io(&err),
                    );
                    continue;
                }
            };

            value.clear();
            value.resize(existing.len(), 0);
            if !pattern_buffer.is_empty() {
                pattern::fill(&mut value, pattern_buffer);
            }

            if let Err(err) = file.set_xattr(&name, &value) {
                reporter.errorp(
                    &format!("overwriting extended attribute {:?}", name),
                    crate::error::errno_from_io(&err),
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::LogReporter;
    use std::io::Write;

    #[test]
    fn missing_attributes_is_a_silent_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"hello").unwrap();
        let file = std::fs::File::open(&path).unwrap();

        let reporter = LogReporter;
        let enumerator = XattrEnumerator;
        let pattern = [0xAAu8; 16];
        assert!(enumerator.overwrite_all(&file, &pattern, &reporter).is_ok());
    }
}
