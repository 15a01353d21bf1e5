//! The overwrite engine (spec §4.2): runs one `Mode`'s pass schedule over a
//! `Target`'s main extent, plus its auxiliary extents, with progress
//! reporting and a one-shot interrupt checkpoint per pass.

use std::io::{Seek, SeekFrom};
use std::os::unix::io::AsRawFd;

use crate::aux::AuxiliaryEnumerator;
use crate::entropy::EntropySource;
use crate::error::{errno_from_io, Error, Result};
use crate::options::VerboseLevel;
use crate::pattern;
use crate::reporter::Reporter;
use crate::schedule::Pass;
use crate::signal;
use crate::target::Target;

const KIB: u64 = 1024;
const MIB: u64 = KIB * KIB;
const GIB: u64 = KIB * KIB * KIB;

/// Runs `target`'s mode-derived pass schedule to completion.
///
/// Each pass: fill the scratch buffer with the pass's pattern, overwrite
/// auxiliary extents with it, write the buffer in a tiled loop over the
/// main extent, flush to media, seek back to the start. A `SignalGuard`
/// covers the whole call; interrupts are checked once per buffer write and
/// only print the current file name, they do not abort the pass (spec §4.2,
/// §9 "Global flag via signal"). Progress lines are only reported at
/// `verbose >= 2`, or for the one-shot interrupt notice regardless of
/// verbosity (spec §4.2 "Signal discipline").
#[allow(clippy::too_many_arguments)]
pub fn run_passes(
    target: &mut Target,
    schedule: &[Pass],
    entropy: &dyn EntropySource,
    aux: &dyn AuxiliaryEnumerator,
    reporter: &dyn Reporter,
    verbose: VerboseLevel,
) -> Result<()> {
    let _guard = crate::signal::SignalGuard::install();

    let mut pass_number = 1u32;
    for pass in schedule {
        match pass {
            Pass::Random { count } => {
                for _ in 0..*count {
                    run_one_pass(target, PassFill::Random, entropy, aux, reporter, pass_number, verbose)?;
                    pass_number += 1;
                }
            }
            Pass::Byte(byte) => {
                run_one_pass(target, PassFill::Bytes(&[*byte]), entropy, aux, reporter, pass_number, verbose)?;
                pass_number += 1;
            }
            Pass::Tuple(tuple) => {
                run_one_pass(target, PassFill::Bytes(tuple), entropy, aux, reporter, pass_number, verbose)?;
                pass_number += 1;
            }
            Pass::Literal(bytes) => {
                run_one_pass(target, PassFill::Bytes(bytes), entropy, aux, reporter, pass_number, verbose)?;
                pass_number += 1;
            }
        }
    }

    Ok(())
}

enum PassFill<'a> {
    Bytes(&'a [u8]),
    Random,
}

#[allow(clippy::too_many_arguments)]
fn run_one_pass(
    target: &mut Target,
    fill: PassFill<'_>,
    entropy: &dyn EntropySource,
    aux: &dyn AuxiliaryEnumerator,
    reporter: &dyn Reporter,
    pass_number: u32,
    verbose: VerboseLevel,
) -> Result<()> {
    let extent = target.extent();
    let name = target.name().to_path_buf();

    match fill {
        PassFill::Bytes(src) => pattern::fill(target.buffer_mut(), src),
        PassFill::Random => entropy.fill(target.buffer_mut()),
    }

    {
        let (file, buffer) = target.file_and_buffer_mut();
        aux.overwrite_all(file, buffer, reporter)?;
    }

    let file = target.file_mut();
    file.seek(SeekFrom::Start(0))
        .map_err(|err| Error::io(&name, errno_from_io(&err)))?;

    let buffer_len = target.buffer_capacity() as u64;
    let mut written = 0u64;
    let mut last_reported = u64::MAX;

    while extent.saturating_sub(written) >= buffer_len && buffer_len > 0 {
        target
            .write_buffer_prefix(buffer_len as usize)
            .map_err(|err| Error::io(&name, errno_from_io(&err)))?;
        written += buffer_len;

        let interrupted = signal::interrupted();
        if interrupted {
            reporter.progress(&name.display().to_string());
            signal::clear_interrupt();
        }

        if verbose >= 2u8 || interrupted {
            report_progress(reporter, pass_number, written, extent, &mut last_reported);
        }
    }

    let remainder = (extent - written) as usize;
    if remainder > 0 {
        target
            .write_buffer_prefix(remainder)
            .map_err(|err| Error::io(&name, errno_from_io(&err)))?;
    }

    flush_to_media(target.file());

    target
        .file_mut()
        .seek(SeekFrom::Start(0))
        .map_err(|err| Error::io(&name, errno_from_io(&err)))?;

    Ok(())
}

fn report_progress(reporter: &dyn Reporter, pass: u32, written: u64, extent: u64, last_reported: &mut u64) {
    let (value, total, unit) = if extent < MIB {
        (written / KIB, extent / KIB, 'K')
    } else if extent < GIB {
        (written / MIB, extent / MIB, 'M')
    } else {
        (written / GIB, extent / GIB, 'G')
    };
    if value != *last_reported {
        reporter.progress(&format!("pass {pass} {value}{unit}iB/{total}{unit}iB"));
        *last_reported = value;
    }
}

/// Flushes buffered writes all the way to the media. Prefers `F_FULLFSYNC`
/// on the platforms that have it (equivalent to fsync plus a device cache
/// flush), then `fdatasync`, then plain `fsync` (spec §4.2, §9).
fn flush_to_media(file: &std::fs::File) {
    #[cfg(target_os = "macos")]
    {
        let rc = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_FULLFSYNC) };
        if rc == 0 {
            return;
        }
    }
    #[cfg(target_os = "linux")]
    {
        if unsafe { libc::fdatasync(file.as_raw_fd()) } == 0 {
            return;
        }
    }
    let _ = file.sync_all();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aux::NullAuxiliaryEnumerator;
    use crate::entropy::OsEntropySource;
    use crate::reporter::LogReporter;
    use std::io::Read;

    #[test]
    fn single_pass_overwrites_entire_extent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target");
        std::fs::write(&path, vec![0x41u8; 10_000]).unwrap();
        let file = std::fs::OpenOptions::new().read(true).write(true).open(&path).unwrap();
        let mut target = Target::new(file, &path, 10_000, 512);

        run_passes(
            &mut target,
            &[Pass::Byte(0x00)],
            &OsEntropySource,
            &NullAuxiliaryEnumerator,
            &LogReporter,
            VerboseLevel::SILENT,
        )
        .unwrap();

        let mut contents = Vec::new();
        std::fs::File::open(&path).unwrap().read_to_end(&mut contents).unwrap();
        assert!(contents.iter().all(|&b| b == 0x00));
        assert_eq!(contents.len(), 10_000);
    }

    #[test]
    fn buffer_larger_than_extent_still_writes_exact_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small");
        std::fs::write(&path, vec![0xFFu8; 4]).unwrap();
        let file = std::fs::OpenOptions::new().read(true).write(true).open(&path).unwrap();
        let mut target = Target::new(file, &path, 4, 512);

        run_passes(
            &mut target,
            &[Pass::Byte(0xAB)],
            &OsEntropySource,
            &NullAuxiliaryEnumerator,
            &LogReporter,
            VerboseLevel::SILENT,
        )
        .unwrap();

        let mut contents = Vec::new();
        std::fs::File::open(&path).unwrap().read_to_end(&mut contents).unwrap();
        assert_eq!(contents, vec![0xAB; 4]);
    }
}
