//! Block-device geometry probing (spec §4.4 step 5, §8 invariant 7): when
//! the target is a block device rather than a regular file, its extent and
//! optimal I/O size come from device ioctls instead of `fstat`.

use std::fs::File;
use std::os::unix::io::AsRawFd;

use crate::error::Result;
use crate::reporter::Reporter;

/// What the engine needs to know about a target before it can schedule
/// passes over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceGeometry {
    /// Total addressable size in bytes.
    pub size_bytes: u64,
    /// The device's preferred I/O block size, used as the scratch buffer's
    /// starting capacity.
    pub sector_size: u64,
}

/// Reports block-device geometry for targets that are devices rather than
/// regular files.
pub trait DeviceGeometryProbe {
    /// Returns `Some` geometry if `file` refers to a block device this
    /// platform knows how to query, `None` otherwise (the driver then falls
    /// back to `fstat`'s `st_size`).
    fn probe(&self, file: &File, reporter: &dyn Reporter) -> Result<Option<DeviceGeometry>>;
}

#[cfg(all(target_os = "linux", not(feature = "no-platform-caps")))]
mod linux_ioctl {
    nix::ioctl_read!(blkgetsize64, 0x12, 114, u64);
    nix::ioctl_read!(blksszget, 0x12, 104, libc::c_int);
    nix::ioctl_read!(blkgetsize, 0x12, 96, libc::c_ulong);
}

#[cfg(all(target_os = "linux", not(feature = "no-platform-caps")))]
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxBlockDeviceProbe;

#[cfg(all(target_os = "linux", not(feature = "no-platform-caps")))]
impl DeviceGeometryProbe for LinuxBlockDeviceProbe {
    fn probe(&self, file: &File, reporter: &dyn Reporter) -> Result<Option<DeviceGeometry>> {
        let metadata = match file.metadata() {
            Ok(metadata) => metadata,
            Err(_) => return Ok(None),
        };
        use std::os::unix::fs::FileTypeExt;
        if !metadata.file_type().is_block_device() {
            return Ok(None);
        }

        let fd = file.as_raw_fd();
        let mut size_bytes: u64 = 0;
        // SAFETY: fd is a valid, open block device descriptor; size_bytes is
        // a correctly-sized out parameter for BLKGETSIZE64.
        if let Err(err) = unsafe { linux_ioctl::blkgetsize64(fd, &mut size_bytes) } {
            reporter.errorp("reading block device size (BLKGETSIZE64)", err);
            return Ok(None);
        }

        let mut sector_size: libc::c_int = 0;
        // SAFETY: as above, for BLKSSZGET.
        let sector_size = match unsafe { linux_ioctl::blksszget(fd, &mut sector_size) } {
            Ok(_) => sector_size.max(0) as u64,
            Err(err) => {
                reporter.notice(&format!("couldn't read sector size (BLKSSZGET): {err}"));
                0
            }
        };

        let mut block_count: libc::c_ulong = 0;
        // SAFETY: as above, for BLKGETSIZE.
        match unsafe { linux_ioctl::blkgetsize(fd, &mut block_count) } {
            Ok(_) if sector_size != 0 => {
                let computed = block_count as u64 * sector_size;
                if computed != size_bytes {
                    reporter.notice(&format!(
                        "block count {block_count} * sector size {sector_size} = {computed}, \
                         disagrees with the reported device size {size_bytes} (BLKGETSIZE64)"
                    ));
                }
            }
            Ok(_) => {}
            Err(err) => reporter.notice(&format!("couldn't read block count (BLKGETSIZE): {err}")),
        }

        Ok(Some(DeviceGeometry {
            size_bytes,
            sector_size,
        }))
    }
}

/// No-op probe: every target is treated as a regular file.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDeviceProbe;

impl DeviceGeometryProbe for NullDeviceProbe {
    fn probe(&self, _file: &File, _reporter: &dyn Reporter) -> Result<Option<DeviceGeometry>> {
        Ok(None)
    }
}

/// The `DeviceGeometryProbe` this platform actually supports, chosen at
/// compile time.
#[cfg(all(target_os = "linux", not(feature = "no-platform-caps")))]
pub fn platform_probe() -> Box<dyn DeviceGeometryProbe> {
    Box::new(LinuxBlockDeviceProbe)
}

#[cfg(any(not(target_os = "linux"), feature = "no-platform-caps"))]
pub fn platform_probe() -> Box<dyn DeviceGeometryProbe> {
    Box::new(NullDeviceProbe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_probe_defers_to_fstat() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        let file = std::fs::File::create(&path).unwrap();
        let reporter = crate::reporter::LogReporter;
        assert_eq!(NullDeviceProbe.probe(&file, &reporter).unwrap(), None);
    }
}
