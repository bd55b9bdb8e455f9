// ── I/O shim contract ─────────────────────────────────────────────────────────
//
// The rules every shim operation follows, independent of the OS:
//   • no retries: an OS failure is reported the first time it happens;
//   • every failure carries the OS error code and enough context to be read
//     in a Java stack trace;
//   • a short write is an error even though the OS call succeeded;
//   • fallback queries run in a fixed order through `strategy`.
//
// `platform::win32::file::Win32File` is the production `Device`.

use std::ops::Range;

use crate::{
    error::{FilePosition, OsCode, Result, ShimError, Transfer},
    strategy::{first_success, Probe},
};

/// Returned by [`sector_size`] when no geometry query worked.
pub const UNKNOWN_SECTOR_SIZE: i32 = -1;

/// The raw OS primitives behind one open file or device.
///
/// Each method maps to exactly one OS call.
pub trait Device {
    /// Move the pointer to `offset` bytes from the start.
    fn set_position(&self, offset: i64) -> std::result::Result<(), OsCode>;

    /// Current pointer, measured from the start.
    fn position(&self) -> std::result::Result<u64, OsCode>;

    /// Read at most `buf.len()` bytes at the pointer. `Ok(0)` at the end.
    fn read(&self, buf: &mut [u8]) -> std::result::Result<usize, Transfer>;

    /// Write `buf` at the pointer, returning what the OS says it wrote.
    fn write(&self, buf: &[u8]) -> std::result::Result<usize, Transfer>;

    fn close(self) -> std::result::Result<(), OsCode>
    where
        Self: Sized;

    fn eject_media(&self) -> std::result::Result<(), OsCode>;
    fn load_media(&self) -> std::result::Result<(), OsCode>;

    /// Size as a regular file.
    fn file_size(&self) -> std::result::Result<u64, OsCode>;
    /// Size of a whole disk or volume.
    fn disk_length(&self) -> std::result::Result<u64, OsCode>;
    /// Size of a partition, for drivers that predate the disk length query.
    fn partition_length(&self) -> std::result::Result<u64, OsCode>;

    /// Bytes per sector from the extended geometry query.
    fn sector_size_ex(&self) -> std::result::Result<u32, OsCode>;
    /// Bytes per sector from the legacy geometry query.
    fn sector_size_legacy(&self) -> std::result::Result<u32, OsCode>;
}

// ── Region checks ─────────────────────────────────────────────────────────────

/// Validate a Java `(offset, length)` pair against an array of `array_len`
/// bytes and turn it into a Rust range.
pub fn check_region(array_len: usize, offset: i32, length: i32) -> Result<Range<usize>> {
    let out_of_bounds = || ShimError::Region { offset, length, array_len };
    let start = usize::try_from(offset).map_err(|_| out_of_bounds())?;
    let len = usize::try_from(length).map_err(|_| out_of_bounds())?;
    let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
    if end > array_len {
        return Err(out_of_bounds());
    }
    Ok(start..end)
}

// ── Operations ────────────────────────────────────────────────────────────────

pub fn seek<D: Device>(dev: &D, offset: i64) -> Result<()> {
    dev.set_position(offset)
        .map_err(|code| ShimError::Seek { offset, code })
}

pub fn file_pointer<D: Device>(dev: &D) -> Result<u64> {
    dev.position().map_err(|code| ShimError::FilePointer { code })
}

/// Position for error messages. A failed query is not an error here.
fn position_hint<D: Device>(dev: &D) -> FilePosition {
    dev.position().map_or(FilePosition::Unknown, FilePosition::At)
}

/// Read up to `length` bytes into a fresh buffer of exactly that size,
/// truncated to what the OS delivered.
pub fn read<D: Device>(dev: &D, length: usize) -> Result<Vec<u8>> {
    let position = position_hint(dev);
    let mut buf = vec![0u8; length];
    match dev.read(&mut buf) {
        Ok(n) => {
            buf.truncate(n);
            Ok(buf)
        }
        Err(Transfer { code, bytes }) => Err(ShimError::Read {
            code,
            length,
            position,
            read: bytes,
        }),
    }
}

/// Write all of `data` or fail.
pub fn write<D: Device>(dev: &D, data: &[u8]) -> Result<()> {
    let position = position_hint(dev);
    match dev.write(data) {
        Ok(n) if n == data.len() => Ok(()),
        Ok(n) => Err(ShimError::PartialWrite {
            written: n,
            length: data.len(),
        }),
        Err(Transfer { code, bytes }) => Err(ShimError::Write {
            code,
            length: data.len(),
            position,
            written: bytes,
        }),
    }
}

pub fn close<D: Device>(dev: D) -> Result<()> {
    dev.close().map_err(|code| ShimError::Close { code })
}

pub fn eject_media<D: Device>(dev: &D) -> Result<()> {
    dev.eject_media().map_err(|code| ShimError::Eject { code })
}

pub fn load_media<D: Device>(dev: &D) -> Result<()> {
    dev.load_media().map_err(|code| ShimError::Load { code })
}

/// Length in bytes: file size, then disk length, then partition length.
pub fn length<D: Device>(dev: &D) -> Result<u64> {
    let probes = [
        Probe::new("file size", D::file_size),
        Probe::new("disk length", D::disk_length),
        Probe::new("partition length", D::partition_length),
    ];
    first_success(dev, &probes).map_err(|exhausted| ShimError::LengthUnavailable {
        code: exhausted.last.unwrap_or(OsCode(0)),
    })
}

/// Bytes per sector, or [`UNKNOWN_SECTOR_SIZE`] when neither geometry query
/// answers (regular files, for instance).
pub fn sector_size<D: Device>(dev: &D) -> i32 {
    let probes = [
        Probe::new("extended drive geometry", D::sector_size_ex),
        Probe::new("drive geometry", D::sector_size_legacy),
    ];
    match first_success(dev, &probes) {
        Ok(bytes) => i32::try_from(bytes).unwrap_or(UNKNOWN_SECTOR_SIZE),
        Err(exhausted) => {
            log::debug!("failed to get bytes per sector: {exhausted}");
            UNKNOWN_SECTOR_SIZE
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
