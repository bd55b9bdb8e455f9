// ── Raw file and device handles ───────────────────────────────────────────────
//
// `Win32File` is a borrowed view of a HANDLE that Java owns.  It never
// closes on drop; only an explicit `Device::close` releases the handle.

#![allow(unsafe_code)]

use std::{ffi::c_void, mem::size_of, ptr};

use windows::{
    core::PCWSTR,
    Win32::{
        Foundation::{CloseHandle, GENERIC_READ, GENERIC_WRITE, HANDLE},
        Storage::FileSystem::{
            CreateFileW, GetFileInformationByHandle, ReadFile, SetFilePointerEx, WriteFile,
            BY_HANDLE_FILE_INFORMATION, FILE_ATTRIBUTE_NORMAL, FILE_BEGIN, FILE_CURRENT,
            FILE_SHARE_MODE, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING,
        },
        System::{
            Ioctl::{
                DISK_GEOMETRY, DISK_GEOMETRY_EX, GET_LENGTH_INFORMATION,
                IOCTL_DISK_GET_DRIVE_GEOMETRY, IOCTL_DISK_GET_DRIVE_GEOMETRY_EX,
                IOCTL_DISK_GET_LENGTH_INFO, IOCTL_DISK_GET_PARTITION_INFO,
                IOCTL_STORAGE_EJECT_MEDIA, IOCTL_STORAGE_LOAD_MEDIA, PARTITION_INFORMATION,
            },
            IO::DeviceIoControl,
        },
    },
};

use super::wide;
use crate::{
    device::Device,
    error::{OsCode, Result, ShimError, Transfer},
    handle::HandleToken,
};

/// `ERROR_INVALID_NAME`, for paths Win32 cannot represent.
const ERROR_INVALID_NAME: OsCode = OsCode(123);

// ── Access profiles ───────────────────────────────────────────────────────────

/// The two ways Java opens a file or device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// `GENERIC_READ`; other processes may keep reading and writing.
    ReadOnly,
    /// `GENERIC_READ | GENERIC_WRITE`; other processes may only read.
    ReadWrite,
}

impl AccessMode {
    fn desired_access(self) -> u32 {
        match self {
            Self::ReadOnly => GENERIC_READ.0,
            Self::ReadWrite => GENERIC_READ.0 | GENERIC_WRITE.0,
        }
    }

    fn share_mode(self) -> FILE_SHARE_MODE {
        match self {
            Self::ReadOnly => FILE_SHARE_READ | FILE_SHARE_WRITE,
            Self::ReadWrite => FILE_SHARE_READ,
        }
    }
}

// ── Win32File ─────────────────────────────────────────────────────────────────

pub struct Win32File(HANDLE);

impl Win32File {
    /// Open an existing file or device (`\\.\PhysicalDrive0`, `\\.\D:`, …).
    pub fn open(path: &str, mode: AccessMode) -> Result<Self> {
        if path.contains('\0') {
            return Err(ShimError::Open {
                path: path.to_owned(),
                code: ERROR_INVALID_NAME,
            });
        }
        let path_wide = wide(path);
        log::debug!("opening {path:?} as {mode:?}");

        // SAFETY: path_wide is a null-terminated UTF-16 string that outlives
        // the call.  No security attributes or template handle are passed.
        let handle = unsafe {
            CreateFileW(
                PCWSTR(path_wide.as_ptr()),
                mode.desired_access(),
                mode.share_mode(),
                None,
                OPEN_EXISTING,
                FILE_ATTRIBUTE_NORMAL,
                HANDLE::default(),
            )
        }
        .map_err(|e| ShimError::Open {
            path: path.to_owned(),
            code: e.into(),
        })?;
        Ok(Self(handle))
    }

    /// View a handle that came back from Java.
    pub fn from_token(token: HandleToken) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> HandleToken {
        self.0.into()
    }

    /// `DeviceIoControl` with no input and a single fixed-size output struct.
    fn query<T: Default>(&self, code: u32, what: &str) -> std::result::Result<T, OsCode> {
        let mut out = T::default();
        let mut returned = 0u32;
        // SAFETY: `out` is a valid, writable T of exactly the size we report;
        // the call is synchronous (no OVERLAPPED) so nothing outlives it.
        unsafe {
            DeviceIoControl(
                self.0,
                code,
                None,
                0,
                Some(ptr::addr_of_mut!(out).cast::<c_void>()),
                size_of::<T>() as u32,
                Some(ptr::addr_of_mut!(returned)),
                None,
            )
        }?;
        if returned as usize != size_of::<T>() {
            log::debug!(
                "expected {} bytes in return from {what}, got {returned}",
                size_of::<T>()
            );
        }
        Ok(out)
    }

    /// `DeviceIoControl` with no buffers at all.
    fn control(&self, code: u32) -> std::result::Result<(), OsCode> {
        let mut returned = 0u32;
        // SAFETY: no buffers are passed; `returned` lives across the
        // synchronous call.
        unsafe {
            DeviceIoControl(
                self.0,
                code,
                None,
                0,
                None,
                0,
                Some(ptr::addr_of_mut!(returned)),
                None,
            )
        }?;
        Ok(())
    }
}

impl Device for Win32File {
    fn set_position(&self, offset: i64) -> std::result::Result<(), OsCode> {
        // SAFETY: the handle is whatever Java handed us; an invalid one makes
        // the call fail with ERROR_INVALID_HANDLE, nothing worse.
        unsafe { SetFilePointerEx(self.0, offset, None, FILE_BEGIN) }?;
        Ok(())
    }

    fn position(&self) -> std::result::Result<u64, OsCode> {
        let mut pos = 0i64;
        // SAFETY: moving by zero from FILE_CURRENT only reads the pointer;
        // `pos` outlives the call.
        unsafe { SetFilePointerEx(self.0, 0, Some(ptr::addr_of_mut!(pos)), FILE_CURRENT) }?;
        Ok(pos as u64)
    }

    fn read(&self, buf: &mut [u8]) -> std::result::Result<usize, Transfer> {
        let mut read = 0u32;
        // SAFETY: ReadFile writes at most buf.len() bytes into buf and the
        // count into `read`; both outlive the synchronous call.
        let res = unsafe { ReadFile(self.0, Some(buf), Some(ptr::addr_of_mut!(read)), None) };
        res.map(|()| read as usize).map_err(|e| Transfer {
            code: e.into(),
            bytes: read as usize,
        })
    }

    fn write(&self, buf: &[u8]) -> std::result::Result<usize, Transfer> {
        let mut written = 0u32;
        // SAFETY: WriteFile only reads buf and writes the count into
        // `written`; both outlive the synchronous call.
        let res =
            unsafe { WriteFile(self.0, Some(buf), Some(ptr::addr_of_mut!(written)), None) };
        res.map(|()| written as usize).map_err(|e| Transfer {
            code: e.into(),
            bytes: written as usize,
        })
    }

    fn close(self) -> std::result::Result<(), OsCode> {
        // SAFETY: the caller promises not to use the marshalled handle again.
        unsafe { CloseHandle(self.0) }?;
        Ok(())
    }

    fn eject_media(&self) -> std::result::Result<(), OsCode> {
        self.control(IOCTL_STORAGE_EJECT_MEDIA)
    }

    fn load_media(&self) -> std::result::Result<(), OsCode> {
        self.control(IOCTL_STORAGE_LOAD_MEDIA)
    }

    fn file_size(&self) -> std::result::Result<u64, OsCode> {
        let mut info = BY_HANDLE_FILE_INFORMATION::default();
        // SAFETY: `info` is a valid out-pointer for the duration of the call.
        unsafe { GetFileInformationByHandle(self.0, &mut info) }?;
        Ok((u64::from(info.nFileSizeHigh) << 32) | u64::from(info.nFileSizeLow))
    }

    fn disk_length(&self) -> std::result::Result<u64, OsCode> {
        let info: GET_LENGTH_INFORMATION =
            self.query(IOCTL_DISK_GET_LENGTH_INFO, "IOCTL_DISK_GET_LENGTH_INFO")?;
        log::debug!("got length with IOCTL_DISK_GET_LENGTH_INFO: {}", info.Length);
        Ok(info.Length.max(0) as u64)
    }

    fn partition_length(&self) -> std::result::Result<u64, OsCode> {
        let info: PARTITION_INFORMATION =
            self.query(IOCTL_DISK_GET_PARTITION_INFO, "IOCTL_DISK_GET_PARTITION_INFO")?;
        log::debug!(
            "got length with IOCTL_DISK_GET_PARTITION_INFO: {}",
            info.PartitionLength
        );
        Ok(info.PartitionLength.max(0) as u64)
    }

    fn sector_size_ex(&self) -> std::result::Result<u32, OsCode> {
        let geom: DISK_GEOMETRY_EX =
            self.query(IOCTL_DISK_GET_DRIVE_GEOMETRY_EX, "IOCTL_DISK_GET_DRIVE_GEOMETRY_EX")?;
        Ok(geom.Geometry.BytesPerSector)
    }

    fn sector_size_legacy(&self) -> std::result::Result<u32, OsCode> {
        let geom: DISK_GEOMETRY =
            self.query(IOCTL_DISK_GET_DRIVE_GEOMETRY, "IOCTL_DISK_GET_DRIVE_GEOMETRY")?;
        Ok(geom.BytesPerSector)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;
    use crate::device;

    fn temp_file_with(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().expect("temp file");
        f.write_all(contents).expect("write");
        f.flush().expect("flush");
        f
    }

    #[test]
    fn open_read_and_measure_a_real_file() {
        let f = temp_file_with(b"H+\x00\x04 volume header");
        let path = f.path().to_str().expect("utf-8 temp path");

        let file = Win32File::open(path, AccessMode::ReadOnly).expect("open");
        assert_eq!(device::length(&file).unwrap(), 19);
        assert_eq!(device::sector_size(&file), device::UNKNOWN_SECTOR_SIZE);

        device::seek(&file, 4).unwrap();
        assert_eq!(device::read(&file, 6).unwrap(), b" volum");
        assert_eq!(device::file_pointer(&file).unwrap(), 10);

        // The marshalled form reopens the same handle.
        let again = Win32File::from_token(HandleToken::from_bytes(&file.token().to_bytes()));
        assert_eq!(device::file_pointer(&again).unwrap(), 10);
        device::close(again).unwrap();
    }

    #[test]
    fn read_write_profile_round_trips() {
        let f = temp_file_with(&[0u8; 16]);
        let path = f.path().to_str().expect("utf-8 temp path");

        let file = Win32File::open(path, AccessMode::ReadWrite).expect("open");
        device::seek(&file, 3).unwrap();
        device::write(&file, b"hfsx").unwrap();
        device::seek(&file, 3).unwrap();
        assert_eq!(device::read(&file, 4).unwrap(), b"hfsx");
        device::close(file).unwrap();
    }

    #[test]
    fn missing_files_report_the_os_code() {
        match Win32File::open(r"C:\does\not\exist\hfsx.dmg", AccessMode::ReadOnly) {
            // ERROR_PATH_NOT_FOUND
            Err(ShimError::Open { code, .. }) => assert_eq!(code, OsCode(3)),
            Err(other) => panic!("expected Open error, got {other:?}"),
            Ok(_) => panic!("opened a file that does not exist"),
        }
    }

    #[test]
    fn invalid_token_fails_cleanly() {
        let file = Win32File::from_token(HandleToken::from_bytes(&[1, 2, 3]));
        assert!(matches!(device::seek(&file, 0), Err(ShimError::Seek { .. })));
    }
}
