// ── Central error types ───────────────────────────────────────────────────────
//
// Three families live here:
//   • `ShimError`  – one I/O shim call failed; becomes a Java exception.
//   • `ProbeError` – one launcher strategy failed; logged and suppressed.
//   • `LaunchError` – the launcher as a whole failed; becomes an exit code.
//
// No panics in production paths.

use std::fmt;
use std::io;

use thiserror::Error;

// ── OS error codes ────────────────────────────────────────────────────────────

/// A raw Win32 error code (`GetLastError()` value).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsCode(pub u32);

impl OsCode {
    /// Recover the Win32 code from an HRESULT.
    ///
    /// The windows crate wraps `GetLastError()` values as
    /// `HRESULT_FROM_WIN32` (`0x8007xxxx`); anything else is kept verbatim.
    pub fn from_hresult(hr: i32) -> Self {
        let bits = hr as u32;
        if bits & 0xFFFF_0000 == 0x8007_0000 {
            Self(bits & 0xFFFF)
        } else {
            Self(bits)
        }
    }
}

impl fmt::Display for OsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

#[cfg(windows)]
impl From<windows::core::Error> for OsCode {
    fn from(e: windows::core::Error) -> Self {
        Self::from_hresult(e.code().0)
    }
}

/// A failed transfer: the OS error plus whatever was moved before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub code: OsCode,
    pub bytes: usize,
}

// ── File position ─────────────────────────────────────────────────────────────

/// The file pointer as it was when an operation started.
///
/// Only used to make error messages readable. `Unknown` is never handed
/// back to callers as a real position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilePosition {
    At(u64),
    Unknown,
}

impl FilePosition {
    /// The value printed when the position could not be queried.
    pub const UNKNOWN_RAW: i64 = i64::MAX;

    pub fn as_raw(self) -> i64 {
        match self {
            Self::At(p) => i64::try_from(p).unwrap_or(Self::UNKNOWN_RAW),
            Self::Unknown => Self::UNKNOWN_RAW,
        }
    }
}

impl fmt::Display for FilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_raw())
    }
}

// ── I/O shim ──────────────────────────────────────────────────────────────────

/// Every error the I/O shim can report to its Java caller.
#[derive(Debug, Error)]
pub enum ShimError {
    #[error("Filename is null.")]
    NullPath,

    #[error("Error {code} while attempting to open \"{path}\".")]
    Open { path: String, code: OsCode },

    #[error("Error {code} while attempting to set file pointer to {offset}.")]
    Seek { offset: i64, code: OsCode },

    #[error("Error {code} while attempting to get file pointer!")]
    FilePointer { code: OsCode },

    #[error(
        "Error {code} while attempting to read {length} bytes from position \
         {position} in file (read {read} bytes)."
    )]
    Read {
        code: OsCode,
        length: usize,
        position: FilePosition,
        read: usize,
    },

    #[error(
        "Error {code} while attempting to write {length} bytes to position \
         {position} in file (wrote {written} bytes)."
    )]
    Write {
        code: OsCode,
        length: usize,
        position: FilePosition,
        written: usize,
    },

    #[error("Could not write entire buffer to file! Managed to write {written} / {length} bytes.")]
    PartialWrite { written: usize, length: usize },

    #[error("Error {code} while closing file.")]
    Close { code: OsCode },

    #[error("Error {code} while attempting to eject media.")]
    Eject { code: OsCode },

    #[error("Error {code} while attempting to load media.")]
    Load { code: OsCode },

    #[error("Error {code} while attempting to get file size.")]
    LengthUnavailable { code: OsCode },

    /// `[offset, offset + length)` does not fit inside the Java array.
    #[error("Region [{offset}, {offset} + {length}) is outside an array of {array_len} bytes.")]
    Region {
        offset: i32,
        length: i32,
        array_len: usize,
    },

    /// A JNI call failed. If it left a Java exception pending, that
    /// exception is what the caller sees.
    #[error("JNI call failed: {0}")]
    Jni(#[from] jni::errors::Error),
}

impl ShimError {
    /// Binary name of the Java exception class this error is thrown as.
    pub fn java_class(&self) -> &'static str {
        match self {
            Self::NullPath => "java/lang/NullPointerException",
            Self::Region { .. } => "java/lang/ArrayIndexOutOfBoundsException",
            _ => "java/lang/RuntimeException",
        }
    }
}

// ── Launcher strategies ───────────────────────────────────────────────────────

/// Why a single discovery or launch strategy did not produce a runtime.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A Win32 API call returned a failure code.
    #[error("{function} failed (error {code})")]
    Win32 {
        /// The name of the failing function, for display purposes.
        function: &'static str,
        code: OsCode,
    },

    #[error("strategy disabled")]
    Disabled,

    #[error("environment variable {0} is not set")]
    MissingVariable(String),

    #[error("no usable runtime under {0}")]
    NothingUnder(String),

    #[error("JNI_CreateJavaVM returned {0}")]
    CreateVm(i32),

    #[error("could not spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid launcher argument: {0}")]
    Argument(#[from] std::ffi::NulError),

    #[error("JNI call failed: {0}")]
    Jni(#[from] jni::errors::Error),
}

#[cfg(windows)]
impl From<windows::core::Error> for ProbeError {
    fn from(e: windows::core::Error) -> Self {
        Self::Win32 {
            function: "windows",
            code: e.into(),
        }
    }
}

// ── Launcher ──────────────────────────────────────────────────────────────────

/// A failure the launcher reports to the user and turns into an exit code.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("No Java Virtual Machine found! Please install a Java runtime and try again.")]
    RuntimeNotFound,

    #[error("Could not get the current working directory: {0}")]
    WorkingDirectoryUnavailable(io::Error),

    #[error("Could not parse the argument vector: {0:?} is not valid Unicode.")]
    ArgumentParse(std::ffi::OsString),

    #[error("Could not get the fully qualified path of the executable: {0}")]
    OwnPathUnavailable(io::Error),

    #[error("Error while trying to create new process: {0}")]
    ElevationFailed(ProbeError),

    #[error("The Java application could not be started: {0}")]
    EntryPointFault(String),
}

impl LaunchError {
    /// Process exit code for this failure. Zero is reserved for success.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RuntimeNotFound => -1,
            Self::WorkingDirectoryUnavailable(_) => -2,
            Self::ArgumentParse(_) => -3,
            Self::OwnPathUnavailable(_) => -4,
            Self::ElevationFailed(_) => -5,
            Self::EntryPointFault(_) => -6,
        }
    }
}

/// Convenience alias for shim operations.
pub type Result<T> = std::result::Result<T, ShimError>;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hresult_from_win32_unwraps_to_the_raw_code() {
        // HRESULT_FROM_WIN32(ERROR_ACCESS_DENIED)
        assert_eq!(OsCode::from_hresult(0x8007_0005_u32 as i32), OsCode(5));
        // E_FAIL is not a wrapped Win32 code.
        assert_eq!(OsCode::from_hresult(0x8000_4005_u32 as i32), OsCode(0x8000_4005));
    }

    #[test]
    fn os_code_renders_as_padded_hex() {
        assert_eq!(OsCode(0x57).to_string(), "0x00000057");
    }

    #[test]
    fn unknown_position_prints_the_sentinel() {
        let e = ShimError::Read {
            code: OsCode(0x17),
            length: 512,
            position: FilePosition::Unknown,
            read: 0,
        };
        let msg = e.to_string();
        assert!(msg.contains("0x00000017"), "{msg}");
        assert!(msg.contains(&i64::MAX.to_string()), "{msg}");
        assert!(msg.contains("512 bytes"), "{msg}");
    }

    #[test]
    fn exception_classes() {
        assert_eq!(ShimError::NullPath.java_class(), "java/lang/NullPointerException");
        let region = ShimError::Region { offset: 4, length: 8, array_len: 6 };
        assert_eq!(region.java_class(), "java/lang/ArrayIndexOutOfBoundsException");
        let close = ShimError::Close { code: OsCode(6) };
        assert_eq!(close.java_class(), "java/lang/RuntimeException");
    }

    #[test]
    fn exit_codes_are_distinct_and_negative() {
        let errors = [
            LaunchError::RuntimeNotFound,
            LaunchError::WorkingDirectoryUnavailable(io::Error::other("cwd")),
            LaunchError::ArgumentParse("x".into()),
            LaunchError::OwnPathUnavailable(io::Error::other("exe")),
            LaunchError::ElevationFailed(ProbeError::Disabled),
            LaunchError::EntryPointFault("boom".into()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(LaunchError::exit_code).collect();
        assert!(codes.iter().all(|&c| c < 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert_eq!(LaunchError::RuntimeNotFound.exit_code(), -1);
    }
}
