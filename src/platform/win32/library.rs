// ── Dynamically loaded runtime library ────────────────────────────────────────
//
// `RuntimeLibrary` owns one `LoadLibraryW` call.  `FreeLibrary` runs on
// drop, which must come after every JavaVM created from it is destroyed.

#![allow(unsafe_code)]

use std::{
    ffi::CStr,
    path::{Path, PathBuf},
};

use windows::{
    core::{PCSTR, PCWSTR},
    Win32::{
        Foundation::HMODULE,
        System::LibraryLoader::{FreeLibrary, GetProcAddress, LoadLibraryW},
    },
};

use super::wide;
use crate::error::{OsCode, ProbeError};

/// A raw exported symbol, to be transmuted to its real signature.
pub type RawSymbol = unsafe extern "system" fn() -> isize;

/// RAII handle to a loaded DLL.
pub struct RuntimeLibrary {
    module: HMODULE,
    path: PathBuf,
}

impl RuntimeLibrary {
    pub fn load(path: &Path) -> Result<Self, ProbeError> {
        let path_wide = wide(path);
        log::debug!("LoadLibraryW({})", path.display());
        // SAFETY: path_wide is a valid null-terminated UTF-16 string.
        let module = unsafe { LoadLibraryW(PCWSTR(path_wide.as_ptr())) }.map_err(|e| {
            ProbeError::Win32 {
                function: "LoadLibraryW",
                code: e.into(),
            }
        })?;
        Ok(Self {
            module,
            path: path.to_owned(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve an exported symbol by name.
    pub fn symbol(&self, name: &CStr) -> Result<RawSymbol, ProbeError> {
        // SAFETY: self.module is a live module handle; name is a valid
        // null-terminated ANSI string that outlives the call.
        let sym = unsafe { GetProcAddress(self.module, PCSTR(name.as_ptr().cast())) };
        sym.ok_or_else(|| ProbeError::Win32 {
            function: "GetProcAddress",
            code: OsCode::from(windows::core::Error::from_win32()),
        })
    }
}

impl Drop for RuntimeLibrary {
    fn drop(&mut self) {
        log::debug!("FreeLibrary({})", self.path.display());
        // SAFETY: self.module came from a successful LoadLibraryW and has not
        // been freed since.  Owners destroy any JavaVM before dropping us.
        unsafe {
            let _ = FreeLibrary(self.module);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel32_resolves_a_known_export() {
        let lib = RuntimeLibrary::load(Path::new("kernel32.dll")).expect("kernel32");
        assert!(lib.symbol(c"GetTickCount").is_ok());
        assert!(lib.symbol(c"JNI_CreateJavaVM").is_err());
    }

    #[test]
    fn missing_library_is_a_probe_error() {
        let err = RuntimeLibrary::load(Path::new(r"C:\nowhere\jvm.dll")).unwrap_err();
        assert!(matches!(err, ProbeError::Win32 { function: "LoadLibraryW", .. }));
    }
}
