// ── Win32 platform implementation ─────────────────────────────────────────────
//
// One of the few modules where `unsafe` code is permitted.  Every `unsafe`
// block MUST carry a `// SAFETY:` comment that states which invariant makes
// the operation sound.
//
// Nothing in this module is `pub` beyond what callers genuinely need.

#![allow(unsafe_code)]

use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;

// ── Sub-modules ───────────────────────────────────────────────────────────────

pub mod dialogs; // launcher error message box
pub mod file; // Device implementation over a raw HANDLE
pub mod library; // LoadLibraryW / GetProcAddress for jvm.dll
pub mod process; // child java(w).exe and the runas re-launch
pub mod registry; // JavaSoft registry lookups
pub mod wow64; // file-system redirection guard

/// Null-terminated UTF-16 copy of `s`, for `PCWSTR` parameters.
pub(crate) fn wide(s: impl AsRef<OsStr>) -> Vec<u16> {
    s.as_ref().encode_wide().chain(std::iter::once(0)).collect()
}

/// Convert a null-terminated UTF-16 buffer to a `String`.
pub(crate) fn string_from_wide(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}
