// ── WOW64 file-system redirection ─────────────────────────────────────────────
//
// A 32-bit launcher on 64-bit Windows would otherwise see System32 silently
// rewritten to SysWOW64.  Redirection is per-thread.

#![allow(unsafe_code)]

use std::{ffi::c_void, ptr};

use windows::Win32::{
    Foundation::BOOL,
    Storage::FileSystem::{Wow64DisableWow64FsRedirection, Wow64RevertWow64FsRedirection},
    System::Threading::{GetCurrentProcess, IsWow64Process},
};

/// Redirection stays disabled while this is alive.
pub struct RedirectionGuard {
    old_value: *mut c_void,
}

/// `true` only when we can be sure this is a 32-bit process on 64-bit Windows.
pub fn is_wow64_process() -> bool {
    let mut wow64 = BOOL(0);
    // SAFETY: GetCurrentProcess returns a pseudo-handle that needs no
    // closing; `wow64` outlives the call.
    let res = unsafe { IsWow64Process(GetCurrentProcess(), ptr::addr_of_mut!(wow64)) };
    res.is_ok() && wow64.as_bool()
}

/// Disable redirection for the calling thread if this is a WOW64 process.
pub fn disable_redirection() -> Option<RedirectionGuard> {
    if !is_wow64_process() {
        return None;
    }
    let mut old_value = ptr::null_mut();
    // SAFETY: `old_value` receives an opaque token that is only ever handed
    // back to Wow64RevertWow64FsRedirection on this thread.
    match unsafe { Wow64DisableWow64FsRedirection(ptr::addr_of_mut!(old_value)) } {
        Ok(()) => {
            log::debug!("disabled WOW64 fs redirection");
            Some(RedirectionGuard { old_value })
        }
        Err(e) => {
            log::warn!("failed to disable WOW64 fs redirection: {e}");
            None
        }
    }
}

impl Drop for RedirectionGuard {
    fn drop(&mut self) {
        // SAFETY: old_value came from Wow64DisableWow64FsRedirection on this
        // thread (the guard is !Send because it holds a raw pointer).
        unsafe {
            let _ = Wow64RevertWow64FsRedirection(self.old_value);
        }
    }
}
