// ── Message boxes ─────────────────────────────────────────────────────────────
//
// The launcher has no console in release builds, so a modal box is the only
// way to tell the user why nothing started.

#![allow(unsafe_code)]

use windows::{
    core::PCWSTR,
    Win32::{
        Foundation::HWND,
        UI::WindowsAndMessaging::{MessageBoxW, MB_ICONERROR, MB_OK},
    },
};

use super::wide;

/// Show a modal error dialog with the given title and message.
pub fn show_error(title: &str, message: &str) {
    let msg_wide = wide(message);
    let title_wide = wide(title);

    // SAFETY: msg_wide and title_wide are valid null-terminated UTF-16
    // strings that remain allocated for the duration of the call.
    // HWND::default() (null) means the dialog has no owner window.
    unsafe {
        let _ = MessageBoxW(
            HWND::default(),
            PCWSTR(msg_wide.as_ptr()),
            PCWSTR(title_wide.as_ptr()),
            MB_OK | MB_ICONERROR,
        );
    }
}
