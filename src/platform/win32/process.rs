// ── Child processes ───────────────────────────────────────────────────────────
//
// Two ways of starting another process:
//   • `spawn_and_wait` – an external java(w).exe, blocking until it exits;
//   • `run_elevated`   – our own image via the shell's "runas" verb, not
//     waiting for it at all.

#![allow(unsafe_code)]

use std::{
    io,
    mem::size_of,
    os::windows::process::CommandExt,
    path::Path,
    process::{Command, ExitStatus},
};

use windows::{
    core::{w, PCWSTR},
    Win32::UI::{
        Shell::{ShellExecuteExW, SEE_MASK_NOASYNC, SHELLEXECUTEINFOW},
        WindowsAndMessaging::SW_SHOW,
    },
};

use super::wide;
use crate::error::ProbeError;

/// Start `program` with an already-quoted argument string and wait for it.
///
/// `raw_args` is appended to the command line verbatim.
pub fn spawn_and_wait(program: &str, raw_args: &str) -> io::Result<ExitStatus> {
    log::debug!("spawning {program} {raw_args}");
    Command::new(program).raw_arg(raw_args).status()
}

/// Ask the shell to re-run `exe` elevated with `parameters`, starting in
/// `directory`.  Returns as soon as the request has been accepted.
pub fn run_elevated(exe: &Path, parameters: &str, directory: &Path) -> Result<(), ProbeError> {
    let file_wide = wide(exe);
    let params_wide = wide(parameters);
    let dir_wide = wide(directory);

    let mut info = SHELLEXECUTEINFOW {
        cbSize: size_of::<SHELLEXECUTEINFOW>() as u32,
        // We exit right after this call; don't let the shell finish
        // asynchronously on a thread we are about to tear down.
        fMask: SEE_MASK_NOASYNC,
        lpVerb: w!("runas"),
        lpFile: PCWSTR(file_wide.as_ptr()),
        lpParameters: PCWSTR(params_wide.as_ptr()),
        lpDirectory: PCWSTR(dir_wide.as_ptr()),
        nShow: SW_SHOW.0,
        ..Default::default()
    };

    log::debug!("ShellExecuteExW(runas, {}, {parameters})", exe.display());
    // SAFETY: `info` is fully initialised and every string it points to is
    // a null-terminated UTF-16 buffer that outlives the call.
    unsafe { ShellExecuteExW(&mut info) }.map_err(|e| ProbeError::Win32 {
        function: "ShellExecuteExW",
        code: e.into(),
    })
}
