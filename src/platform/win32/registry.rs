// ── Registry reads ────────────────────────────────────────────────────────────
//
// Only string values under HKEY_LOCAL_MACHINE are needed (JavaSoft keys).

#![allow(unsafe_code)]

use std::{ffi::c_void, ptr};

use windows::{
    core::PCWSTR,
    Win32::{
        Foundation::ERROR_SUCCESS,
        System::Registry::{RegGetValueW, HKEY_LOCAL_MACHINE, RRF_RT_REG_SZ},
    },
};

use super::{string_from_wide, wide};
use crate::error::{OsCode, ProbeError};

/// Read the `REG_SZ` value `value` from `HKLM\<subkey>`.
pub fn read_hklm_string(subkey: &str, value: &str) -> Result<String, ProbeError> {
    let subkey_wide = wide(subkey);
    let value_wide = wide(value);
    let fail = |code: u32| ProbeError::Win32 {
        function: "RegGetValueW",
        code: OsCode(code),
    };

    // First call: size in bytes, including the terminator.
    let mut size = 0u32;
    // SAFETY: both name buffers are null-terminated UTF-16 that outlive the
    // call; passing no data buffer only queries the size into `size`.
    let err = unsafe {
        RegGetValueW(
            HKEY_LOCAL_MACHINE,
            PCWSTR(subkey_wide.as_ptr()),
            PCWSTR(value_wide.as_ptr()),
            RRF_RT_REG_SZ,
            None,
            None,
            Some(ptr::addr_of_mut!(size)),
        )
    };
    if err != ERROR_SUCCESS {
        return Err(fail(err.0));
    }

    let mut buf = vec![0u16; (size as usize).div_ceil(2) + 1];
    let mut size = (buf.len() * 2) as u32;
    // SAFETY: `buf` is writable for `size` bytes; RegGetValueW writes at most
    // that many and always null-terminates REG_SZ data.
    let err = unsafe {
        RegGetValueW(
            HKEY_LOCAL_MACHINE,
            PCWSTR(subkey_wide.as_ptr()),
            PCWSTR(value_wide.as_ptr()),
            RRF_RT_REG_SZ,
            None,
            Some(buf.as_mut_ptr().cast::<c_void>()),
            Some(ptr::addr_of_mut!(size)),
        )
    };
    if err != ERROR_SUCCESS {
        return Err(fail(err.0));
    }
    Ok(string_from_wide(&buf))
}
