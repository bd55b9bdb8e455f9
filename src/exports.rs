// ── JNI entry points ──────────────────────────────────────────────────────────
//
// Everything the Java stream classes call lives here.  Each export:
//   • decodes its arguments (handle array → `Win32File`, region checks),
//   • runs the matching `device` operation,
//   • turns a `ShimError` into a pending Java exception and returns the
//     failure value Java ignores (`-1`, `null`, nothing).
// Panics are caught at this boundary and rethrown as `java.lang.Error`.

#![allow(unsafe_code)]
#![allow(non_snake_case)]

use std::{
    any::Any,
    ffi::c_void,
    panic::{self, AssertUnwindSafe},
    ptr,
};

use jni::{
    objects::{JByteArray, JClass, JString},
    sys::{self, jbyteArray, jint, jlong},
    JNIEnv,
};

use crate::{
    device,
    error::{Result, ShimError},
    handle::{HandleToken, HANDLE_WIDTH},
    logging,
    platform::win32::file::{AccessMode, Win32File},
};

/// Called once when `System.loadLibrary("llio")` maps us in.
#[no_mangle]
pub extern "system" fn JNI_OnLoad(_vm: *mut sys::JavaVM, _reserved: *mut c_void) -> jint {
    logging::init("warn");
    log::debug!("llio loaded");
    sys::JNI_VERSION_1_2
}

// ── Boundary helpers ──────────────────────────────────────────────────────────

/// Run `body`, converting errors and panics into Java exceptions.
fn guarded<'local, T>(
    env: &mut JNIEnv<'local>,
    fallback: T,
    body: impl FnOnce(&mut JNIEnv<'local>) -> Result<T>,
) -> T {
    match panic::catch_unwind(AssertUnwindSafe(|| body(&mut *env))) {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            throw(env, &e);
            fallback
        }
        Err(payload) => {
            let msg = panic_message(payload.as_ref());
            log::error!("panic in native code: {msg}");
            if !env.exception_check().unwrap_or(false) {
                let _ = env.throw_new("java/lang/Error", format!("panic in llio: {msg}"));
            }
            fallback
        }
    }
}

fn throw(env: &mut JNIEnv<'_>, err: &ShimError) {
    // A failed JNI call may already have an exception in flight; that one
    // is more precise than anything we could say.
    if env.exception_check().unwrap_or(false) {
        log::debug!("leaving pending exception in place ({err})");
        return;
    }
    log::debug!("throwing {}: {err}", err.java_class());
    if let Err(e) = env.throw_new(err.java_class(), err.to_string()) {
        log::error!("could not throw {}: {e}", err.java_class());
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

/// Decode the marshalled handle.  A wrong-sized array yields an invalid
/// handle, which the OS then rejects.
fn file_of(env: &JNIEnv<'_>, handle: &JByteArray<'_>) -> Result<Win32File> {
    if handle.is_null() {
        log::debug!("handle array is null");
        return Ok(Win32File::from_token(HandleToken::from_java_bytes(None)));
    }
    let len = env.get_array_length(handle)?;
    if len as usize != HANDLE_WIDTH {
        log::debug!("handle array has {len} bytes, expected {HANDLE_WIDTH}");
        return Ok(Win32File::from_token(HandleToken::INVALID));
    }
    let mut raw = [0i8; HANDLE_WIDTH];
    env.get_byte_array_region(handle, 0, &mut raw)?;
    Ok(Win32File::from_token(HandleToken::from_java_bytes(Some(&raw))))
}

fn open_native(
    env: &mut JNIEnv<'_>,
    filename: &JString<'_>,
    mode: AccessMode,
) -> Result<jbyteArray> {
    if filename.is_null() {
        return Err(ShimError::NullPath);
    }
    let path: String = env.get_string(filename)?.into();
    let file = Win32File::open(&path, mode)?;
    match env.byte_array_from_slice(&file.token().to_bytes()) {
        Ok(array) => Ok(array.as_raw()),
        Err(e) => {
            // Java never saw the handle, so nobody else can close it.
            let _ = device::close(file);
            Err(e.into())
        }
    }
}

// ── ReadableWin32FileStream ───────────────────────────────────────────────────

#[no_mangle]
pub extern "system" fn Java_org_catacombae_storage_io_win32_ReadableWin32FileStream_openNative<
    'local,
>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    filename: JString<'local>,
) -> jbyteArray {
    guarded(&mut env, ptr::null_mut(), |env| {
        open_native(env, &filename, AccessMode::ReadOnly)
    })
}

#[no_mangle]
pub extern "system" fn Java_org_catacombae_storage_io_win32_ReadableWin32FileStream_seek<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    pos: jlong,
    handle: JByteArray<'local>,
) {
    guarded(&mut env, (), |env| device::seek(&file_of(env, &handle)?, pos))
}

#[no_mangle]
pub extern "system" fn Java_org_catacombae_storage_io_win32_ReadableWin32FileStream_read<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    data: JByteArray<'local>,
    offset: jint,
    length: jint,
    handle: JByteArray<'local>,
) -> jint {
    guarded(&mut env, -1, |env| {
        let array_len = env.get_array_length(&data)? as usize;
        let region = device::check_region(array_len, offset, length)?;
        let file = file_of(env, &handle)?;
        let bytes = device::read(&file, region.len())?;
        let signed: Vec<i8> = bytes.iter().map(|&b| b as i8).collect();
        env.set_byte_array_region(&data, offset, &signed)?;
        Ok(bytes.len() as jint)
    })
}

#[no_mangle]
pub extern "system" fn Java_org_catacombae_storage_io_win32_ReadableWin32FileStream_close<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    handle: JByteArray<'local>,
) {
    guarded(&mut env, (), |env| device::close(file_of(env, &handle)?))
}

#[no_mangle]
pub extern "system" fn Java_org_catacombae_storage_io_win32_ReadableWin32FileStream_ejectMedia<
    'local,
>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    handle: JByteArray<'local>,
) {
    guarded(&mut env, (), |env| device::eject_media(&file_of(env, &handle)?))
}

#[no_mangle]
pub extern "system" fn Java_org_catacombae_storage_io_win32_ReadableWin32FileStream_loadMedia<
    'local,
>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    handle: JByteArray<'local>,
) {
    guarded(&mut env, (), |env| device::load_media(&file_of(env, &handle)?))
}

#[no_mangle]
pub extern "system" fn Java_org_catacombae_storage_io_win32_ReadableWin32FileStream_length<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    handle: JByteArray<'local>,
) -> jlong {
    guarded(&mut env, -1, |env| {
        let len = device::length(&file_of(env, &handle)?)?;
        Ok(len as jlong)
    })
}

#[no_mangle]
pub extern "system" fn Java_org_catacombae_storage_io_win32_ReadableWin32FileStream_getFilePointer<
    'local,
>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    handle: JByteArray<'local>,
) -> jlong {
    guarded(&mut env, -1, |env| {
        let pos = device::file_pointer(&file_of(env, &handle)?)?;
        Ok(pos as jlong)
    })
}

#[no_mangle]
pub extern "system" fn Java_org_catacombae_storage_io_win32_ReadableWin32FileStream_getSectorSize<
    'local,
>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    handle: JByteArray<'local>,
) -> jint {
    guarded(&mut env, device::UNKNOWN_SECTOR_SIZE, |env| {
        Ok(device::sector_size(&file_of(env, &handle)?))
    })
}

// ── Win32FileStream ───────────────────────────────────────────────────────────

#[no_mangle]
pub extern "system" fn Java_org_catacombae_storage_io_win32_Win32FileStream_openNative<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    filename: JString<'local>,
) -> jbyteArray {
    guarded(&mut env, ptr::null_mut(), |env| {
        open_native(env, &filename, AccessMode::ReadWrite)
    })
}

#[no_mangle]
pub extern "system" fn Java_org_catacombae_storage_io_win32_Win32FileStream_write<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    data: JByteArray<'local>,
    offset: jint,
    length: jint,
    handle: JByteArray<'local>,
) {
    guarded(&mut env, (), |env| {
        let array_len = env.get_array_length(&data)? as usize;
        let region = device::check_region(array_len, offset, length)?;
        let mut signed = vec![0i8; region.len()];
        env.get_byte_array_region(&data, offset, &mut signed)?;
        let bytes: Vec<u8> = signed.iter().map(|&b| b as u8).collect();
        device::write(&file_of(env, &handle)?, &bytes)
    })
}
