// ── In-process runtime hosting ────────────────────────────────────────────────
//
// Lifecycle: load jvm.dll → JNI_CreateJavaVM → run `main(String[])` →
// DestroyJavaVM → FreeLibrary.  The VM is always destroyed before the
// library that implements it goes away.

#![allow(unsafe_code)]

use std::{
    ffi::{c_char, c_void, CString},
    mem,
    path::{Path, PathBuf},
    ptr,
};

use jni::{
    objects::{JObject, JObjectArray, JValue},
    sys, JNIEnv, JavaVM,
};

use super::discovery::RuntimeLoader;
use crate::{
    error::{LaunchError, ProbeError},
    platform::win32::{
        library::{RawSymbol, RuntimeLibrary},
        registry,
    },
};

type CreateJavaVm =
    unsafe extern "system" fn(*mut *mut sys::JavaVM, *mut *mut c_void, *mut c_void) -> sys::jint;

const MAIN_SIGNATURE: &str = "([Ljava/lang/String;)V";

// ── HostedRuntime ─────────────────────────────────────────────────────────────

/// A VM living in this process, plus the library it came from.
pub struct HostedRuntime {
    vm: JavaVM,
    library: RuntimeLibrary,
}

impl std::fmt::Debug for HostedRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedRuntime")
            .field("library", &self.library.path())
            .finish_non_exhaustive()
    }
}

impl HostedRuntime {
    /// Load `lib_path` and create a VM with `classpath`.
    pub fn create(lib_path: &Path, classpath: &str) -> Result<Self, ProbeError> {
        let library = RuntimeLibrary::load(lib_path)?;
        let symbol = library.symbol(c"JNI_CreateJavaVM")?;
        // SAFETY: JNI_CreateJavaVM has exactly this signature in every
        // conforming runtime; both are plain function pointers.
        let create = unsafe { mem::transmute::<RawSymbol, CreateJavaVm>(symbol) };

        let class_path = CString::new(format!("-Djava.class.path={classpath}"))?;
        let mut options = [sys::JavaVMOption {
            optionString: class_path.as_ptr() as *mut c_char,
            extraInfo: ptr::null_mut(),
        }];
        let mut init_args = sys::JavaVMInitArgs {
            version: sys::JNI_VERSION_1_2,
            nOptions: options.len() as sys::jint,
            options: options.as_mut_ptr(),
            ignoreUnrecognized: sys::JNI_TRUE,
        };

        let mut vm_ptr: *mut sys::JavaVM = ptr::null_mut();
        let mut env_ptr: *mut c_void = ptr::null_mut();
        log::info!("creating VM from {}", lib_path.display());
        // SAFETY: every pointer refers to a live local; the option strings
        // stay alive until after the call returns.
        let rc = unsafe {
            create(
                ptr::addr_of_mut!(vm_ptr),
                ptr::addr_of_mut!(env_ptr),
                ptr::addr_of_mut!(init_args).cast(),
            )
        };
        if rc != sys::JNI_OK || vm_ptr.is_null() {
            return Err(ProbeError::CreateVm(rc));
        }
        // SAFETY: vm_ptr was just produced by a successful JNI_CreateJavaVM.
        let vm = unsafe { JavaVM::from_raw(vm_ptr) }?;
        Ok(Self { vm, library })
    }

    /// Run `main_class.main(args)`, then tear the VM down whatever happened.
    pub fn run(self, main_class: &str, args: &[String]) -> Result<(), LaunchError> {
        let outcome = self.invoke_main(main_class, args);
        self.shutdown();
        outcome
    }

    fn invoke_main(&self, main_class: &str, args: &[String]) -> Result<(), LaunchError> {
        let fault = LaunchError::EntryPointFault;
        let mut env = self
            .vm
            .attach_current_thread()
            .map_err(|e| fault(e.to_string()))?;

        let class = match env.find_class(main_class) {
            Ok(class) => class,
            Err(e) => {
                describe_pending(&mut env);
                return Err(fault(format!(
                    "Could not find the required class files! ({main_class}: {e})"
                )));
            }
        };

        let argv = string_array(&mut env, args).map_err(|e| {
            describe_pending(&mut env);
            fault(format!("Could not build the argument array: {e}"))
        })?;

        log::info!("calling {main_class}.main with {} arguments", args.len());
        let called =
            env.call_static_method(&class, "main", MAIN_SIGNATURE, &[JValue::Object(&argv)]);
        if let Err(e) = called {
            describe_pending(&mut env);
            return Err(fault(format!("{main_class}.main failed: {e}")));
        }
        if env.exception_check().unwrap_or(false) {
            describe_pending(&mut env);
            return Err(fault(format!("{main_class}.main threw an exception")));
        }
        Ok(())
    }

    fn shutdown(self) {
        let Self { vm, library } = self;
        log::debug!("destroying VM");
        // SAFETY: no JNIEnv or AttachGuard from this VM outlives
        // `invoke_main`, and nothing uses `vm` afterwards.
        if let Err(e) = unsafe { vm.destroy() } {
            log::warn!("DestroyJavaVM failed: {e}");
        }
        drop(library);
    }
}

/// Build a `String[]` from `args`.
fn string_array<'local>(
    env: &mut JNIEnv<'local>,
    args: &[String],
) -> jni::errors::Result<JObjectArray<'local>> {
    let array =
        env.new_object_array(args.len() as sys::jsize, "java/lang/String", JObject::null())?;
    for (i, arg) in args.iter().enumerate() {
        let s = env.new_string(arg)?;
        env.set_object_array_element(&array, i as sys::jsize, &s)?;
        env.delete_local_ref(s)?;
    }
    Ok(array)
}

/// Print and clear any pending Java exception.
fn describe_pending(env: &mut JNIEnv<'_>) {
    if env.exception_check().unwrap_or(false) {
        let _ = env.exception_describe();
        let _ = env.exception_clear();
    }
}

// ── Loader ────────────────────────────────────────────────────────────────────

fn runtime_lib_from(key: &str) -> Result<PathBuf, ProbeError> {
    let version = registry::read_hklm_string(key, "CurrentVersion")?;
    log::debug!("{key} CurrentVersion = {version}");
    let lib = registry::read_hklm_string(&format!(r"{key}\{version}"), "RuntimeLib")?;
    Ok(PathBuf::from(lib))
}

/// Registry lookups and VM creation backed by Win32.
pub fn loader() -> RuntimeLoader<HostedRuntime> {
    RuntimeLoader {
        runtime_lib_from,
        create: HostedRuntime::create,
    }
}
