// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except:
//   • `platform::win32`  – Win32 FFI
//   • `exports`          – the JNI entry points
//   • `launcher::host`   – JNI_CreateJavaVM and friends
// Each unsafe block in those modules MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]

//! Native half of HFSExplorer on Windows.
//!
//! `llio.dll` gives the Java stream classes raw access to files and block
//! devices; the `hfsexplorer` binary finds a Java runtime and starts the
//! application.

pub mod device;
pub mod error;
pub mod handle;
pub mod launcher;
pub mod logging;
pub mod platform;
pub mod strategy;

#[cfg(windows)]
mod exports;
