// Release builds run as a GUI application (no console window).
// Debug builds keep the console so that log output is visible.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
#![deny(unsafe_code)]

#[cfg(windows)]
fn main() {
    llio::logging::init(if cfg!(debug_assertions) { "info" } else { "warn" });
    std::process::exit(llio::launcher::run());
}

#[cfg(not(windows))]
fn main() {
    llio::logging::init("warn");
    log::error!("the HFSExplorer launcher only runs on Windows");
    std::process::exit(1);
}
