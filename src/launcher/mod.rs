// ── HFSExplorer launcher ──────────────────────────────────────────────────────
//
// Startup sequence:
//   1. disable WOW64 redirection for the whole launch;
//   2. parse arguments; `-invokeuac` re-launches elevated and exits;
//   3. make the document argument absolute, chdir to the executable's
//      directory, and append its `lib` directory to PATH;
//   4. find a runtime (see `discovery.rs`) and run the entry point.
// Any failure is shown in a message box and becomes the process exit code.

pub mod args;
pub mod config;
pub mod discovery;
#[cfg(windows)]
mod host;

/// Title of every launcher error dialog.
pub const DIALOG_TITLE: &str = "HFSExplorer launch error";

#[cfg(windows)]
pub use self::windows_launch::run;

#[cfg(windows)]
mod windows_launch {
    use std::{
        env, io,
        path::{Path, PathBuf},
    };

    use super::{
        args::{augmented_search_path, quote_all, resolve_app_path, Invocation, LaunchArgs},
        config::LauncherConfig,
        discovery::{self, Discovery, Runtime},
        host, DIALOG_TITLE,
    };
    use crate::{
        error::LaunchError,
        platform::win32::{dialogs, process, wow64},
    };

    /// Run the launcher and return the process exit code.
    pub fn run() -> i32 {
        // Held until we return, so the hosted VM sees the real System32.
        let _redirection = wow64::disable_redirection();
        match launch() {
            Ok(()) => 0,
            Err(e) => {
                log::error!("{e}");
                dialogs::show_error(DIALOG_TITLE, &e.to_string());
                e.exit_code()
            }
        }
    }

    fn launch() -> Result<(), LaunchError> {
        let invocation = Invocation::parse(env::args_os())?;
        let exe = env::current_exe().map_err(LaunchError::OwnPathUnavailable)?;
        let exe_dir = exe.parent().map(Path::to_path_buf).ok_or_else(|| {
            LaunchError::OwnPathUnavailable(io::Error::other("executable has no parent directory"))
        })?;
        log::info!("running from {}", exe_dir.display());

        match invocation {
            Invocation::Elevate(args) => elevate(&exe, &args),
            Invocation::Launch(args) => start(&exe_dir, args),
        }
    }

    fn elevate(exe: &Path, args: &[String]) -> Result<(), LaunchError> {
        let cwd = env::current_dir().map_err(LaunchError::WorkingDirectoryUnavailable)?;
        let parameters = quote_all(args.iter().map(String::as_str));
        process::run_elevated(exe, &parameters, &cwd).map_err(LaunchError::ElevationFailed)
    }

    fn start(exe_dir: &Path, mut args: Vec<String>) -> Result<(), LaunchError> {
        let cwd = env::current_dir().map_err(LaunchError::WorkingDirectoryUnavailable)?;
        if let Some(first) = args.first_mut() {
            *first = resolve_app_path(&cwd, first);
        }
        env::set_current_dir(exe_dir).map_err(LaunchError::WorkingDirectoryUnavailable)?;

        let mut config = LauncherConfig::load(exe_dir);
        config.apply_env_toggles(|name| env::var_os(name));

        let lib_dir = exe_dir.join(&config.library_dir);
        match augmented_search_path(env::var_os("PATH").as_deref(), &lib_dir) {
            Ok(path) => env::set_var("PATH", path),
            Err(e) => log::warn!("could not add {} to PATH: {e}", lib_dir.display()),
        }

        let launch_args = LaunchArgs::new(config.prefix_args.clone(), args);
        let d = Discovery {
            config: &config,
            args: &launch_args,
            runtime_home: env::var_os(&config.runtime_home_var).map(PathBuf::from),
            loader: host::loader(),
            spawn: spawn_external,
        };
        match discovery::discover(&d, &discovery::strategies())? {
            Runtime::InProcess(runtime) => {
                runtime.run(&config.jni_class_name(), &launch_args.to_vec())
            }
            Runtime::External(_) => Ok(()),
        }
    }

    fn spawn_external(program: &str, raw_args: &str) -> io::Result<i32> {
        process::spawn_and_wait(program, raw_args).map(|status| status.code().unwrap_or(-1))
    }
}
