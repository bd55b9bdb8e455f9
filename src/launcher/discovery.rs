// ── Runtime discovery ─────────────────────────────────────────────────────────
//
// The launcher tries, in order:
//   1. the runtime library named in the JavaSoft registry keys,
//   2. `jvm.dll` under the runtime home variable,
//   3. an external `javaw.exe` / `java.exe` found on PATH.
// The first two host the VM in our own process through a `RuntimeLoader`
// (the Win32 one lives in `host.rs`); the third hands everything to a child
// process.  Nothing here touches Win32, so the whole order can be exercised
// anywhere.

use std::{
    io,
    path::{Path, PathBuf},
};

use crate::{
    error::{LaunchError, ProbeError},
    strategy::{first_success, Probe},
};

use super::{
    args::{quote_all, quote_arg, LaunchArgs},
    config::LauncherConfig,
};

/// Registry subkeys under HKLM that may describe an installed runtime, in
/// probe order.  Each carries a `CurrentVersion` value naming a subkey with
/// a `RuntimeLib` value.
pub const LEGACY_JRE_KEY: &str = r"SOFTWARE\JavaSoft\Java Runtime Environment";
pub const JRE_KEY: &str = r"SOFTWARE\JavaSoft\JRE";

/// Starts `program` with a pre-quoted argument string and returns its exit
/// code once it finishes.
pub type Spawner = fn(&str, &str) -> io::Result<i32>;

/// How in-process candidates are found and turned into a hosted VM.
pub struct RuntimeLoader<H> {
    /// Runtime library path recorded under a registry key.
    pub runtime_lib_from: fn(&str) -> Result<PathBuf, ProbeError>,
    /// Load a runtime library and create a VM with the given class path.
    pub create: fn(&Path, &str) -> Result<H, ProbeError>,
}

/// Where the launch ended up.
#[derive(Debug)]
pub enum Runtime<H> {
    /// A VM hosted in this process, ready to run the entry point.
    InProcess(H),
    /// A child runtime already ran to completion with this exit code.
    External(i32),
}

/// Everything a strategy needs to know.
pub struct Discovery<'a, H> {
    pub config: &'a LauncherConfig,
    pub args: &'a LaunchArgs,
    /// Value of the runtime home variable, if set.
    pub runtime_home: Option<PathBuf>,
    pub loader: RuntimeLoader<H>,
    pub spawn: Spawner,
}

impl<H> Discovery<'_, H> {
    /// Candidate libraries under the runtime home, in probe order.
    pub fn runtime_home_libs(&self) -> Result<Vec<PathBuf>, ProbeError> {
        if !self.config.java_home_search {
            return Err(ProbeError::Disabled);
        }
        let home = self
            .runtime_home
            .as_deref()
            .ok_or_else(|| ProbeError::MissingVariable(self.config.runtime_home_var.clone()))?;
        Ok(self.config.runtime_libs_under(home))
    }

    /// Arguments for an external runtime, already quoted.
    ///
    /// Only the caller's own arguments follow the main class; the prefix
    /// arguments are for the in-process `String[]` alone.
    pub fn external_command_args(&self) -> String {
        let mut line = format!(
            "-classpath {} {}",
            quote_arg(&self.config.classpath_string()),
            self.config.main_class
        );
        let rest = quote_all(self.args.passthrough().iter().map(String::as_str));
        if !rest.is_empty() {
            line.push(' ');
            line.push_str(&rest);
        }
        line
    }

    /// Run each configured external runtime until one starts.
    ///
    /// A runtime that starts and then exits non-zero still counts as a
    /// launch; its exit code is only logged.
    pub fn launch_external(&self) -> Result<i32, ProbeError> {
        if !self.config.process_creation {
            return Err(ProbeError::Disabled);
        }
        let line = self.external_command_args();
        let mut last = None;
        for program in &self.config.external_runtimes {
            match (self.spawn)(program, &line) {
                Ok(code) => {
                    log::info!("{program} exited with code {code}");
                    return Ok(code);
                }
                Err(source) => {
                    log::debug!("could not start {program}: {source}");
                    last = Some(ProbeError::Spawn {
                        program: program.clone(),
                        source,
                    });
                }
            }
        }
        Err(last.unwrap_or_else(|| ProbeError::NothingUnder("PATH".to_owned())))
    }

    fn hosted_from_key(&self, key: &str) -> Result<Runtime<H>, ProbeError> {
        if !self.config.registry_search {
            return Err(ProbeError::Disabled);
        }
        let lib = (self.loader.runtime_lib_from)(key)?;
        (self.loader.create)(&lib, &self.config.classpath_string()).map(Runtime::InProcess)
    }
}

// ── Strategies ────────────────────────────────────────────────────────────────

pub fn from_legacy_registry<H>(d: &Discovery<'_, H>) -> Result<Runtime<H>, ProbeError> {
    d.hosted_from_key(LEGACY_JRE_KEY)
}

pub fn from_registry<H>(d: &Discovery<'_, H>) -> Result<Runtime<H>, ProbeError> {
    d.hosted_from_key(JRE_KEY)
}

/// First library under the runtime home that loads.  Candidates missing
/// from disk are skipped without a load attempt.
pub fn from_runtime_home<H>(d: &Discovery<'_, H>) -> Result<Runtime<H>, ProbeError> {
    let classpath = d.config.classpath_string();
    let mut last = None;
    for lib in d.runtime_home_libs()? {
        if !lib.is_file() {
            continue;
        }
        match (d.loader.create)(&lib, &classpath) {
            Ok(rt) => return Ok(Runtime::InProcess(rt)),
            Err(e) => {
                log::debug!("{}: {e}", lib.display());
                last = Some(e);
            }
        }
    }
    let home = d.runtime_home.as_deref().unwrap_or(Path::new(""));
    Err(last.unwrap_or_else(|| ProbeError::NothingUnder(home.display().to_string())))
}

pub fn external<H>(d: &Discovery<'_, H>) -> Result<Runtime<H>, ProbeError> {
    d.launch_external().map(Runtime::External)
}

/// Every strategy, in the order they are tried.
pub fn strategies<'a, H>() -> [Probe<Discovery<'a, H>, Runtime<H>, ProbeError>; 4] {
    [
        Probe::new("registry (Java Runtime Environment)", from_legacy_registry::<H>),
        Probe::new("registry (JRE)", from_registry::<H>),
        Probe::new("runtime home", from_runtime_home::<H>),
        Probe::new("external process", external::<H>),
    ]
}

/// Run the strategies in order; running out of them is `RuntimeNotFound`.
pub fn discover<'a, H>(
    d: &Discovery<'a, H>,
    probes: &[Probe<Discovery<'a, H>, Runtime<H>, ProbeError>],
) -> Result<Runtime<H>, LaunchError> {
    first_success(d, probes).map_err(|exhausted| {
        log::warn!("runtime discovery failed: {exhausted}");
        LaunchError::RuntimeNotFound
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    thread_local! {
        static CALLS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    fn record(call: String) {
        CALLS.with(|c| c.borrow_mut().push(call));
    }

    fn calls() -> Vec<String> {
        CALLS.with(|c| c.take())
    }

    fn not_found<T>() -> io::Result<T> {
        Err(io::Error::from(io::ErrorKind::NotFound))
    }

    // ── Stub spawners ─────────────────────────────────────────────────────

    fn nothing_on_path(program: &str, args: &str) -> io::Result<i32> {
        record(format!("spawn {program} {args}"));
        not_found()
    }

    fn only_java_exe(program: &str, args: &str) -> io::Result<i32> {
        record(format!("spawn {program} {args}"));
        if program == "java.exe" {
            Ok(0)
        } else {
            not_found()
        }
    }

    fn never_spawns(_: &str, _: &str) -> io::Result<i32> {
        panic!("spawner should not run");
    }

    // ── Stub loaders ──────────────────────────────────────────────────────

    fn no_registry_entry(key: &str) -> Result<PathBuf, ProbeError> {
        record(format!("registry {key}"));
        Err(ProbeError::Win32 {
            function: "RegGetValueW",
            code: crate::error::OsCode(2),
        })
    }

    fn registry_points_at_jvm(key: &str) -> Result<PathBuf, ProbeError> {
        record(format!("registry {key}"));
        Ok(Path::new("jre").join("bin").join("jvm.dll"))
    }

    fn create_fails(lib: &Path, _classpath: &str) -> Result<&'static str, ProbeError> {
        record(format!("create {}", lib.file_name().unwrap().to_string_lossy()));
        Err(ProbeError::CreateVm(-1))
    }

    fn create_succeeds(lib: &Path, _classpath: &str) -> Result<&'static str, ProbeError> {
        record(format!("create {}", lib.file_name().unwrap().to_string_lossy()));
        Ok("vm")
    }

    fn never_loads(_: &str) -> Result<PathBuf, ProbeError> {
        panic!("registry should not be read");
    }

    fn never_creates(_: &Path, _: &str) -> Result<&'static str, ProbeError> {
        panic!("no VM should be created");
    }

    fn inert() -> RuntimeLoader<&'static str> {
        RuntimeLoader {
            runtime_lib_from: never_loads,
            create: never_creates,
        }
    }

    fn args() -> LaunchArgs {
        LaunchArgs::new(vec!["-dbgconsole".into()], vec![r"C:\Disk Images\a.dmg".into()])
    }

    fn discovery<'a>(
        config: &'a LauncherConfig,
        args: &'a LaunchArgs,
        loader: RuntimeLoader<&'static str>,
        spawn: Spawner,
    ) -> Discovery<'a, &'static str> {
        Discovery {
            config,
            args,
            runtime_home: None,
            loader,
            spawn,
        }
    }

    /// A runtime home holding a single `jvm.dll`.
    fn home_with_jvm() -> (tempfile::TempDir, LauncherConfig) {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("jvm.dll"), b"MZ").expect("write");
        let config = LauncherConfig {
            runtime_lib_suffixes: vec!["missing.dll".into(), "jvm.dll".into()],
            ..LauncherConfig::default()
        };
        (dir, config)
    }

    // ── External process ──────────────────────────────────────────────────

    #[test]
    fn external_command_line_carries_only_user_arguments() {
        let config = LauncherConfig::default();
        let args = args();
        let d = discovery(&config, &args, inert(), never_spawns);
        let line = d.external_command_args();
        assert!(line.starts_with(r#"-classpath "lib\hfsx.jar;"#), "{line}");
        assert!(line.ends_with(
            r#"org.catacombae.hfsexplorer.FileSystemBrowserWindow "C:\Disk Images\a.dmg""#
        ));
        assert!(!line.contains("-dbgconsole"), "{line}");
    }

    #[test]
    fn external_command_line_without_arguments_ends_at_main_class() {
        let config = LauncherConfig::default();
        let args = LaunchArgs::new(vec!["-dbgconsole".into()], vec![]);
        let d = discovery(&config, &args, inert(), never_spawns);
        assert!(d
            .external_command_args()
            .ends_with("org.catacombae.hfsexplorer.FileSystemBrowserWindow"));
    }

    #[test]
    fn javaw_is_tried_before_java() {
        let config = LauncherConfig::default();
        let args = args();
        let d = discovery(&config, &args, inert(), only_java_exe);
        assert_eq!(d.launch_external().unwrap(), 0);
        let names: Vec<_> = calls()
            .into_iter()
            .map(|c| c.split(' ').nth(1).unwrap_or_default().to_owned())
            .collect();
        assert_eq!(names, ["javaw.exe", "java.exe"]);
    }

    #[test]
    fn runtime_home_needs_the_variable() {
        let config = LauncherConfig::default();
        let args = args();
        let mut d = discovery(&config, &args, inert(), never_spawns);
        match d.runtime_home_libs() {
            Err(ProbeError::MissingVariable(name)) => assert_eq!(name, "JAVA_HOME"),
            other => panic!("expected MissingVariable, got {other:?}"),
        }

        d.runtime_home = Some(PathBuf::from("jdk"));
        let first = d.runtime_home_libs().unwrap().remove(0);
        assert_eq!(first, Path::new("jdk").join(r"jre\bin\client\jvm.dll"));
    }

    // ── Full order ────────────────────────────────────────────────────────

    #[test]
    fn strategies_run_registry_then_home_then_external() {
        let (home, config) = home_with_jvm();
        let args = args();
        let loader = RuntimeLoader {
            runtime_lib_from: no_registry_entry,
            create: create_fails,
        };
        let mut d = discovery(&config, &args, loader, nothing_on_path);
        d.runtime_home = Some(home.path().to_path_buf());

        let err = discover(&d, &strategies()).unwrap_err();
        assert_eq!(err.exit_code(), -1);

        let calls = calls();
        let heads: Vec<_> = calls.iter().map(|c| c.split(" -classpath").next().unwrap()).collect();
        assert_eq!(
            heads,
            [
                format!("registry {LEGACY_JRE_KEY}").as_str(),
                format!("registry {JRE_KEY}").as_str(),
                "create jvm.dll",
                "spawn javaw.exe",
                "spawn java.exe",
            ]
        );
    }

    #[test]
    fn first_registry_hit_stops_the_search() {
        let config = LauncherConfig::default();
        let args = args();
        let loader = RuntimeLoader {
            runtime_lib_from: registry_points_at_jvm,
            create: create_succeeds,
        };
        let d = discovery(&config, &args, loader, never_spawns);
        assert!(matches!(discover(&d, &strategies()), Ok(Runtime::InProcess("vm"))));
        assert_eq!(calls(), [format!("registry {LEGACY_JRE_KEY}"), "create jvm.dll".to_owned()]);
    }

    #[test]
    fn runtime_home_wins_when_registry_is_disabled() {
        let (home, mut config) = home_with_jvm();
        config.registry_search = false;
        let args = args();
        let loader = RuntimeLoader {
            runtime_lib_from: never_loads,
            create: create_succeeds,
        };
        let mut d = discovery(&config, &args, loader, never_spawns);
        d.runtime_home = Some(home.path().to_path_buf());

        assert!(matches!(discover(&d, &strategies()), Ok(Runtime::InProcess("vm"))));
        assert_eq!(calls(), ["create jvm.dll"]);
    }

    #[test]
    fn each_switch_disables_its_strategy() {
        let (home, mut config) = home_with_jvm();
        config.registry_search = false;
        config.java_home_search = false;
        config.process_creation = false;
        let args = args();
        let mut d = discovery(&config, &args, inert(), never_spawns);
        d.runtime_home = Some(home.path().to_path_buf());

        assert!(matches!(from_legacy_registry(&d), Err(ProbeError::Disabled)));
        assert!(matches!(from_registry(&d), Err(ProbeError::Disabled)));
        assert!(matches!(from_runtime_home(&d), Err(ProbeError::Disabled)));
        assert!(matches!(external(&d), Err(ProbeError::Disabled)));

        let err = discover(&d, &strategies()).unwrap_err();
        assert_eq!(err.exit_code(), -1);
        assert!(calls().is_empty());
    }

    #[test]
    fn external_child_exit_code_is_reported() {
        let config = LauncherConfig {
            registry_search: false,
            java_home_search: false,
            ..LauncherConfig::default()
        };
        let args = args();
        let d = discovery(&config, &args, inert(), only_java_exe);
        assert!(matches!(discover(&d, &strategies()), Ok(Runtime::External(0))));
        calls();
    }
}
