// ── Launcher configuration ────────────────────────────────────────────────────
//
// Optional `launcher.json` next to the executable.  Every field has a
// default, so a missing file (or a file that only sets one field) is fine.
// No `unsafe`; pure safe Rust + serde_json.

use std::{
    ffi::{OsStr, OsString},
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "launcher.json";

/// Environment switches.  Any value other than empty, `0` or `false` turns the
/// corresponding strategy off.
pub const DISABLE_REGISTRY_SEARCH: &str = "DISABLE_REGISTRY_SEARCH";
pub const DISABLE_JAVA_HOME_SEARCH: &str = "DISABLE_JAVA_HOME_SEARCH";
pub const DISABLE_JAVA_PROCESS_CREATION: &str = "DISABLE_JAVA_PROCESS_CREATION";

// ── On-disk type ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Entry class in dotted form.
    pub main_class: String,
    /// Class path components, relative to the executable's directory.
    pub classpath: Vec<String>,
    /// Arguments placed before the user's own.
    pub prefix_args: Vec<String>,
    /// Environment variable naming a runtime home directory.
    pub runtime_home_var: String,
    /// Where `jvm.dll` may sit under that home, tried in order.
    pub runtime_lib_suffixes: Vec<String>,
    /// Executables tried, in order, when no runtime can be hosted in-process.
    pub external_runtimes: Vec<String>,
    /// Directory appended to `PATH` for the native libraries.
    pub library_dir: String,
    pub registry_search: bool,
    pub java_home_search: bool,
    pub process_creation: bool,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            main_class: "org.catacombae.hfsexplorer.FileSystemBrowserWindow".to_owned(),
            classpath: [
                r"lib\hfsx.jar",
                r"lib\swing-layout-1.0.1.jar",
                r"lib\hfsx_dmglib.jar",
                r"lib\apache-ant-1.7.0-bzip2.jar",
                r"lib\iharder-base64.jar",
            ]
            .map(str::to_owned)
            .to_vec(),
            prefix_args: vec!["-dbgconsole".to_owned()],
            runtime_home_var: "JAVA_HOME".to_owned(),
            runtime_lib_suffixes: [
                r"jre\bin\client\jvm.dll",
                r"jre\bin\server\jvm.dll",
                r"bin\client\jvm.dll",
                r"bin\server\jvm.dll",
            ]
            .map(str::to_owned)
            .to_vec(),
            external_runtimes: vec!["javaw.exe".to_owned(), "java.exe".to_owned()],
            library_dir: "lib".to_owned(),
            registry_search: true,
            java_home_search: true,
            process_creation: true,
        }
    }
}

impl LauncherConfig {
    /// Load `launcher.json` from `dir`.
    ///
    /// A missing file yields the defaults quietly; an unreadable or malformed
    /// one is logged and also yields the defaults.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE_NAME);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                log::warn!("could not read {}: {e}", path.display());
                return Self::default();
            }
        };
        match serde_json::from_slice(&data) {
            Ok(config) => {
                log::info!("loaded {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("ignoring malformed {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Apply the `DISABLE_*` switches.  `lookup` is `std::env::var_os` outside
    /// tests.
    pub fn apply_env_toggles(&mut self, lookup: impl Fn(&str) -> Option<OsString>) {
        let disabled = |name: &str| {
            let off = lookup(name).is_some_and(|v| switch_is_set(&v));
            if off {
                log::info!("{name} is set");
            }
            off
        };
        if disabled(DISABLE_REGISTRY_SEARCH) {
            self.registry_search = false;
        }
        if disabled(DISABLE_JAVA_HOME_SEARCH) {
            self.java_home_search = false;
        }
        if disabled(DISABLE_JAVA_PROCESS_CREATION) {
            self.process_creation = false;
        }
    }

    /// Main class in the slash form `FindClass` expects.
    pub fn jni_class_name(&self) -> String {
        self.main_class.replace('.', "/")
    }

    /// Class path string, joined with the Windows list separator.
    pub fn classpath_string(&self) -> String {
        self.classpath.join(";")
    }

    /// Candidate runtime libraries under `home`, in probe order.
    pub fn runtime_libs_under(&self, home: &Path) -> Vec<PathBuf> {
        self.runtime_lib_suffixes
            .iter()
            .map(|suffix| home.join(suffix))
            .collect()
    }
}

fn switch_is_set(value: &OsStr) -> bool {
    !matches!(value.to_str(), Some("" | "0" | "false"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let map: HashMap<String, OsString> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), OsString::from(v)))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_describe_the_stock_install() {
        let c = LauncherConfig::default();
        assert_eq!(c.jni_class_name(), "org/catacombae/hfsexplorer/FileSystemBrowserWindow");
        assert!(c.classpath_string().starts_with(r"lib\hfsx.jar;lib\swing-layout"));
        assert_eq!(c.external_runtimes, ["javaw.exe", "java.exe"]);
        assert!(c.registry_search && c.java_home_search && c.process_creation);
    }

    #[test]
    fn partial_files_keep_other_defaults() {
        let json = r#"{"main_class":"com.example.Main","process_creation":false}"#;
        let c: LauncherConfig = serde_json::from_str(json).expect("deserialize");
        assert_eq!(c.main_class, "com.example.Main");
        assert!(!c.process_creation);
        assert_eq!(c.prefix_args, ["-dbgconsole"]);
        assert_eq!(c.runtime_home_var, "JAVA_HOME");
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(LauncherConfig::load(dir.path()), LauncherConfig::default());

        fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{"library_dir":"native"}"#)
            .expect("write");
        assert_eq!(LauncherConfig::load(dir.path()).library_dir, "native");
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(CONFIG_FILE_NAME), b"{ not json").expect("write");
        assert_eq!(LauncherConfig::load(dir.path()), LauncherConfig::default());
    }

    #[test]
    fn env_switches_disable_strategies() {
        let mut c = LauncherConfig::default();
        c.apply_env_toggles(env_of(&[
            (DISABLE_REGISTRY_SEARCH, "1"),
            (DISABLE_JAVA_PROCESS_CREATION, "yes"),
        ]));
        assert!(!c.registry_search);
        assert!(c.java_home_search);
        assert!(!c.process_creation);
    }

    #[test]
    fn falsy_switch_values_are_ignored() {
        let mut c = LauncherConfig::default();
        c.apply_env_toggles(env_of(&[
            (DISABLE_REGISTRY_SEARCH, ""),
            (DISABLE_JAVA_HOME_SEARCH, "0"),
            (DISABLE_JAVA_PROCESS_CREATION, "false"),
        ]));
        assert_eq!(c, LauncherConfig::default());
    }

    #[test]
    fn runtime_libs_follow_suffix_order() {
        let c = LauncherConfig::default();
        let libs = c.runtime_libs_under(Path::new("jdk"));
        assert_eq!(libs.len(), 4);
        assert_eq!(libs[0], Path::new("jdk").join(r"jre\bin\client\jvm.dll"));
        assert_eq!(libs[3], Path::new("jdk").join(r"bin\server\jvm.dll"));
    }
}
