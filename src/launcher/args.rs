// ── Launcher arguments ────────────────────────────────────────────────────────
//
// Everything here is pure string/path work so it can be tested on any host.

use std::{
    env,
    ffi::{OsStr, OsString},
    iter,
    path::Path,
};

use crate::error::LaunchError;

/// Leading argument that asks for an elevated re-launch.
pub const ELEVATE_FLAG: &str = "-invokeuac";

/// What the launcher was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Re-launch ourselves elevated with these arguments.
    Elevate(Vec<String>),
    /// Start the application with these arguments.
    Launch(Vec<String>),
}

impl Invocation {
    /// Parse a full argument vector, program name included.
    pub fn parse<I>(argv: I) -> Result<Self, LaunchError>
    where
        I: IntoIterator<Item = OsString>,
    {
        let args = argv
            .into_iter()
            .skip(1)
            .map(|a| a.into_string().map_err(LaunchError::ArgumentParse))
            .collect::<Result<Vec<_>, _>>()?;

        match args.split_first() {
            Some((flag, rest)) if flag == ELEVATE_FLAG => Ok(Self::Elevate(rest.to_vec())),
            _ => Ok(Self::Launch(args)),
        }
    }
}

/// Fixed prefix arguments followed by the user's own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchArgs {
    prefix: Vec<String>,
    passthrough: Vec<String>,
}

impl LaunchArgs {
    pub fn new(prefix: Vec<String>, passthrough: Vec<String>) -> Self {
        Self { prefix, passthrough }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prefix
            .iter()
            .chain(&self.passthrough)
            .map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(str::to_owned).collect()
    }

    /// The user's own arguments, without the prefix.
    pub fn passthrough(&self) -> &[String] {
        &self.passthrough
    }
}

// ── Command-line quoting ──────────────────────────────────────────────────────

/// Quote one argument so `CommandLineToArgvW` (and the MSVC CRT) parse it
/// back unchanged.
pub fn quote_arg(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    let mut backslashes = 0usize;
    for c in arg.chars() {
        if c == '\\' {
            backslashes += 1;
            continue;
        }
        // Backslashes only escape when they end up in front of a quote.
        let escaped = if c == '"' { backslashes * 2 + 1 } else { backslashes };
        out.extend(iter::repeat('\\').take(escaped));
        out.push(c);
        backslashes = 0;
    }
    out.extend(iter::repeat('\\').take(backslashes * 2));
    out.push('"');
    out
}

/// Quote each argument and join them with single spaces.
pub fn quote_all<'a>(args: impl IntoIterator<Item = &'a str>) -> String {
    args.into_iter()
        .map(quote_arg)
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Path normalisation ────────────────────────────────────────────────────────

/// Make the document argument absolute before we change directory.
///
/// Only rewritten when `cwd/arg` exists; anything else (options, URLs,
/// missing files) goes through untouched.
pub fn resolve_app_path(cwd: &Path, arg: &str) -> String {
    let path = Path::new(arg);
    if path.is_absolute() {
        return arg.to_owned();
    }
    let candidate = cwd.join(path);
    if !candidate.exists() {
        log::debug!("could not resolve {arg:?} against {}", cwd.display());
        return arg.to_owned();
    }
    match candidate.to_str() {
        Some(s) => s.to_owned(),
        None => arg.to_owned(),
    }
}

/// `current` with `lib_dir` appended, in the platform's list syntax.
pub fn augmented_search_path(
    current: Option<&OsStr>,
    lib_dir: &Path,
) -> Result<OsString, env::JoinPathsError> {
    let existing = current.map(env::split_paths).into_iter().flatten();
    env::join_paths(existing.chain(iter::once(lib_dir.to_path_buf())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<OsString> {
        iter::once("hfsexplorer.exe")
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect()
    }

    #[test]
    fn elevation_flag_is_stripped() {
        let inv = Invocation::parse(argv(&["-invokeuac", "foo.txt"])).unwrap();
        assert_eq!(inv, Invocation::Elevate(vec!["foo.txt".into()]));
    }

    #[test]
    fn elevation_parameters_are_quoted() {
        match Invocation::parse(argv(&["-invokeuac", "foo.txt"])).unwrap() {
            Invocation::Elevate(args) => {
                assert_eq!(quote_all(args.iter().map(String::as_str)), r#""foo.txt""#);
            }
            other => panic!("expected Elevate, got {other:?}"),
        }
    }

    #[test]
    fn elevation_flag_only_counts_in_front() {
        let inv = Invocation::parse(argv(&["foo.txt", "-invokeuac"])).unwrap();
        assert_eq!(
            inv,
            Invocation::Launch(vec!["foo.txt".into(), "-invokeuac".into()])
        );
        assert_eq!(Invocation::parse(argv(&[])).unwrap(), Invocation::Launch(vec![]));
    }

    #[cfg(unix)]
    #[test]
    fn non_unicode_arguments_fail_to_parse() {
        use std::os::unix::ffi::OsStringExt;
        let bad = vec![OsString::from("x"), OsString::from_vec(vec![0xff, 0xfe])];
        let err = Invocation::parse(bad).unwrap_err();
        assert_eq!(err.exit_code(), -3);
    }

    #[test]
    fn prefix_comes_first() {
        let args = LaunchArgs::new(vec!["-dbgconsole".into()], vec!["a.dmg".into()]);
        assert_eq!(args.to_vec(), ["-dbgconsole", "a.dmg"]);
    }

    #[test]
    fn passthrough_leaves_out_the_prefix() {
        let args = LaunchArgs::new(vec!["-dbgconsole".into()], vec!["foo.dmg".into()]);
        assert_eq!(args.passthrough(), ["foo.dmg"]);
        assert_eq!(quote_all(args.passthrough().iter().map(String::as_str)), r#""foo.dmg""#);
    }

    #[test]
    fn quoting_survives_argv_parsing() {
        assert_eq!(quote_arg("foo"), r#""foo""#);
        assert_eq!(quote_arg("My Disk.dmg"), r#""My Disk.dmg""#);
        assert_eq!(quote_arg(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(quote_arg(r"C:\dir\"), r#""C:\dir\\""#);
        assert_eq!(quote_arg(r"a\\b"), r#""a\\b""#);
        assert_eq!(quote_arg(r#"\""#), r#""\\\"""#);
        assert_eq!(quote_arg(""), r#""""#);
    }

    #[test]
    fn quote_all_separates_with_spaces() {
        assert_eq!(quote_all(["foo.txt", "b c"]), r#""foo.txt" "b c""#);
        assert_eq!(quote_all(Vec::<&str>::new()), "");
    }

    #[test]
    fn existing_relative_files_become_absolute() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("image.dmg"), b"koly").expect("write");

        let resolved = resolve_app_path(dir.path(), "image.dmg");
        assert_eq!(Path::new(&resolved), dir.path().join("image.dmg"));

        assert_eq!(resolve_app_path(dir.path(), "missing.dmg"), "missing.dmg");
    }

    #[test]
    fn absolute_paths_pass_through() {
        let dir = tempfile::tempdir().expect("tempdir");
        let abs = dir.path().join("whatever.iso");
        let abs = abs.to_str().expect("utf-8");
        assert_eq!(resolve_app_path(Path::new("/elsewhere"), abs), abs);
    }

    #[test]
    fn library_dir_is_appended_last() {
        let existing = env::join_paths(["/usr/bin", "/bin"]).unwrap();
        let lib = Path::new("/opt/hfsexplorer/lib");
        let joined = augmented_search_path(Some(&existing), lib).unwrap();
        let parts: Vec<_> = env::split_paths(&joined).collect();
        assert_eq!(parts.last().map(|p| p.as_path()), Some(lib));
        assert_eq!(parts.len(), 3);

        let alone = augmented_search_path(None, lib).unwrap();
        assert_eq!(env::split_paths(&alone).collect::<Vec<_>>(), [lib]);
    }
}
