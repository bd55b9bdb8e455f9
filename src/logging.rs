// ── Logging ───────────────────────────────────────────────────────────────────
//
// `log` facade everywhere, `env_logger` as the backend.  Output goes to
// stderr, which is the JVM's stderr when running inside `llio.dll`.
// `RUST_LOG` overrides the default filter.

/// Install the logger. Later calls are no-ops, so both `JNI_OnLoad` and the
/// launcher's `main` can call it unconditionally.
pub fn init(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env)
        .format_target(false)
        .try_init();
}
