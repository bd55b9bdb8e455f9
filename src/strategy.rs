// ── Ordered fallbacks ─────────────────────────────────────────────────────────
//
// Several operations have more than one way of getting an answer out of the
// OS (file size vs. disk length vs. partition length, extended vs. legacy
// geometry, registry vs. JAVA_HOME vs. child process).  They all share this
// combinator: try each probe in order, stop at the first success.

use std::fmt;

/// One named way of producing a `T` from some context `C`.
pub struct Probe<C: ?Sized, T, E> {
    pub name: &'static str,
    pub run: fn(&C) -> Result<T, E>,
}

impl<C: ?Sized, T, E> Probe<C, T, E> {
    pub const fn new(name: &'static str, run: fn(&C) -> Result<T, E>) -> Self {
        Self { name, run }
    }
}

impl<C: ?Sized, T, E> Clone for Probe<C, T, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: ?Sized, T, E> Copy for Probe<C, T, E> {}

/// Every probe failed (or there were none).
#[derive(Debug)]
pub struct Exhausted<E> {
    /// Names of the probes that ran, in order.
    pub tried: Vec<&'static str>,
    /// The error from the last probe that ran.
    pub last: Option<E>,
}

impl<E: fmt::Display> fmt::Display for Exhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.last {
            Some(e) => write!(f, "all of [{}] failed; last: {e}", self.tried.join(", ")),
            None => f.write_str("no strategies to try"),
        }
    }
}

/// Run `probes` against `ctx` in order and return the first success.
///
/// Failures are logged at debug level and otherwise discarded; only the
/// last one survives in [`Exhausted`].
pub fn first_success<C, T, E>(ctx: &C, probes: &[Probe<C, T, E>]) -> Result<T, Exhausted<E>>
where
    C: ?Sized,
    E: fmt::Display,
{
    let mut tried = Vec::with_capacity(probes.len());
    let mut last = None;
    for probe in probes {
        tried.push(probe.name);
        match (probe.run)(ctx) {
            Ok(value) => {
                log::debug!("{} succeeded", probe.name);
                return Ok(value);
            }
            Err(e) => {
                log::debug!("{} failed: {e}", probe.name);
                last = Some(e);
            }
        }
    }
    Err(Exhausted { tried, last })
}
