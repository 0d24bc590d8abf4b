//! Scoped mutation of process environment variables.

use std::env;
use std::ffi::{OsStr, OsString};

/// Applies a set of environment bindings and restores the prior state on
/// drop.
///
/// Entering records, for every name, the value it had before (or that it was
/// absent); leaving restores exactly that state, so a variable that did not
/// exist before does not exist after. Restoration runs from `Drop`, so it
/// happens even when the scoped body panics. Scopes nest with stack
/// discipline: the last-entered scope for a name is the first restored.
///
/// The process environment is global mutable state with no built-in
/// isolation. Callers that mutate the same variable from several threads
/// must serialize those mutations externally; this crate's own test suite
/// does so with a lock.
#[derive(Debug)]
#[must_use = "the prior environment is restored when the scope is dropped"]
pub struct EnvScope {
    saved: Vec<(OsString, Option<OsString>)>,
}

impl EnvScope {
    /// Set each binding, recording what it replaced.
    pub fn apply<I, K, V>(bindings: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        let mut saved = Vec::new();
        for (key, value) in bindings {
            let key = key.as_ref().to_os_string();
            saved.push((key.clone(), env::var_os(&key)));
            // SAFETY: mutating the environment is sound only while no other
            // thread touches it concurrently, which is the documented
            // contract of this type.
            unsafe { env::set_var(&key, value.as_ref()) };
        }
        Self { saved }
    }

    /// Run `body` with `bindings` applied, restoring afterwards even if
    /// `body` panics.
    pub fn with<I, K, V, T>(bindings: I, body: impl FnOnce() -> T) -> T
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        let _scope = Self::apply(bindings);
        body()
    }
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        // Reverse order keeps repeated names within one scope
        // stack-disciplined.
        for (key, prior) in self.saved.drain(..).rev() {
            // SAFETY: see `apply`.
            unsafe {
                match prior {
                    Some(value) => env::set_var(&key, value),
                    None => env::remove_var(&key),
                }
            }
        }
    }
}
