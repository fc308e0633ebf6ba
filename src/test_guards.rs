//! Environment isolation for config tests.
//!
//! `Config` reads `CASEBOOK_CONFIG`, `CASEBOOK_API_URL` and
//! `CASEBOOK_API_TOKEN` from the process environment. [`EnvGuard::clean`]
//! unsets all of them for the duration of a test and puts the previous values
//! back when dropped, panics included. Callers are `#[serial]`.

use std::env;
use std::ffi::{OsStr, OsString};

use crate::config::ENV_VARS;

pub struct EnvGuard {
    saved: Vec<(&'static str, Option<OsString>)>,
}

impl EnvGuard {
    /// Start from an environment with no casebook overrides.
    ///
    /// # Safety
    /// Mutates the process environment; no other thread may read or write it
    /// while the guard is alive.
    pub unsafe fn clean() -> Self {
        let mut guard = Self { saved: Vec::new() };
        for key in ENV_VARS {
            guard.remember(key);
            unsafe { env::remove_var(key) };
        }
        guard
    }

    /// Set `key` until the guard is dropped.
    ///
    /// # Safety
    /// Same contract as [`EnvGuard::clean`].
    pub unsafe fn set(mut self, key: &'static str, value: impl AsRef<OsStr>) -> Self {
        self.remember(key);
        unsafe { env::set_var(key, value) };
        self
    }

    fn remember(&mut self, key: &'static str) {
        if !self.saved.iter().any(|(saved, _)| *saved == key) {
            self.saved.push((key, env::var_os(key)));
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        // SAFETY: see EnvGuard::clean
        for (key, value) in self.saved.drain(..).rev() {
            match value {
                Some(value) => unsafe { env::set_var(key, value) },
                None => unsafe { env::remove_var(key) },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_clean_restores_overrides() {
        unsafe { env::set_var("CASEBOOK_API_URL", "https://before.example.test") };
        {
            let _env = unsafe { EnvGuard::clean() };
            assert!(env::var("CASEBOOK_API_URL").is_err());
        }
        assert_eq!(
            env::var("CASEBOOK_API_URL").unwrap(),
            "https://before.example.test"
        );
        unsafe { env::remove_var("CASEBOOK_API_URL") };
    }

    #[test]
    #[serial]
    fn test_set_is_undone_on_drop() {
        let key = "CASEBOOK_TEST_GUARD_EXTRA";
        unsafe { env::remove_var(key) };
        {
            let _env = unsafe { EnvGuard::clean().set(key, "temporary") };
            assert_eq!(env::var(key).unwrap(), "temporary");
        }
        assert!(env::var(key).is_err());
    }
}
