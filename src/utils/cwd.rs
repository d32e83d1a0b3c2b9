/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// A scoped change of the current working directory.
///
/// [`enter`](CurrentDirGuard::enter) saves the current directory and moves
/// to the given one; dropping the guard moves back to the saved directory,
/// on every exit path, unwinding included.
///
/// The current directory is process-wide state: at most one guard should be
/// alive at any time, and no other thread should depend on the current
/// directory while a guard is alive.
///
/// ```no_run
/// # use node_eff_bench::utils::CurrentDirGuard;
/// # fn main() -> anyhow::Result<()> {
/// {
///     let _guard = CurrentDirGuard::enter("redes-grandes")?;
///     // relative paths now resolve inside redes-grandes
/// }
/// // back to the original directory
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CurrentDirGuard {
    saved: PathBuf,
}

impl CurrentDirGuard {
    /// Saves the current directory and changes to `path`.
    ///
    /// A leading `~` in `path` is expanded to the home directory.
    pub fn enter(path: impl AsRef<Path>) -> Result<Self> {
        let path = expand_tilde(path.as_ref());
        let saved =
            std::env::current_dir().context("Could not determine the current directory")?;
        std::env::set_current_dir(&path)
            .with_context(|| format!("Could not change directory to {}", path.display()))?;
        log::debug!("Entered {} (from {})", path.display(), saved.display());
        Ok(Self { saved })
    }

    /// Returns the directory that will be restored on drop.
    pub fn saved(&self) -> &Path {
        &self.saved
    }
}

impl Drop for CurrentDirGuard {
    fn drop(&mut self) {
        match std::env::set_current_dir(&self.saved) {
            Ok(()) => log::debug!("Restored {}", self.saved.display()),
            Err(e) => log::error!(
                "Could not restore the current directory to {}: {}",
                self.saved.display(),
                e
            ),
        }
    }
}

/// Expands a leading `~` component to the value of `HOME`.
///
/// Paths not starting with `~`, and all paths when `HOME` is not set, are
/// returned unchanged. The `~user` form is not supported.
pub fn expand_tilde(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_owned();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_owned(),
    }
}
