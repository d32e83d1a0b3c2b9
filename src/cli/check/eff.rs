/*
 * SPDX-FileCopyrightText: 2025 Tommaso Fontana
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::cli::GlobalArgs;
use crate::eff::{DEFAULT_TOLERANCE, compare_eff};
use anyhow::{Result, bail};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
#[command(name = "eff", about = "Checks that an efficiency file matches the expected results, element by element, within a tolerance. By default the expected results are read from the file with the same name prefixed by \"expected_\".", long_about = None)]
pub struct CliArgs {
    /// The efficiency file to check.
    pub file: PathBuf,

    #[arg(short, long)]
    /// The file containing the expected results.
    pub expected: Option<PathBuf>,

    #[arg(short, long, default_value_t = DEFAULT_TOLERANCE)]
    /// The maximum absolute difference between matching values.
    pub tolerance: f64,
}

pub fn main(_global_args: GlobalArgs, args: CliArgs) -> Result<()> {
    let comparison = compare_eff(&args.file, args.expected.as_deref(), args.tolerance)?;
    if !comparison.is_match() {
        bail!("{}: {}", args.file.display(), comparison);
    }
    log::info!("{}: {}", args.file.display(), comparison);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(file: PathBuf, expected: Option<PathBuf>) -> CliArgs {
        CliArgs {
            file,
            expected,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    #[test]
    fn test_match_and_mismatch() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("g.eff");
        std::fs::write(&file, "0.1\n0.2\n")?;
        std::fs::write(dir.path().join("expected_g.eff"), "0.1\n0.2\n")?;
        main(GlobalArgs::default(), args(file.clone(), None))?;

        let other = dir.path().join("other.eff");
        std::fs::write(&other, "0.1\n")?;
        let err = main(GlobalArgs::default(), args(file, Some(other))).unwrap_err();
        assert!(err.to_string().contains("different number of elements"));
        Ok(())
    }
}
