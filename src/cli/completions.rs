/*
 * SPDX-FileCopyrightText: 2024 Tommaso Fontana
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use clap::Parser;
use clap_complete::shells::Shell;

use super::GlobalArgs;

/// Generates shell completions. Use with `source <(node-eff-bench completions $SHELL)`.
#[derive(Parser, Debug)]
pub struct CliArgs {
    shell: Shell,
}

pub fn main(
    _global_args: GlobalArgs,
    args: CliArgs,
    mut top_command: clap::Command,
) -> Result<()> {
    clap_complete::generate(
        args.shell,
        &mut top_command,
        "node-eff-bench",
        &mut std::io::stdout(),
    );
    Ok(())
}
