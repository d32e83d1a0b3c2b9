/*
 * SPDX-FileCopyrightText: 2024 Tommaso Fontana
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use clap::Subcommand;

use super::GlobalArgs;

pub mod eff;

#[derive(Subcommand, Debug)]
#[command(name = "check")]
/// Check results of node-efficiency programs.
pub enum SubCommands {
    Eff(eff::CliArgs),
}

pub fn main(global_args: GlobalArgs, subcommand: SubCommands) -> Result<()> {
    match subcommand {
        SubCommands::Eff(args) => eff::main(global_args, args),
    }
}
