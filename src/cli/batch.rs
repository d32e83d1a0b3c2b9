/*
 * SPDX-FileCopyrightText: 2025 Tommaso Fontana
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use clap::{Args, Parser};
use dsi_progress_logger::prelude::*;
use std::ffi::OsString;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use super::{GlobalArgs, build_info, pretty_print_elapsed};
use crate::batch::prompt::{ask_num_threads, ask_variant};
use crate::batch::{
    COMPARE_PROGRAM, Comparer, DEFAULT_DIR, DEFAULT_MPI_LAUNCHER, DEFAULT_PROGRAMS_DIR,
    DEFAULT_SUFFIX, Runner, Variant, run_batch,
};
use crate::eff::DEFAULT_TOLERANCE;

#[derive(Parser, Debug)]
#[command(name = "node-eff-batch", version=build_info::version_string())]
/// Runs a node-efficiency program on each edge list of a directory.
#[doc = include_str!("common_env.txt")]
pub struct Cli {
    #[clap(flatten)]
    global_args: GlobalArgs,
    #[clap(flatten)]
    args: CliArgs,
}

#[derive(Args, Debug)]
#[command(about = "Runs a node-efficiency program on each edge list of a directory, one at a time. Exit statuses of the program are logged but never stop the batch.", long_about = None)]
pub struct CliArgs {
    /// The directory containing the edge lists.
    #[arg(default_value = DEFAULT_DIR)]
    pub dir: PathBuf,

    #[arg(short, long, default_value = DEFAULT_SUFFIX)]
    /// The suffix of the names of the edge-list files.
    pub suffix: String,

    #[arg(short, long, value_enum)]
    /// The program to run. If missing, you will be asked to choose between
    /// sequential and OpenMP processing.
    pub variant: Option<Variant>,

    #[arg(short = 'j', long, allow_negative_numbers = true)]
    /// The number of threads (or MPI processes) for parallel variants. It is
    /// passed to the program as is. If missing, you will be asked for it.
    pub num_threads: Option<i64>,

    #[arg(long, default_value = DEFAULT_PROGRAMS_DIR)]
    /// The directory containing the programs, relative to the directory of
    /// the edge lists.
    pub programs_dir: PathBuf,

    #[arg(long)]
    /// The path of the program, relative to the directory of the edge
    /// lists (overrides the one in --programs-dir).
    pub program: Option<PathBuf>,

    #[arg(long)]
    /// Compare the results with the expected ones after each run.
    pub compare: bool,

    #[arg(long, conflicts_with_all = ["compare", "builtin_compare", "compare_program"])]
    /// Do not compare the results, even for variants that do by default.
    pub no_compare: bool,

    #[arg(long)]
    /// The program comparing results, relative to the directory of the edge
    /// lists [default: compare-expected-trab-1 in --programs-dir]
    pub compare_program: Option<PathBuf>,

    #[arg(long, conflicts_with = "compare_program")]
    /// Compare results in-process instead of running a comparison program.
    pub builtin_compare: bool,

    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    /// The tolerance of in-process comparisons.
    pub tolerance: f64,

    #[arg(long, default_value = DEFAULT_MPI_LAUNCHER)]
    /// The launcher of MPI programs.
    pub mpi_launcher: OsString,

    #[arg(short, long)]
    /// Append the standard output of the program to this file.
    pub output_log: Option<PathBuf>,

    #[arg(short = 'n', long)]
    /// Log the commands instead of running them.
    pub dry_run: bool,
}

pub fn cli_main<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let start = std::time::Instant::now();
    let cli = Cli::parse_from(args);
    main(cli.global_args, cli.args)?;

    log::info!(
        "The command took {}",
        pretty_print_elapsed(start.elapsed().as_secs_f64())
    );

    Ok(())
}

pub fn main(global_args: GlobalArgs, args: CliArgs) -> Result<()> {
    let runner = {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        runner(&args, &mut stdin.lock(), &mut stdout)?
    };

    let mut pl = progress_logger![];
    if let Some(log_interval) = global_args.log_interval {
        pl.log_interval(log_interval);
    }

    let report = run_batch(&args.dir, &args.suffix, &runner, &mut pl)?;
    log::info!(
        "Processed {} files: {} runs failed, {} of {} comparisons failed",
        report.files.len(),
        report.failed,
        report.mismatched,
        report.compared
    );
    Ok(())
}

/// Builds the runner described by the arguments, asking on `input` for the
/// variant and the number of threads when they are needed but missing.
pub fn runner(
    args: &CliArgs,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<Runner> {
    let variant = match args.variant {
        Some(variant) => variant,
        None => ask_variant(input, output)?,
    };
    let num_threads = match (variant.is_parallel(), args.num_threads) {
        (true, Some(num_threads)) => Some(num_threads),
        (true, None) => Some(ask_num_threads(input, output)?),
        (false, Some(_)) => {
            log::warn!("Ignoring the number of threads for the {:?} variant", variant);
            None
        }
        (false, None) => None,
    };

    let mut runner = Runner::new(variant, &args.programs_dir);
    if let Some(program) = &args.program {
        runner.program = program.clone();
    }
    runner.num_threads = num_threads;
    runner.mpi_launcher = args.mpi_launcher.clone();
    runner.output_log = args.output_log.clone();
    runner.dry_run = args.dry_run;

    let compare = !args.no_compare
        && (args.compare
            || args.builtin_compare
            || args.compare_program.is_some()
            || variant.compares_by_default());
    runner.comparer = compare.then(|| {
        if args.builtin_compare {
            Comparer::Builtin(args.tolerance)
        } else {
            Comparer::External(
                args.compare_program
                    .clone()
                    .unwrap_or_else(|| args.programs_dir.join(COMPARE_PROGRAM)),
            )
        }
    });

    Ok(runner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::Path;

    fn parse(args: &[&str]) -> CliArgs {
        Cli::parse_from(std::iter::once("node-eff-batch").chain(args.iter().copied())).args
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let args = parse(&["--variant", "sequential-array"]);
        assert_eq!(args.dir, Path::new("redes-grandes"));
        assert_eq!(args.suffix, "edgelist");
        let runner = runner(&args, &mut Cursor::new(""), &mut std::io::sink())?;
        assert_eq!(runner.program, Path::new("../node_eff_sequential_array"));
        assert_eq!(runner.num_threads, None);
        assert_eq!(runner.comparer, None);
        assert!(!runner.dry_run);
        Ok(())
    }

    #[test]
    fn test_interactive_parallel() -> Result<()> {
        let args = parse(&[]);
        let mut output = Vec::<u8>::new();
        let runner = runner(&args, &mut Cursor::new("1\n0\n"), &mut output)?;
        assert_eq!(runner.variant, Variant::ParallelOpenmp);
        assert_eq!(runner.num_threads, Some(0));
        let output = String::from_utf8(output)?;
        assert!(output.contains("input 0 for sequential processing"));
        assert!(output.contains("please enter the number of threads"));
        Ok(())
    }

    #[test]
    fn test_interactive_sequential() -> Result<()> {
        let args = parse(&["-j", "4"]);
        let runner = runner(&args, &mut Cursor::new("0\n"), &mut std::io::sink())?;
        assert_eq!(runner.variant, Variant::SequentialArray);
        assert_eq!(runner.num_threads, None);
        Ok(())
    }

    #[test]
    fn test_interactive_invalid() {
        let args = parse(&[]);
        assert!(runner(&args, &mut Cursor::new("yes\n"), &mut std::io::sink()).is_err());
    }

    #[test]
    fn test_threads_from_args() -> Result<()> {
        let args = parse(&["-v", "parallel-openmp", "-j", "8"]);
        let runner = runner(&args, &mut Cursor::new(""), &mut std::io::sink())?;
        assert_eq!(runner.num_threads, Some(8));

        let args = parse(&["-v", "parallel-mpi", "-j", "-1"]);
        let runner = super::runner(&args, &mut Cursor::new(""), &mut std::io::sink())?;
        assert_eq!(runner.num_threads, Some(-1));
        Ok(())
    }

    #[test]
    fn test_interactive_negative_threads() -> Result<()> {
        let args = parse(&["-v", "parallel-openmp"]);
        let runner = runner(&args, &mut Cursor::new("-2\n"), &mut std::io::sink())?;
        assert_eq!(runner.num_threads, Some(-2));
        Ok(())
    }

    #[test]
    fn test_compare_options() -> Result<()> {
        let args = parse(&["-v", "plain", "--programs-dir", "bin"]);
        let r = runner(&args, &mut Cursor::new(""), &mut std::io::sink())?;
        assert_eq!(
            r.comparer,
            Some(Comparer::External(PathBuf::from("bin/compare-expected-trab-1")))
        );

        let args = parse(&["-v", "plain", "--no-compare"]);
        let r = runner(&args, &mut Cursor::new(""), &mut std::io::sink())?;
        assert_eq!(r.comparer, None);

        let args = parse(&["-v", "sequential-list", "--builtin-compare", "--tolerance", "0.01"]);
        let r = runner(&args, &mut Cursor::new(""), &mut std::io::sink())?;
        assert_eq!(r.comparer, Some(Comparer::Builtin(0.01)));

        let args = parse(&["-v", "sequential-array", "--compare-program", "/opt/cmp"]);
        let r = runner(&args, &mut Cursor::new(""), &mut std::io::sink())?;
        assert_eq!(r.comparer, Some(Comparer::External(PathBuf::from("/opt/cmp"))));
        Ok(())
    }

    #[test]
    fn test_conflicting_compare_options() {
        let result = Cli::try_parse_from([
            "node-eff-batch",
            "--no-compare",
            "--builtin-compare",
        ]);
        assert!(result.is_err());
    }
}
