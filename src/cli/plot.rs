/*
 * SPDX-FileCopyrightText: 2025 Tommaso Fontana
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use clap::{Args, Parser};
use std::path::PathBuf;

use super::{GlobalArgs, build_info, pretty_print_elapsed};
use crate::plot::{DEFAULT_SIZE, ImageFormat, render_scatters};
use crate::timing_log::{RecordFormat, TimingLog};

#[derive(Parser, Debug)]
#[command(name = "node-eff-plot", version=build_info::version_string())]
/// Plots the elapsed times of a timing log against the size of the graphs.
#[doc = include_str!("common_env.txt")]
pub struct Cli {
    #[clap(flatten)]
    global_args: GlobalArgs,
    #[clap(flatten)]
    args: CliArgs,
}

#[derive(Args, Debug)]
#[command(about = "Plots the elapsed times of a timing log against the number of nodes, the number of edges, and their sum. The log is made of records of four lines: a label <tok>_<tok>_<nodes>_<tok>_<degree>_... and the elapsed time in seconds, followed by two ignored lines.", long_about = None)]
pub struct CliArgs {
    /// The timing log.
    #[arg(default_value = "bach_process.log")]
    pub log: PathBuf,

    #[arg(short, long, default_value = ".")]
    /// The directory where the plots will be written.
    pub out_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = ImageFormat::Png)]
    /// The image format of the plots.
    pub fmt: ImageFormat,

    #[arg(long, default_value_t = DEFAULT_SIZE.0)]
    /// The width of the plots, in pixels.
    pub width: u32,

    #[arg(long, default_value_t = DEFAULT_SIZE.1)]
    /// The height of the plots, in pixels.
    pub height: u32,

    #[arg(long)]
    /// Also store the parsed records in this file.
    pub export: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = RecordFormat::Ascii)]
    /// The format of the exported records.
    pub export_fmt: RecordFormat,
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

pub fn main(_global_args: GlobalArgs, args: CliArgs) -> Result<()> {
    let timing_log = TimingLog::load(&args.log)?;
    log::info!("Parsed {} records", timing_log.len());

    if let Some(export) = &args.export {
        args.export_fmt.store(export, &timing_log)?;
    }

    let paths = render_scatters(
        &args.out_dir,
        args.fmt,
        (args.width, args.height),
        &timing_log,
    )?;
    for path in paths {
        log::info!("Plot written to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn test_export_before_plotting() -> Result<()> {
        // an empty log cannot be plotted, but it can still be exported
        let dir = tempfile::tempdir()?;
        let log = dir.path().join("bach_process.log");
        std::fs::write(&log, "a_b_10_d_2\n0.5\n")?;
        let export = dir.path().join("records.json");
        let cli = Cli::parse_from::<_, OsString>([
            "node-eff-plot".into(),
            log.clone().into(),
            "--out-dir".into(),
            dir.path().join("plots").into(),
            "--export".into(),
            export.clone().into(),
            "--export-fmt".into(),
            "json".into(),
        ]);
        assert!(main(cli.global_args, cli.args).is_err());
        assert_eq!(std::fs::read_to_string(&export)?, "[]");
        assert!(!dir.path().join("plots").exists());
        Ok(())
    }

    #[test]
    fn test_malformed_log() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let log = dir.path().join("bach_process.log");
        std::fs::write(&log, "a_b_10\n0.5\nx\ny\n")?;
        let cli = Cli::parse_from::<_, OsString>([
            "node-eff-plot".into(),
            log.clone().into(),
            "--out-dir".into(),
            dir.path().into(),
        ]);
        let err = main(cli.global_args, cli.args).unwrap_err();
        assert!(format!("{:#}", err).contains("line 1"));
        Ok(())
    }
}
