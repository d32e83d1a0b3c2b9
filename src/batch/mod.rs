/*
 * SPDX-FileCopyrightText: 2025 Tommaso Fontana
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Batch execution of node-efficiency programs over edge lists.
//!
//! [`run_batch`] moves into a directory, collects the files whose name ends
//! with a given suffix, and runs a [`Runner`] on each of them, one at a
//! time. The programs are external: their exit status is logged, but it
//! never stops the batch.

use anyhow::{Context, Result, ensure};
use dsi_progress_logger::ProgressLog;
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::eff::{compare_eff, eff_file_name};
use crate::utils::CurrentDirGuard;

pub mod prompt;

/// The default directory containing the edge lists.
pub const DEFAULT_DIR: &str = "redes-grandes";
/// The default suffix of edge-list files.
pub const DEFAULT_SUFFIX: &str = "edgelist";
/// The default directory containing the programs, relative to the
/// directory containing the edge lists.
pub const DEFAULT_PROGRAMS_DIR: &str = "..";
/// The name of the program comparing efficiency files with expected results.
pub const COMPARE_PROGRAM: &str = "compare-expected-trab-1";
/// The default launcher for MPI programs.
pub const DEFAULT_MPI_LAUNCHER: &str = "mpirun";

/// The node-efficiency programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Variant {
    /// Sequential computation on adjacency arrays.
    SequentialArray,
    /// Sequential computation on adjacency lists.
    SequentialList,
    /// Parallel computation with OpenMP; takes the number of threads.
    ParallelOpenmp,
    /// Parallel computation with MPI, started by an MPI launcher with the
    /// given number of processes.
    ParallelMpi,
    /// Implementation without adjacency lists; results are compared by
    /// default.
    NoList,
    /// Reference implementation; results are compared by default.
    Plain,
}

impl Variant {
    /// The file name of the program.
    pub fn program_name(&self) -> &'static str {
        match self {
            Variant::SequentialArray => "node_eff_sequential_array",
            Variant::SequentialList => "node_eff_sequential_list",
            Variant::ParallelOpenmp => "node_eff_parallel_array_openmp",
            Variant::ParallelMpi => "node_eff_parallel_array_mpi",
            Variant::NoList => "node_eff_no_list",
            Variant::Plain => "node_eff",
        }
    }

    /// Whether the program needs a number of threads (or processes).
    pub fn is_parallel(&self) -> bool {
        matches!(self, Variant::ParallelOpenmp | Variant::ParallelMpi)
    }

    /// Whether results are compared with expected results unless
    /// requested otherwise.
    pub fn compares_by_default(&self) -> bool {
        matches!(self, Variant::NoList | Variant::Plain)
    }
}

/// How efficiency files are compared with expected results.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparer {
    /// Run the given program with the name of the efficiency file.
    External(PathBuf),
    /// Compare in-process with the given tolerance.
    Builtin(f64),
}

/// What happened to a single invocation.
#[derive(Debug)]
pub enum Outcome {
    /// The program exited successfully.
    Success,
    /// The program exited unsuccessfully, with the given code if it was not
    /// killed by a signal.
    Failed(Option<i32>),
    /// The program could not be started.
    NotStarted(std::io::Error),
    /// Nothing was run.
    DryRun,
}

impl Outcome {
    /// Returns true unless the program failed or could not be started.
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Success | Outcome::DryRun)
    }
}

/// Runs the node-efficiency program, and possibly a comparison, on an edge
/// list.
///
/// Relative paths of programs are resolved against the directory the batch
/// runs in, that is, the directory containing the edge lists.
#[derive(Debug, Clone)]
pub struct Runner {
    /// The program to run.
    pub variant: Variant,
    /// The path of the program.
    pub program: PathBuf,
    /// The number of threads or processes, for parallel variants. It is
    /// passed unchanged, even if zero or negative.
    pub num_threads: Option<i64>,
    /// The launcher for MPI programs.
    pub mpi_launcher: OsString,
    /// How to compare results, if at all.
    pub comparer: Option<Comparer>,
    /// A file the standard output of the program is appended to.
    pub output_log: Option<PathBuf>,
    /// Log the commands instead of running them.
    pub dry_run: bool,
}

impl Runner {
    /// Creates a runner for the given variant whose program is in
    /// `programs_dir`.
    ///
    /// Variants that [compare by default](Variant::compares_by_default) get
    /// the external comparison program from the same directory.
    pub fn new(variant: Variant, programs_dir: impl AsRef<Path>) -> Self {
        let programs_dir = programs_dir.as_ref();
        Self {
            variant,
            program: programs_dir.join(variant.program_name()),
            num_threads: None,
            mpi_launcher: OsString::from(DEFAULT_MPI_LAUNCHER),
            comparer: variant
                .compares_by_default()
                .then(|| Comparer::External(programs_dir.join(COMPARE_PROGRAM))),
            output_log: None,
            dry_run: false,
        }
    }

    /// Returns the command running the program on an edge list.
    pub fn command(&self, edgelist: impl AsRef<OsStr>) -> Result<Command> {
        let edgelist = edgelist.as_ref();
        let num_threads = || {
            self.num_threads
                .with_context(|| format!("The {:?} variant needs a number of threads", self.variant))
        };
        Ok(match self.variant {
            Variant::ParallelOpenmp => {
                let mut command = Command::new(&self.program);
                command.arg(edgelist).arg(num_threads()?.to_string());
                command
            }
            Variant::ParallelMpi => {
                let mut command = Command::new(&self.mpi_launcher);
                command
                    .arg("-np")
                    .arg(num_threads()?.to_string())
                    .arg(&self.program)
                    .arg(edgelist);
                command
            }
            _ => {
                let mut command = Command::new(&self.program);
                command.arg(edgelist);
                command
            }
        })
    }

    /// Returns the command running the external comparison program on the
    /// efficiency file of an edge list, if an external program is used.
    pub fn compare_command(&self, edgelist: impl AsRef<OsStr>) -> Option<Command> {
        match &self.comparer {
            Some(Comparer::External(program)) => {
                let mut command = Command::new(program);
                command.arg(eff_file_name(edgelist));
                Some(command)
            }
            _ => None,
        }
    }

    /// Opens the output log in append mode, creating it if necessary.
    pub fn open_output_log(&self) -> Result<Option<File>> {
        self.output_log
            .as_ref()
            .map(|path| {
                File::options()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Could not open output log {}", path.display()))
            })
            .transpose()
    }

    /// Runs the program, and then the comparison, on an edge list.
    ///
    /// Returns the outcome of the program and, if a comparison was
    /// performed, whether it succeeded.
    pub fn run(
        &self,
        edgelist: impl AsRef<OsStr>,
        output: Option<&File>,
    ) -> Result<(Outcome, Option<bool>)> {
        let edgelist = edgelist.as_ref();
        let mut command = self.command(edgelist)?;
        if let Some(output) = output {
            let output = output
                .try_clone()
                .context("Could not duplicate the output log handle")?;
            command.stdout(Stdio::from(output));
        }
        let outcome = self.spawn(command);

        let compared = match &self.comparer {
            None => None,
            Some(Comparer::External(_)) => self
                .compare_command(edgelist)
                .map(|command| self.spawn(command).is_ok()),
            Some(Comparer::Builtin(tolerance)) => Some(self.compare_builtin(edgelist, *tolerance)),
        };

        Ok((outcome, compared))
    }

    fn spawn(&self, mut command: Command) -> Outcome {
        if self.dry_run {
            log::info!("Would run {:?}", command);
            return Outcome::DryRun;
        }
        log::debug!("Running {:?}", command);
        match command.status() {
            Ok(status) if status.success() => Outcome::Success,
            Ok(status) => {
                log::warn!("{:?} exited with {}", command, status);
                Outcome::Failed(status.code())
            }
            Err(e) => {
                log::warn!("Could not run {:?}: {}", command, e);
                Outcome::NotStarted(e)
            }
        }
    }

    fn compare_builtin(&self, edgelist: &OsStr, tolerance: f64) -> bool {
        let eff = PathBuf::from(eff_file_name(edgelist));
        if self.dry_run {
            log::info!("Would compare {} with its expected results", eff.display());
            return true;
        }
        match compare_eff(&eff, None, tolerance) {
            Ok(comparison) if comparison.is_match() => {
                log::info!("{}: {}", eff.display(), comparison);
                true
            }
            Ok(comparison) => {
                log::warn!("{}: {}", eff.display(), comparison);
                false
            }
            Err(e) => {
                log::warn!("Could not compare {}: {:#}", eff.display(), e);
                false
            }
        }
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(Variant::SequentialArray, DEFAULT_PROGRAMS_DIR)
    }
}

/// Returns the names of the files in `dir` whose name ends with `suffix`,
/// in lexicographical order.
///
/// Hidden files are not returned. Names are compared and returned byte by
/// byte, so names that are not valid UTF-8 are preserved.
pub fn find_by_suffix(dir: impl AsRef<Path>, suffix: &str) -> Result<Vec<OsString>> {
    let dir = dir.as_ref();
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Could not read directory {}", dir.display()))?
    {
        let entry = entry.with_context(|| format!("Could not scan directory {}", dir.display()))?;
        let name = entry.file_name();
        let bytes = name.as_encoded_bytes();
        if !bytes.starts_with(b".") && bytes.ends_with(suffix.as_bytes()) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Summary of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// The edge lists processed, in processing order.
    pub files: Vec<OsString>,
    /// The number of invocations that failed or could not be started.
    pub failed: usize,
    /// The number of comparisons performed.
    pub compared: usize,
    /// The number of comparisons that failed.
    pub mismatched: usize,
}

/// Runs `runner` on each file of `dir` whose name ends with `suffix`.
///
/// The current directory is `dir` for the whole duration of the batch, and
/// it is restored before returning, whatever the outcome. Failures of the
/// external programs are logged and counted in the returned report, but do
/// not make the batch fail.
///
/// # Errors
///
/// If the output log cannot be opened, if `dir` cannot be entered or
/// scanned, or if a parallel variant has no number of threads.
pub fn run_batch(
    dir: impl AsRef<Path>,
    suffix: &str,
    runner: &Runner,
    pl: &mut impl ProgressLog,
) -> Result<BatchReport> {
    ensure!(
        !runner.variant.is_parallel() || runner.num_threads.is_some(),
        "The {:?} variant needs a number of threads",
        runner.variant
    );
    // opened before moving, so that relative paths refer to the starting directory
    let output = runner.open_output_log()?;

    let _guard = CurrentDirGuard::enter(dir.as_ref())?;
    let files = find_by_suffix(".", suffix)?;
    log::info!("Found {} files: {:?}", files.len(), files);

    pl.item_name("file");
    pl.expected_updates(Some(files.len()));
    pl.start(format!("Running {}...", runner.program.display()));

    let mut report = BatchReport::default();
    for file in &files {
        let (outcome, compared) = runner.run(file, output.as_ref())?;
        if !outcome.is_ok() {
            report.failed += 1;
        }
        if let Some(matched) = compared {
            report.compared += 1;
            if !matched {
                report.mismatched += 1;
            }
        }
        pl.update();
    }
    pl.done();

    if report.failed > 0 {
        log::warn!("{} of {} runs failed", report.failed, files.len());
    }
    if report.mismatched > 0 {
        log::warn!(
            "{} of {} comparisons failed",
            report.mismatched,
            report.compared
        );
    }
    report.files = files;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eff::DEFAULT_TOLERANCE;

    fn args(command: &Command) -> Vec<String> {
        command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_sequential_command() -> Result<()> {
        let runner = Runner::new(Variant::SequentialArray, "..");
        let command = runner.command("a.edgelist")?;
        assert_eq!(
            command.get_program(),
            Path::new("../node_eff_sequential_array").as_os_str()
        );
        assert_eq!(args(&command), vec!["a.edgelist"]);
        assert!(runner.comparer.is_none());
        assert!(runner.compare_command("a.edgelist").is_none());
        Ok(())
    }

    #[test]
    fn test_openmp_command() -> Result<()> {
        let mut runner = Runner::new(Variant::ParallelOpenmp, "bin");
        assert!(runner.command("a.edgelist").is_err());
        runner.num_threads = Some(0);
        let command = runner.command("a.edgelist")?;
        assert_eq!(
            command.get_program(),
            Path::new("bin/node_eff_parallel_array_openmp").as_os_str()
        );
        assert_eq!(args(&command), vec!["a.edgelist", "0"]);
        runner.num_threads = Some(-1);
        assert_eq!(args(&runner.command("a.edgelist")?), vec!["a.edgelist", "-1"]);
        Ok(())
    }

    #[test]
    fn test_mpi_command() -> Result<()> {
        let mut runner = Runner::new(Variant::ParallelMpi, "..");
        runner.num_threads = Some(4);
        let command = runner.command("g.edgelist")?;
        assert_eq!(command.get_program(), "mpirun");
        assert_eq!(
            args(&command),
            vec!["-np", "4", "../node_eff_parallel_array_mpi", "g.edgelist"]
        );
        Ok(())
    }

    #[test]
    fn test_compare_command() {
        let runner = Runner::new(Variant::Plain, "..");
        assert_eq!(
            runner.comparer,
            Some(Comparer::External(PathBuf::from("../compare-expected-trab-1")))
        );
        let command = runner.compare_command("rede_n_10.k_2.edgelist").unwrap();
        assert_eq!(args(&command), vec!["rede_n_10.eff"]);

        let mut runner = Runner::new(Variant::NoList, "..");
        runner.comparer = Some(Comparer::Builtin(DEFAULT_TOLERANCE));
        assert!(runner.compare_command("a.edgelist").is_none());
    }

    #[test]
    fn test_find_by_suffix() -> Result<()> {
        let dir = tempfile::tempdir()?;
        for name in ["a.edgelist", "b.edgelist", "c.txt", ".hidden.edgelist", "edgelist.bak"] {
            std::fs::write(dir.path().join(name), "0 1\n")?;
        }
        let mut found = find_by_suffix(dir.path(), DEFAULT_SUFFIX)?;
        found.sort();
        assert_eq!(found, vec!["a.edgelist", "b.edgelist"]);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_find_by_suffix_special_chars() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let sub = dir.path().join("graphs [large]");
        std::fs::create_dir(&sub)?;
        std::fs::write(sub.join("x.el*"), "")?;
        std::fs::write(sub.join("y.elx"), "")?;
        assert_eq!(find_by_suffix(&sub, ".el*")?, vec!["x.el*"]);
        Ok(())
    }

    // some filesystems reject names that are not valid UTF-8
    #[cfg(target_os = "linux")]
    #[test]
    fn test_find_by_suffix_non_utf8() -> Result<()> {
        use std::os::unix::ffi::OsStrExt;
        let dir = tempfile::tempdir()?;
        let name = OsStr::from_bytes(b"rede_\xff.edgelist");
        std::fs::write(dir.path().join(name), "0 1\n")?;
        std::fs::write(dir.path().join("a.edgelist"), "0 1\n")?;
        let found = find_by_suffix(dir.path(), DEFAULT_SUFFIX)?;
        assert_eq!(found, vec![OsString::from("a.edgelist"), name.to_owned()]);

        let runner = Runner::new(Variant::Plain, "..");
        let command = runner.command(name)?;
        assert_eq!(command.get_args().collect::<Vec<_>>(), vec![name]);
        let command = runner.compare_command(name).unwrap();
        assert_eq!(
            command.get_args().collect::<Vec<_>>(),
            vec![OsStr::from_bytes(b"rede_\xff.eff")]
        );
        Ok(())
    }

    #[test]
    fn test_dry_run() -> Result<()> {
        let mut runner = Runner::new(Variant::SequentialArray, "/nonexistent");
        runner.dry_run = true;
        let (outcome, compared) = runner.run("a.edgelist", None)?;
        assert!(matches!(outcome, Outcome::DryRun));
        assert!(compared.is_none());
        Ok(())
    }

    #[test]
    fn test_missing_program() -> Result<()> {
        let runner = Runner::new(Variant::SequentialArray, "/nonexistent/programs");
        let (outcome, _) = runner.run("a.edgelist", None)?;
        assert!(matches!(outcome, Outcome::NotStarted(_)));
        assert!(!outcome.is_ok());
        Ok(())
    }
}
