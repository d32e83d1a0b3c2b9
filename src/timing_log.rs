/*
 * SPDX-FileCopyrightText: 2025 Tommaso Fontana
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Parsing of the timing logs written by the node-efficiency programs.
//!
//! A log is a sequence of records of [`LINES_PER_RECORD`] lines each. The
//! first line of a record is a label made of underscore-separated tokens,
//! the third of which (index 2) is the number of nodes of the graph and the
//! fifth of which (index 4) is its average degree, as in
//! `rede_n_1000_k_4_0`. The second line is the elapsed time in seconds. The
//! remaining two lines are ignored.
//!
//! The log is split on `\n`, so a final newline yields a last empty line; a
//! trailing block with fewer than [`LINES_PER_RECORD`] lines is ignored.

use anyhow::{Context, Result, anyhow, ensure};
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::utils::create_parent_dir;

/// The number of lines of each record.
pub const LINES_PER_RECORD: usize = 4;
/// The index of the label token containing the number of nodes.
pub const NODES_TOKEN: usize = 2;
/// The index of the label token containing the average degree.
pub const DEGREE_TOKEN: usize = 4;

/// A single timing record, as parsed from a log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingRecord {
    /// The number of nodes.
    pub nodes: u64,
    /// The average degree.
    pub degree: u64,
    /// The elapsed time in seconds.
    pub time: f64,
}

impl TimingRecord {
    /// Returns the number of edges, that is, `nodes * degree / 2` with
    /// integer division, or `None` if it does not fit a `u64`.
    ///
    /// The product is computed on 128 bits, so it may exceed `u64::MAX` as
    /// long as its half does not.
    pub fn edges(&self) -> Option<u64> {
        u64::try_from(u128::from(self.nodes) * u128::from(self.degree) / 2).ok()
    }

    /// Returns the size of the graph, that is, the number of nodes plus the
    /// number of edges, or `None` if it does not fit a `u64`.
    pub fn model(&self) -> Option<u64> {
        self.nodes.checked_add(self.edges()?)
    }

    /// Returns the derived row of this record.
    ///
    /// # Errors
    ///
    /// If the number of edges or the size of the graph overflow.
    pub fn row(&self) -> Result<TimingRow> {
        let edges = self.edges().with_context(|| {
            format!(
                "The number of edges of a graph with {} nodes and degree {} overflows",
                self.nodes, self.degree
            )
        })?;
        let model = self.model().with_context(|| {
            format!(
                "The number of nodes plus the number of edges ({} + {}) overflows",
                self.nodes, edges
            )
        })?;
        Ok(TimingRow {
            nodes: self.nodes,
            edges,
            model,
            time: self.time,
        })
    }
}

/// A row of a parsed log: the number of nodes, the number of edges, their
/// sum, and the elapsed time.
///
/// This is also the format of exported records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimingRow {
    pub nodes: u64,
    pub edges: u64,
    pub model: u64,
    pub time: f64,
}

/// Parses the number of nodes and the average degree from a record label.
pub fn parse_label(label: &str) -> Result<(u64, u64)> {
    let tokens: Vec<&str> = label.split('_').collect();
    ensure!(
        tokens.len() > DEGREE_TOKEN,
        "Label {:?} has {} underscore-separated tokens, at least {} expected",
        label,
        tokens.len(),
        DEGREE_TOKEN + 1
    );
    let nodes = tokens[NODES_TOKEN].trim().parse::<u64>().map_err(|e| {
        anyhow!(
            "Invalid number of nodes {:?} in label {:?}: {}",
            tokens[NODES_TOKEN],
            label,
            e
        )
    })?;
    let degree = tokens[DEGREE_TOKEN].trim().parse::<u64>().map_err(|e| {
        anyhow!(
            "Invalid degree {:?} in label {:?}: {}",
            tokens[DEGREE_TOKEN],
            label,
            e
        )
    })?;
    Ok((nodes, degree))
}

/// Parses a record from its lines.
///
/// Only the first two lines are inspected.
pub fn parse_record(lines: &[&str]) -> Result<TimingRecord> {
    ensure!(
        lines.len() >= 2,
        "A record needs at least 2 lines, {} given",
        lines.len()
    );
    let (nodes, degree) = parse_label(lines[0])?;
    let time = lines[1]
        .trim()
        .parse::<f64>()
        .map_err(|e| anyhow!("Invalid elapsed time {:?}: {}", lines[1], e))?;
    Ok(TimingRecord {
        nodes,
        degree,
        time,
    })
}

/// The content of a timing log, as parallel sequences indexed by record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingLog {
    nodes: Vec<u64>,
    edges: Vec<u64>,
    model: Vec<u64>,
    eff: Vec<f64>,
    num_lines: usize,
}

impl TimingLog {
    /// Parses a log from its text.
    ///
    /// Parsing stops at the first malformed record, and the error reports
    /// the (one-based) number of the offending line.
    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text.split('\n').collect();
        let num_records = lines.len() / LINES_PER_RECORD;
        let mut log = Self {
            nodes: Vec::with_capacity(num_records),
            edges: Vec::with_capacity(num_records),
            model: Vec::with_capacity(num_records),
            eff: Vec::with_capacity(num_records),
            num_lines: lines.len(),
        };

        for (i, chunk) in lines.chunks_exact(LINES_PER_RECORD).enumerate() {
            let row = parse_record(chunk)
                .and_then(|record| record.row())
                .with_context(|| format!("Malformed record at line {}", i * LINES_PER_RECORD + 1))?;
            log.push(row);
        }

        if lines.len() % LINES_PER_RECORD != 0 {
            log::debug!(
                "Ignoring {} trailing lines",
                lines.len() % LINES_PER_RECORD
            );
        }

        Ok(log)
    }

    /// Reads and parses the log at the given path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read timing log {}", path.display()))?;
        let log = Self::parse(&text).with_context(|| format!("In {}", path.display()))?;
        log::info!("Read {} lines from {}", log.num_lines, path.display());
        Ok(log)
    }

    fn push(&mut self, row: TimingRow) {
        self.nodes.push(row.nodes);
        self.edges.push(row.edges);
        self.model.push(row.model);
        self.eff.push(row.time);
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.eff.len()
    }

    /// Returns true if the log contains no record.
    pub fn is_empty(&self) -> bool {
        self.eff.is_empty()
    }

    /// Returns the number of lines of the parsed text, including the ones
    /// of a trailing partial record.
    pub fn num_lines(&self) -> usize {
        self.num_lines
    }

    /// The number of nodes of each record.
    pub fn nodes(&self) -> &[u64] {
        &self.nodes
    }

    /// The number of edges of each record.
    pub fn edges(&self) -> &[u64] {
        &self.edges
    }

    /// The number of nodes plus the number of edges of each record.
    pub fn model(&self) -> &[u64] {
        &self.model
    }

    /// The elapsed time of each record, in seconds.
    pub fn eff(&self) -> &[f64] {
        &self.eff
    }

    /// Iterates over the rows of the log.
    pub fn rows(&self) -> impl Iterator<Item = TimingRow> + '_ {
        (0..self.len()).map(|i| TimingRow {
            nodes: self.nodes[i],
            edges: self.edges[i],
            model: self.model[i],
            time: self.eff[i],
        })
    }
}

/// Formats for exporting a parsed timing log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum RecordFormat {
    /// ASCII format: a header line and a line for each record, with
    /// tab-separated number of nodes, number of edges, their sum, and time.
    Ascii,
    /// A JSON array of objects.
    Json,
}

impl RecordFormat {
    /// Stores the records of `log` at `path` in the format defined by
    /// `self`.
    pub fn store(&self, path: impl AsRef<Path>, log: &TimingLog) -> Result<()> {
        create_parent_dir(&path)?;
        let path_display = path.as_ref().display();
        let file = std::fs::File::create(&path)
            .with_context(|| format!("Could not create {}", path_display))?;
        let mut file = BufWriter::new(file);

        match self {
            RecordFormat::Ascii => {
                log::info!("Storing records in ASCII format at {}", path_display);
                writeln!(file, "nodes\tedges\tmodel\ttime")?;
                for row in log.rows() {
                    writeln!(file, "{}\t{}\t{}\t{}", row.nodes, row.edges, row.model, row.time)
                        .with_context(|| format!("Could not write to {}", path_display))?;
                }
            }
            RecordFormat::Json => {
                log::info!("Storing records in JSON format at {}", path_display);
                let rows: Vec<TimingRow> = log.rows().collect();
                serde_json::to_writer(&mut file, &rows)
                    .with_context(|| format!("Could not write to {}", path_display))?;
            }
        }

        file.flush()
            .with_context(|| format!("Could not flush {}", path_display))?;
        Ok(())
    }
}
