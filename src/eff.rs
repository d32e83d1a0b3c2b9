/*
 * SPDX-FileCopyrightText: 2025 Tommaso Fontana
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Comparison of node-efficiency files against expected results.
//!
//! An efficiency file contains one value per node, separated by whitespace.
//! The expected results for `name.eff` live in `expected_name.eff`, in the
//! same directory.

use anyhow::{Context, Result, bail};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// The maximum absolute difference between two values considered equal.
pub const DEFAULT_TOLERANCE: f64 = 1e-5;
/// The prefix of the file name of expected results.
pub const EXPECTED_PREFIX: &str = "expected_";
/// The extension of efficiency files.
pub const EFF_EXTENSION: &str = "eff";

/// Returns the name of the efficiency file written for an edge list: the
/// file name up to its first dot, followed by `.eff`.
///
/// ```
/// # use node_eff_bench::eff::eff_file_name;
/// assert_eq!(eff_file_name("rede_n_10_k_2.edgelist"), "rede_n_10_k_2.eff");
/// assert_eq!(eff_file_name("a.b.edgelist"), "a.eff");
/// ```
///
/// Names that are not valid UTF-8 are preserved byte by byte.
pub fn eff_file_name(edgelist: impl AsRef<OsStr>) -> OsString {
    let bytes = edgelist.as_ref().as_encoded_bytes();
    let stem_len = bytes.iter().position(|&b| b == b'.').unwrap_or(bytes.len());
    // SAFETY: the bytes come from an OsStr and are split right before an
    // ASCII character or at the end
    let stem = unsafe { OsStr::from_encoded_bytes_unchecked(&bytes[..stem_len]) };
    let mut name = stem.to_owned();
    name.push(".");
    name.push(EFF_EXTENSION);
    name
}

/// Returns the path of the expected results for the given efficiency file.
///
/// # Errors
///
/// If `path` has no file name.
pub fn expected_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let Some(file_name) = path.file_name() else {
        bail!("{} has no file name", path.display());
    };
    let mut expected = OsString::from(EXPECTED_PREFIX);
    expected.push(file_name);
    Ok(path.with_file_name(expected))
}

/// Reads whitespace-separated values from a string.
///
/// Reading stops at the first token that is not a number, like a formatted
/// input stream would.
pub fn parse_values(text: &str) -> Vec<f64> {
    let mut values = Vec::new();
    for token in text.split_whitespace() {
        match token.parse::<f64>() {
            Ok(value) => values.push(value),
            Err(_) => {
                log::warn!(
                    "Stopped reading at token {:?} after {} values",
                    token,
                    values.len()
                );
                break;
            }
        }
    }
    values
}

/// Reads the values of an efficiency file.
pub fn read_eff(path: impl AsRef<Path>) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Error opening file {}", path.display()))?;
    Ok(parse_values(&text))
}

/// The outcome of a comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    /// All values match; the number of values is given.
    Match(usize),
    /// The files have a different number of values.
    DifferentLengths { found: usize, expected: usize },
    /// The first index at which values differ by more than the tolerance.
    Differ {
        index: usize,
        expected: f64,
        found: f64,
    },
}

impl Comparison {
    /// Returns true if the values match.
    pub fn is_match(&self) -> bool {
        matches!(self, Comparison::Match(_))
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Match(len) => write!(f, "{} elements read, files match", len),
            Comparison::DifferentLengths { found, expected } => write!(
                f,
                "Files have different number of elements ({} found, {} expected)",
                found, expected
            ),
            Comparison::Differ {
                index,
                expected,
                found,
            } => write!(
                f,
                "Files differ at element {}: expected {}, found {}",
                index, expected, found
            ),
        }
    }
}

/// Compares two sequences of values with the given absolute tolerance.
pub fn compare_values(found: &[f64], expected: &[f64], tolerance: f64) -> Comparison {
    if found.len() != expected.len() {
        return Comparison::DifferentLengths {
            found: found.len(),
            expected: expected.len(),
        };
    }
    // written so that NaNs count as differences
    match found
        .iter()
        .zip(expected)
        .position(|(f, e)| !((f - e).abs() <= tolerance))
    {
        Some(index) => Comparison::Differ {
            index,
            expected: expected[index],
            found: found[index],
        },
        None => Comparison::Match(found.len()),
    }
}

/// Compares an efficiency file against its expected results.
///
/// If `expected` is `None`, the [expected path](expected_path) of `path` is
/// used.
pub fn compare_eff(
    path: impl AsRef<Path>,
    expected: Option<&Path>,
    tolerance: f64,
) -> Result<Comparison> {
    let path = path.as_ref();
    let expected = match expected {
        Some(expected) => expected.to_owned(),
        None => expected_path(path)?,
    };
    let found_values = read_eff(path)?;
    let expected_values = read_eff(&expected)?;
    Ok(compare_values(&found_values, &expected_values, tolerance))
}
