/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Interactive selection of the batch mode, used when it is not given on
//! the command line.

use anyhow::{Context, Result, bail};
use std::io::{BufRead, Write};

use super::Variant;

/// The prompt asking for sequential or parallel processing.
pub const MODE_PROMPT: &str =
    "input 0 for sequential processing, 1 for parallel processing with OpenMP";
/// The prompt asking for the number of threads.
pub const THREADS_PROMPT: &str = "please enter the number of threads";

/// Prints `prompt` on a line of its own and reads an integer from a line
/// of `input`.
///
/// Blocks until a line is available. There is no default: end of input and
/// non-numeric lines are errors.
pub fn read_int(input: &mut impl BufRead, output: &mut impl Write, prompt: &str) -> Result<i64> {
    writeln!(output, "{}", prompt)?;
    output.flush()?;

    let mut line = String::new();
    if input
        .read_line(&mut line)
        .context("Could not read from standard input")?
        == 0
    {
        bail!("Unexpected end of input after {:?}", prompt);
    }
    line.trim()
        .parse::<i64>()
        .with_context(|| format!("Invalid integer {:?}", line.trim()))
}

/// Asks for sequential or parallel processing: zero selects
/// [`Variant::SequentialArray`], any other integer
/// [`Variant::ParallelOpenmp`].
pub fn ask_variant(input: &mut impl BufRead, output: &mut impl Write) -> Result<Variant> {
    Ok(match read_int(input, output, MODE_PROMPT)? {
        0 => Variant::SequentialArray,
        _ => Variant::ParallelOpenmp,
    })
}

/// Asks for the number of threads.
///
/// Any integer is accepted, zero and negative numbers included, and passed
/// to the program as is.
pub fn ask_num_threads(input: &mut impl BufRead, output: &mut impl Write) -> Result<i64> {
    read_int(input, output, THREADS_PROMPT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_ask_variant() -> Result<()> {
        let mut output = Vec::<u8>::new();
        assert_eq!(
            ask_variant(&mut Cursor::new("0\n"), &mut output)?,
            Variant::SequentialArray
        );
        assert_eq!(String::from_utf8(output)?, format!("{}\n", MODE_PROMPT));

        let mut output = Vec::<u8>::new();
        assert_eq!(
            ask_variant(&mut Cursor::new(" 1 \n"), &mut output)?,
            Variant::ParallelOpenmp
        );
        assert_eq!(
            ask_variant(&mut Cursor::new("-3"), &mut output)?,
            Variant::ParallelOpenmp
        );
        Ok(())
    }

    #[test]
    fn test_non_numeric() {
        let mut output = Vec::<u8>::new();
        let err = ask_variant(&mut Cursor::new("parallel\n"), &mut output).unwrap_err();
        assert!(err.to_string().contains("Invalid integer"));
        assert!(ask_variant(&mut Cursor::new(""), &mut output).is_err());
        assert!(ask_variant(&mut Cursor::new("\n"), &mut output).is_err());
    }

    #[test]
    fn test_ask_num_threads() -> Result<()> {
        let mut output = Vec::<u8>::new();
        let mut input = Cursor::new("8\n0\n-1\nfour\n");
        assert_eq!(ask_num_threads(&mut input, &mut output)?, 8);
        assert_eq!(ask_num_threads(&mut input, &mut output)?, 0);
        assert_eq!(ask_num_threads(&mut input, &mut output)?, -1);
        assert!(ask_num_threads(&mut input, &mut output).is_err());
        Ok(())
    }
}
