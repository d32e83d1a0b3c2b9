/*
 * SPDX-FileCopyrightText: 2025 Tommaso Fontana
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]
// for now we don't need any new feature but we might remove this in the future
#![deny(unstable_features)]
#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(clippy::empty_loop)]
#![deny(unreachable_code)]
#![deny(unreachable_pub)]
#![deny(unreachable_patterns)]
#![deny(unused_macro_rules)]
#![deny(unused_doc_comments)]

pub mod batch;
pub mod eff;
pub mod plot;
pub mod timing_log;
pub mod utils;

#[cfg(feature = "cli")]
pub mod cli;

/// Prelude module to import everything from this crate.
pub mod prelude {
    pub use crate::batch::*;
    pub use crate::eff::*;
    pub use crate::plot::*;
    pub use crate::timing_log::*;
    pub use crate::utils::*;
}
