/*
 * SPDX-FileCopyrightText: 2025 Tommaso Fontana
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::io::Write;
use std::path::PathBuf;

fn main() {
    built::write_built_file().expect("Failed to acquire build-time information");

    // append the build date, which built does not provide without its chrono feature
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR is not set"));
    let mut built_file = std::fs::OpenOptions::new()
        .append(true)
        .open(out_dir.join("built.rs"))
        .expect("Failed to open built.rs");
    writeln!(
        built_file,
        "#[allow(dead_code)]\npub const BUILD_DATE: &str = \"{}\";",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )
    .expect("Failed to write the build date");
}
