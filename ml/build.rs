/*
 * Copyright © 2026 Volodymyr Kadzhaia
 * Copyright © 2026 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::env;
use std::path::Path;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Only the sentence-transformers embedder needs a Python runtime
    if env::var("CARGO_FEATURE_PYTHON").is_err() {
        return;
    }

    // pyo3 links libpython itself; add an rpath so the test and CLI binaries
    // find it at runtime without LD_LIBRARY_PATH
    let libdir = get_python_config("import sysconfig; print(sysconfig.get_config_var('LIBDIR') or '')");
    if !libdir.is_empty() && Path::new(&libdir).exists() {
        println!("cargo:rustc-link-arg=-Wl,-rpath,{}", libdir);
    }
    if Path::new("/opt/homebrew/lib").exists() {
        println!("cargo:rustc-link-arg=-Wl,-rpath,/opt/homebrew/lib");
    }
}

fn get_python_config(script: &str) -> String {
    match Command::new("python3").args(["-c", script]).output() {
        Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout).trim().to_string(),
        _ => String::new(),
    }
}
