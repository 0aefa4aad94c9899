// FAE Tools - Post-Issuance Software Toolkit
// Copyright (C) 2026 FAE Tools Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use fae_demo::{Addresses, GREETING};
use std::io::Write;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // stdout carries the address report, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let v = fae_demo::dispatch(std::env::args().skip(1).count());

    let string: &'static str = GREETING;
    let addresses = Addresses::capture(&string, main as fn() -> ExitCode as *const ());
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = write!(stdout, "{}", addresses).and_then(|_| stdout.flush()) {
        tracing::warn!("Failed to print addresses: {}", e);
    }

    ExitCode::from(u8::try_from(v).unwrap_or(u8::MAX))
}
