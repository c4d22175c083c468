//! Usha server binary.
//! Run with: cargo run --bin usha-server

use std::process::ExitCode;

use usha_table::start_usha;

fn main() -> ExitCode {
    start_usha::run()
}
