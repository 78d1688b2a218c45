//! Viscosity rankings HTTP server.
//! Run with: cargo run --bin viscosity-rank-server

use std::process::ExitCode;

use viscosity_rank::start_viscosity_rank;

fn main() -> ExitCode {
    start_viscosity_rank::run()
}
