//! cfgmerge binary entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    cfgmerge::cli::run()
}
