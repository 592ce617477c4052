// squish-cli/src/lib.rs
//
// Library portion of the Squish CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod output;

// Re-export items needed by the binary or integration tests
pub use cli::{CheckArgs, Cli, Commands, CompressArgs, ProbeArgs};
pub use commands::{run_check, run_compress, run_probe};
