//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of one subcommand.

pub mod check;
pub mod compress;
pub mod probe;

pub use check::run_check;
pub use compress::run_compress;
pub use probe::run_probe;
