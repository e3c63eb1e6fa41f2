// streamcheck-cli/src/lib.rs
//
// Library portion of the streamcheck CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;

// Re-export items needed by the binary or integration tests
pub use cli::{CheckArgs, Cli, Commands, GlobalArgs, ProbeArgs, PublishArgs};
pub use commands::check::run_check;
pub use commands::probe::run_probe;
pub use commands::publish::run_publish;
pub use error::{CliErrorContext, CliResult};
