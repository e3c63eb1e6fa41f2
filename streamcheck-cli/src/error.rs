// ============================================================================
// streamcheck-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Error types and utilities for the CLI
//
// KEY COMPONENTS:
// - CliResult: Type alias for CLI operations
// - CliErrorContext: context for errors surfacing from commands

// ---- Internal crate imports ----
use streamcheck_core::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::fmt;

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

/// Prefixes a command step onto errors surfacing from the core, so the user
/// sees which step of `publish`, `probe` or `check` failed.
pub trait CliErrorContext<T> {
    /// Names the failing step.
    fn cli_context<C: fmt::Display>(self, step: C) -> CliResult<T>;

    /// Names the failing step; `step` is only evaluated on error.
    fn cli_with_context<C, F>(self, step: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C;
}

impl<T, E: Into<CoreError>> CliErrorContext<T> for Result<T, E> {
    fn cli_context<C: fmt::Display>(self, step: C) -> CliResult<T> {
        self.cli_with_context(|| step)
    }

    fn cli_with_context<C, F>(self, step: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| step_failed(step(), e.into()))
    }
}

fn step_failed(step: impl fmt::Display, error: CoreError) -> CoreError {
    CoreError::OperationFailed(format!("{step}: {error}"))
}

/// Turns a panicked or aborted supervisor task into an error.
pub fn join_error(task: &str, error: tokio::task::JoinError) -> CoreError {
    CoreError::OperationFailed(format!("{task} task did not complete: {error}"))
}
